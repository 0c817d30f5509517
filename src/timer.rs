//! Countdown between AI answer and user reply, owned by the session
//! controller and cancelled on every transition that should stop it.

use serde::Serialize;
use tauri::{AppHandle, Emitter};
use tokio::time::{interval, Duration};

#[derive(Debug, Clone, Serialize)]
struct TickPayload {
    remaining: u32,
}

#[derive(Default)]
pub struct Countdown {
    handle: Option<tauri::async_runtime::JoinHandle<()>>,
}

impl Countdown {
    /// Starts a fresh countdown, replacing any running one. Emits a
    /// `timer-tick` event each second and `timer-expired` at zero, then
    /// stops itself.
    pub fn start(&mut self, app: AppHandle, seconds: u32) {
        self.cancel();
        let handle = tauri::async_runtime::spawn(async move {
            let mut remaining = seconds;
            let mut ticker = interval(Duration::from_secs(1));
            // the first tick of a tokio interval fires immediately
            ticker.tick().await;
            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                let _ = app.emit("timer-tick", TickPayload { remaining });
            }
            let _ = app.emit("timer-expired", ());
        });
        self.handle = Some(handle);
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
