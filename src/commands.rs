use std::sync::{Mutex, MutexGuard};

use log::{info, warn};
use serde::Serialize;
use tauri::{AppHandle, State};

use crate::db;
use crate::history;
use crate::llm::GeminiClient;
use crate::models::{HistoryRecord, Mode, Settings};
use crate::prompts;
use crate::session::{ReplyGate, Session, SessionView};
use crate::timer::Countdown;

/// Application state managed by the Tauri runtime. The guards are never
/// held across an await.
pub struct AppState {
  session: Mutex<Session>,
  timer: Mutex<Countdown>,
}

impl AppState {
  pub fn new() -> Self {
    Self {
      session: Mutex::new(Session::new()),
      timer: Mutex::new(Countdown::default()),
    }
  }
}

impl Default for AppState {
  fn default() -> Self {
    Self::new()
  }
}

fn session_guard<'a>(state: &'a State<'_, AppState>) -> Result<MutexGuard<'a, Session>, String> {
  state
    .session
    .lock()
    .map_err(|e| format!("failed to lock session state: {}", e))
}

fn timer_guard<'a>(state: &'a State<'_, AppState>) -> Result<MutexGuard<'a, Countdown>, String> {
  state
    .timer
    .lock()
    .map_err(|e| format!("failed to lock timer: {}", e))
}

// Credential flow

#[tauri::command]
pub fn has_credential(app: AppHandle) -> Result<bool, String> {
  let conn = db::connect(&app).map_err(|e| e.to_string())?;
  Ok(db::credential(&conn).map_err(|e| e.to_string())?.is_some())
}

#[tauri::command]
pub async fn verify_credential(app: AppHandle, key: String) -> Result<(), String> {
  let key = key.trim().to_string();
  if key.is_empty() {
    return Err("credential must not be empty".into());
  }

  let client = GeminiClient::new(key.clone());
  client.verify().await.map_err(|e| e.to_string())?;

  let conn = db::connect(&app).map_err(|e| e.to_string())?;
  db::set_credential(&conn, &key).map_err(|e| e.to_string())?;
  info!("credential verified and stored");
  Ok(())
}

#[tauri::command]
pub fn reset_credential(app: AppHandle) -> Result<(), String> {
  let conn = db::connect(&app).map_err(|e| e.to_string())?;
  db::delete_credential(&conn).map_err(|e| e.to_string())?;
  info!("credential reset");
  Ok(())
}

// Theme and settings

#[tauri::command]
pub fn get_theme(app: AppHandle) -> Result<String, String> {
  let conn = db::connect(&app).map_err(|e| e.to_string())?;
  db::theme(&conn).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_theme(app: AppHandle, theme: String) -> Result<(), String> {
  if theme != db::THEME_LIGHT && theme != db::THEME_DARK {
    return Err(format!("unknown theme: {}", theme));
  }
  let conn = db::connect(&app).map_err(|e| e.to_string())?;
  db::set_theme(&conn, &theme).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn get_settings(app: AppHandle) -> Result<Settings, String> {
  let conn = db::connect(&app).map_err(|e| e.to_string())?;
  db::load_settings(&conn).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn save_settings(app: AppHandle, settings: Settings) -> Result<(), String> {
  if settings.timer_duration == 0 || settings.max_rounds == 0 {
    return Err("timer duration and max rounds must be positive".into());
  }
  let conn = db::connect(&app).map_err(|e| e.to_string())?;
  db::save_settings(&conn, &settings).map_err(|e| e.to_string())
}

// Session lifecycle

#[tauri::command]
pub fn session_view(state: State<'_, AppState>) -> Result<SessionView, String> {
  Ok(session_guard(&state)?.view())
}

#[tauri::command]
pub fn select_mode(state: State<'_, AppState>, mode: Mode) -> Result<SessionView, String> {
  let mut session = session_guard(&state)?;
  session.select_mode(mode).map_err(|e| e.to_string())?;
  Ok(session.view())
}

#[tauri::command]
pub async fn start_challenge(
  app: AppHandle,
  state: State<'_, AppState>,
  statement: String,
) -> Result<SessionView, String> {
  let prompt = {
    let mut session = session_guard(&state)?;
    session.start_challenge(&statement).map_err(|e| e.to_string())?;
    session.begin_exchange().map_err(|e| e.to_string())?;
    let conversation = session.conversation().ok_or("no active conversation")?;
    prompts::build_prompt(conversation.mode, &conversation.messages)
  };

  run_exchange(&app, &state, prompt).await
}

/// Tagged outcome of `send_reply`: either a completed exchange, or a request
/// to confirm going past the round cap and retry with `allow_over_limit`.
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ReplyOutcome {
  Exchanged(SessionView),
  #[serde(rename_all = "camelCase")]
  ConfirmRoundLimit { max_rounds: u32 },
}

#[tauri::command]
pub async fn send_reply(
  app: AppHandle,
  state: State<'_, AppState>,
  text: String,
  allow_over_limit: bool,
) -> Result<ReplyOutcome, String> {
  let prompt = {
    let mut session = session_guard(&state)?;
    let conn = db::connect(&app).map_err(|e| e.to_string())?;
    let settings = db::load_settings(&conn).map_err(|e| e.to_string())?;

    let gate = session
      .gate_reply(&text, settings.max_rounds, allow_over_limit)
      .map_err(|e| e.to_string())?;

    // the reply is admissible; the countdown stops even if the user still
    // has to confirm the round cap
    timer_guard(&state)?.cancel();

    if let ReplyGate::ConfirmRoundLimit(max_rounds) = gate {
      return Ok(ReplyOutcome::ConfirmRoundLimit { max_rounds });
    }

    session.push_reply(&text).map_err(|e| e.to_string())?;
    session.begin_exchange().map_err(|e| e.to_string())?;
    let conversation = session.conversation().ok_or("no active conversation")?;
    prompts::build_prompt(conversation.mode, &conversation.messages)
  };

  run_exchange(&app, &state, prompt)
    .await
    .map(ReplyOutcome::Exchanged)
}

#[tauri::command]
pub fn stop_session(app: AppHandle, state: State<'_, AppState>) -> Result<SessionView, String> {
  // lock order is session before timer, everywhere
  let mut session = session_guard(&state)?;
  let record = session.stop().map_err(|e| e.to_string())?;
  timer_guard(&state)?.cancel();
  if let Some(record) = record {
    let conn = db::connect(&app).map_err(|e| e.to_string())?;
    history::upsert(&conn, record).map_err(|e| e.to_string())?;
  }
  Ok(session.view())
}

// History

#[tauri::command]
pub fn list_history(app: AppHandle) -> Result<Vec<HistoryRecord>, String> {
  let conn = db::connect(&app).map_err(|e| e.to_string())?;
  history::list(&conn).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn clear_history(app: AppHandle) -> Result<(), String> {
  let conn = db::connect(&app).map_err(|e| e.to_string())?;
  history::clear(&conn).map_err(|e| e.to_string())?;
  info!("history cleared");
  Ok(())
}

#[tauri::command]
pub fn load_session(
  app: AppHandle,
  state: State<'_, AppState>,
  id: String,
) -> Result<SessionView, String> {
  let conn = db::connect(&app).map_err(|e| e.to_string())?;
  let record = history::find(&conn, &id).map_err(|e| e.to_string())?;

  let mut session = session_guard(&state)?;
  match record {
    Some(record) => {
      timer_guard(&state)?.cancel();
      session.resume(record).map_err(|e| e.to_string())?;
      Ok(session.view())
    }
    None => {
      // absent records are a no-op, not a failure
      warn!("history record {} not found", id);
      Ok(session.view())
    }
  }
}

// Exchange orchestration

async fn exchange_answer(app: &AppHandle, prompt: &str) -> Result<String, String> {
  let credential = {
    let conn = db::connect(app).map_err(|e| e.to_string())?;
    db::credential(&conn)
      .map_err(|e| e.to_string())?
      .ok_or("no stored credential")?
  };

  let client = GeminiClient::new(credential);
  client.generate(prompt).await.map_err(|e| e.to_string())
}

/// Runs the outstanding exchange for the current session: calls the
/// provider, commits or aborts, archives the session-in-progress, and arms
/// the countdown when enabled.
async fn run_exchange(
  app: &AppHandle,
  state: &State<'_, AppState>,
  prompt: String,
) -> Result<SessionView, String> {
  let outcome = exchange_answer(app, &prompt).await;

  let mut session = session_guard(state)?;
  match outcome {
    Ok(answer) => {
      session.complete_exchange(&answer).map_err(|e| e.to_string())?;

      let conn = db::connect(app).map_err(|e| e.to_string())?;
      if let Some(record) = session.to_record() {
        history::upsert(&conn, record).map_err(|e| e.to_string())?;
      }

      let settings = db::load_settings(&conn).map_err(|e| e.to_string())?;
      if settings.timer_enabled {
        timer_guard(state)?.start(app.clone(), settings.timer_duration);
      }

      Ok(session.view())
    }
    Err(e) => {
      warn!("exchange failed: {}", e);
      session.abort_exchange();
      Err(e)
    }
  }
}
