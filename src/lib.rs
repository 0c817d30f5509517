pub mod commands;
pub mod db;
pub mod history;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod session;
pub mod timer;

use log::info;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_log::Builder::new().build())
        .plugin(tauri_plugin_dialog::init())
        .manage(commands::AppState::new())
        .setup(|app| {
            db::init_db(app.handle())?;
            info!("database initialized");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::has_credential,
            commands::verify_credential,
            commands::reset_credential,
            commands::get_theme,
            commands::set_theme,
            commands::get_settings,
            commands::save_settings,
            commands::session_view,
            commands::select_mode,
            commands::start_challenge,
            commands::send_reply,
            commands::stop_session,
            commands::list_history,
            commands::clear_history,
            commands::load_session,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
