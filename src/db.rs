use rusqlite::{Connection, OptionalExtension};
use tauri::{AppHandle, Manager};
use thiserror::Error;

use crate::models::{now_iso, Settings};

// Logical persistence keys in the storage table.
pub const KEY_CREDENTIAL: &str = "credential";
pub const KEY_HISTORY: &str = "history";
pub const KEY_SETTINGS: &str = "settings";
pub const KEY_THEME: &str = "theme";

pub const THEME_LIGHT: &str = "light";
pub const THEME_DARK: &str = "dark";

#[derive(Debug, Error)]
pub enum DbError {
  #[error("tauri error: {0}")]
  Tauri(#[from] tauri::Error),
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),
}

pub fn db_path(app: &AppHandle) -> Result<std::path::PathBuf, DbError> {
  let app_data = app.path().app_data_dir().map_err(DbError::Tauri)?;
  std::fs::create_dir_all(&app_data)?;
  Ok(app_data.join("counterpoint.sqlite"))
}

pub fn connect(app: &AppHandle) -> Result<Connection, DbError> {
  let conn = Connection::open(db_path(app)?)?;
  Ok(conn)
}

pub fn init_db(app: &AppHandle) -> Result<(), DbError> {
  let conn = connect(app)?;
  // Schema is embedded at compile time and idempotent.
  let init_sql = include_str!("../migrations/001_init.sql");
  conn.execute_batch(init_sql)?;
  Ok(())
}

pub fn kv_get(conn: &Connection, key: &str) -> Result<Option<String>, DbError> {
  let value = conn
    .query_row("SELECT value FROM storage WHERE key = ?1", [key], |r| r.get(0))
    .optional()?;
  Ok(value)
}

pub fn kv_set(conn: &Connection, key: &str, value: &str) -> Result<(), DbError> {
  let updated_at = now_iso();
  conn.execute(
    "INSERT INTO storage (key, value, updated_at) VALUES (?1, ?2, ?3)
     ON CONFLICT(key) DO UPDATE SET value=excluded.value, updated_at=excluded.updated_at",
    (key, value, &updated_at),
  )?;
  Ok(())
}

pub fn kv_delete(conn: &Connection, key: &str) -> Result<(), DbError> {
  conn.execute("DELETE FROM storage WHERE key = ?1", [key])?;
  Ok(())
}

// Typed accessors over the four logical keys.

pub fn credential(conn: &Connection) -> Result<Option<String>, DbError> {
  kv_get(conn, KEY_CREDENTIAL)
}

pub fn set_credential(conn: &Connection, key: &str) -> Result<(), DbError> {
  kv_set(conn, KEY_CREDENTIAL, key)
}

pub fn delete_credential(conn: &Connection) -> Result<(), DbError> {
  kv_delete(conn, KEY_CREDENTIAL)
}

/// Absent or unparsable settings fall back to defaults.
pub fn load_settings(conn: &Connection) -> Result<Settings, DbError> {
  let settings = kv_get(conn, KEY_SETTINGS)?
    .and_then(|raw| serde_json::from_str(&raw).ok())
    .unwrap_or_default();
  Ok(settings)
}

pub fn save_settings(conn: &Connection, settings: &Settings) -> Result<(), DbError> {
  kv_set(conn, KEY_SETTINGS, &serde_json::to_string(settings)?)
}

pub fn theme(conn: &Connection) -> Result<String, DbError> {
  Ok(kv_get(conn, KEY_THEME)?.unwrap_or_else(|| THEME_LIGHT.to_string()))
}

pub fn set_theme(conn: &Connection, theme: &str) -> Result<(), DbError> {
  kv_set(conn, KEY_THEME, theme)
}

#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
  let conn = Connection::open_in_memory().expect("in-memory sqlite");
  conn
    .execute_batch(include_str!("../migrations/001_init.sql"))
    .expect("apply schema");
  conn
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kv_set_then_get_round_trips() {
    let conn = test_connection();
    kv_set(&conn, "k", "v1").unwrap();
    assert_eq!(kv_get(&conn, "k").unwrap().as_deref(), Some("v1"));
    kv_set(&conn, "k", "v2").unwrap();
    assert_eq!(kv_get(&conn, "k").unwrap().as_deref(), Some("v2"));
  }

  #[test]
  fn kv_get_missing_key_is_none() {
    let conn = test_connection();
    assert!(kv_get(&conn, "absent").unwrap().is_none());
  }

  #[test]
  fn kv_delete_removes_key() {
    let conn = test_connection();
    kv_set(&conn, "k", "v").unwrap();
    kv_delete(&conn, "k").unwrap();
    assert!(kv_get(&conn, "k").unwrap().is_none());
  }

  #[test]
  fn settings_default_when_absent() {
    let conn = test_connection();
    assert_eq!(load_settings(&conn).unwrap(), Settings::default());
  }

  #[test]
  fn settings_default_when_corrupt() {
    let conn = test_connection();
    kv_set(&conn, KEY_SETTINGS, "not json").unwrap();
    assert_eq!(load_settings(&conn).unwrap(), Settings::default());
  }

  #[test]
  fn settings_round_trip() {
    let conn = test_connection();
    let settings = Settings {
      timer_enabled: true,
      timer_duration: 90,
      max_rounds: 5,
    };
    save_settings(&conn, &settings).unwrap();
    assert_eq!(load_settings(&conn).unwrap(), settings);
  }

  #[test]
  fn theme_defaults_to_light() {
    let conn = test_connection();
    assert_eq!(theme(&conn).unwrap(), THEME_LIGHT);
    set_theme(&conn, THEME_DARK).unwrap();
    assert_eq!(theme(&conn).unwrap(), THEME_DARK);
  }

  #[test]
  fn credential_set_and_reset() {
    let conn = test_connection();
    assert!(credential(&conn).unwrap().is_none());
    set_credential(&conn, "secret").unwrap();
    assert_eq!(credential(&conn).unwrap().as_deref(), Some("secret"));
    delete_credential(&conn).unwrap();
    assert!(credential(&conn).unwrap().is_none());
  }
}
