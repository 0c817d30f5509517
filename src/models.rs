use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ID = String;

/// The four argumentation styles a challenge can run in.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  Logical,
  Practical,
  Consistent,
  Minimalist,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Ai,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
  pub role: Role,
  pub content: String,
  pub timestamp: String,
}

impl Message {
  pub fn new(role: Role, content: impl Into<String>) -> Self {
    Self {
      role,
      content: content.into(),
      timestamp: now_iso(),
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
  pub mode: Mode,
  pub messages: Vec<Message>,
  pub round_count: u32,
}

/// One archived session. `id` stays stable across the repeated archive
/// writes of a single session, so updates land on the same record.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HistoryRecord {
  pub id: ID,
  pub mode: Mode,
  pub date: String,
  pub rounds: u32,
  pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  pub timer_enabled: bool,
  pub timer_duration: u32,
  pub max_rounds: u32,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      timer_enabled: false,
      timer_duration: 60,
      max_rounds: 10,
    }
  }
}

pub fn new_id() -> ID {
  Uuid::new_v4().to_string()
}

pub fn now_iso() -> String {
  // RFC3339 without nanos; good enough for sorting/display.
  let t = time::OffsetDateTime::now_utc();
  t.format(&time::format_description::well_known::Rfc3339)
    .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn settings_default_fills_missing_fields() {
    let s: Settings = serde_json::from_str(r#"{"timerEnabled":true}"#).unwrap();
    assert!(s.timer_enabled);
    assert_eq!(s.timer_duration, 60);
    assert_eq!(s.max_rounds, 10);
  }

  #[test]
  fn mode_round_trips_as_lowercase() {
    let json = serde_json::to_string(&Mode::Minimalist).unwrap();
    assert_eq!(json, "\"minimalist\"");
    let back: Mode = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Mode::Minimalist);
  }

  #[test]
  fn message_records_creation_time() {
    let msg = Message::new(Role::User, "שלום");
    assert_eq!(msg.role, Role::User);
    assert!(msg.timestamp.contains('T'));
  }
}
