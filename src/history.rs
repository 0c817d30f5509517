//! Bounded archive of past conversations, most-recent-first.

use rusqlite::Connection;

use crate::db::{self, DbError, KEY_HISTORY};
use crate::models::HistoryRecord;

pub const HISTORY_CAP: usize = 50;

pub fn list(conn: &Connection) -> Result<Vec<HistoryRecord>, DbError> {
    match db::kv_get(conn, KEY_HISTORY)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Inserts or refreshes a record. Records are keyed by session id: a session
/// archived again replaces its earlier entry and moves to the front, so one
/// session never occupies more than one slot. The archive is truncated to
/// `HISTORY_CAP`, evicting the oldest entries.
pub fn upsert(conn: &Connection, record: HistoryRecord) -> Result<(), DbError> {
    let mut records = list(conn)?;
    records.retain(|r| r.id != record.id);
    records.insert(0, record);
    records.truncate(HISTORY_CAP);
    db::kv_set(conn, KEY_HISTORY, &serde_json::to_string(&records)?)
}

pub fn find(conn: &Connection, id: &str) -> Result<Option<HistoryRecord>, DbError> {
    Ok(list(conn)?.into_iter().find(|r| r.id == id))
}

/// Irreversible; the caller confirms with the user first.
pub fn clear(conn: &Connection) -> Result<(), DbError> {
    db::kv_delete(conn, KEY_HISTORY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::models::{now_iso, Message, Mode, Role};

    fn record(id: &str, content: &str) -> HistoryRecord {
        HistoryRecord {
            id: id.to_string(),
            mode: Mode::Logical,
            date: now_iso(),
            rounds: 1,
            messages: vec![Message::new(Role::User, content)],
        }
    }

    #[test]
    fn empty_archive_lists_nothing() {
        let conn = test_connection();
        assert!(list(&conn).unwrap().is_empty());
    }

    #[test]
    fn newest_record_is_first() {
        let conn = test_connection();
        upsert(&conn, record("a", "ראשון")).unwrap();
        upsert(&conn, record("b", "שני")).unwrap();
        let records = list(&conn).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "b");
        assert_eq!(records[1].id, "a");
    }

    #[test]
    fn archive_caps_at_fifty_and_evicts_oldest() {
        let conn = test_connection();
        for i in 0..51 {
            upsert(&conn, record(&format!("s{}", i), "עמדה")).unwrap();
        }
        let records = list(&conn).unwrap();
        assert_eq!(records.len(), HISTORY_CAP);
        assert_eq!(records[0].id, "s50");
        // s0, the oldest, fell off
        assert!(records.iter().all(|r| r.id != "s0"));
    }

    #[test]
    fn upsert_same_id_keeps_one_record_at_front() {
        let conn = test_connection();
        upsert(&conn, record("a", "ראשון")).unwrap();
        upsert(&conn, record("b", "שני")).unwrap();
        let mut updated = record("a", "מעודכן");
        updated.rounds = 3;
        upsert(&conn, updated).unwrap();

        let records = list(&conn).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].rounds, 3);
        assert_eq!(records[0].messages[0].content, "מעודכן");
    }

    #[test]
    fn find_returns_matching_record_or_none() {
        let conn = test_connection();
        upsert(&conn, record("a", "עמדה")).unwrap();
        assert!(find(&conn, "a").unwrap().is_some());
        assert!(find(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn clear_empties_archive() {
        let conn = test_connection();
        upsert(&conn, record("a", "עמדה")).unwrap();
        clear(&conn).unwrap();
        assert!(list(&conn).unwrap().is_empty());
    }
}
