use serde::Serialize;
use thiserror::Error;

use crate::models::{new_id, now_iso, Conversation, HistoryRecord, Message, Mode, Role, ID};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("statement or reply must not be empty")]
    EmptyInput,
    #[error("operation is not valid in the current session phase")]
    WrongPhase,
    #[error("an exchange is already in flight")]
    ExchangeInFlight,
    #[error("no active conversation")]
    NoConversation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Idle,
    AwaitingStatement,
    Exchanging,
    Closed,
}

/// Outcome of admitting a reply: proceed, or ask the user to confirm going
/// past the configured round cap. The cap is soft; confirmation overrides it.
#[derive(Debug, PartialEq, Eq)]
pub enum ReplyGate {
    Proceed,
    ConfirmRoundLimit(u32),
}

/// Snapshot handed to the frontend for rendering.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub phase: SessionPhase,
    pub mode: Option<Mode>,
    pub mode_name: Option<&'static str>,
    pub messages: Vec<Message>,
    pub round_count: u32,
    pub exchange_in_flight: bool,
}

/// The session state machine. Pure state and transitions; persistence and
/// the actual AI call are driven by the command layer.
#[derive(Debug, Default)]
pub struct Session {
    phase: SessionPhase,
    pending_mode: Option<Mode>,
    id: Option<ID>,
    conversation: Option<Conversation>,
    in_flight: bool,
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Idle
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn exchange_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Picks (or re-picks, before a statement exists) the challenge mode.
    pub fn select_mode(&mut self, mode: Mode) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Idle | SessionPhase::Closed | SessionPhase::AwaitingStatement => {
                self.pending_mode = Some(mode);
                self.phase = SessionPhase::AwaitingStatement;
                Ok(())
            }
            SessionPhase::Exchanging => Err(SessionError::WrongPhase),
        }
    }

    /// Opens the conversation with the user's initial statement. The first
    /// round is the statement itself.
    pub fn start_challenge(&mut self, statement: &str) -> Result<(), SessionError> {
        if self.phase != SessionPhase::AwaitingStatement {
            return Err(SessionError::WrongPhase);
        }
        let statement = statement.trim();
        if statement.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let mode = self.pending_mode.ok_or(SessionError::WrongPhase)?;

        self.conversation = Some(Conversation {
            mode,
            messages: vec![Message::new(Role::User, statement)],
            round_count: 1,
        });
        self.id = Some(new_id());
        self.phase = SessionPhase::Exchanging;
        Ok(())
    }

    /// Validates a reply without mutating anything.
    pub fn gate_reply(
        &self,
        text: &str,
        max_rounds: u32,
        allow_over_limit: bool,
    ) -> Result<ReplyGate, SessionError> {
        if self.phase != SessionPhase::Exchanging {
            return Err(SessionError::WrongPhase);
        }
        if self.in_flight {
            return Err(SessionError::ExchangeInFlight);
        }
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let conversation = self.conversation.as_ref().ok_or(SessionError::NoConversation)?;
        if conversation.round_count >= max_rounds && !allow_over_limit {
            return Ok(ReplyGate::ConfirmRoundLimit(max_rounds));
        }
        Ok(ReplyGate::Proceed)
    }

    /// Appends the user's reply and advances the round counter. Callers go
    /// through `gate_reply` first; the same checks are applied here.
    pub fn push_reply(&mut self, text: &str) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Exchanging {
            return Err(SessionError::WrongPhase);
        }
        if self.in_flight {
            return Err(SessionError::ExchangeInFlight);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let conversation = self.conversation.as_mut().ok_or(SessionError::NoConversation)?;
        conversation.messages.push(Message::new(Role::User, text));
        conversation.round_count += 1;
        Ok(())
    }

    /// Marks an exchange as outstanding. At most one per session.
    pub fn begin_exchange(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Exchanging {
            return Err(SessionError::WrongPhase);
        }
        if self.in_flight {
            return Err(SessionError::ExchangeInFlight);
        }
        if self.conversation.is_none() {
            return Err(SessionError::NoConversation);
        }
        self.in_flight = true;
        Ok(())
    }

    /// Appends the AI answer produced by the outstanding exchange.
    pub fn complete_exchange(&mut self, answer: &str) -> Result<(), SessionError> {
        if !self.in_flight || self.phase != SessionPhase::Exchanging {
            return Err(SessionError::WrongPhase);
        }
        let conversation = self.conversation.as_mut().ok_or(SessionError::NoConversation)?;
        conversation.messages.push(Message::new(Role::Ai, answer));
        self.in_flight = false;
        Ok(())
    }

    /// Releases the in-flight marker after a failed exchange. The transcript
    /// is left untouched so the user can retry.
    pub fn abort_exchange(&mut self) {
        self.in_flight = false;
    }

    /// Current state as an archive record, if there is anything to archive.
    pub fn to_record(&self) -> Option<HistoryRecord> {
        let id = self.id.clone()?;
        let conversation = self.conversation.as_ref()?;
        if conversation.messages.is_empty() {
            return None;
        }
        Some(HistoryRecord {
            id,
            mode: conversation.mode,
            date: now_iso(),
            rounds: conversation.round_count,
            messages: conversation.messages.clone(),
        })
    }

    /// Ends the conversation. Returns the final archive record (when the
    /// transcript is non-empty) and leaves the machine ready for a new
    /// mode selection.
    pub fn stop(&mut self) -> Result<Option<HistoryRecord>, SessionError> {
        if self.phase != SessionPhase::Exchanging {
            return Err(SessionError::WrongPhase);
        }
        let record = self.to_record();
        self.pending_mode = None;
        self.id = None;
        self.conversation = None;
        self.in_flight = false;
        self.phase = SessionPhase::Closed;
        Ok(record)
    }

    /// Rebuilds an exchanging session from an archived record. The record's
    /// id is kept so further archive writes update the same entry.
    pub fn resume(&mut self, record: HistoryRecord) -> Result<(), SessionError> {
        if self.in_flight {
            return Err(SessionError::ExchangeInFlight);
        }
        self.pending_mode = Some(record.mode);
        self.id = Some(record.id);
        self.conversation = Some(Conversation {
            mode: record.mode,
            messages: record.messages,
            round_count: record.rounds,
        });
        self.phase = SessionPhase::Exchanging;
        Ok(())
    }

    pub fn view(&self) -> SessionView {
        let mode = self
            .conversation
            .as_ref()
            .map(|c| c.mode)
            .or(self.pending_mode);
        SessionView {
            phase: self.phase,
            mode,
            mode_name: mode.map(|m| m.display_name()),
            messages: self
                .conversation
                .as_ref()
                .map(|c| c.messages.clone())
                .unwrap_or_default(),
            round_count: self.conversation.as_ref().map(|c| c.round_count).unwrap_or(0),
            exchange_in_flight: self.in_flight,
        }
    }
}
