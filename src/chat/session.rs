//! Per-session conversation state.
//!
//! A [`Session`] is an explicitly owned value: one per interactive session,
//! handed by reference to whatever handles the user's next action.  Its
//! mutators are crate-private so that only the reducer changes it.

use crate::error::{Error, Result};
use crate::types::{ChatMessage, Role};

/// Whether the session has any conversation yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No messages; onboarding affordances are shown.
    Idle,
    /// At least one message; the transcript is shown.
    Active,
}

/// Conversation state for one interactive session.
///
/// `messages` never contains a system message: the system prompt is rebuilt
/// from `decision_context` on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    messages: Vec<ChatMessage>,
    decision_context: String,
    current_decision: String,
    in_flight: bool,
}

impl Session {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// The conversation so far, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// The decision context as last set by the user.
    pub fn decision_context(&self) -> &str {
        &self.decision_context
    }

    /// The decision context captured by the last "start new decision".
    pub fn current_decision(&self) -> &str {
        &self.current_decision
    }

    /// Idle when there are no messages, Active otherwise.
    pub fn phase(&self) -> SessionPhase {
        if self.messages.is_empty() {
            SessionPhase::Idle
        } else {
            SessionPhase::Active
        }
    }

    /// True while a request for this session is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// True when the last message is a user message with no reply after it.
    pub fn has_unanswered_turn(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|message| message.role == Role::User)
    }

    pub(crate) fn push(&mut self, message: ChatMessage) {
        debug_assert!(message.role != Role::System);
        self.messages.push(message);
    }

    pub(crate) fn clear_messages(&mut self) {
        self.messages.clear();
    }

    pub(crate) fn set_decision_context(&mut self, context: String) {
        self.decision_context = context;
    }

    pub(crate) fn set_current_decision(&mut self, decision: String) {
        self.current_decision = decision;
    }

    /// Marks a request as outstanding.  Fails if one already is.
    pub(crate) fn begin_request(&mut self) -> Result<()> {
        if self.in_flight {
            return Err(Error::busy());
        }
        self.in_flight = true;
        Ok(())
    }

    pub(crate) fn finish_request(&mut self) {
        self.in_flight = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.message_count(), 0);
        assert_eq!(session.decision_context(), "");
        assert_eq!(session.current_decision(), "");
        assert!(!session.is_in_flight());
        assert!(!session.has_unanswered_turn());
    }

    #[test]
    fn push_makes_active() {
        let mut session = Session::new();
        session.push(ChatMessage::user("Should I move?"));
        assert_eq!(session.phase(), SessionPhase::Active);
        assert!(session.has_unanswered_turn());

        session.push(ChatMessage::assistant("What is pulling you there?"));
        assert!(!session.has_unanswered_turn());

        session.clear_messages();
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn one_request_at_a_time() {
        let mut session = Session::new();
        session.begin_request().unwrap();
        assert!(session.is_in_flight());
        assert!(session.begin_request().unwrap_err().is_busy());
        session.finish_request();
        assert!(!session.is_in_flight());
        session.begin_request().unwrap();
    }
}
