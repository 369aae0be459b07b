//! State transitions for a decision session.
//!
//! Every user action becomes an [`Action`].  [`reduce`] applies it to the
//! [`Session`] synchronously and either settles immediately or hands back a
//! [`PendingQuery`] describing the one API round-trip the action needs.  The
//! outcome of that round-trip is folded back in with [`resolve`], or dropped
//! with [`abandon`] if the request was cancelled.  [`Dispatcher`] strings the
//! three together around a [`ChatBackend`].
//!
//! The transitions are synchronous; only the backend call is awaited.  A
//! request that is cancelled, or whose dispatch future is dropped, leaves the
//! session out of flight with the pending turn abandoned.

use std::future::Future;

use crate::chat::render::Renderer;
use crate::chat::scenarios::Scenario;
use crate::chat::session::{Session, SessionPhase};
use crate::client::ChatBackend;
use crate::error::{Error, Result};
use crate::observability::{
    SESSION_ACTIONS, SESSION_BUSY, SESSION_CANCELLED, SESSION_UNANSWERED_TURNS,
};
use crate::prompt::build_system_prompt;
use crate::types::{ChatCompletionResponse, ChatMessage, Model};

/// Shown after a failed submit, below the error itself.
pub const SUBMIT_FAILURE_NOTICE: &str = "Sorry, I couldn't get a response. Please try again.";

/// Prefix of the seeded user message sent by [`Action::StartNewDecision`].
pub const DECISION_SEED_PREFIX: &str = "I need help deciding: ";

/// A user action against a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the decision context.  History is untouched.
    SetContext(String),
    /// Clear history and, if there is a context, open the conversation with it.
    StartNewDecision,
    /// Clear history unconditionally.
    ClearConversation,
    /// Append a user message and ask for a reply.
    SubmitMessage(String),
    /// Append an example scenario's prompt without asking for a reply.
    ExampleClick(Scenario),
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something failed.
    Error,
}

/// A user-visible message produced by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text to show.
    pub text: String,
}

impl Notice {
    /// Creates an informational notice.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    /// Creates an error notice.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    /// True for error notices.
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Turn {
    /// Opening exchange of a new decision; `seed` is stored only on success.
    Opening { seed: ChatMessage },
    /// Reply to the user message already at the end of history.
    Reply,
}

/// An API round-trip requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    messages: Vec<ChatMessage>,
    turn: Turn,
}

impl PendingQuery {
    /// The full request: system prompt first, then the conversation.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Progress label to show while waiting.
    pub fn label(&self) -> &'static str {
        match self.turn {
            Turn::Opening { .. } => "Getting AI response...",
            Turn::Reply => "Thinking...",
        }
    }
}

/// What a transition needs next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The transition is complete.
    Settled(Vec<Notice>),
    /// The transition needs one API round-trip.  The session is now in flight.
    Query(PendingQuery),
}

/// Applies `action` to `session`.
///
/// Fails with [`Error::Busy`] if a request is already outstanding; the session
/// is left untouched in that case.
pub fn reduce(session: &mut Session, action: Action) -> Result<Effect> {
    if session.is_in_flight() {
        SESSION_BUSY.click();
        return Err(Error::busy());
    }
    match action {
        Action::SetContext(context) => {
            session.set_decision_context(context);
            Ok(Effect::Settled(Vec::new()))
        }
        Action::StartNewDecision => {
            session.clear_messages();
            let context = session.decision_context().to_string();
            session.set_current_decision(context.clone());
            if context.is_empty() {
                return Ok(Effect::Settled(vec![Notice::info(
                    "No decision context set. Describe your decision with /context <text>, or just ask below.",
                )]));
            }
            let seed = ChatMessage::user(format!("{DECISION_SEED_PREFIX}{context}"));
            let messages = vec![
                ChatMessage::system(build_system_prompt(&context)),
                seed.clone(),
            ];
            session.begin_request()?;
            Ok(Effect::Query(PendingQuery {
                messages,
                turn: Turn::Opening { seed },
            }))
        }
        Action::ClearConversation => {
            session.clear_messages();
            Ok(Effect::Settled(Vec::new()))
        }
        Action::SubmitMessage(text) => {
            session.push(ChatMessage::user(text));
            let mut messages = Vec::with_capacity(session.message_count() + 1);
            messages.push(ChatMessage::system(build_system_prompt(
                session.decision_context(),
            )));
            messages.extend_from_slice(session.messages());
            session.begin_request()?;
            Ok(Effect::Query(PendingQuery {
                messages,
                turn: Turn::Reply,
            }))
        }
        Action::ExampleClick(scenario) => {
            if session.phase() == SessionPhase::Active {
                return Ok(Effect::Settled(vec![Notice::info(
                    "Examples are offered before a conversation starts. Use /clear to start over.",
                )]));
            }
            session.push(ChatMessage::user(scenario.prompt()));
            Ok(Effect::Settled(Vec::new()))
        }
    }
}

/// Folds the outcome of a [`PendingQuery`] back into `session`.
///
/// Failures never propagate: they come back as notices.  A failed reply leaves
/// the user message in place, unanswered.
pub fn resolve(
    session: &mut Session,
    query: PendingQuery,
    result: Result<ChatCompletionResponse>,
) -> Vec<Notice> {
    session.finish_request();
    let reply = result.and_then(|response| response.reply().map(str::to_string));
    match (query.turn, reply) {
        (Turn::Opening { seed }, Ok(reply)) => {
            session.push(seed);
            session.push(ChatMessage::assistant(reply));
            Vec::new()
        }
        (Turn::Opening { .. }, Err(err)) => failure_notices(&err, false),
        (Turn::Reply, Ok(reply)) => {
            session.push(ChatMessage::assistant(reply));
            Vec::new()
        }
        (Turn::Reply, Err(err)) => {
            SESSION_UNANSWERED_TURNS.click();
            failure_notices(&err, true)
        }
    }
}

/// Drops a cancelled [`PendingQuery`].
pub fn abandon(session: &mut Session, query: PendingQuery) -> Vec<Notice> {
    session.finish_request();
    SESSION_CANCELLED.click();
    match query.turn {
        Turn::Opening { .. } => vec![Notice::info("Request cancelled. No decision was started.")],
        Turn::Reply => {
            SESSION_UNANSWERED_TURNS.click();
            vec![Notice::info(
                "Request cancelled. Your message is kept; send another to continue.",
            )]
        }
    }
}

fn failure_notices(err: &Error, with_fallback: bool) -> Vec<Notice> {
    let mut notices = vec![Notice::error(err.to_string())];
    if let Some(remediation) = err.remediation() {
        // Configuration problems halt the operation; say how to fix them instead.
        notices.push(Notice::info(remediation));
    } else if with_fallback {
        notices.push(Notice::error(SUBMIT_FAILURE_NOTICE));
    }
    notices
}

/// Clears the in-flight flag if the dispatch future is dropped mid-request.
struct InFlight<'a> {
    session: &'a mut Session,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.finish_request();
            SESSION_CANCELLED.click();
        }
    }
}

/// Runs actions against a session using one backend and model.
pub struct Dispatcher<B: ChatBackend> {
    backend: B,
    model: Model,
}

impl<B: ChatBackend> Dispatcher<B> {
    /// Creates a dispatcher.
    pub fn new(backend: B, model: Model) -> Self {
        Self { backend, model }
    }

    /// The backend requests go to.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the current model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Changes the model used for later requests.
    pub fn set_model(&mut self, model: Model) {
        self.model = model;
    }

    /// Applies `action`, performing its API round-trip if it has one.
    pub async fn dispatch(
        &self,
        session: &mut Session,
        action: Action,
        renderer: &mut dyn Renderer,
    ) -> Result<Vec<Notice>> {
        self.dispatch_until(session, action, renderer, std::future::pending::<()>())
            .await
    }

    /// Like [`Dispatcher::dispatch`], but abandons the request if `cancel` completes first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Busy`] if the session already has a request in flight.
    /// API failures are not errors here; they come back as notices.
    pub async fn dispatch_until<F>(
        &self,
        session: &mut Session,
        action: Action,
        renderer: &mut dyn Renderer,
        cancel: F,
    ) -> Result<Vec<Notice>>
    where
        F: Future<Output = ()>,
    {
        SESSION_ACTIONS.click();
        let query = match reduce(session, action)? {
            Effect::Settled(notices) => return Ok(notices),
            Effect::Query(query) => query,
        };
        renderer.start_request(query.label());
        let mut guard = InFlight {
            session,
            armed: true,
        };
        let outcome = tokio::select! {
            result = self.backend.query(query.messages(), &self.model) => Some(result),
            () = cancel => None,
        };
        renderer.finish_request();
        guard.armed = false;
        Ok(match outcome {
            Some(result) => resolve(&mut *guard.session, query, result),
            None => abandon(&mut *guard.session, query),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::chat::render::PlainTextRenderer;
    use crate::prompt::SYSTEM_PROMPT_TEMPLATE;
    use crate::types::{Choice, ChoiceMessage, Role};

    /// Backend that answers from a script and records every request.
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<ChatCompletionResponse>>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<ChatCompletionResponse>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<Vec<ChatMessage>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn query(
            &self,
            messages: &[ChatMessage],
            _: &Model,
        ) -> Result<ChatCompletionResponse> {
            self.requests.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected request")
        }
    }

    fn reply(text: &str) -> Result<ChatCompletionResponse> {
        Ok(ChatCompletionResponse {
            choices: vec![Choice {
                index: 0,
                message: Some(ChoiceMessage {
                    role: Some("assistant".to_string()),
                    content: Some(text.to_string()),
                }),
                finish_reason: Some("stop".to_string()),
            }],
            ..ChatCompletionResponse::default()
        })
    }

    fn failure() -> Result<ChatCompletionResponse> {
        Err(Error::transport("Service Unavailable", Some(503), None))
    }

    fn sink() -> PlainTextRenderer<std::io::Sink> {
        PlainTextRenderer::with_writer(std::io::sink(), false)
    }

    fn dispatcher(replies: Vec<Result<ChatCompletionResponse>>) -> Dispatcher<ScriptedBackend> {
        Dispatcher::new(ScriptedBackend::new(replies), Model::default())
    }

    #[test]
    fn set_context_only_touches_context() {
        let mut session = Session::new();
        session.push(ChatMessage::user("earlier"));
        let effect = reduce(&mut session, Action::SetContext("rent or buy".to_string())).unwrap();
        assert_eq!(effect, Effect::Settled(Vec::new()));
        assert_eq!(session.decision_context(), "rent or buy");
        assert_eq!(session.messages(), &[ChatMessage::user("earlier")]);
    }

    #[test]
    fn clear_conversation_is_idempotent() {
        let mut session = Session::new();
        session.push(ChatMessage::user("a"));
        session.push(ChatMessage::assistant("b"));
        for _ in 0..2 {
            reduce(&mut session, Action::ClearConversation).unwrap();
            assert!(session.messages().is_empty());
            assert_eq!(session.phase(), SessionPhase::Idle);
        }
    }

    #[test]
    fn example_click_appends_one_message_without_query() {
        let mut session = Session::new();
        let effect = reduce(&mut session, Action::ExampleClick(Scenario::Moving)).unwrap();
        assert!(matches!(effect, Effect::Settled(ref notices) if notices.is_empty()));
        assert_eq!(session.messages(), &[ChatMessage::user(Scenario::Moving.prompt())]);
        assert!(!session.is_in_flight());
        assert!(session.has_unanswered_turn());
    }

    #[test]
    fn example_click_ignored_when_active() {
        let mut session = Session::new();
        session.push(ChatMessage::user("already talking"));
        let effect = reduce(&mut session, Action::ExampleClick(Scenario::Career)).unwrap();
        assert!(matches!(effect, Effect::Settled(ref notices) if notices.len() == 1));
        assert_eq!(session.message_count(), 1);
    }

    #[test]
    fn submit_builds_system_prompt_plus_history() {
        let mut session = Session::new();
        session.set_decision_context("job offer in Denver".to_string());
        session.push(ChatMessage::user("first"));
        session.push(ChatMessage::assistant("reply"));
        let Effect::Query(query) =
            reduce(&mut session, Action::SubmitMessage("second".to_string())).unwrap()
        else {
            panic!("submit must query");
        };
        assert_eq!(query.label(), "Thinking...");
        let messages = query.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.starts_with(SYSTEM_PROMPT_TEMPLATE));
        assert!(messages[0].content.ends_with("job offer in Denver"));
        assert_eq!(&messages[1..], session.messages());
        assert!(session.messages().iter().all(|m| m.role != Role::System));
        assert!(session.is_in_flight());
    }

    #[test]
    fn busy_session_rejects_actions_untouched() {
        let mut session = Session::new();
        let _query = reduce(&mut session, Action::SubmitMessage("one".to_string())).unwrap();
        let before = session.clone();
        for action in [
            Action::SubmitMessage("two".to_string()),
            Action::ClearConversation,
            Action::StartNewDecision,
        ] {
            assert!(reduce(&mut session, action).unwrap_err().is_busy());
        }
        assert_eq!(session, before);
    }

    #[test]
    fn abandon_keeps_user_message() {
        let mut session = Session::new();
        let Effect::Query(query) =
            reduce(&mut session, Action::SubmitMessage("hello".to_string())).unwrap()
        else {
            panic!("submit must query");
        };
        let notices = abandon(&mut session, query);
        assert_eq!(notices.len(), 1);
        assert!(!session.is_in_flight());
        assert_eq!(session.messages(), &[ChatMessage::user("hello")]);
    }

    #[tokio::test]
    async fn successful_submits_alternate() {
        let dispatcher = dispatcher(vec![reply("r1"), reply("r2"), reply("r3")]);
        let mut session = Session::new();
        let mut renderer = sink();
        for (idx, text) in ["q1", "q2", "q3"].into_iter().enumerate() {
            let notices = tokio_test::assert_ok!(
                dispatcher
                    .dispatch(&mut session, Action::SubmitMessage(text.to_string()), &mut renderer)
                    .await
            );
            assert!(notices.is_empty());
            assert_eq!(session.message_count(), 2 * (idx + 1));
        }
        for (idx, message) in session.messages().iter().enumerate() {
            let expected = if idx % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(message.role, expected);
        }
        assert_eq!(session.messages()[5], ChatMessage::assistant("r3"));
        assert_eq!(dispatcher.backend().requests()[2].len(), 6);
    }

    #[tokio::test]
    async fn failed_submit_leaves_unanswered_user_message() {
        let dispatcher = dispatcher(vec![reply("r1"), failure()]);
        let mut session = Session::new();
        let mut renderer = sink();
        dispatcher
            .dispatch(&mut session, Action::SubmitMessage("q1".to_string()), &mut renderer)
            .await
            .unwrap();
        let before = session.messages().to_vec();

        let notices = dispatcher
            .dispatch(&mut session, Action::SubmitMessage("X".to_string()), &mut renderer)
            .await
            .unwrap();
        assert_eq!(session.message_count(), 3);
        assert_eq!(&session.messages()[..2], &before[..]);
        assert_eq!(session.messages().last(), Some(&ChatMessage::user("X")));
        assert!(session.has_unanswered_turn());
        assert!(!session.is_in_flight());
        assert!(notices.iter().all(Notice::is_error));
        assert!(notices.iter().any(|n| n.text.contains("HTTP 503")));
        assert_eq!(notices.last().unwrap().text, SUBMIT_FAILURE_NOTICE);
    }

    #[tokio::test]
    async fn reply_without_content_is_reported() {
        let dispatcher = dispatcher(vec![Ok(ChatCompletionResponse::default())]);
        let mut session = Session::new();
        let notices = dispatcher
            .dispatch(&mut session, Action::SubmitMessage("q".to_string()), &mut sink())
            .await
            .unwrap();
        assert!(!notices.is_empty());
        assert!(notices[0].text.contains("choices[0].message.content"));
        assert_eq!(session.messages(), &[ChatMessage::user("q")]);
    }

    #[tokio::test]
    async fn configuration_error_shows_remediation() {
        let dispatcher = dispatcher(vec![Err(Error::configuration(
            "HF_TOKEN not found",
            Some("Add HF_TOKEN to secrets".to_string()),
        ))]);
        let mut session = Session::new();
        let notices = dispatcher
            .dispatch(&mut session, Action::SubmitMessage("q".to_string()), &mut sink())
            .await
            .unwrap();
        assert_eq!(notices.len(), 2);
        assert!(notices[0].is_error());
        assert_eq!(notices[1], Notice::info("Add HF_TOKEN to secrets"));
        assert_eq!(session.messages(), &[ChatMessage::user("q")]);
    }

    #[tokio::test]
    async fn start_new_decision_without_context_stays_idle() {
        let dispatcher = dispatcher(Vec::new());
        let mut session = Session::new();
        session.push(ChatMessage::user("old"));
        dispatcher
            .dispatch(&mut session, Action::StartNewDecision, &mut sink())
            .await
            .unwrap();
        assert!(session.messages().is_empty());
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(dispatcher.backend().requests().is_empty());
    }

    #[tokio::test]
    async fn start_new_decision_with_context() {
        let dispatcher = dispatcher(vec![reply("What are your options?")]);
        let mut session = Session::new();
        session.push(ChatMessage::user("old"));
        let mut renderer = sink();
        dispatcher
            .dispatch(&mut session, Action::SetContext("rent or buy".to_string()), &mut renderer)
            .await
            .unwrap();
        dispatcher
            .dispatch(&mut session, Action::StartNewDecision, &mut renderer)
            .await
            .unwrap();

        assert_eq!(
            session.messages(),
            &[
                ChatMessage::user("I need help deciding: rent or buy"),
                ChatMessage::assistant("What are your options?"),
            ]
        );
        assert_eq!(session.current_decision(), "rent or buy");

        let requests = dispatcher.backend().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 2);
        assert_eq!(requests[0][0].role, Role::System);
        assert_eq!(requests[0][1], ChatMessage::user("I need help deciding: rent or buy"));
    }

    #[tokio::test]
    async fn failed_start_new_decision_stays_idle() {
        let dispatcher = dispatcher(vec![failure()]);
        let mut session = Session::new();
        let mut renderer = sink();
        dispatcher
            .dispatch(&mut session, Action::SetContext("rent or buy".to_string()), &mut renderer)
            .await
            .unwrap();
        let notices = dispatcher
            .dispatch(&mut session, Action::StartNewDecision, &mut renderer)
            .await
            .unwrap();
        assert!(session.messages().is_empty());
        assert_eq!(notices.len(), 1);
        assert!(notices[0].is_error());
    }

    #[tokio::test]
    async fn changing_context_rewrites_only_the_system_prompt() {
        let dispatcher = dispatcher(vec![reply("r1"), reply("r2")]);
        let mut session = Session::new();
        let mut renderer = sink();
        dispatcher
            .dispatch(&mut session, Action::SetContext("first".to_string()), &mut renderer)
            .await
            .unwrap();
        dispatcher
            .dispatch(&mut session, Action::SubmitMessage("q1".to_string()), &mut renderer)
            .await
            .unwrap();
        dispatcher
            .dispatch(&mut session, Action::SetContext("second".to_string()), &mut renderer)
            .await
            .unwrap();
        dispatcher
            .dispatch(&mut session, Action::SubmitMessage("q2".to_string()), &mut renderer)
            .await
            .unwrap();

        let requests = dispatcher.backend().requests();
        assert!(requests[0][0].content.ends_with("first"));
        assert!(requests[1][0].content.ends_with("second"));
        assert_eq!(requests[1][1], ChatMessage::user("q1"));
    }

    #[tokio::test]
    async fn example_click_then_submit_sends_both_user_turns() {
        let dispatcher = dispatcher(vec![reply("Let's start with the job.")]);
        let mut session = Session::new();
        let mut renderer = sink();
        dispatcher
            .dispatch(&mut session, Action::ExampleClick(Scenario::Moving), &mut renderer)
            .await
            .unwrap();
        assert!(dispatcher.backend().requests().is_empty());
        dispatcher
            .dispatch(&mut session, Action::SubmitMessage("It's in Berlin.".to_string()), &mut renderer)
            .await
            .unwrap();
        let requests = dispatcher.backend().requests();
        assert_eq!(requests[0].len(), 3);
        assert_eq!(requests[0][1].content, Scenario::Moving.prompt());
        assert_eq!(session.message_count(), 3);
    }

    /// Backend that never answers.
    struct Hang;

    #[async_trait::async_trait]
    impl ChatBackend for Hang {
        async fn query(&self, _: &[ChatMessage], _: &Model) -> Result<ChatCompletionResponse> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn cancelled_request_is_abandoned() {
        let dispatcher = Dispatcher::new(Hang, Model::default());
        let mut session = Session::new();
        let notices = dispatcher
            .dispatch_until(
                &mut session,
                Action::SubmitMessage("anyone there?".to_string()),
                &mut sink(),
                std::future::ready(()),
            )
            .await
            .unwrap();
        assert_eq!(notices.len(), 1);
        assert!(!notices[0].is_error());
        assert!(!session.is_in_flight());
        assert_eq!(session.messages(), &[ChatMessage::user("anyone there?")]);
    }

    #[tokio::test]
    async fn dropped_dispatch_releases_session() {
        let dispatcher = Dispatcher::new(Hang, Model::default());
        let mut session = Session::new();
        let mut renderer = sink();
        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            dispatcher.dispatch(&mut session, Action::SubmitMessage("q".to_string()), &mut renderer),
        )
        .await;
        assert!(outcome.is_err());
        assert!(!session.is_in_flight());
        assert_eq!(session.messages(), &[ChatMessage::user("q")]);

        tokio_test::assert_ok!(
            dispatcher
                .dispatch(&mut session, Action::SetContext("a new job".to_string()), &mut renderer)
                .await
        );
        tokio_test::assert_ok!(
            dispatcher
                .dispatch(&mut session, Action::ClearConversation, &mut renderer)
                .await
        );
        assert_eq!(session.decision_context(), "a new job");
        assert_eq!(session.message_count(), 0);
    }
}
