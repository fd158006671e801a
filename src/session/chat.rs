//! Question submission flow
//!
//! The ChatSession is the only writer of the conversation. It:
//! 1. Creates a backend session
//! 2. Appends the user's question as soon as it is submitted
//! 3. Asks the backend for an answer
//! 4. Appends the answer with its sources, or reports a notification
//!
//! Failures never end the session; they become [`Notification`]s the user
//! can dismiss.

use serde::Serialize;

use crate::backend::{AskResponse, Backend, BackendError};
use crate::conversation::{Conversation, Message, MessageId};

/// What went wrong, as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SessionInitFailed,
    SessionNotReady,
    AnswerFailed,
}

/// A dismissible message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    fn new(kind: NotificationKind) -> Self {
        let message = match kind {
            NotificationKind::SessionInitFailed => {
                "Could not start a chat session. Please try again later."
            }
            NotificationKind::SessionNotReady => {
                "The chat session is not ready yet. Please wait a moment."
            }
            NotificationKind::AnswerFailed => "Failed to get a response. Please try again.",
        };
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

/// Errors from the submission flow
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("No session available")]
    NoSession,

    #[error("Question is empty")]
    EmptyQuestion,

    #[error("A question is already waiting for an answer")]
    Busy,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// A question that has been appended and is waiting for its answer
#[derive(Debug, Clone)]
pub struct PendingQuestion {
    pub session_id: String,
    pub question: String,
    pub user_message: MessageId,
}

pub struct ChatSession<B> {
    backend: B,
    session_id: Option<String>,
    conversation: Conversation,
    loading: bool,
    notifications: Vec<Notification>,
}

impl<B: Backend> ChatSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            session_id: None,
            conversation: Conversation::new(),
            loading: false,
            notifications: Vec::new(),
        }
    }

    /// Create the backend session questions are asked in.
    pub async fn init(&mut self) -> Result<&str, ChatError> {
        match self.backend.create_session().await {
            Ok(id) => {
                tracing::info!(session_id = %id, "session created");
                Ok(self.session_id.insert(id).as_str())
            }
            Err(e) => {
                tracing::error!("Failed to initialize session: {}", e);
                self.notify(NotificationKind::SessionInitFailed);
                Err(e.into())
            }
        }
    }

    /// Append the user's question and mark the session as loading.
    pub fn begin(&mut self, question: &str) -> Result<PendingQuestion, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }
        if self.loading {
            return Err(ChatError::Busy);
        }
        let Some(session_id) = self.session_id.clone() else {
            tracing::warn!("question submitted before a session exists");
            self.notify(NotificationKind::SessionNotReady);
            return Err(ChatError::NoSession);
        };

        self.loading = true;
        let user_message = self.conversation.push_user(question);
        tracing::debug!(%user_message, "question submitted");
        Ok(PendingQuestion {
            session_id,
            question: question.to_string(),
            user_message,
        })
    }

    /// Ask the backend. Does not touch the conversation.
    pub async fn resolve(&self, pending: &PendingQuestion) -> Result<AskResponse, BackendError> {
        self.backend
            .ask(&pending.session_id, &pending.question)
            .await
    }

    /// Append the answer, or leave the question unanswered and notify.
    pub fn finish(
        &mut self,
        pending: PendingQuestion,
        result: Result<AskResponse, BackendError>,
    ) -> Result<MessageId, ChatError> {
        self.loading = false;
        match result {
            Ok(answer) => {
                let id = self
                    .conversation
                    .push_assistant(&answer.response, answer.sources);
                tracing::debug!(question = %pending.user_message, answer = %id, "answer received");
                Ok(id)
            }
            Err(e) => {
                tracing::error!(question = %pending.user_message, "Error getting response: {}", e);
                self.notify(NotificationKind::AnswerFailed);
                Err(e.into())
            }
        }
    }

    /// Submit a question and wait for its answer.
    pub async fn submit(&mut self, question: &str) -> Result<MessageId, ChatError> {
        let pending = self.begin(question)?;
        let result = self.resolve(&pending).await;
        self.finish(pending, result)
    }

    fn notify(&mut self, kind: NotificationKind) {
        self.notifications.push(Notification::new(kind));
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Remove the notification at `index`, if any.
    pub fn dismiss(&mut self, index: usize) -> Option<Notification> {
        (index < self.notifications.len()).then(|| self.notifications.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UiConfig;
    use crate::conversation::{Role, Source};
    use crate::render::{TranscriptView, Viewport};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct FakeBackend {
        session: Option<&'static str>,
        answer: Option<&'static str>,
    }

    fn failure() -> BackendError {
        BackendError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream down".to_string(),
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn create_session(&self) -> Result<String, BackendError> {
            self.session.map(str::to_string).ok_or_else(failure)
        }

        async fn ask(&self, session_id: &str, question: &str) -> Result<AskResponse, BackendError> {
            let response = self.answer.ok_or_else(failure)?;
            Ok(AskResponse {
                session_id: session_id.to_string(),
                question: question.to_string(),
                response: response.to_string(),
                sources: vec![Source {
                    source: "jac_brochure_2025".to_string(),
                    source_type: "pdf".to_string(),
                    relevance: 0.8,
                    content_preview: "Documents required at reporting".to_string(),
                    page: Some(12),
                    section: "Reporting".to_string(),
                }],
            })
        }
    }

    struct NoopViewport;

    impl Viewport for NoopViewport {
        fn scroll_to_bottom(&self, _smooth: bool) {}
    }

    fn session(answer: Option<&'static str>) -> ChatSession<FakeBackend> {
        ChatSession::new(FakeBackend {
            session: Some("sess-1"),
            answer,
        })
    }

    #[tokio::test]
    async fn test_submit_appends_question_and_answer() {
        let mut chat = session(Some("Bring your marksheet."));
        assert_eq!(chat.init().await.unwrap(), "sess-1");

        let id = chat.submit("What documents are required?").await.unwrap();

        let messages = chat.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].id, id);
        assert_eq!(messages[1].sources.len(), 1);
        assert!(!chat.is_loading());
        assert!(chat.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_submit_without_session_is_blocked() {
        let mut chat = ChatSession::new(FakeBackend {
            session: None,
            answer: Some("unused"),
        });
        assert!(chat.init().await.is_err());
        assert_eq!(chat.notifications()[0].kind, NotificationKind::SessionInitFailed);

        let err = chat.submit("Hello?").await.unwrap_err();
        assert!(matches!(err, ChatError::NoSession));
        assert!(chat.messages().is_empty());
        assert_eq!(chat.notifications()[1].kind, NotificationKind::SessionNotReady);
    }

    #[tokio::test]
    async fn test_failed_answer_keeps_question() {
        let mut chat = session(None);
        chat.init().await.unwrap();

        let err = chat.submit("Is hostel available?").await.unwrap_err();
        assert!(matches!(err, ChatError::Backend(_)));
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(&*chat.messages()[0].content, "Is hostel available?");
        assert!(!chat.is_loading());

        let notification = chat.dismiss(0).unwrap();
        assert_eq!(notification.kind, NotificationKind::AnswerFailed);
        assert!(chat.notifications().is_empty());
        assert!(chat.dismiss(0).is_none());
    }

    #[tokio::test]
    async fn test_blank_question_is_ignored() {
        let mut chat = session(Some("unused"));
        chat.init().await.unwrap();
        assert!(matches!(chat.submit("   ").await, Err(ChatError::EmptyQuestion)));
        assert!(chat.messages().is_empty());
        assert!(chat.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_question_is_trimmed_before_sending() {
        let mut chat = session(Some("In June."));
        chat.init().await.unwrap();

        let pending = chat.begin("  When does counselling start?\r\n").unwrap();
        assert_eq!(pending.question, "When does counselling start?");
        assert_eq!(&*chat.messages()[0].content, "When does counselling start?");

        let answer = chat.resolve(&pending).await.unwrap();
        assert_eq!(answer.question, "When does counselling start?");
    }

    #[tokio::test]
    async fn test_second_question_while_loading_is_busy() {
        let mut chat = session(Some("Yes."));
        chat.init().await.unwrap();

        let pending = chat.begin("First?").unwrap();
        assert!(chat.is_loading());
        assert!(matches!(chat.begin("Second?"), Err(ChatError::Busy)));

        let result = chat.resolve(&pending).await;
        chat.finish(pending, result).unwrap();
        assert!(chat.begin("Second?").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_fully_visible_after_reveal() {
        let mut chat = session(Some("You need:\n\n- Class X marksheet\n- Domicile certificate"));
        chat.init().await.unwrap();
        let mut view = TranscriptView::new(UiConfig::default(), Arc::new(NoopViewport));

        let pending = chat.begin("What documents are required?").unwrap();
        view.sync(chat.messages());
        assert_eq!(view.frames(chat.messages()).len(), 1);

        let result = chat.resolve(&pending).await;
        let answer = chat.finish(pending, result).unwrap();
        view.sync(chat.messages());
        assert_eq!(view.revealing(), Some(answer));

        // initial delay + 3 lines * speed
        tokio::time::sleep(Duration::from_millis(500 + 3 * 300 - 1)).await;
        assert!(!view.reveal_state().complete);
        tokio::time::sleep(Duration::from_millis(2)).await;

        let frames = view.frames(chat.messages());
        let frame = &frames[1];
        assert_eq!(frame.lines.len(), 3);
        assert!(frame.cursor.is_none());
        assert!(!frame.sources.is_empty());
    }
}
