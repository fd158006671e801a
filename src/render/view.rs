//! The transcript view: owner of the reveal run and the auto-scroll timer

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::UiConfig;
use crate::conversation::{listed_sources, ListedSource, Message, MessageId, Role};

use super::markdown::{render_document, render_line, RenderedLine};
use super::reveal::{RevealScheduler, RevealState, RevealTiming};
use super::scroll::{AutoScroll, ScrollArbiter, ScrollMetrics, ScrollMode};
use super::segment::SegmentCache;

/// Whatever displays the transcript and can be scrolled.
pub trait Viewport: Send + Sync {
    fn scroll_to_bottom(&self, smooth: bool);
}

/// Disclaimer shown under assistant answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Disclaimer {
    pub text: String,
    pub url: Option<String>,
}

/// Everything needed to draw one message.
#[derive(Debug, Clone, Serialize)]
pub struct MessageFrame {
    pub id: MessageId,
    pub role: Role,
    pub author: String,
    /// Revealed lines of an assistant answer; empty for user messages
    pub lines: Vec<RenderedLine>,
    pub html: String,
    /// Cursor shown after the last line while the answer is being revealed
    pub cursor: Option<String>,
    pub sources: Vec<ListedSource>,
    pub disclaimer: Option<Disclaimer>,
}

impl MessageFrame {
    pub fn is_revealing(&self) -> bool {
        self.cursor.is_some()
    }
}

/// Holds exactly one reveal run and one pending auto-scroll for a transcript.
///
/// Dropping the view cancels both.
pub struct TranscriptView {
    config: UiConfig,
    reveal: RevealScheduler,
    revealing: Option<MessageId>,
    arbiter: ScrollArbiter,
    pending_scroll: Option<JoinHandle<()>>,
    viewport: Arc<dyn Viewport>,
    segments: SegmentCache,
    completed_tx: mpsc::UnboundedSender<MessageId>,
    completed_rx: Option<mpsc::UnboundedReceiver<MessageId>>,
}

impl TranscriptView {
    pub fn new(config: UiConfig, viewport: Arc<dyn Viewport>) -> Self {
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        Self {
            arbiter: ScrollArbiter::new(config.scroll.clone()),
            config,
            reveal: RevealScheduler::new(),
            revealing: None,
            pending_scroll: None,
            viewport,
            segments: SegmentCache::new(),
            completed_tx,
            completed_rx: Some(completed_rx),
        }
    }

    /// Receiver of message ids whose reveal finished. Can be taken once.
    pub fn take_completions(&mut self) -> Option<mpsc::UnboundedReceiver<MessageId>> {
        self.completed_rx.take()
    }

    /// React to the current transcript: reveal the newest answer and
    /// schedule an auto-scroll if the transcript grew.
    pub fn sync(&mut self, messages: &[Message]) {
        if let Some(answer) = messages.iter().rev().find(|m| m.is_assistant()) {
            if self.revealing != Some(answer.id) {
                self.start_reveal(answer);
            }
        }

        let last_role = messages.last().map(|m| m.role);
        if let Some(scroll) = self.arbiter.on_message_count(messages.len(), last_role) {
            self.schedule_scroll(scroll);
        }
    }

    fn start_reveal(&mut self, answer: &Message) {
        let id = answer.id;
        let tx = self.completed_tx.clone();
        let timing = RevealTiming::from(&self.config.reveal);

        self.reveal.cancel();
        self.reveal.start(Arc::clone(&answer.content), timing, move || {
            let _ = tx.send(id);
        });
        self.revealing = Some(id);
    }

    fn schedule_scroll(&mut self, scroll: AutoScroll) {
        if let Some(pending) = self.pending_scroll.take() {
            pending.abort();
        }
        let viewport = Arc::clone(&self.viewport);
        self.pending_scroll = Some(tokio::spawn(async move {
            tokio::time::sleep(scroll.delay).await;
            viewport.scroll_to_bottom(scroll.smooth);
        }));
    }

    /// Feed a scroll event. Detaching drops any auto-scroll still waiting.
    pub fn on_scroll(&mut self, metrics: ScrollMetrics) -> ScrollMode {
        let mode = self.arbiter.observe(metrics);
        if mode == ScrollMode::Detached {
            if let Some(pending) = self.pending_scroll.take() {
                pending.abort();
            }
        }
        mode
    }

    pub fn scroll_mode(&self) -> ScrollMode {
        self.arbiter.mode()
    }

    pub fn reveal_state(&self) -> RevealState {
        self.reveal.state()
    }

    pub fn subscribe_reveal(&self) -> watch::Receiver<RevealState> {
        self.reveal.subscribe()
    }

    pub fn revealing(&self) -> Option<MessageId> {
        self.revealing
    }

    /// Render the transcript as it should look right now.
    pub fn frames(&mut self, messages: &[Message]) -> Vec<MessageFrame> {
        let state = self.reveal.state();
        messages
            .iter()
            .map(|message| match message.role {
                Role::User => self.user_frame(message),
                Role::Assistant => self.assistant_frame(message, &state),
            })
            .collect()
    }

    fn user_frame(&self, message: &Message) -> MessageFrame {
        MessageFrame {
            id: message.id,
            role: Role::User,
            author: self.config.branding.user_label.clone(),
            lines: Vec::new(),
            html: render_document(&message.content, &message.sources, &self.config.sources),
            cursor: None,
            sources: Vec::new(),
            disclaimer: None,
        }
    }

    fn assistant_frame(&mut self, message: &Message, state: &RevealState) -> MessageFrame {
        let animating = self.revealing == Some(message.id) && state.is_revealing(&message.content);
        let (lines, complete) = if animating {
            (state.visible_lines().to_vec(), state.complete)
        } else {
            (self.segments.lines(&message.content).to_vec(), true)
        };

        let rendered: Vec<RenderedLine> = lines
            .iter()
            .map(|line| render_line(line, &message.sources, &self.config.sources))
            .collect();
        let html = rendered.iter().map(|line| line.html.as_str()).collect();
        let cursor = (!complete && self.config.reveal.cursor)
            .then(|| self.config.reveal.cursor_char.clone());
        let branding = &self.config.branding;

        MessageFrame {
            id: message.id,
            role: Role::Assistant,
            author: branding.bot_name.clone(),
            lines: rendered,
            html,
            cursor,
            sources: listed_sources(&message.sources, &self.config.sources),
            disclaimer: branding.disclaimer.clone().map(|text| Disclaimer {
                text,
                url: branding.disclaimer_url.clone(),
            }),
        }
    }

    /// Cancel the reveal run and any pending auto-scroll.
    pub fn shutdown(&mut self) {
        self.reveal.cancel();
        if let Some(pending) = self.pending_scroll.take() {
            pending.abort();
        }
    }
}

impl Drop for TranscriptView {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{Conversation, Source};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingViewport {
        scrolls: AtomicUsize,
    }

    impl Viewport for CountingViewport {
        fn scroll_to_bottom(&self, _smooth: bool) {
            self.scrolls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn view() -> (TranscriptView, Arc<CountingViewport>) {
        let viewport = Arc::new(CountingViewport::default());
        let view = TranscriptView::new(UiConfig::default(), viewport.clone());
        (view, viewport)
    }

    fn sources() -> Vec<Source> {
        vec![Source {
            source: "brochure".to_string(),
            source_type: "pdf".to_string(),
            relevance: 0.9,
            content_preview: "Admission schedule".to_string(),
            page: Some(3),
            section: String::new(),
        }]
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_is_revealed_progressively() {
        let (mut view, _) = view();
        let mut conversation = Conversation::new();
        conversation.push_user("What documents are required?");
        let answer = conversation.push_assistant(
            "You need:\n- Class X certificate\n- Domicile, see [[brochure]](x)",
            sources(),
        );

        view.sync(conversation.messages());
        let frames = view.frames(conversation.messages());
        assert_eq!(frames[0].author, "You");
        assert!(frames[0].html.contains("What documents are required?"));
        assert!(frames[1].lines.is_empty());
        assert_eq!(frames[1].cursor.as_deref(), Some("▋"));

        // 500ms initial delay, then one line per 300ms
        tokio::time::sleep(Duration::from_millis(1_150)).await;
        let frames = view.frames(conversation.messages());
        assert_eq!(frames[1].lines.len(), 2);
        assert!(frames[1].is_revealing());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let frames = view.frames(conversation.messages());
        let frame = &frames[1];
        assert_eq!(frame.id, answer);
        assert_eq!(frame.author, "JAC BOT");
        assert_eq!(frame.lines.len(), 3);
        assert!(frame.cursor.is_none());
        assert!(frame.html.contains("/pdfs/brochure.pdf#page=3"));
        assert_eq!(frame.sources.len(), 1);
        assert!(frame.disclaimer.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_is_reported_once() {
        let (mut view, _) = view();
        let mut completions = view.take_completions().unwrap();
        let mut conversation = Conversation::new();
        conversation.push_user("Hi");
        let answer = conversation.push_assistant("Hello!\nHow can I help?", Vec::new());

        view.sync(conversation.messages());
        view.sync(conversation.messages());

        assert_eq!(completions.recv().await, Some(answer));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(completions.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_answer_supersedes_running_reveal() {
        let (mut view, _) = view();
        let mut conversation = Conversation::new();
        conversation.push_user("First?");
        let first = conversation.push_assistant("a\nb\nc\nd\ne", Vec::new());
        view.sync(conversation.messages());
        tokio::time::sleep(Duration::from_millis(900)).await;

        conversation.push_user("Second?");
        let second = conversation.push_assistant("x\ny", Vec::new());
        view.sync(conversation.messages());

        assert_eq!(view.revealing(), Some(second));
        let frames = view.frames(conversation.messages());
        assert_eq!(frames[1].id, first);
        assert_eq!(frames[1].lines.len(), 5);
        assert!(frames[3].lines.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_scroll_follows_unless_detached() {
        let (mut view, viewport) = view();
        let mut conversation = Conversation::new();

        conversation.push_user("Question one");
        view.sync(conversation.messages());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(viewport.scrolls.load(Ordering::SeqCst), 1);

        conversation.push_assistant("Answer one", Vec::new());
        view.sync(conversation.messages());
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(viewport.scrolls.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(viewport.scrolls.load(Ordering::SeqCst), 2);

        let at = |offset: f64| ScrollMetrics {
            offset,
            viewport_height: 500.0,
            content_height: 1_500.0,
        };
        view.on_scroll(at(1_000.0));
        assert_eq!(view.on_scroll(at(400.0)), ScrollMode::Detached);

        conversation.push_user("Question two");
        view.sync(conversation.messages());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(viewport.scrolls.load(Ordering::SeqCst), 2);

        assert_eq!(view.on_scroll(at(990.0)), ScrollMode::Following);
        conversation.push_user("Question three");
        view.sync(conversation.messages());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(viewport.scrolls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scrolling_up_cancels_pending_auto_scroll() {
        let (mut view, viewport) = view();
        let mut conversation = Conversation::new();
        let at = |offset: f64| ScrollMetrics {
            offset,
            viewport_height: 500.0,
            content_height: 1_500.0,
        };

        conversation.push_user("Question");
        view.sync(conversation.messages());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(viewport.scrolls.load(Ordering::SeqCst), 1);
        view.on_scroll(at(1_000.0));

        conversation.push_assistant("Answer", Vec::new());
        view.sync(conversation.messages());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(view.on_scroll(at(300.0)), ScrollMode::Detached);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(viewport.scrolls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_work() {
        let (mut view, viewport) = view();
        let mut completions = view.take_completions().unwrap();
        let mut conversation = Conversation::new();
        conversation.push_user("Hi");
        conversation.push_assistant("Hello", Vec::new());
        view.sync(conversation.messages());
        drop(view);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(viewport.scrolls.load(Ordering::SeqCst), 0);
        assert_eq!(completions.recv().await, None);
    }
}
