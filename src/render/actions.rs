//! Per-message actions

use std::time::Duration;

use tokio::time::Instant;

/// How long the "copied" indicator stays on after a copy.
pub const COPIED_INDICATOR: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for copied message text
pub trait Clipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Copy button state of one message.
#[derive(Debug, Clone, Default)]
pub struct CopyAction {
    copied_until: Option<Instant>,
}

impl CopyAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `content`. Failures are logged and leave the indicator off.
    pub fn copy(&mut self, clipboard: &dyn Clipboard, content: &str) -> bool {
        match clipboard.set_text(content) {
            Ok(()) => {
                self.copied_until = Some(Instant::now() + COPIED_INDICATOR);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to copy text: {}", e);
                false
            }
        }
    }

    pub fn is_copied(&self) -> bool {
        self.copied_until
            .is_some_and(|until| Instant::now() < until)
    }
}
