//! Presentation core: line reveal, markdown lines and scroll arbitration
//!
//! This module contains everything that makes a complete backend answer look
//! live on screen while keeping the transcript readable.

pub mod actions;
pub mod markdown;
pub mod reveal;
pub mod scroll;
pub mod segment;
pub mod view;

pub use actions::{Clipboard, ClipboardError, CopyAction};
pub use markdown::{render_document, render_line, resolve_citation, RenderedLine};
pub use reveal::{RevealScheduler, RevealState, RevealTiming};
pub use scroll::{AutoScroll, ScrollArbiter, ScrollMetrics, ScrollMode};
pub use segment::{segment_lines, SegmentCache};
pub use view::{Disclaimer, MessageFrame, TranscriptView, Viewport};
