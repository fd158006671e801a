//! Progressive line-by-line reveal of complete answers
//!
//! The backend returns an answer in one piece. [`RevealScheduler`] makes it
//! read like it is arriving: after an initial delay one more line becomes
//! visible every `speed` until the whole answer is shown.
//!
//! The scheduler owns at most one timer task at a time. Starting a run for
//! different content, calling [`RevealScheduler::cancel`] or dropping the
//! scheduler aborts the previous task, and every tick re-checks its run number
//! under the state lock, so a superseded run can never touch the new state or
//! fire its completion callback.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::RevealConfig;

use super::segment::segment_lines;

/// Timing of one reveal run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTiming {
    /// Interval between two lines
    pub speed: Duration,
    /// Pause before the first line
    pub initial_delay: Duration,
}

impl From<&RevealConfig> for RevealTiming {
    fn from(config: &RevealConfig) -> Self {
        Self {
            speed: config.speed(),
            initial_delay: config.initial_delay(),
        }
    }
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self::from(&RevealConfig::default())
    }
}

/// Observable state of the current reveal run.
#[derive(Debug, Clone, Default)]
pub struct RevealState {
    /// Number of the run this state belongs to, 0 before the first run
    pub run: u64,
    /// Content snapshot being revealed
    pub content: Option<Arc<str>>,
    pub lines: Arc<[String]>,
    pub visible: usize,
    pub complete: bool,
}

impl RevealState {
    pub fn visible_lines(&self) -> &[String] {
        &self.lines[..self.visible.min(self.lines.len())]
    }

    pub fn is_revealing(&self, content: &str) -> bool {
        self.content.as_deref() == Some(content)
    }
}

/// Drives one reveal run at a time. Must be used inside a Tokio runtime.
#[derive(Debug)]
pub struct RevealScheduler {
    state: Arc<watch::Sender<RevealState>>,
    task: Option<JoinHandle<()>>,
    runs: u64,
}

impl RevealScheduler {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RevealState::default());
        Self {
            state: Arc::new(state),
            task: None,
            runs: 0,
        }
    }

    /// Begin revealing `content`.
    ///
    /// Returns `false` without doing anything when `content` is already the
    /// subject of the current run, finished or not. Empty content completes
    /// immediately and `on_complete` runs before this returns.
    pub fn start<F>(&mut self, content: Arc<str>, timing: RevealTiming, on_complete: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.state.borrow().is_revealing(&content) {
            return false;
        }

        self.cancel();
        self.runs += 1;
        let run = self.runs;
        let lines: Arc<[String]> = segment_lines(&content).into();
        let total = lines.len();

        if total == 0 {
            tracing::debug!(run, "nothing to reveal");
            self.state.send_replace(RevealState {
                run,
                content: Some(content),
                lines,
                visible: 0,
                complete: true,
            });
            on_complete();
            return true;
        }

        tracing::debug!(run, lines = total, "reveal started");
        self.state.send_replace(RevealState {
            run,
            content: Some(content),
            lines,
            visible: 0,
            complete: false,
        });

        let state = Arc::clone(&self.state);
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(timing.initial_delay).await;
            loop {
                tokio::time::sleep(timing.speed).await;

                let mut finished = false;
                let advanced = state.send_if_modified(|current| {
                    if current.run != run || current.complete {
                        return false;
                    }
                    current.visible += 1;
                    if current.visible >= current.lines.len() {
                        current.complete = true;
                        finished = true;
                    }
                    true
                });

                if !advanced {
                    return;
                }
                if finished {
                    tracing::debug!(run, "reveal complete");
                    on_complete();
                    return;
                }
            }
        }));
        true
    }

    /// Stop the current run and forget its content, so the same text can be
    /// started again. An unfinished run's completion callback will not fire.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let superseded = self.runs + 1;
        self.state.send_if_modified(|current| {
            if current.content.is_none() {
                return false;
            }
            if !current.complete {
                tracing::debug!(run = current.run, visible = current.visible, "reveal cancelled");
            }
            // Bump the run number so an in-flight tick sees it is stale.
            current.run = superseded;
            current.content = None;
            true
        });
        self.runs = self.runs.max(self.state.borrow().run);
    }

    pub fn state(&self) -> RevealState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every visible-line change.
    pub fn subscribe(&self) -> watch::Receiver<RevealState> {
        self.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        let state = self.state.borrow();
        state.content.is_some() && !state.complete
    }
}

impl Default for RevealScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RevealScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
