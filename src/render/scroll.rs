//! Deciding when the transcript follows new messages

use std::time::Duration;

use serde::Serialize;

use crate::config::ScrollConfig;
use crate::conversation::Role;

/// Geometry of the transcript viewport at one scroll event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    /// Distance scrolled from the top
    pub offset: f64,
    pub viewport_height: f64,
    pub content_height: f64,
}

impl ScrollMetrics {
    pub fn is_at_bottom(&self, tolerance: f64) -> bool {
        ((self.offset + self.viewport_height) - self.content_height).abs() < tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollMode {
    /// Auto-scroll to new content
    Following,
    /// The user scrolled up; leave the viewport alone
    Detached,
}

/// A scroll to the bottom the viewport should perform after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoScroll {
    pub delay: Duration,
    pub smooth: bool,
}

#[derive(Debug, Clone)]
pub struct ScrollArbiter {
    config: ScrollConfig,
    mode: ScrollMode,
    last_offset: f64,
    last_message_count: usize,
}

impl ScrollArbiter {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            mode: ScrollMode::Following,
            last_offset: 0.0,
            last_message_count: 0,
        }
    }

    pub fn mode(&self) -> ScrollMode {
        self.mode
    }

    /// Feed a scroll event.
    pub fn observe(&mut self, metrics: ScrollMetrics) -> ScrollMode {
        let at_bottom = metrics.is_at_bottom(self.config.bottom_tolerance_px);

        if at_bottom {
            if self.mode == ScrollMode::Detached {
                tracing::debug!(offset = metrics.offset, "back at bottom, following");
            }
            self.mode = ScrollMode::Following;
        } else if metrics.offset < self.last_offset {
            if self.mode == ScrollMode::Following {
                tracing::debug!(offset = metrics.offset, "user scrolled up, detached");
            }
            self.mode = ScrollMode::Detached;
        }

        self.last_offset = metrics.offset;
        self.mode
    }

    /// Called whenever the transcript may have changed.
    ///
    /// Returns a scroll request only when the message count grew while following.
    pub fn on_message_count(&mut self, count: usize, last_role: Option<Role>) -> Option<AutoScroll> {
        if count == 0 {
            return None;
        }
        let grew = count > self.last_message_count;
        self.last_message_count = count;

        if !grew || self.mode == ScrollMode::Detached {
            return None;
        }

        let delay_ms = match last_role {
            Some(Role::Assistant) => self.config.assistant_delay_ms,
            _ => self.config.user_delay_ms,
        };
        Some(AutoScroll {
            delay: Duration::from_millis(delay_ms),
            smooth: self.config.smooth,
        })
    }
}

impl Default for ScrollArbiter {
    fn default() -> Self {
        Self::new(ScrollConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(offset: f64) -> ScrollMetrics {
        ScrollMetrics {
            offset,
            viewport_height: 600.0,
            content_height: 2_000.0,
        }
    }

    #[test]
    fn test_is_at_bottom_within_tolerance() {
        assert!(metrics(1_400.0).is_at_bottom(50.0));
        assert!(metrics(1_360.0).is_at_bottom(50.0));
        assert!(!metrics(1_350.0).is_at_bottom(50.0));
    }

    #[test]
    fn test_follows_new_messages_by_role() {
        let mut arbiter = ScrollArbiter::default();

        let user = arbiter.on_message_count(1, Some(Role::User)).unwrap();
        assert_eq!(user.delay, Duration::from_millis(100));
        assert!(user.smooth);

        let assistant = arbiter.on_message_count(2, Some(Role::Assistant)).unwrap();
        assert_eq!(assistant.delay, Duration::from_millis(800));
    }

    #[test]
    fn test_unchanged_count_is_a_no_op() {
        let mut arbiter = ScrollArbiter::default();
        assert!(arbiter.on_message_count(0, None).is_none());
        assert!(arbiter.on_message_count(1, Some(Role::User)).is_some());
        assert!(arbiter.on_message_count(1, Some(Role::User)).is_none());
    }

    #[test]
    fn test_scrolling_up_detaches_and_bottom_reattaches() {
        let mut arbiter = ScrollArbiter::default();
        arbiter.observe(metrics(1_400.0));
        arbiter.on_message_count(1, Some(Role::User));

        assert_eq!(arbiter.observe(metrics(900.0)), ScrollMode::Detached);
        assert!(arbiter.on_message_count(2, Some(Role::Assistant)).is_none());
        assert!(arbiter.on_message_count(3, Some(Role::User)).is_none());

        // Scrolling down but not to the bottom keeps the user in control.
        assert_eq!(arbiter.observe(metrics(1_100.0)), ScrollMode::Detached);

        assert_eq!(arbiter.observe(metrics(1_390.0)), ScrollMode::Following);
        assert!(arbiter.on_message_count(4, Some(Role::Assistant)).is_some());
    }

    #[test]
    fn test_scrolling_up_near_bottom_keeps_following() {
        let mut arbiter = ScrollArbiter::default();
        arbiter.observe(metrics(1_400.0));
        assert_eq!(arbiter.observe(metrics(1_380.0)), ScrollMode::Following);
    }
}
