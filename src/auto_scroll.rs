use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::timer::DebounceTimer;

pub const DEFAULT_FOLLOW_THRESHOLD: u32 = 50;
pub const DEFAULT_STREAM_DEBOUNCE: Duration = Duration::from_millis(80);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(120);
pub const DEFAULT_SMOOTH_SCROLL_MAX_MESSAGES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowState {
    Following,
    PinnedByUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrollState {
    pub auto_follow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// A request to move the viewport to the end of the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollCommand {
    pub behavior: ScrollBehavior,
}

/// Scroll metrics sampled from the content container, in scroll units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollSample {
    pub distance_from_bottom: u32,
}

impl ScrollSample {
    #[cfg(test)]
    pub fn at_distance(distance_from_bottom: u32) -> Self {
        Self {
            distance_from_bottom,
        }
    }

    pub fn from_metrics(scroll_top: u32, viewport_height: u32, content_height: u32) -> Self {
        Self {
            distance_from_bottom: content_height
                .saturating_sub(scroll_top.saturating_add(viewport_height)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AutoScrollConfig {
    pub threshold: u32,
    pub stream_debounce: Duration,
    pub settle_delay: Duration,
    pub smooth_scroll_max_messages: usize,
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_FOLLOW_THRESHOLD,
            stream_debounce: DEFAULT_STREAM_DEBOUNCE,
            settle_delay: DEFAULT_SETTLE_DELAY,
            smooth_scroll_max_messages: DEFAULT_SMOOTH_SCROLL_MAX_MESSAGES,
        }
    }
}

/// Decides when the chat viewport follows new content.
///
/// The controller owns two timers: one coalescing scroll-to-end requests while
/// content streams in, and one settle window after a programmatic scroll
/// during which samples are ignored. Both are cancelled by [`shutdown`], after
/// which every entry point is inert.
///
/// [`shutdown`]: AutoScrollController::shutdown
#[derive(Debug)]
pub struct AutoScrollController {
    config: AutoScrollConfig,
    state: FollowState,
    scroll_timer: DebounceTimer,
    settle_timer: DebounceTimer,
    pending: Option<ScrollBehavior>,
    torn_down: bool,
}

impl Default for AutoScrollController {
    fn default() -> Self {
        Self::new(AutoScrollConfig::default())
    }
}

impl AutoScrollController {
    pub fn new(config: AutoScrollConfig) -> Self {
        Self {
            config,
            state: FollowState::Following,
            scroll_timer: DebounceTimer::new(config.stream_debounce),
            settle_timer: DebounceTimer::new(config.settle_delay),
            pending: None,
            torn_down: false,
        }
    }

    pub fn state(&self) -> FollowState {
        self.state
    }

    pub fn is_following(&self) -> bool {
        self.state == FollowState::Following
    }

    pub fn scroll_state(&self) -> ScrollState {
        ScrollState {
            auto_follow: self.is_following(),
        }
    }

    #[cfg(test)]
    pub fn has_pending_scroll(&self) -> bool {
        self.scroll_timer.is_armed()
    }

    /// Feeds a viewport position read after any scroll. Ignored while a
    /// programmatic scroll is settling. Returns the new state when the sample
    /// caused a transition.
    pub fn on_scroll_sample(&mut self, sample: ScrollSample, now: Instant) -> Option<FollowState> {
        if self.torn_down || self.is_settling(now) {
            return None;
        }
        self.apply_sample(sample)
    }

    /// Feeds a position the user scrolled to with keys or the wheel. Always
    /// honored, and ends any settle window.
    pub fn on_user_scroll(&mut self, sample: ScrollSample) -> Option<FollowState> {
        if self.torn_down {
            return None;
        }
        self.settle_timer.cancel();
        self.apply_sample(sample)
    }

    fn apply_sample(&mut self, sample: ScrollSample) -> Option<FollowState> {
        let next = if sample.distance_from_bottom > self.config.threshold {
            FollowState::PinnedByUser
        } else {
            FollowState::Following
        };
        if next == self.state {
            return None;
        }
        debug!(
            distance = sample.distance_from_bottom,
            threshold = self.config.threshold,
            ?next,
            "auto-scroll state changed"
        );
        self.state = next;
        if next == FollowState::PinnedByUser {
            self.scroll_timer.cancel();
            self.pending = None;
        }
        Some(next)
    }

    /// Reports that the visible content grew. While following, schedules one
    /// scroll-to-end; streamed growth is coalesced through the debounce window.
    pub fn on_content_growth(&mut self, streaming: bool, message_count: usize, now: Instant) -> bool {
        if self.torn_down || self.state == FollowState::PinnedByUser {
            return false;
        }
        self.request(self.behavior_for(message_count));
        if streaming {
            self.scroll_timer.arm(now);
        } else {
            self.scroll_timer.arm_immediate(now);
        }
        true
    }

    /// Explicit "jump to bottom": re-enables following and drives the
    /// viewport to the end once, coalesced with any growth in flight.
    pub fn jump_to_bottom(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        self.state = FollowState::Following;
        self.settle_timer.cancel();
        self.request(ScrollBehavior::Instant);
        self.scroll_timer.arm(now);
    }

    /// Returns the scroll to perform when the debounce window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<ScrollCommand> {
        if self.torn_down || !self.scroll_timer.poll(now) {
            return None;
        }
        let behavior = self.pending.take()?;
        if self.state != FollowState::Following {
            return None;
        }
        self.settle_timer.restart(now);
        Some(ScrollCommand { behavior })
    }

    /// Marks a programmatic viewport move (for example one frame of a smooth
    /// scroll) so the resulting positions are not read as user scrolling.
    pub fn note_programmatic_scroll(&mut self, now: Instant) {
        if !self.torn_down {
            self.settle_timer.restart(now);
        }
    }

    pub fn shutdown(&mut self) {
        self.scroll_timer.cancel();
        self.settle_timer.cancel();
        self.pending = None;
        self.torn_down = true;
    }

    pub fn behavior_for(&self, message_count: usize) -> ScrollBehavior {
        if message_count > self.config.smooth_scroll_max_messages {
            ScrollBehavior::Instant
        } else {
            ScrollBehavior::Smooth
        }
    }

    fn request(&mut self, behavior: ScrollBehavior) {
        self.pending = match (self.pending, behavior) {
            (Some(ScrollBehavior::Instant), _) | (_, ScrollBehavior::Instant) => {
                Some(ScrollBehavior::Instant)
            }
            _ => Some(ScrollBehavior::Smooth),
        };
    }

    fn is_settling(&mut self, now: Instant) -> bool {
        if !self.settle_timer.is_armed() {
            return false;
        }
        !self.settle_timer.poll(now)
    }
}

#[cfg(test)]
#[path = "../tests/unit/auto_scroll_tests.rs"]
mod tests;
