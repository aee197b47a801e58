use std::time::{Duration, Instant};

/// A cancellable, single-shot deadline polled from the UI tick.
///
/// The timer never runs a callback on its own. Its owner calls [`poll`] with
/// the current instant and acts when it reports that the deadline passed, so
/// cancelling (or dropping the owner) guarantees nothing fires afterwards.
///
/// [`poll`]: DebounceTimer::poll
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arms the timer unless it is already pending. Repeated calls inside one
    /// window coalesce into the first deadline.
    pub fn arm(&mut self, now: Instant) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(now + self.delay);
        true
    }

    /// Arms the timer to fire on the next poll.
    pub fn arm_immediate(&mut self, now: Instant) {
        if self.deadline.is_none_or(|deadline| deadline > now) {
            self.deadline = Some(now);
        }
    }

    /// Pushes the deadline out to `now + delay`, arming if necessary.
    pub fn restart(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns true exactly once when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
