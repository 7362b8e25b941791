use std::time::{Duration, Instant};

/// Periodic position refresh. Armed while playing, cancelled otherwise.
#[derive(Debug, Clone)]
pub struct ProgressTicker {
    interval: Duration,
    next_due: Option<Instant>,
}

impl ProgressTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    #[cfg(test)]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// True once per elapsed interval; re-arms itself when it fires.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}
