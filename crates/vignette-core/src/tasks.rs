use std::time::Duration;

/// Fixed-interval task stepped by an injected clock.
///
/// The session owns one of these per recurring timer (progress poll, fade
/// ramp) instead of scheduling real timers, so tests can single-step them
/// deterministically by advancing `now`.
#[derive(Clone, Debug)]
pub struct Ticker {
    period: Duration,
    next_due: Option<Duration>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn start(&mut self, now: Duration) {
        self.next_due = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn running(&self) -> bool {
        self.next_due.is_some()
    }

    /// True once per elapsed period. A ticker that fell behind fires once per
    /// call until it has caught up.
    pub fn due(&mut self, now: Duration) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(due + self.period);
                true
            }
            _ => false,
        }
    }
}
