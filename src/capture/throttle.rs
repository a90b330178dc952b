//! Minimum-interval gate for published frames.

use std::time::{Duration, Instant};

/// Allows one publish per `interval`, independent of the render cadence.
#[derive(Debug, Clone)]
pub struct PublishThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl PublishThrottle {
    /// Creates a throttle that has never fired.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns `true` if a publish at `now` is allowed.
    #[must_use]
    pub fn is_ready(&self, now: Instant) -> bool {
        self.last
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Records a publish at `now` if allowed; returns whether it was.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self.is_ready(now) {
            self.last = Some(now);
            true
        } else {
            false
        }
    }

}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn first_publish_is_immediate() {
        let mut throttle = PublishThrottle::new(Duration::from_millis(300));
        assert!(throttle.try_acquire(Instant::now()));
    }

    #[test]
    fn ten_ticks_at_100ms_allow_at_most_four() {
        let mut throttle = PublishThrottle::new(Duration::from_millis(300));
        let start = Instant::now();
        let allowed = (0..10_u32)
            .filter(|i| throttle.try_acquire(start + Duration::from_millis(100) * *i))
            .count();
        assert_eq!(allowed, 4);
    }

    #[test]
    fn gate_reopens_after_the_interval() {
        let mut throttle = PublishThrottle::new(Duration::from_millis(300));
        let now = Instant::now();
        assert!(throttle.try_acquire(now));
        assert!(!throttle.try_acquire(now + Duration::from_millis(299)));
        assert!(throttle.is_ready(now + Duration::from_millis(300)));
    }
}
