//! Leading-edge throttle with trailing delivery of the latest pending value.

use std::time::Duration;

use tokio::time::Instant;

/// Clock-driven gate: the caller supplies `now`, the throttle decides.
///
/// The first value after a quiet period fires immediately and opens a
/// cooldown window. Values offered during the window replace each other;
/// the last one fires once the window closes, which opens a new window.
#[derive(Debug)]
pub struct Throttle<T> {
    window: Duration,
    cooldown_until: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            cooldown_until: None,
            pending: None,
        }
    }

    /// Returns the value back when it may fire right now, otherwise keeps it
    /// as the pending value.
    pub fn offer(&mut self, value: T, now: Instant) -> Option<T> {
        if self.is_cooling(now) {
            self.pending = Some(value);
            return None;
        }
        self.cooldown_until = Some(now + self.window);
        self.pending = None;
        Some(value)
    }

    /// When [`Throttle::poll_trailing`] should next be called.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().and(self.cooldown_until)
    }

    /// Release the pending value if the window has closed.
    pub fn poll_trailing(&mut self, now: Instant) -> Option<T> {
        if self.is_cooling(now) {
            return None;
        }
        let value = self.pending.take()?;
        self.cooldown_until = Some(now + self.window);
        Some(value)
    }

    /// Drop the window and hand out whatever is pending.
    pub fn flush(&mut self) -> Option<T> {
        self.cooldown_until = None;
        self.pending.take()
    }

    fn is_cooling(&self, now: Instant) -> bool {
        self.cooldown_until.is_some_and(|until| now < until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(100);

    #[test]
    fn leading_edge_fires_immediately() {
        let start = Instant::now();
        let mut throttle = Throttle::new(WINDOW);
        assert_eq!(throttle.offer(1, start), Some(1));
        assert_eq!(throttle.deadline(), None);
    }

    #[test]
    fn values_inside_window_coalesce_to_latest() {
        let start = Instant::now();
        let mut throttle = Throttle::new(WINDOW);
        throttle.offer(1, start);
        assert_eq!(throttle.offer(2, start + Duration::from_millis(10)), None);
        assert_eq!(throttle.offer(3, start + Duration::from_millis(20)), None);
        assert_eq!(throttle.deadline(), Some(start + WINDOW));

        assert_eq!(throttle.poll_trailing(start + Duration::from_millis(50)), None);
        assert_eq!(throttle.poll_trailing(start + WINDOW), Some(3));
        assert_eq!(throttle.poll_trailing(start + WINDOW * 3), None);
    }

    #[test]
    fn trailing_fire_opens_a_new_window() {
        let start = Instant::now();
        let mut throttle = Throttle::new(WINDOW);
        throttle.offer(1, start);
        throttle.offer(2, start + Duration::from_millis(10));
        assert_eq!(throttle.poll_trailing(start + WINDOW), Some(2));
        assert_eq!(throttle.offer(4, start + WINDOW + Duration::from_millis(5)), None);
        assert_eq!(throttle.offer(5, start + WINDOW * 2), Some(5));
    }

    #[test]
    fn flush_releases_pending() {
        let start = Instant::now();
        let mut throttle = Throttle::new(WINDOW);
        throttle.offer(1, start);
        throttle.offer(2, start);
        assert_eq!(throttle.flush(), Some(2));
        assert_eq!(throttle.flush(), None);
    }
}
