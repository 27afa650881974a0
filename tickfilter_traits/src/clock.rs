use std::thread;
use std::time::{Duration, Instant};

/// Monotonic time source.
///
/// The engine measures everything as elapsed seconds from an epoch `Instant`,
/// so the trait only needs `now`, a blocking `sleep`, and the `secs_since`
/// convenience built on top of them.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, d: Duration);

    /// Elapsed seconds since `epoch` as `f64`, 0.0 on underflow.
    fn secs_since(&self, epoch: Instant) -> f64 {
        self.now().saturating_duration_since(epoch).as_secs_f64()
    }
}

/// Real clock backed by `std::time::Instant`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    #[inline]
    fn sleep(&self, d: Duration) {
        if !d.is_zero() {
            thread::sleep(d);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_clock::TestClock;
    use super::*;

    #[test]
    fn secs_since_saturates_at_zero() {
        let clock = MonotonicClock::new();
        let future = clock.now() + Duration::from_secs(10);
        assert_eq!(clock.secs_since(future), 0.0);
    }

    #[test]
    fn test_clock_advances_without_sleeping() {
        let clock = TestClock::new();
        let epoch = clock.now();
        clock.advance(Duration::from_millis(2500));
        assert!((clock.secs_since(epoch) - 2.5).abs() < 1e-9);
        clock.sleep(Duration::from_millis(500));
        assert!((clock.secs_since(epoch) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn clones_share_advanced_time() {
        let a = TestClock::new();
        let b = a.clone();
        let epoch = a.now();
        b.advance(Duration::from_secs(7));
        assert!((a.secs_since(epoch) - 7.0).abs() < 1e-9);
    }
}
