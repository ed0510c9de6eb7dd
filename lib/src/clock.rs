use std::time::Duration;

/// Virtual animation time, stepped once per transmitted frame.
///
/// Frame content must only depend on [`FrameClock::elapsed`], never on wall clock time, so the
/// same sequence of frames is produced no matter how long rendering or the bus transfer took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    step: Duration,
    elapsed: Duration,
    frames: u64,
}

impl FrameClock {
    pub fn new(step: Duration) -> Self {
        Self { step, elapsed: Duration::ZERO, frames: 0 }
    }

    pub fn advance(&mut self) {
        self.elapsed += self.step;
        self.frames += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// number of times the clock was advanced
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let clock = FrameClock::new(Duration::from_millis(100));
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert_eq!(clock.frames(), 0);
    }

    #[test]
    fn ignores_real_time_between_advances() {
        let mut clock = FrameClock::new(Duration::from_millis(41));
        clock.advance();
        std::thread::sleep(Duration::from_millis(20));
        clock.advance();
        clock.advance();
        assert_eq!(clock.elapsed(), Duration::from_millis(123));
    }

    proptest::proptest! {
        #[test]
        fn n_advances_add_n_steps(step_ms in 1_u64..=1000, n in 0_u32..500) {
            let mut clock = FrameClock::new(Duration::from_millis(step_ms));
            let mut previous = clock.elapsed();
            for _ in 0..n {
                clock.advance();
                proptest::prop_assert!(clock.elapsed() > previous);
                previous = clock.elapsed();
            }
            proptest::prop_assert_eq!(clock.elapsed(), Duration::from_millis(step_ms) * n);
            proptest::prop_assert_eq!(clock.frames(), u64::from(n));
        }
    }
}
