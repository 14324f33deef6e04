/// Turns a monotonically increasing elapsed time into per-frame deltas.
///
/// The first tick yields 0. A timestamp earlier than the last one (clock
/// skew between hosts, a reset `performance.now()`) also yields 0 and does
/// not rewind the clock.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    previous: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `elapsed` seconds and return the delta since the last tick.
    pub fn tick(&mut self, elapsed: f64) -> f32 {
        match self.previous {
            None => {
                self.previous = Some(elapsed);
                0.0
            }
            Some(previous) => {
                let delta = (elapsed - previous).max(0.0);
                self.previous = Some(previous.max(elapsed));
                delta as f32
            }
        }
    }

    /// Last observed elapsed time, if any frame has ticked.
    pub fn elapsed(&self) -> Option<f64> {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_is_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(12.5), 0.0);
        assert_eq!(clock.elapsed(), Some(12.5));
    }

    #[test]
    fn test_delta_between_ticks() {
        let mut clock = FrameClock::new();
        clock.tick(1.0);
        let dt = clock.tick(1.25);
        assert!((dt - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_backwards_time_clamps_to_zero() {
        let mut clock = FrameClock::new();
        clock.tick(2.0);
        assert_eq!(clock.tick(1.0), 0.0);
        // still measured from the high-water mark
        let dt = clock.tick(2.5);
        assert!((dt - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_deltas_never_negative() {
        let mut clock = FrameClock::new();
        for t in [0.0, 0.016, 0.010, 0.033, 0.033, 0.05] {
            assert!(clock.tick(t) >= 0.0);
        }
    }
}
