use std::time::Duration;

/// delay and sound timers count down at 60Hz
pub const TIMER_HZ: u32 = 60;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// one timer period, rounded up to the next whole nanosecond so that feeding
/// in a multiple of it always yields that many ticks
pub const TIMER_PERIOD: Duration = Duration::from_nanos(
    (1_000_000_000 + TIMER_HZ as u64 - 1) / TIMER_HZ as u64,
);

/// Turns wall-clock time into whole 60Hz ticks. Whatever is left over from a
/// partial period is carried into the next call, so the tick rate holds no
/// matter how often (or how unevenly) time is fed in.
///
/// The carry is kept as nanoseconds scaled by `TIMER_HZ`, so a tick is due for
/// every full second of scaled time and the cadence is exact.
#[derive(Clone, Debug, Default)]
pub struct TimerClock {
    carry: u128,
}

impl TimerClock {
    pub fn new() -> Self {
        TimerClock { carry: 0 }
    }

    /// add elapsed time; returns how many ticks are now due
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.carry += elapsed.as_nanos() * TIMER_HZ as u128;
        let ticks = self.carry / NANOS_PER_SEC;
        self.carry %= NANOS_PER_SEC;
        ticks.min(u32::MAX as u128) as u32
    }

    /// time already counted towards the next tick, to the nanosecond below
    #[cfg(test)]
    pub fn pending(&self) -> Duration {
        Duration::from_nanos((self.carry / TIMER_HZ as u128) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_periods() {
        let mut c = TimerClock::new();
        assert_eq!(c.advance(TIMER_PERIOD * 3), 3);
        // rounding the period up leaves a nanosecond over
        assert_eq!(c.pending(), Duration::from_nanos(1));
    }

    #[test]
    fn test_partial_periods_carry() {
        let mut c = TimerClock::new();
        assert_eq!(c.advance(Duration::from_millis(10)), 0);
        assert_eq!(c.advance(Duration::from_millis(10)), 1);
        assert_eq!(c.pending(), Duration::from_nanos(3_333_333));
        assert_eq!(c.advance(Duration::from_millis(1)), 0);
    }

    #[test]
    fn test_period_boundary() {
        let mut c = TimerClock::new();
        assert_eq!(c.advance(Duration::from_nanos(16_666_666)), 0);
        assert_eq!(c.advance(Duration::from_nanos(1)), 1);
        assert_eq!(TIMER_PERIOD, Duration::from_nanos(16_666_667));
    }

    #[test]
    fn test_one_second_is_sixty_ticks() {
        let mut c = TimerClock::new();
        let ticks: u32 = (0..1000)
            .map(|_| c.advance(Duration::from_millis(1)))
            .sum();
        assert_eq!(ticks, 60);
        assert_eq!(c.pending(), Duration::ZERO);
        assert_eq!(c.advance(Duration::from_secs(1)), 60);
    }

    #[test]
    fn test_no_drift_over_an_hour() {
        let mut c = TimerClock::new();
        let ticks: u64 = (0..3600 * 60)
            .map(|_| c.advance(Duration::from_nanos(16_666_666)) as u64)
            .sum();
        // 3600 * 60 * 16_666_666ns falls 144us short of an hour
        assert_eq!(ticks, 3600 * 60 - 1);
        assert_eq!(c.advance(Duration::from_micros(144)), 1);
    }
}
