use std::thread;
use std::time::Duration;

/// Soft frame-rate cap.
///
/// After a frame has been presented, sleeps for whatever is left of the
/// target period, truncated to whole milliseconds. Long frames are never
/// compensated, so this is an upper bound on frame rate only.
#[derive(Debug, Clone, Copy)]
pub struct FrameGovernor {
    period: Option<Duration>,
}

impl FrameGovernor {
    /// `fps == 0` disables pacing.
    pub fn from_fps(fps: u32) -> Self {
        Self {
            period: (fps > 0).then(|| Duration::from_secs(1) / fps),
        }
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period: Some(period),
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Sleep needed after a frame that took `elapsed`.
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        let Some(period) = self.period else {
            return Duration::ZERO;
        };
        let left = period.saturating_sub(elapsed);
        Duration::from_millis(u64::try_from(left.as_millis()).unwrap_or(u64::MAX))
    }

    /// Block the calling thread for the rest of the frame. Returns the sleep.
    pub fn pace(&self, elapsed: Duration) -> Duration {
        let sleep = self.remaining(elapsed);
        if !sleep.is_zero() {
            thread::sleep(sleep);
        }
        sleep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_short_frame_sleeps_for_the_rest() {
        let governor = FrameGovernor::with_period(Duration::from_millis(30));
        assert_eq!(
            governor.remaining(Duration::from_millis(10)),
            Duration::from_millis(20)
        );
    }

    #[test]
    fn test_long_frame_does_not_sleep() {
        let governor = FrameGovernor::with_period(Duration::from_millis(30));
        assert_eq!(governor.remaining(Duration::from_millis(40)), Duration::ZERO);
        assert_eq!(governor.remaining(Duration::from_millis(30)), Duration::ZERO);
    }

    #[test]
    fn test_sleep_rounds_down_to_millis() {
        let governor = FrameGovernor::with_period(Duration::from_millis(30));
        assert_eq!(
            governor.remaining(Duration::from_micros(10_600)),
            Duration::from_millis(19)
        );
        assert_eq!(
            governor.remaining(Duration::from_micros(29_500)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_from_fps() {
        let governor = FrameGovernor::from_fps(60);
        assert_eq!(governor.period(), Some(Duration::from_nanos(16_666_666)));
        assert_eq!(governor.remaining(Duration::ZERO), Duration::from_millis(16));
    }

    #[test]
    fn test_zero_fps_disables_pacing() {
        let governor = FrameGovernor::from_fps(0);
        assert_eq!(governor.period(), None);
        assert_eq!(governor.pace(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_pace_blocks() {
        let governor = FrameGovernor::with_period(Duration::from_millis(30));
        let start = Instant::now();
        let slept = governor.pace(Duration::from_millis(10));
        assert_eq!(slept, Duration::from_millis(20));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
