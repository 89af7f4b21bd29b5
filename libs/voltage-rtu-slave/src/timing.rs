//! RTU character timing
//!
//! The 1.5 character gap drives frame assembly and the 3.5 character gap is
//! held after every transmission. Both are derived once from the baud rate.

use std::time::Duration;

use crate::constants::{
    FIXED_T1_5_US, FIXED_T3_5_US, FIXED_TIMING_BAUD_THRESHOLD, T1_5_NUMERATOR, T3_5_NUMERATOR,
};

/// Inter-character and end-of-frame gaps for one baud rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtuTiming {
    /// 1.5 character times
    pub char_gap: Duration,
    /// 3.5 character times
    pub frame_gap: Duration,
}

impl RtuTiming {
    /// Derive the gaps for `baud_rate`
    ///
    /// Up to 19200 baud the gaps scale with the character time; above that
    /// they are fixed at 750 µs and 1750 µs. A zero baud rate is treated as
    /// the slowest possible line (1 baud) rather than dividing by zero.
    pub fn from_baud(baud_rate: u32) -> Self {
        if baud_rate > FIXED_TIMING_BAUD_THRESHOLD {
            return Self {
                char_gap: Duration::from_micros(FIXED_T1_5_US),
                frame_gap: Duration::from_micros(FIXED_T3_5_US),
            };
        }

        let baud = u64::from(baud_rate.max(1));
        Self {
            char_gap: Duration::from_micros(T1_5_NUMERATOR / baud),
            frame_gap: Duration::from_micros(T3_5_NUMERATOR / baud),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_9600() {
        let timing = RtuTiming::from_baud(9600);
        assert_eq!(timing.char_gap, Duration::from_micros(1562));
        assert_eq!(timing.frame_gap, Duration::from_micros(3645));
    }

    #[test]
    fn test_timing_threshold_is_inclusive() {
        let timing = RtuTiming::from_baud(19_200);
        assert_eq!(timing.char_gap, Duration::from_micros(781));
        assert_eq!(timing.frame_gap, Duration::from_micros(1822));
    }

    #[test]
    fn test_timing_fixed_above_19200() {
        for baud in [38_400, 57_600, 115_200] {
            let timing = RtuTiming::from_baud(baud);
            assert_eq!(timing.char_gap, Duration::from_micros(750));
            assert_eq!(timing.frame_gap, Duration::from_micros(1750));
        }
    }
}
