//! Communication liveness watchdog
//!
//! `None` → `CommunicationLost` once the line has been silent for longer
//! than the configured timeout. The alarm latches: only a successfully
//! processed request clears it. Any received burst restarts the silence
//! clock, even one that is later dropped as noise.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Alarm state reported by every poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Alarm {
    #[default]
    None = 0,
    CommunicationLost = 1,
}

impl Alarm {
    /// Numeric alarm code, 0 = none
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn is_raised(self) -> bool {
        self != Alarm::None
    }
}

impl std::fmt::Display for Alarm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alarm::None => write!(f, "none"),
            Alarm::CommunicationLost => write!(f, "communication lost"),
        }
    }
}

/// Silence supervisor
#[derive(Debug, Clone)]
pub struct Watchdog {
    timeout: Duration,
    last_activity: Duration,
    alarm: Alarm,
}

impl Watchdog {
    /// Start supervising at `now`
    pub fn new(timeout: Duration, now: Duration) -> Self {
        Self {
            timeout,
            last_activity: now,
            alarm: Alarm::None,
        }
    }

    #[inline]
    pub fn alarm(&self) -> Alarm {
        self.alarm
    }

    /// Time since the last received burst
    pub fn silence(&self, now: Duration) -> Duration {
        now.saturating_sub(self.last_activity)
    }

    /// Restart the silence clock
    pub fn record_activity(&mut self, now: Duration) {
        self.last_activity = now;
    }

    /// Raise the alarm if the silence exceeds the timeout
    ///
    /// Returns `true` only on the transition into `CommunicationLost`.
    pub fn check(&mut self, now: Duration) -> bool {
        let silence = self.silence(now);
        if silence <= self.timeout {
            return false;
        }

        let raised = !self.alarm.is_raised();
        if raised {
            warn!(
                "Communication lost: no traffic for {} ms (timeout {} ms)",
                silence.as_millis(),
                self.timeout.as_millis()
            );
        }
        self.alarm = Alarm::CommunicationLost;
        raised
    }

    /// Clear the alarm after a successful request
    ///
    /// Returns `true` if an alarm was actually cleared.
    pub fn clear(&mut self) -> bool {
        let cleared = self.alarm.is_raised();
        if cleared {
            info!("Communication restored");
        }
        self.alarm = Alarm::None;
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const TIMEOUT: Duration = Duration::from_millis(1000);

    #[test]
    fn test_alarm_requires_strictly_longer_silence() {
        let mut watchdog = Watchdog::new(TIMEOUT, Duration::ZERO);

        assert!(!watchdog.check(Duration::from_millis(1000)));
        assert_eq!(watchdog.alarm(), Alarm::None);

        assert!(watchdog.check(Duration::from_millis(1001)));
        assert_eq!(watchdog.alarm(), Alarm::CommunicationLost);
    }

    #[test]
    fn test_alarm_latches_until_cleared() {
        let mut watchdog = Watchdog::new(TIMEOUT, Duration::ZERO);
        assert!(watchdog.check(Duration::from_secs(2)));
        assert!(!watchdog.check(Duration::from_secs(3)));

        // Activity alone does not clear it
        watchdog.record_activity(Duration::from_secs(3));
        assert!(!watchdog.check(Duration::from_secs(3)));
        assert_eq!(watchdog.alarm(), Alarm::CommunicationLost);

        assert!(watchdog.clear());
        assert_eq!(watchdog.alarm(), Alarm::None);
        assert!(!watchdog.clear());
    }

    #[test]
    fn test_activity_restarts_silence_clock() {
        let mut watchdog = Watchdog::new(TIMEOUT, Duration::ZERO);
        watchdog.record_activity(Duration::from_millis(900));

        assert_eq!(
            watchdog.silence(Duration::from_millis(1500)),
            Duration::from_millis(600)
        );
        assert!(!watchdog.check(Duration::from_millis(1500)));
    }

    #[test]
    fn test_alarm_codes() {
        assert_eq!(Alarm::None.code(), 0);
        assert_eq!(Alarm::CommunicationLost.code(), 1);
        assert!(!Alarm::default().is_raised());
        assert_eq!(Alarm::CommunicationLost.to_string(), "communication lost");
    }

    #[test]
    #[traced_test]
    fn test_transitions_are_logged_once() {
        let mut watchdog = Watchdog::new(TIMEOUT, Duration::ZERO);
        watchdog.check(Duration::from_secs(5));
        watchdog.check(Duration::from_secs(6));
        assert!(logs_contain("Communication lost: no traffic for 5000 ms"));
        assert!(!logs_contain("no traffic for 6000 ms"));

        watchdog.clear();
        assert!(logs_contain("Communication restored"));
    }
}
