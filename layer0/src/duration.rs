//! A plain-integer-milliseconds duration newtype for stable wire formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Milliseconds, serialized as a plain integer rather than serde's
/// default `Duration` struct representation. Used for timeout knobs
/// and other duration-shaped configuration values that cross a
/// protocol boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMs(pub u64);

impl DurationMs {
    /// The zero duration.
    pub const ZERO: DurationMs = DurationMs(0);

    /// Construct from a millisecond count.
    pub const fn from_millis(ms: u64) -> Self {
        DurationMs(ms)
    }

    /// Construct from a whole number of seconds.
    pub const fn from_secs(secs: u64) -> Self {
        DurationMs(secs * 1000)
    }

    /// The millisecond count.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Convert to a `std::time::Duration`.
    pub const fn to_std(self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        DurationMs(d.as_millis() as u64)
    }
}

impl From<DurationMs> for Duration {
    fn from(d: DurationMs) -> Self {
        d.to_std()
    }
}

impl fmt::Display for DurationMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_secs_converts() {
        assert_eq!(DurationMs::from_secs(120).as_millis(), 120_000);
    }

    #[test]
    fn roundtrips_through_std_duration() {
        let d = DurationMs::from_millis(4500);
        let std_d: Duration = d.into();
        assert_eq!(std_d, Duration::from_millis(4500));
        assert_eq!(DurationMs::from(std_d), d);
    }

    #[test]
    fn serializes_as_plain_integer() {
        let d = DurationMs::from_millis(250);
        assert_eq!(serde_json::to_string(&d).unwrap(), "250");
    }
}
