//! Time values and the validation trait shared by the domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Wall-clock time in milliseconds since the Unix epoch
///
/// Stored in the `modified_at` column and used to order the library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// A clock set before 1970 reads as 0
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self(millis)
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Length of audio in milliseconds
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Duration(u64);

impl Duration {
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_seconds(seconds: u64) -> Self {
        Self(seconds.saturating_mul(1000))
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Whole seconds, rounded down
    pub fn as_seconds(&self) -> u64 {
        self.0 / 1000
    }

    fn parts(&self) -> (u64, u64, u64) {
        let secs = self.as_seconds();
        (secs / 3600, secs % 3600 / 60, secs % 60)
    }

    /// `H:MM:SS`, hours always shown
    pub fn as_hms(&self) -> String {
        let (h, m, s) = self.parts();
        format!("{}:{:02}:{:02}", h, m, s)
    }

    /// `H:MM:SS` past the first hour, `MM:SS` before it
    pub fn as_clock(&self) -> String {
        match self.parts() {
            (0, m, s) => format!("{:02}:{:02}", m, s),
            _ => self.as_hms(),
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hms())
    }
}

impl From<std::time::Duration> for Duration {
    fn from(d: std::time::Duration) -> Self {
        Self(d.as_millis() as u64)
    }
}

impl std::iter::Sum for Duration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|d| d.0).fold(0, u64::saturating_add))
    }
}

/// Domain values that can check their own invariants
pub trait Validator {
    /// Every violated invariant, described for a log line
    fn validate(&self) -> Result<(), Vec<String>>;

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
