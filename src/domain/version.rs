use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike, Utc};
use std::fmt;

use crate::error::{PackagerError, Result};

/// `strftime` layout of a release version.
pub const VERSION_FORMAT: &str = "%Y%m%d%H%M%S";

/// Time-derived release version, e.g. `20240115120000`.
///
/// The rendered form is fixed-width, so lexical order and chronological order agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    timestamp: DateTime<Utc>,
}

impl Version {
    /// Build a version from an instant, dropping sub-second precision
    pub fn from_datetime(timestamp: DateTime<Utc>) -> Self {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        Version { timestamp }
    }

    /// Parse a 14-digit version string (e.g., "20240115120000", optionally prefixed by 'v')
    pub fn parse(s: &str) -> Result<Self> {
        let clean = s.trim_start_matches('v').trim_start_matches('V');
        if clean.len() != 14 || !clean.chars().all(|c| c.is_ascii_digit()) {
            return Err(PackagerError::version(format!(
                "Invalid version format: '{}' - expected YYYYMMDDHHMMSS",
                s
            )));
        }

        let naive = NaiveDateTime::parse_from_str(clean, VERSION_FORMAT)
            .map_err(|e| PackagerError::version(format!("Invalid version '{}': {}", s, e)))?;

        Ok(Version {
            timestamp: Utc.from_utc_datetime(&naive),
        })
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The version one second later
    pub fn successor(&self) -> Self {
        Version {
            timestamp: self.timestamp + Duration::seconds(1),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.timestamp.format(VERSION_FORMAT))
    }
}

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Freeze the clock at the instant a version string denotes
    pub fn at_version(version: &str) -> Result<Self> {
        Ok(FixedClock(Version::parse(version)?.timestamp()))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Issues strictly increasing versions from a clock.
///
/// If the clock has not moved past the last issued second (or went backwards),
/// the next version is the successor of the last one.
pub struct VersionGenerator<C: Clock> {
    clock: C,
    last: Option<Version>,
}

impl<C: Clock> VersionGenerator<C> {
    pub fn new(clock: C) -> Self {
        VersionGenerator { clock, last: None }
    }

    pub fn next_version(&mut self) -> Version {
        let candidate = Version::from_datetime(self.clock.now());
        let version = match self.last {
            Some(last) if candidate <= last => last.successor(),
            _ => candidate,
        };
        self.last = Some(version);
        version
    }
}
