//! Remote modification timestamps.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canonical display format compared and persisted by the DDL time cache.
pub const DDL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Last DDL time of a database object (`all_objects.last_ddl_time`).
///
/// Two times are considered equal when their canonical strings are equal,
/// so sub-second precision never triggers a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DdlTime(NaiveDateTime);

impl DdlTime {
    /// Wrap a naive timestamp.
    pub fn new(value: NaiveDateTime) -> Self {
        Self(value)
    }

    /// Parse the canonical `YYYY-MM-DD HH:MM:SS` form.
    pub fn from_canonical(value: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(value.trim(), DDL_TIME_FORMAT).map(Self)
    }

    /// The canonical string form.
    pub fn canonical(&self) -> String {
        self.0.format(DDL_TIME_FORMAT).to_string()
    }

    /// The wrapped timestamp.
    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for DdlTime {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

impl FromStr for DdlTime {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_canonical(s)
    }
}

impl fmt::Display for DdlTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DDL_TIME_FORMAT))
    }
}

impl Serialize for DdlTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DdlTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_canonical(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_round_trip() {
        let time = DdlTime::from_canonical("2023-01-01 10:00:00").unwrap();
        assert_eq!(time.canonical(), "2023-01-01 10:00:00");
        assert_eq!(time.to_string(), "2023-01-01 10:00:00");
    }

    #[test]
    fn test_subsecond_precision_is_dropped() {
        let precise = NaiveDateTime::parse_from_str("2023-01-01 10:00:00.750", "%Y-%m-%d %H:%M:%S%.f")
            .unwrap();
        assert_eq!(DdlTime::new(precise).canonical(), "2023-01-01 10:00:00");
    }

    #[test]
    fn test_rejects_other_formats() {
        assert!(DdlTime::from_canonical("01/02/2023").is_err());
    }
}
