//! Wall-clock timestamps for due dates and creation times.
//!
//! Stored as fixed-width `YYYY-MM-DD HH:MM:SS` text so that lexicographic
//! comparison in SQL equals chronological comparison. Years outside
//! 1000..=9999 are rejected for the same reason.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ValidationError;

/// Canonical storage format.
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accepted input formats with a time component, most specific first.
const DATETIME_FORMATS: &[&str] = &[STORAGE_FORMAT, "%Y-%m-%d %H:%M"];

/// Accepted date-only format (interpreted as midnight).
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A local timestamp with second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Current local time, truncated to whole seconds.
    pub fn now() -> Self {
        Self(Local::now().naive_local().trunc_subsecs(0))
    }

    /// Wrap a `NaiveDateTime`, dropping sub-second precision.
    pub fn from_naive(value: NaiveDateTime) -> Result<Self, ValidationError> {
        if !(1000..=9999).contains(&value.year()) {
            return Err(ValidationError::Timestamp(value.to_string()));
        }
        Ok(Self(value.trunc_subsecs(0)))
    }

    /// Parse user or stored text.
    ///
    /// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD HH:MM`, and `YYYY-MM-DD`.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        let invalid = || ValidationError::Timestamp(raw.to_string());

        let parsed = DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
            .ok_or_else(invalid)?;

        Self::from_naive(parsed).map_err(|_| invalid())
    }

    /// Fixed-width storage text.
    pub fn to_storage(&self) -> String {
        self.0.format(STORAGE_FORMAT).to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(STORAGE_FORMAT))
    }
}

impl FromStr for Timestamp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_storage())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_storage_format() {
        let ts = Timestamp::parse("2026-02-15 09:30:15").unwrap();
        assert_eq!(ts.to_storage(), "2026-02-15 09:30:15");
    }

    #[test]
    fn parses_minute_precision() {
        let ts = Timestamp::parse("2026-02-15 09:30").unwrap();
        assert_eq!(ts.to_storage(), "2026-02-15 09:30:00");
    }

    #[test]
    fn parses_date_only_as_midnight() {
        let ts = Timestamp::parse("2026-02-15").unwrap();
        assert_eq!(ts.to_storage(), "2026-02-15 00:00:00");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert!(Timestamp::parse("  2026-02-15 09:30  ").is_ok());
    }

    #[test]
    fn rejects_garbage() {
        let err = Timestamp::parse("next tuesday").unwrap_err();
        assert_eq!(err, ValidationError::Timestamp("next tuesday".to_string()));
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(Timestamp::parse("2026-02-30 10:00").is_err());
        assert!(Timestamp::parse("2026-13-01").is_err());
        assert!(Timestamp::parse("2026-01-01 25:00").is_err());
    }

    #[test]
    fn rejects_years_that_break_fixed_width() {
        let naive = NaiveDate::from_ymd_opt(12_000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(Timestamp::from_naive(naive).is_err());
    }

    #[test]
    fn string_order_matches_chronological_order() {
        let earlier = Timestamp::parse("2026-02-09 23:59").unwrap();
        let later = Timestamp::parse("2026-02-10 00:00").unwrap();
        assert!(earlier < later);
        assert!(earlier.to_storage() < later.to_storage());
    }

    #[test]
    fn now_has_no_subseconds() {
        let now = Timestamp::now();
        assert_eq!(Timestamp::parse(&now.to_storage()).unwrap(), now);
    }

    #[test]
    fn serde_uses_storage_text() {
        let ts = Timestamp::parse("2026-02-15 09:30").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2026-02-15 09:30:00\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn serde_rejects_malformed_text() {
        let result: Result<Timestamp, _> = serde_json::from_str("\"soon\"");
        assert!(result.is_err());
    }
}
