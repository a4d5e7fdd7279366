//! Chart time ranges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Time window selectable for chart data.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum TimeRange {
    Hour = 0,
    #[default]
    Day = 1,
    Week = 2,
    Month = 3,
    ThreeMonths = 4,
}

impl TimeRange {
    /// All ranges in selector order.
    pub const ALL: [TimeRange; 5] = [
        TimeRange::Hour,
        TimeRange::Day,
        TimeRange::Week,
        TimeRange::Month,
        TimeRange::ThreeMonths,
    ];

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(TimeRange::Hour),
            1 => Some(TimeRange::Day),
            2 => Some(TimeRange::Week),
            3 => Some(TimeRange::Month),
            4 => Some(TimeRange::ThreeMonths),
            _ => None,
        }
    }

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Value of the provider's `days` query parameter.
    /// The provider has no sub-day granularity, so `Hour` requests a full day.
    pub fn days(self) -> u32 {
        match self {
            TimeRange::Hour | TimeRange::Day => 1,
            TimeRange::Week => 7,
            TimeRange::Month => 30,
            TimeRange::ThreeMonths => 90,
        }
    }

    /// Short label shown on the range selector.
    pub fn display_name(self) -> &'static str {
        match self {
            TimeRange::Hour => "1h",
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::ThreeMonths => "90d",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown time range: {0} (expected one of 1h, 24h, 7d, 30d, 90d)")]
pub struct ParseRangeError(pub String);

impl FromStr for TimeRange {
    type Err = ParseRangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        TimeRange::ALL
            .into_iter()
            .find(|r| r.display_name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseRangeError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_days() {
        assert_eq!(TimeRange::Hour.days(), 1);
        assert_eq!(TimeRange::Day.days(), 1);
        assert_eq!(TimeRange::Week.days(), 7);
        assert_eq!(TimeRange::Month.days(), 30);
        assert_eq!(TimeRange::ThreeMonths.days(), 90);
    }

    #[test]
    fn test_range_from_id_roundtrip() {
        for range in TimeRange::ALL {
            assert_eq!(TimeRange::from_id(range.id()), Some(range));
        }
        assert_eq!(TimeRange::from_id(5), None);
    }

    #[test]
    fn test_range_parse() {
        assert_eq!("7d".parse::<TimeRange>(), Ok(TimeRange::Week));
        assert_eq!(" 24H ".parse::<TimeRange>(), Ok(TimeRange::Day));
        assert!("1y".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_range_default_is_day() {
        assert_eq!(TimeRange::default(), TimeRange::Day);
        assert_eq!(TimeRange::default().to_string(), "24h");
    }
}
