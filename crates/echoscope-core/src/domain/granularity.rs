use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Price-history bucket size understood by the market data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Granularity {
    OneMinute,
    ThreeMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    #[default]
    OneHour,
    TwoHours,
    FourHours,
    SixHours,
    EightHours,
    TwelveHours,
    OneDay,
    ThreeDays,
    OneWeek,
}

impl Granularity {
    pub const ALL: [Self; 14] = [
        Self::OneMinute,
        Self::ThreeMinutes,
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::TwoHours,
        Self::FourHours,
        Self::SixHours,
        Self::EightHours,
        Self::TwelveHours,
        Self::OneDay,
        Self::ThreeDays,
        Self::OneWeek,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1m",
            Self::ThreeMinutes => "3m",
            Self::FiveMinutes => "5m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1H",
            Self::TwoHours => "2H",
            Self::FourHours => "4H",
            Self::SixHours => "6H",
            Self::EightHours => "8H",
            Self::TwelveHours => "12H",
            Self::OneDay => "1D",
            Self::ThreeDays => "3D",
            Self::OneWeek => "1W",
        }
    }

    pub const fn seconds(self) -> i64 {
        const MINUTE: i64 = 60;
        const HOUR: i64 = 60 * MINUTE;
        const DAY: i64 = 24 * HOUR;
        match self {
            Self::OneMinute => MINUTE,
            Self::ThreeMinutes => 3 * MINUTE,
            Self::FiveMinutes => 5 * MINUTE,
            Self::FifteenMinutes => 15 * MINUTE,
            Self::ThirtyMinutes => 30 * MINUTE,
            Self::OneHour => HOUR,
            Self::TwoHours => 2 * HOUR,
            Self::FourHours => 4 * HOUR,
            Self::SixHours => 6 * HOUR,
            Self::EightHours => 8 * HOUR,
            Self::TwelveHours => 12 * HOUR,
            Self::OneDay => DAY,
            Self::ThreeDays => 3 * DAY,
            Self::OneWeek => 7 * DAY,
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Minute buckets are the only lowercase suffix.
        let trimmed = value.trim();
        let canonical = match trimmed.strip_suffix('m') {
            Some(_) => trimmed.to_owned(),
            None => trimmed.to_ascii_uppercase(),
        };

        Self::ALL
            .into_iter()
            .find(|granularity| granularity.as_str() == canonical)
            .ok_or_else(|| ValidationError::InvalidGranularity {
                value: trimmed.to_owned(),
            })
    }
}

impl TryFrom<String> for Granularity {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Granularity> for String {
    fn from(value: Granularity) -> Self {
        value.as_str().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_granularity_case_insensitively() {
        assert_eq!(Granularity::from_str("1h").expect("must parse"), Granularity::OneHour);
        assert_eq!(Granularity::from_str("1D").expect("must parse"), Granularity::OneDay);
        assert_eq!(
            Granularity::from_str("15m").expect("must parse"),
            Granularity::FifteenMinutes
        );
    }

    #[test]
    fn rejects_unknown_granularity() {
        let err = Granularity::from_str("2m").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidGranularity { .. }));
    }

    #[test]
    fn hour_bucket_is_default() {
        assert_eq!(Granularity::default(), Granularity::OneHour);
        assert_eq!(Granularity::OneHour.seconds(), 3_600);
    }
}
