use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::ValidationError;

/// Unix timestamp in whole seconds, rendered as RFC3339 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnixTime(i64);

impl UnixTime {
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc().unix_timestamp())
    }

    pub fn parse_rfc3339(input: &str) -> Result<Self, ValidationError> {
        OffsetDateTime::parse(input, &Rfc3339)
            .map(|value| Self(value.unix_timestamp()))
            .map_err(|_| ValidationError::InvalidConfig {
                field: "timestamp",
                reason: format!("'{input}' is not RFC3339"),
            })
    }

    pub const fn as_secs(self) -> i64 {
        self.0
    }

    pub const fn saturating_add_secs(self, secs: i64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds elapsed from `earlier` to `self`, clamped at zero.
    pub const fn seconds_since(self, earlier: Self) -> i64 {
        let delta = self.0.saturating_sub(earlier.0);
        if delta < 0 {
            0
        } else {
            delta
        }
    }

    pub fn format_rfc3339(self) -> String {
        OffsetDateTime::from_unix_timestamp(self.0)
            .ok()
            .and_then(|value| value.format(&Rfc3339).ok())
            .unwrap_or_else(|| self.0.to_string())
    }
}

impl Display for UnixTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_rfc3339())
    }
}

impl Serialize for UnixTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_rfc3339())
    }
}

impl<'de> Deserialize<'de> for UnixTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse_rfc3339(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_as_utc() {
        let ts = UnixTime::from_secs(1_704_067_200);
        assert_eq!(ts.format_rfc3339(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn parses_rfc3339_round_trip() {
        let ts = UnixTime::parse_rfc3339("2024-01-01T01:00:00+01:00").expect("must parse");
        assert_eq!(ts.as_secs(), 1_704_067_200);
    }

    #[test]
    fn elapsed_is_never_negative() {
        let earlier = UnixTime::from_secs(100);
        let later = UnixTime::from_secs(40);
        assert_eq!(later.seconds_since(earlier), 0);
        assert_eq!(earlier.seconds_since(later), 60);
    }
}
