use std::fmt::{Display, Formatter};
use std::str::FromStr;

use geomag_utils::time::{DAY, HOUR, MINUTE, NANOS_PER_SECOND};

/// Interval is the sampling cadence of a timeseries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Second,
    Minute,
    Hourly,
    Daily,
}

impl Interval {
    /// delta is the sample period in nanoseconds.
    pub fn delta(&self) -> i64 {
        match self {
            Self::Second => NANOS_PER_SECOND,
            Self::Minute => MINUTE,
            Self::Hourly => HOUR,
            Self::Daily => DAY,
        }
    }

    pub fn seconds(&self) -> i64 {
        self.delta() / NANOS_PER_SECOND
    }

    /// abbreviation is used in file name templates.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Second => "sec",
            Self::Minute => "min",
            Self::Hourly => "hor",
            Self::Daily => "day",
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hourly => "hourly",
            Self::Daily => "daily",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "second" => Ok(Self::Second),
            "minute" => Ok(Self::Minute),
            "hourly" | "hour" => Ok(Self::Hourly),
            "daily" | "day" => Ok(Self::Daily),
            _ => Err(format!("unexpected interval \"{}\"", s)),
        }
    }
}
