use crate::error::Error;
use core::str::FromStr;
use lazy_static::*;
use regex::Regex;
use std::time::Duration;

lazy_static! {
    static ref DURATION_REGEX: Regex =
        Regex::new(r"^\s*(?P<value>\d+)\s*(?P<unit>[a-z]+)\s*$").expect("Regex compilation error");
}

/// A `<value><unit>` pair such as `5s` or `250ms`.
#[derive(Debug, PartialEq)]
pub struct DurationUnit {
    value: u64,
    unit: TimeUnit,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum TimeUnit {
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    fn seconds(self) -> Option<u64> {
        match self {
            TimeUnit::Second => Some(1),
            TimeUnit::Minute => Some(60),
            TimeUnit::Hour => Some(60 * 60),
            TimeUnit::Day => Some(60 * 60 * 24),
            _ => None,
        }
    }
}

/// Parses a duration in unit syntax, used directly as a structopt parser.
pub fn parse_duration(s: &str) -> Result<Duration, Error> {
    s.parse::<DurationUnit>().map(Duration::from)
}

impl FromStr for DurationUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DURATION_REGEX.captures(s).ok_or_else(|| {
            Error::Duration(format!("'{}' is not a duration, expected e.g. 5s or 250ms", s))
        })?;
        let value = caps["value"]
            .parse::<u64>()
            .map_err(|e| Error::Duration(format!("'{}': {}", s, e)))?;
        let unit = caps["unit"].parse::<TimeUnit>()?;
        Ok(Self { value, unit })
    }
}

impl From<DurationUnit> for Duration {
    fn from(duration: DurationUnit) -> Self {
        let value = duration.value;
        match duration.unit {
            TimeUnit::Nanosecond => Duration::from_nanos(value),
            TimeUnit::Microsecond => Duration::from_micros(value),
            TimeUnit::Millisecond => Duration::from_millis(value),
            unit => Duration::from_secs(value.saturating_mul(unit.seconds().unwrap_or(1))),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ns" | "nanosecond" | "nanos" | "nanoseconds" => Ok(TimeUnit::Nanosecond),
            "us" | "microsecond" | "micros" | "microseconds" => Ok(TimeUnit::Microsecond),
            "ms" | "millisecond" | "millis" | "milliseconds" => Ok(TimeUnit::Millisecond),
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(TimeUnit::Second),
            "m" | "min" | "mins" | "minute" | "minutes" => Ok(TimeUnit::Minute),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hour),
            "d" | "day" | "days" => Ok(TimeUnit::Day),
            _ => Err(Error::Duration(format!("Unit '{}' not supported", s))),
        }
    }
}
