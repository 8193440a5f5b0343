//! Timestamp parsing.

use std::{fmt, str::FromStr};

use chrono::{
    DateTime, FixedOffset, Local, NaiveDateTime, NaiveTime, TimeZone, Utc,
    format::{Parsed, StrftimeItems},
};
use chrono_tz::Tz;

use crate::metadata::TimeOptions;

/// Error parsing a timestamp.
#[derive(Debug)]
pub(crate) enum TimeError {
    Empty,
    Parse(chrono::ParseError),
    InvalidUnix(String),
    InvalidLocation(&'static str),
    Ambiguous,
}

impl fmt::Display for TimeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => formatter.write_str("val is empty"),
            Self::Parse(err) => write!(formatter, "cannot parse timestamp: {err}"),
            Self::InvalidUnix(value) => write!(formatter, "`{value}` is not a Unix timestamp"),
            Self::InvalidLocation(location) => write!(
                formatter,
                "unsupported location `{location}`; expected `UTC`, `Local`, a fixed offset like `+08:00` or an IANA zone name"
            ),
            Self::Ambiguous => formatter.write_str("local time is ambiguous or does not exist"),
        }
    }
}

impl std::error::Error for TimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Zone applied to timestamps without an explicit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Utc,
    Local,
    Fixed(FixedOffset),
    Named(Tz),
}

impl FromStr for Zone {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "UTC" | "utc" => Self::Utc,
            "Local" | "local" => Self::Local,
            _ => match s.parse::<FixedOffset>() {
                Ok(offset) => Self::Fixed(offset),
                Err(_) => Self::Named(s.parse().map_err(drop)?),
            },
        })
    }
}

impl Zone {
    fn new(options: &TimeOptions) -> Result<Self, TimeError> {
        if let Some(location) = options.location {
            return location
                .parse()
                .map_err(|()| TimeError::InvalidLocation(location));
        }
        Ok(if options.utc { Self::Utc } else { Self::Local })
    }

    fn localize(self, naive: NaiveDateTime) -> Result<DateTime<FixedOffset>, TimeError> {
        match self {
            Self::Utc => Ok(naive.and_utc().fixed_offset()),
            Self::Local => Local
                .from_local_datetime(&naive)
                .single()
                .map(|time| time.fixed_offset())
                .ok_or(TimeError::Ambiguous),
            Self::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .ok_or(TimeError::Ambiguous),
            Self::Named(tz) => tz
                .from_local_datetime(&naive)
                .single()
                .map(|time| time.fixed_offset())
                .ok_or(TimeError::Ambiguous),
        }
    }

    fn convert(self, time: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Self::Utc => time.fixed_offset(),
            Self::Local => time.with_timezone(&Local).fixed_offset(),
            Self::Fixed(offset) => time.with_timezone(&offset),
            Self::Named(tz) => time.with_timezone(&tz).fixed_offset(),
        }
    }
}

/// Checks whether `location` can be used as `time_location`.
pub(crate) fn is_valid_location(location: &str) -> bool {
    location.parse::<Zone>().is_ok()
}

fn parse_unix(s: &str, layout: &str) -> Option<DateTime<Utc>> {
    let value: i64 = s.parse().ok()?;
    let (secs, nanos) = match layout {
        "unix" => (value, 0),
        "unixmilli" => (value.div_euclid(1_000), value.rem_euclid(1_000) * 1_000_000),
        "unixmicro" => (value.div_euclid(1_000_000), value.rem_euclid(1_000_000) * 1_000),
        "unixnano" => (value.div_euclid(1_000_000_000), value.rem_euclid(1_000_000_000)),
        _ => return None,
    };
    DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?)
}

fn parse_strftime(s: &str, layout: &str, zone: Zone) -> Result<DateTime<FixedOffset>, TimeError> {
    let mut parsed = Parsed::new();
    chrono::format::parse(&mut parsed, s, StrftimeItems::new(layout)).map_err(TimeError::Parse)?;
    if parsed.offset().is_some() {
        return parsed.to_datetime().map_err(TimeError::Parse);
    }

    let date = parsed.to_naive_date().map_err(TimeError::Parse)?;
    let time = match parsed.to_naive_time() {
        Ok(time) => time,
        // Date-only layouts
        Err(_) if parsed.hour_div_12().is_none() => NaiveTime::MIN,
        Err(err) => return Err(TimeError::Parse(err)),
    };
    zone.localize(date.and_time(time))
}

/// Parses a timestamp according to the options.
pub(crate) fn parse_time(s: &str, options: &TimeOptions) -> Result<DateTime<FixedOffset>, TimeError> {
    let zone = Zone::new(options)?;
    let layout = options.format.unwrap_or("RFC3339");
    let lowercase_layout = layout.to_ascii_lowercase();
    if lowercase_layout.starts_with("unix") {
        return parse_unix(s, &lowercase_layout)
            .map(|time| zone.convert(time))
            .ok_or_else(|| TimeError::InvalidUnix(s.to_owned()));
    }

    if s.is_empty() {
        return Err(TimeError::Empty);
    }
    match layout {
        "RFC3339" => DateTime::parse_from_rfc3339(s).map_err(TimeError::Parse),
        "RFC2822" => DateTime::parse_from_rfc2822(s).map_err(TimeError::Parse),
        _ => parse_strftime(s, layout, zone),
    }
}
