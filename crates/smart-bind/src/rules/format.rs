//! Format rules checking string values against well-known formats.

use chrono::format::{Parsed, StrftimeItems};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::IgnoredAny;

use crate::{error::SchemaErrorKind, field::Field};

macro_rules! regex_rules {
    ($($(#[$attr:meta])* $name:ident => $pattern:expr,)+) => {
        $(
        $(#[$attr])*
        pub(super) fn $name(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
            static REGEX: Lazy<Regex> = Lazy::new(|| {
                Regex::new($pattern).expect(concat!("regex for `", stringify!($name), "` should be valid"))
            });
            Ok(field.exists() && REGEX.is_match(field.str().unwrap_or_default()))
        }
        )+
    };
}

regex_rules! {
    alpha => "^[a-zA-Z]+$",
    alphanum => "^[a-zA-Z0-9]+$",
    alpha_unicode => r"^[\p{L}]+$",
    alphanum_unicode => r"^[\p{L}\p{N}]+$",
    email => r"^(?:(?:(?:(?:[a-zA-Z]|\d|[!#\$%&'\*\+\-\/=\?\^_`{\|}~]|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}])+(?:\.([a-zA-Z]|\d|[!#\$%&'\*\+\-\/=\?\^_`{\|}~]|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}])+)*)|(?:(?:\x22)(?:(?:(?:(?:\x20|\x09)*(?:\x0d\x0a))?(?:\x20|\x09)+)?(?:(?:[\x01-\x08\x0b\x0c\x0e-\x1f\x7f]|\x21|[\x23-\x5b]|[\x5d-\x7e]|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}])|(?:(?:[\x01-\x09\x0b\x0c\x0d-\x7f]|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}]))))*(?:(?:(?:\x20|\x09)*(?:\x0d\x0a))?(\x20|\x09)+)?(?:\x22))))@(?:(?:(?:[a-zA-Z]|\d|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}])|(?:(?:[a-zA-Z]|\d|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}])(?:[a-zA-Z]|\d|-|\.|~|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}])*(?:[a-zA-Z]|\d|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}])))\.)+(?:(?:[a-zA-Z]|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}])|(?:(?:[a-zA-Z]|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}])(?:[a-zA-Z]|\d|-|\.|~|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}])*(?:[a-zA-Z]|[\x{00A0}-\x{D7FF}\x{F900}-\x{FDCF}\x{FDF0}-\x{FFEF}])))\.?$",
    base64 => r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=|[A-Za-z0-9+/]{4})$",
    base64_url => r"^(?:[A-Za-z0-9_-]{4})*(?:[A-Za-z0-9_-]{2}==|[A-Za-z0-9_-]{3}=|[A-Za-z0-9_-]{4})$",
    md5 => "^[0-9a-f]{32}$",
    sha256 => "^[0-9a-f]{64}$",
    /// RFC 952 hostname.
    hostname_rfc952 => r"^[a-zA-Z]([a-zA-Z0-9\-]+[\.]?)*[a-zA-Z0-9]$",
    url_encoded => r"^(?:[^%]|%[0-9A-Fa-f]{2})*$",
    html_encoded => r"&#[x]?([0-9a-fA-F]{2})|(&gt)|(&lt)|(&quot)|(&amp)+[;]?",
    html => r"<[/]?([a-zA-Z]+).*?>",
    jwt => r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*$",
}

/// RFC 1123 hostname; unlike RFC 952, allows a leading digit.
pub(super) static HOSTNAME_RFC1123: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z0-9]{1}[a-zA-Z0-9-]{0,62}){1}(\.[a-zA-Z0-9]{1}[a-zA-Z0-9-]{0,62})*?$")
        .expect("RFC 1123 hostname regex should be valid")
});

static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?[0-9]+(?:\.[0-9]+)?$").expect("numeric regex should be valid")
});

/// Checks whether a string is a decimal number, possibly signed and with a fractional part.
pub(crate) fn is_numeric_str(s: &str) -> bool {
    NUMERIC.is_match(s)
}

pub(super) fn hostname_rfc1123(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field.str().is_some_and(|s| HOSTNAME_RFC1123.is_match(s)))
}

pub(super) fn numeric(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field.exists() && field.is_numeric())
}

/// Non-negative integer.
pub(super) fn number(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field.exists() && field.int().is_some_and(|value| value >= 0))
}

pub(super) fn boolean(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field.exists() && field.is_bool())
}

pub(super) fn json(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field
        .str()
        .is_some_and(|s| serde_json::from_str::<IgnoredAny>(s).is_ok()))
}

pub(super) fn lowercase(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field
        .str()
        .is_some_and(|s| !s.is_empty() && s == s.to_lowercase()))
}

pub(super) fn uppercase(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field
        .str()
        .is_some_and(|s| !s.is_empty() && s == s.to_uppercase()))
}

/// `datetime=%Y-%m-%d`: the value must be parsable with the `strftime`-style layout.
pub(super) fn datetime(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let layout = field.rule().value();
    Ok(field.str().is_some_and(|s| {
        let mut parsed = Parsed::new();
        chrono::format::parse(&mut parsed, s, StrftimeItems::new(layout)).is_ok()
    }))
}

/// IANA time zone name, such as `Europe/Berlin`. `Local` is not accepted.
pub(super) fn timezone(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field.str().is_some_and(|name| name.parse::<Tz>().is_ok()))
}
