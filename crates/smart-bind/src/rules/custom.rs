//! Extension rules: `mobile`, `idcard` and `regex`.

use std::{collections::HashMap, sync::Arc};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use crate::{error::SchemaErrorKind, field::Field};

static MOBILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\+?86)?1(?:3\d{3}|5[^4\D]\d{2}|8\d{3}|7(?:[35678]\d{2}|4(?:0\d|1[0-2]|9\d))|9[189]\d{2}|66\d{2})\d{6}$",
    )
    .expect("mobile regex should be valid")
});

static ID_CARD: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[0-9]{17}[0-9X]$").expect("ID card regex should be valid"));

static PATTERNS: Lazy<RwLock<HashMap<&'static str, Arc<Regex>>>> = Lazy::new(RwLock::default);

/// Mainland China mobile number, optionally prefixed with `+86` / `86`.
pub(super) fn mobile(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field.exists() && field.str().is_some_and(|s| MOBILE.is_match(s)))
}

/// 18-char resident ID number with a valid ISO 7064 MOD 11-2 check char.
pub(super) fn id_card(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let Some(s) = field.str().filter(|_| field.exists()) else {
        return Ok(false);
    };
    Ok(is_id_card(&s.to_uppercase()))
}

fn is_id_card(s: &str) -> bool {
    if !ID_CARD.is_match(s) {
        return false;
    }

    let (digits, check) = s.as_bytes().split_at(17);
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &digit)| {
            let weight = (1_u32 << (17 - i)) % 11;
            weight * u32::from(digit - b'0')
        })
        .sum();
    let expected = (12 - sum % 11) % 11;
    match check[0] {
        b'X' => expected == 10,
        digit => expected == u32::from(digit - b'0'),
    }
}

/// Compiles the pattern for the `regex` rule. Compiled patterns are cached.
pub(super) fn compiled_pattern(
    pattern: Option<&'static str>,
) -> Result<Arc<Regex>, SchemaErrorKind> {
    let pattern = pattern.ok_or(SchemaErrorKind::MissingPattern)?;
    if let Some(regex) = PATTERNS.read().get(pattern) {
        return Ok(regex.clone());
    }

    let regex = Regex::new(pattern).map_err(|err| SchemaErrorKind::InvalidPattern {
        pattern,
        message: err.to_string(),
    })?;
    Ok(PATTERNS
        .write()
        .entry(pattern)
        .or_insert_with(|| Arc::new(regex))
        .clone())
}

/// Matches the value against the `pattern` attribute of the field (or the field the rule is inherited from).
pub(super) fn regex(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let regex = compiled_pattern(field.pattern())?;
    Ok(field.exists() && regex.is_match(&field.text()))
}
