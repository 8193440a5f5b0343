//! Substring rules. Negative rules pass for values that are not strings.

use crate::{error::SchemaErrorKind, field::Field};

fn check_str(field: &Field<'_>, check: impl FnOnce(&str, &'static str) -> bool) -> bool {
    field
        .str()
        .is_some_and(|value| check(value, field.rule().value()))
}

pub(super) fn contains(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_str(field, |value, param| value.contains(param)))
}

/// Checks whether the value contains any of the chars in the rule value.
pub(super) fn contains_any(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_str(field, |value, chars| value.contains(|ch: char| chars.contains(ch))))
}

/// Checks whether the value contains the first char of the rule value.
pub(super) fn contains_rune(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_str(field, |value, param| {
        let ch = param.chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
        value.contains(ch)
    }))
}

pub(super) fn excludes(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    contains(field).map(|contains| !contains)
}

pub(super) fn excludes_all(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    contains_any(field).map(|contains| !contains)
}

pub(super) fn excludes_rune(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    contains_rune(field).map(|contains| !contains)
}

pub(super) fn starts_with(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_str(field, |value, param| value.starts_with(param)))
}

pub(super) fn ends_with(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_str(field, |value, param| value.ends_with(param)))
}

pub(super) fn starts_not_with(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    starts_with(field).map(|starts| !starts)
}

pub(super) fn ends_not_with(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    ends_with(field).map(|ends| !ends)
}
