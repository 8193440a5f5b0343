//! Size and equality rules: `len`, `min` / `gte`, `max` / `lte`, `gt`, `lt`, `eq`, `ne`.
//!
//! Size rules compare the char count for strings, the number of elements for collections and the value itself
//! for numbers. For timestamps, the value is compared with the current time and the rule value is ignored.

use std::cmp::Ordering;

use chrono::Utc;

use super::Rule;
use crate::{error::SchemaErrorKind, field::Field, metadata::Kind, utils::parse_bool_flag};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum EqParam {
    Str(&'static str),
    Length(usize),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
}

pub(super) fn parse_eq_param(rule: Rule, kind: Kind) -> Result<EqParam, SchemaErrorKind> {
    let value = rule.value();
    Ok(match kind {
        Kind::String => EqParam::Str(value),
        Kind::Slice | Kind::Map => {
            EqParam::Length(value.parse().map_err(|_| rule.invalid_param("length"))?)
        }
        Kind::Int => EqParam::Int(value.parse().map_err(|_| rule.invalid_param("integer"))?),
        Kind::Uint => EqParam::Uint(
            value
                .parse()
                .map_err(|_| rule.invalid_param("unsigned integer"))?,
        ),
        Kind::Float => EqParam::Float(value.parse().map_err(|_| rule.invalid_param("number"))?),
        Kind::Bool => EqParam::Bool(parse_bool_flag(value).ok_or_else(|| rule.invalid_param("bool"))?),
        _ => {
            return Err(SchemaErrorKind::UnsupportedKind {
                rule: rule.name(),
                kind,
            });
        }
    })
}

#[allow(clippy::float_cmp)] // exact comparison is intended
pub(super) fn eq(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let expected = parse_eq_param(field.rule(), field.kind())?;
    if !field.exists() {
        return Ok(false);
    }

    Ok(match expected {
        EqParam::Str(expected) => field.str() == Some(expected),
        EqParam::Length(expected) => {
            (field.is_array() || field.is_object()) && field.len() == expected
        }
        EqParam::Int(expected) => field.int() == Some(expected),
        EqParam::Uint(expected) => field.uint() == Some(expected),
        EqParam::Float(expected) => field.float() == Some(expected),
        EqParam::Bool(expected) => field.bool() == Some(expected),
    })
}

pub(super) fn ne(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    eq(field).map(|is_eq| !is_eq)
}

pub(super) fn len(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    compare_size(field, false, Ordering::is_eq)
}

pub(super) fn gt(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    compare_size(field, true, Ordering::is_gt)
}

pub(super) fn gte(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    compare_size(field, true, Ordering::is_ge)
}

pub(super) fn lt(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    compare_size(field, true, Ordering::is_lt)
}

pub(super) fn lte(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    compare_size(field, true, Ordering::is_le)
}

fn cmp_len(len: usize, param: i64) -> Ordering {
    i64::try_from(len).map_or(Ordering::Greater, |len| len.cmp(&param))
}

#[allow(clippy::cast_precision_loss)] // rule values are small
fn compare_size(
    field: &Field<'_>,
    allow_time: bool,
    accept: fn(Ordering) -> bool,
) -> Result<bool, SchemaErrorKind> {
    let rule = field.rule();
    let kind = field.kind();
    if kind == Kind::Time && allow_time {
        if !field.exists() {
            return Ok(false);
        }
        let now = Utc::now().naive_utc();
        return Ok(field.time().is_some_and(|time| accept(time.naive_utc().cmp(&now))));
    }

    let param = match kind {
        Kind::String | Kind::Slice | Kind::Map | Kind::Int | Kind::Uint | Kind::Float => {
            rule.int_param()?
        }
        _ => {
            return Err(SchemaErrorKind::UnsupportedKind {
                rule: rule.name(),
                kind,
            });
        }
    };
    if !field.exists() {
        return Ok(false);
    }

    let ordering = match kind {
        Kind::String => field.str().map(|s| cmp_len(s.chars().count(), param)),
        Kind::Slice | Kind::Map => {
            (field.is_array() || field.is_object()).then(|| cmp_len(field.len(), param))
        }
        Kind::Int => field.int().map(|value| value.cmp(&param)),
        Kind::Uint => field
            .uint()
            .map(|value| i128::from(value).cmp(&i128::from(param))),
        Kind::Float => field
            .float()
            .and_then(|value| value.partial_cmp(&(param as f64))),
        _ => None,
    };
    Ok(ordering.is_some_and(accept))
}
