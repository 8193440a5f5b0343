//! Presence rules.

use super::params::split_params;
use crate::{error::SchemaErrorKind, field::Field, metadata::Kind, utils::parse_bool_flag};

pub(super) fn required(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(field.exists())
}

/// `required_if=Field op value ...`: the field is required if all conditions hold for the referenced sibling fields.
pub(super) fn required_if(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let rule = field.rule();
    let params = split_params(rule.value());
    if params.is_empty() || params.len() % 3 != 0 {
        return Err(rule.invalid_param("triples of `field op value`"));
    }

    for condition in params.chunks_exact(3) {
        let [name, op, value] = condition else {
            unreachable!("chunks have exactly 3 elements");
        };
        if !condition_holds(field, name, op, value)? {
            return Ok(true);
        }
    }
    Ok(field.exists())
}

fn condition_holds(
    field: &Field<'_>,
    name: &str,
    op: &str,
    value: &str,
) -> Result<bool, SchemaErrorKind> {
    let rule = field.rule();
    let unknown_op = || rule.invalid_param("`eq`, `ne`, `gt`, `gte`, `lt` or `lte` operation");
    if compare(op, 0, 0).is_none() {
        return Err(unknown_op());
    }
    let Some(other) = field.sibling(name) else {
        return Ok(false);
    };
    if !other.exists() {
        return Ok(false);
    }

    let holds = match other.kind() {
        Kind::Int | Kind::Uint => {
            let expected: i64 = value.parse().map_err(|_| rule.invalid_param("integer"))?;
            other.int().and_then(|actual| compare(op, actual, expected))
        }
        Kind::Float => {
            let expected: f64 = value.parse().map_err(|_| rule.invalid_param("number"))?;
            other.float().and_then(|actual| compare(op, actual, expected))
        }
        Kind::Slice | Kind::Map => {
            let expected: usize = value.parse().map_err(|_| rule.invalid_param("length"))?;
            if other.is_array() || other.is_object() {
                compare(op, other.len(), expected)
            } else {
                Some(false)
            }
        }
        Kind::Bool => {
            let expected = parse_bool_flag(value).ok_or_else(|| rule.invalid_param("bool"))?;
            Some(equality(op, other.bool() == Some(expected)).ok_or_else(unknown_op)?)
        }
        _ => Some(equality(op, other.str() == Some(value)).ok_or_else(unknown_op)?),
    };
    Ok(holds.unwrap_or(false))
}

fn compare<T: PartialOrd>(op: &str, actual: T, expected: T) -> Option<bool> {
    Some(match op {
        "eq" => actual == expected,
        "ne" => actual != expected,
        "gt" => actual > expected,
        "gte" => actual >= expected,
        "lt" => actual < expected,
        "lte" => actual <= expected,
        _ => return None,
    })
}

/// Bools and strings support only equality checks.
fn equality(op: &str, equal: bool) -> Option<bool> {
    match op {
        "eq" => Some(equal),
        "ne" => Some(!equal),
        _ => None,
    }
}
