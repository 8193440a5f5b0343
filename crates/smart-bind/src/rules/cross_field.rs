//! Rules comparing a field with another field.
//!
//! `*field` rules look up the referenced field among the siblings of the current field, while `*csfield` rules
//! look it up starting from the root struct (so the rule value may be a dotted path like `Inner.Start`).
//! If the referenced field doesn't exist or has a different kind, comparisons fail (and negative rules,
//! such as `nefield`, pass).

use std::cmp::Ordering;

use crate::{error::SchemaErrorKind, field::Field, metadata::Kind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Parent,
    Root,
}

fn resolve<'a>(field: &Field<'a>, scope: Scope) -> Option<Field<'a>> {
    let name = field.rule().value();
    let other = match scope {
        Scope::Parent => field.sibling(name),
        Scope::Root => field.from_root(name),
    }?;
    (other.kind() == field.kind()).then_some(other)
}

fn compare_values(field: &Field<'_>, other: &Field<'_>) -> Option<Ordering> {
    match field.kind() {
        Kind::Int => Some(field.int().unwrap_or_default().cmp(&other.int().unwrap_or_default())),
        Kind::Uint => Some(field.uint().unwrap_or_default().cmp(&other.uint().unwrap_or_default())),
        Kind::Float => field
            .float()
            .unwrap_or_default()
            .partial_cmp(&other.float().unwrap_or_default()),
        Kind::Bool => Some(field.bool().unwrap_or_default().cmp(&other.bool().unwrap_or_default())),
        Kind::Slice | Kind::Map => Some(field.len().cmp(&other.len())),
        Kind::Time => match (field.time(), other.time()) {
            (Some(time), Some(other_time)) => Some(time.cmp(&other_time)),
            // Both values are not timestamps; fall back to comparing raw values
            (None, None) => Some(field.text().cmp(&other.text())),
            _ => None,
        },
        _ => Some(field.text().cmp(&other.text())),
    }
}

fn is_eq(field: &Field<'_>, scope: Scope) -> bool {
    let Some(other) = resolve(field, scope) else {
        return false;
    };
    if !field.exists() || !other.exists() {
        return false;
    }
    if matches!(field.kind(), Kind::Int | Kind::Uint | Kind::Float)
        && !(field.is_numeric() && other.is_numeric())
    {
        return false;
    }
    compare_values(field, &other).is_some_and(Ordering::is_eq)
}

fn check_order(field: &Field<'_>, scope: Scope, accept: fn(Ordering) -> bool) -> bool {
    resolve(field, scope)
        .and_then(|other| compare_values(field, &other))
        .is_some_and(accept)
}

pub(super) fn eq_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(is_eq(field, Scope::Parent))
}

pub(super) fn ne_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(!is_eq(field, Scope::Parent))
}

pub(super) fn gt_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_order(field, Scope::Parent, Ordering::is_gt))
}

pub(super) fn gte_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_order(field, Scope::Parent, Ordering::is_ge))
}

pub(super) fn lt_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_order(field, Scope::Parent, Ordering::is_lt))
}

pub(super) fn lte_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_order(field, Scope::Parent, Ordering::is_le))
}

pub(super) fn eq_cs_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(is_eq(field, Scope::Root))
}

pub(super) fn ne_cs_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(!is_eq(field, Scope::Root))
}

pub(super) fn gt_cs_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_order(field, Scope::Root, Ordering::is_gt))
}

pub(super) fn gte_cs_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_order(field, Scope::Root, Ordering::is_ge))
}

pub(super) fn lt_cs_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_order(field, Scope::Root, Ordering::is_lt))
}

pub(super) fn lte_cs_field(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    Ok(check_order(field, Scope::Root, Ordering::is_le))
}

pub(super) fn field_contains(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let Some(other) = field.sibling(field.rule().value()) else {
        return Ok(false);
    };
    if !field.exists() || !other.exists() {
        return Ok(false);
    }
    Ok(field.text().contains(&*other.text()))
}

pub(super) fn field_excludes(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let Some(other) = field.sibling(field.rule().value()) else {
        return Ok(true);
    };
    if !field.exists() || !other.exists() {
        return Ok(false);
    }
    Ok(!field.text().contains(&*other.text()))
}
