//! Set membership and uniqueness rules.

use std::collections::HashSet;

use super::{Rule, params::split_params};
use crate::{
    error::SchemaErrorKind,
    field::Field,
    metadata::{Kind, Shape},
    source::Segment,
};

/// `oneof=red green 'light blue'`: the value must be one of the space-separated params.
pub(super) fn one_of(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let rule = field.rule();
    let value = match field.kind() {
        Kind::String => field.str().map(str::to_owned),
        Kind::Int => field.int().map(|value| value.to_string()),
        Kind::Uint => field.uint().map(|value| value.to_string()),
        kind => {
            return Err(SchemaErrorKind::UnsupportedKind {
                rule: rule.name(),
                kind,
            });
        }
    };
    let Some(value) = value else {
        return Ok(false);
    };
    Ok(split_params(rule.value()).iter().any(|param| *param == value))
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum UniqueKey {
    Int(i64),
    Uint(u64),
    Float(u64),
    Bool(bool),
    Text(String),
}

impl UniqueKey {
    fn new(field: &Field<'_>) -> Option<Self> {
        Some(match field.kind() {
            Kind::Int => Self::Int(field.int()?),
            Kind::Uint => Self::Uint(field.uint()?),
            // Normalize `-0.0` so that it equals `0.0`
            Kind::Float => Self::Float((field.float()? + 0.0).to_bits()),
            Kind::Bool => Self::Bool(field.bool()?),
            _ => Self::Text(field.text().into_owned()),
        })
    }
}

pub(super) fn check_unique(rule: Rule, shape: Shape) -> Result<(), SchemaErrorKind> {
    let kind = shape.kind();
    match shape.deref() {
        Shape::Slice(item) if !rule.value().is_empty() => {
            let Shape::Struct(metadata) = item().deref() else {
                return Err(rule.invalid_param("no value for sequences of non-structs"));
            };
            if metadata.find_field(rule.value()).is_none() {
                return Err(SchemaErrorKind::UnknownField {
                    rule: rule.name(),
                    field: rule.value(),
                });
            }
            Ok(())
        }
        Shape::Slice(_) | Shape::Map(_) => Ok(()),
        _ => Err(SchemaErrorKind::UnsupportedKind {
            rule: rule.name(),
            kind,
        }),
    }
}

/// `unique` checks that sequence elements or map values are distinct; `unique=Field` compares the specified field
/// of struct elements.
pub(super) fn unique(field: &Field<'_>) -> Result<bool, SchemaErrorKind> {
    let rule = field.rule();
    check_unique(rule, field.shape())?;
    let Some(element_shape) = field.shape().element() else {
        unreachable!("checked by `check_unique()`");
    };

    let mut seen = HashSet::new();
    if field.kind() == Kind::Map {
        let keys = field.map_keys();
        for key in &keys {
            let value = field.child(Segment::Key((*key).to_owned()), element_shape);
            let Some(value) = UniqueKey::new(&value) else {
                return Ok(false);
            };
            seen.insert(value);
        }
        return Ok(seen.len() == keys.len());
    }

    let len = field.len();
    for i in 0..len {
        let mut element = field.child(Segment::Index(i), element_shape);
        if let Shape::Struct(metadata) = element_shape.deref()
            && let Some((_, sub_field)) = metadata.find_field(rule.value())
        {
            let name = sub_field.param_name(field.namespace()).into_owned();
            element = element.child(Segment::Key(name), sub_field.shape());
        }
        let Some(value) = UniqueKey::new(&element) else {
            return Ok(false);
        };
        seen.insert(value);
    }
    Ok(seen.len() == len)
}
