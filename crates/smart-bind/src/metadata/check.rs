//! Startup-time checks of binding schemas.

use std::{any, collections::HashSet};

use super::{FieldTags, Shape, StructMetadata};
use crate::{
    error::{SchemaError, SchemaErrorKind},
    rules::{self, Rule},
    time,
};

/// Walks a type tree and checks rule chains of all encountered fields against the field shapes.
#[derive(Debug, Default)]
pub(super) struct SchemaChecker {
    visited: HashSet<any::TypeId>,
}

impl SchemaChecker {
    pub(super) fn check_struct(&mut self, metadata: &'static StructMetadata) -> Result<(), SchemaError> {
        if !self.visited.insert(metadata.ty.id()) {
            return Ok(());
        }

        for field in metadata.fields {
            let shape = field.shape();
            Self::check_location(&field.tags)
                .and_then(|()| Self::check_chain(&field.tags, field.tags.binding, shape))
                .map_err(|kind| {
                    SchemaError::from(kind).with_field(Some(metadata.ty.name_in_code()), field.rust_name)
                })?;
            self.check_nested(shape)?;
        }
        Ok(())
    }

    fn check_nested(&mut self, shape: Shape) -> Result<(), SchemaError> {
        match shape.deref() {
            Shape::Struct(metadata) => self.check_struct(metadata),
            Shape::Slice(item) | Shape::Map(item) => self.check_nested(item()),
            _ => Ok(()),
        }
    }

    fn check_location(tags: &FieldTags) -> Result<(), SchemaErrorKind> {
        match tags.time.location {
            Some(location) if !time::is_valid_location(location) => {
                Err(SchemaErrorKind::InvalidLocation { location })
            }
            _ => Ok(()),
        }
    }

    fn check_chain(tags: &FieldTags, chain: &[Rule], shape: Shape) -> Result<(), SchemaErrorKind> {
        let shape = shape.deref();
        if matches!(shape, Shape::Any) {
            // Untyped values are never validated
            return Ok(());
        }

        for (i, &rule) in chain.iter().enumerate() {
            match rule.name() {
                rules::OMITEMPTY => { /* no checks required */ }
                rules::DIVE => {
                    let rest = &chain[i + 1..];
                    return match shape {
                        Shape::Slice(item) => Self::check_chain(tags, rest, item()),
                        Shape::Map(value) => {
                            let (key_rules, rest) = rules::split_keys_block(rest)?;
                            for &key_rule in key_rules {
                                rules::check_static(key_rule, tags, Shape::String)?;
                            }
                            Self::check_chain(tags, rest, value())
                        }
                        _ => Err(SchemaErrorKind::DiveOnNonCollection { kind: shape.kind() }),
                    };
                }
                rules::KEYS | rules::ENDKEYS => return Err(SchemaErrorKind::KeysOutsideMap),
                _ => rules::check_static(rule, tags, shape)?,
            }
        }
        Ok(())
    }
}
