//! Recursive walker binding request data to destinations and running rule chains.

use std::{borrow::Cow, ops, sync::Arc};

use anyhow::anyhow;
use chrono::{DateTime, FixedOffset};

use self::impls::Scalar;
use crate::{
    Bind, DescribeParams,
    error::{BindError, SchemaErrorKind},
    field::Field,
    metadata::{FieldMetadata, FieldTags, Kind, Namespace, Shape, StructMetadata},
    rules::{self, Rule},
    source::{FilePart, Node, Path, Segment, Source, SourceKind},
    time::TimeError,
};

mod impls;
#[cfg(test)]
mod tests;

/// Outcome of binding a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Value is absent from request data; the destination was left intact.
    Absent,
    /// Value (or a part of it) was bound.
    Bound,
}

impl ops::BitOrAssign for Outcome {
    fn bitor_assign(&mut self, rhs: Self) {
        if rhs == Self::Bound {
            *self = Self::Bound;
        }
    }
}

/// Rules inherited by collection elements through a `dive`, together with the tags of the field declaring them.
#[derive(Debug, Clone)]
pub(crate) struct Inheritance {
    pub(crate) rules: Arc<[Rule]>,
    pub(crate) tags: Option<&'static FieldTags>,
}

impl Inheritance {
    pub(crate) fn none() -> Self {
        Self {
            rules: Arc::from([]),
            tags: None,
        }
    }
}

/// Position of the walker in the destination type tree, together with the binding metadata for this position.
#[derive(Debug, Clone)]
pub struct Step {
    pub(crate) path: Path,
    pub(crate) param: Cow<'static, str>,
    pub(crate) key: &'static str,
    pub(crate) tags: &'static FieldTags,
    pub(crate) parent: Option<&'static StructMetadata>,
    pub(crate) shape: Shape,
    pub(crate) default: Option<&'static str>,
    pub(crate) skip_own_rules: bool,
    pub(crate) inheritance: Inheritance,
}

impl Step {
    pub(crate) fn root(metadata: &'static StructMetadata) -> Self {
        Self {
            path: Path::root(),
            param: Cow::Borrowed(""),
            key: metadata.ty.name_in_code(),
            tags: &FieldTags::EMPTY,
            parent: None,
            shape: Shape::Struct(metadata),
            default: None,
            skip_own_rules: false,
            inheritance: Inheritance::none(),
        }
    }

    fn struct_field(
        &self,
        parent: &'static StructMetadata,
        field: &'static FieldMetadata,
        namespace: Namespace,
    ) -> Self {
        let (path, param) = if field.flatten {
            (self.path.clone(), self.param.clone())
        } else {
            let param = field.param_name(namespace);
            (self.path.join(&*param), param)
        };

        Self {
            path,
            param,
            key: field.rust_name,
            tags: &field.tags,
            parent: Some(parent),
            shape: field.shape(),
            default: field.default_value(namespace),
            skip_own_rules: field.skips_rules(namespace),
            inheritance: Inheritance::none(),
        }
    }

    fn element(&self, segment: Segment, shape: Shape, inheritance: Inheritance) -> Self {
        Self {
            path: self.path.join(segment),
            param: self.param.clone(),
            key: self.key,
            tags: &FieldTags::EMPTY,
            parent: None,
            shape,
            default: None,
            skip_own_rules: false,
            inheritance,
        }
    }

    /// Returns the path to the bound value in request data.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the request param name of the bound value.
    pub fn param(&self) -> &str {
        &self.param
    }
}

/// Walker over request data. Created for each binding operation.
#[derive(Debug, Clone, Copy)]
pub struct Walker<'a> {
    source: &'a dyn Source,
    namespace: Namespace,
    root: &'static StructMetadata,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(
        source: &'a dyn Source,
        namespace: Namespace,
        root: &'static StructMetadata,
    ) -> Self {
        Self {
            source,
            namespace,
            root,
        }
    }

    pub(crate) fn source(&self) -> &'a dyn Source {
        self.source
    }

    pub(crate) fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub(crate) fn root(&self) -> &'static StructMetadata {
        self.root
    }

    fn resolve(&self, step: &Step) -> Option<Node<'a>> {
        self.source.resolve(&step.path)
    }

    /// Runs inherited rules followed by the own rules of the step. Returns the rules to be inherited by elements
    /// if the chain contains a `dive`.
    fn run_rules(&self, step: &Step) -> Result<Option<Inheritance>, BindError> {
        let own_rules: &[Rule] = if step.skip_own_rules {
            &[]
        } else {
            step.tags.binding
        };
        let inherited_len = step.inheritance.rules.len();
        let chain: Vec<_> = step
            .inheritance
            .rules
            .iter()
            .chain(own_rules)
            .copied()
            .collect();

        for (i, &rule) in chain.iter().enumerate() {
            let field = Field::new(self, step, rule);
            match rule.name() {
                rules::OMITEMPTY => {
                    if !field.exists() || field.is_empty() {
                        tracing::trace!(path = %step.path, "skipping rules for empty value");
                        return Ok(None);
                    }
                }
                rules::DIVE => {
                    let kind = step.shape.kind();
                    if !kind.is_collection() {
                        let kind = SchemaErrorKind::DiveOnNonCollection { kind };
                        return Err(field.schema_error(kind).into());
                    }
                    let tags = if i < inherited_len {
                        step.inheritance.tags
                    } else {
                        Some(step.tags)
                    };
                    return Ok(Some(Inheritance {
                        rules: chain[i + 1..].iter().map(|rule| rule.descend()).collect(),
                        tags,
                    }));
                }
                rules::KEYS | rules::ENDKEYS => {
                    return Err(field.schema_error(SchemaErrorKind::KeysOutsideMap).into());
                }
                name => {
                    let predicate = rules::lookup(name).ok_or_else(|| {
                        field.schema_error(SchemaErrorKind::UnknownRule { name })
                    })?;
                    let passed = predicate(&field).map_err(|kind| field.schema_error(kind))?;
                    if !passed {
                        tracing::debug!(path = %step.path, %rule, "rule failed");
                        return Err(field.error().into());
                    }
                }
            }
        }
        Ok(None)
    }
}

impl Walker<'_> {
    /// Binds a struct. Used by the code generated by the [`Bind`](macro@crate::Bind) derive macro;
    /// `bind_field` is called for each field in the declaration order with the field index.
    ///
    /// # Errors
    ///
    /// Propagates errors produced by rules and field binding.
    pub fn bind_struct(
        &self,
        step: &Step,
        metadata: &'static StructMetadata,
        bind_field: &mut dyn FnMut(usize, &Step) -> Result<Outcome, BindError>,
    ) -> Result<Outcome, BindError> {
        self.run_rules(step)?;

        let mut outcome = if self.resolve(step).is_some() {
            Outcome::Bound
        } else {
            Outcome::Absent
        };
        for (index, field) in metadata.fields.iter().enumerate() {
            let field_step = step.struct_field(metadata, field, self.namespace);
            outcome |= bind_field(index, &field_step)?;
        }
        Ok(outcome)
    }

    pub(crate) fn bind_scalar<T: Scalar>(
        &self,
        step: &Step,
        dest: &mut T,
    ) -> Result<Outcome, BindError> {
        self.run_rules(step)?;

        let field = Field::new(self, step, Rule::coercion(T::NAME));
        if !field.exists() {
            return Ok(Outcome::Absent);
        }
        *dest = T::extract(&field).ok_or_else(|| field.coercion_error())?;
        Ok(Outcome::Bound)
    }

    pub(crate) fn bind_optional<T: Bind>(
        &self,
        step: &Step,
        dest: &mut Option<T>,
    ) -> Result<Outcome, BindError> {
        if self.resolve(step).is_none() && step.default.is_none() {
            let parent = step.path.parent();
            // Only the outermost absent pointee is entered, so that self-referencing types terminate.
            if !parent.is_root() && self.source.resolve(&parent).is_none() {
                self.run_rules(step)?;
                return Ok(Outcome::Absent);
            }
        }

        let mut value = T::default();
        let outcome = value.bind(self, step)?;
        if outcome == Outcome::Bound {
            *dest = Some(value);
        }
        Ok(outcome)
    }

    pub(crate) fn bind_time(&self, step: &Step) -> Result<Option<DateTime<FixedOffset>>, BindError> {
        self.run_rules(step)?;

        let field = Field::new(self, step, Rule::coercion("time"));
        if !field.exists() {
            return Ok(None);
        }
        match field.parse_time() {
            Ok(timestamp) => Ok(Some(timestamp)),
            Err(TimeError::InvalidLocation(location)) => {
                Err(field.schema_error(SchemaErrorKind::InvalidLocation { location }).into())
            }
            Err(err) => {
                let cause = anyhow::Error::new(err).context(format!(
                    "the params {} data can not covert to time",
                    step.param
                ));
                Err(field.error().with_cause(cause).into())
            }
        }
    }

    pub(crate) fn bind_file(&self, step: &Step) -> Result<Option<FilePart>, BindError> {
        self.run_rules(step)?;

        let field = Field::new(self, step, Rule::coercion("file"));
        match self.resolve(step) {
            None => Ok(None),
            Some(Node::File(file)) => Ok(Some(file.clone())),
            Some(Node::Files([file, ..])) => Ok(Some(file.clone())),
            Some(_) => Err(field.coercion_error().into()),
        }
    }

    /// Binds an untyped value verbatim. Such values are never validated.
    pub(crate) fn bind_any(&self, step: &Step) -> Option<serde_json::Value> {
        Some(match self.resolve(step)? {
            Node::Json(value) => value.clone(),
            Node::Text(s) => serde_json::Value::from(s),
            Node::Values([single]) => serde_json::Value::from(single.as_str()),
            Node::Values(values) => string_array(values),
            Node::Form(form) => {
                let map = form
                    .keys()
                    .filter_map(|key| Some((key.to_owned(), string_array(form.values(key)?))))
                    .collect();
                serde_json::Value::Object(map)
            }
            Node::Files(_) | Node::File(_) => return None,
        })
    }

    /// Binds a sequence. The destination is replaced wholesale, so that binding is idempotent.
    pub(crate) fn bind_slice<T: Bind>(
        &self,
        step: &Step,
        dest: &mut Vec<T>,
    ) -> Result<Outcome, BindError> {
        let inheritance = self.run_rules(step)?;

        let field = Field::new(self, step, Rule::coercion(Kind::Slice.as_str()));
        if self.resolve(step).is_none() {
            return Ok(Outcome::Absent);
        }
        if !field.is_array() {
            return Err(field.coercion_error().into());
        }

        let inheritance = inheritance.unwrap_or_else(Inheritance::none);
        let element_shape = T::shape();
        let len = field.len();
        tracing::trace!(path = %step.path, len, "binding sequence elements");
        let mut items = Vec::with_capacity(len);
        for i in 0..len {
            let element_step = step.element(Segment::Index(i), element_shape, inheritance.clone());
            let mut item = T::default();
            item.bind(self, &element_step)?;
            items.push(item);
        }
        *dest = items;
        Ok(Outcome::Bound)
    }

    /// Binds a map with string keys. Returns `None` if the map is absent. Forms never bind maps.
    pub(crate) fn bind_map<V: Bind>(
        &self,
        step: &Step,
    ) -> Result<Option<Vec<(String, V)>>, BindError> {
        let inheritance = self.run_rules(step)?;
        if self.source.kind() == SourceKind::Form {
            return Ok(None);
        }

        let field = Field::new(self, step, Rule::coercion(Kind::Map.as_str()));
        let Some(node) = self.resolve(step) else {
            let required = inheritance.as_ref().and_then(|inheritance| {
                inheritance
                    .rules
                    .iter()
                    .find(|rule| rule.name() == "required")
            });
            if let Some(&rule) = required
                && !field.exists()
            {
                let field = Field::new(self, step, rule);
                let cause = anyhow!("the param {} data required but data not exist", step.param);
                return Err(field.error().with_cause(cause).into());
            }
            return Ok(None);
        };
        let Node::Json(serde_json::Value::Object(map)) = node else {
            return Err(field.coercion_error().into());
        };

        let (key_rules, value_inheritance) = match &inheritance {
            Some(inheritance) => {
                let (key_rules, rest) = rules::split_keys_block(&inheritance.rules)
                    .map_err(|kind| field.schema_error(kind))?;
                let value_inheritance = Inheritance {
                    rules: rest.into(),
                    tags: inheritance.tags,
                };
                (key_rules, value_inheritance)
            }
            None => (&[][..], Inheritance::none()),
        };

        let value_shape = V::shape();
        tracing::trace!(path = %step.path, len = map.len(), "binding map entries");
        let mut entries = Vec::with_capacity(map.len());
        for key in map.keys() {
            if !key_rules.is_empty() {
                let tags = inheritance.as_ref().and_then(|inheritance| inheritance.tags);
                self.check_map_key(step, key, key_rules, tags)?;
            }

            let value_step = step.element(Segment::Key(key.clone()), value_shape, value_inheritance.clone());
            let mut value = V::default();
            value.bind(self, &value_step)?;
            entries.push((key.clone(), value));
        }
        Ok(Some(entries))
    }

    /// Validates a map key by running the rules from a `keys` block against a synthetic document.
    fn check_map_key(
        &self,
        step: &Step,
        key: &str,
        key_rules: &[Rule],
        tags: Option<&'static FieldTags>,
    ) -> Result<(), BindError> {
        let doc = serde_json::json!({ "key": key });
        let key_walker = Walker::new(&doc, self.namespace, self.root);
        let key_step = Step {
            path: Path::root().join("key"),
            param: step.param.clone(),
            key: step.key,
            tags: &FieldTags::EMPTY,
            parent: None,
            shape: Shape::String,
            default: None,
            skip_own_rules: false,
            inheritance: Inheritance {
                rules: key_rules.into(),
                tags,
            },
        };
        // Errors point at the key in the request data
        key_walker.run_rules(&key_step).map_err(|err| match err {
            BindError::Validation(err) => {
                let path = step.path.join(Segment::Key(key.to_owned()));
                BindError::Validation(err.with_path(path.to_string()))
            }
            err => err,
        })?;
        Ok(())
    }
}

fn string_array(values: &[String]) -> serde_json::Value {
    values.iter().map(String::as_str).collect()
}

/// Binds request data from `source` to `dest`, looking up fields in the specified namespace.
///
/// # Errors
///
/// Returns an error if the data fails to bind or to pass validation, or if the binding schema of `T` is invalid.
#[tracing::instrument(level = "debug", skip_all, fields(ty = T::DESCRIPTION.ty.name_in_code(), ?namespace))]
pub fn bind_source<T: DescribeParams + Bind>(
    source: &dyn Source,
    namespace: Namespace,
    dest: &mut T,
) -> Result<(), BindError> {
    let metadata = T::metadata();
    let walker = Walker::new(source, namespace, metadata);
    let step = Step::root(metadata);
    match dest.bind(&walker, &step) {
        Ok(_) => Ok(()),
        Err(BindError::Schema(err)) => {
            tracing::error!(%err, "binding schema is invalid");
            Err(err.into())
        }
        Err(err) => {
            tracing::debug!(%err, "request data is invalid");
            Err(err)
        }
    }
}
