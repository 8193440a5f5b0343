//! Field accessor used by rule predicates.

use std::borrow::Cow;

use anyhow::anyhow;
use chrono::{DateTime, FixedOffset};
use serde_json::Value;

pub(crate) use self::message::resolve_message;
use crate::{
    error::{SchemaError, SchemaErrorKind, ValidationError},
    metadata::{FieldTags, Kind, Namespace, Shape, StructMetadata, TimeOptions},
    rules::{Rule, is_numeric_str},
    source::{Node, Path, Segment, Source},
    time::{TimeError, parse_time},
    utils::parse_bool_flag,
    walk::{Step, Walker},
};

mod message;

/// View of the value being validated, together with its binding metadata and the rule being checked.
///
/// Value getters are uniform across data sources: for JSON, getters return a value only if the JSON type matches
/// (e.g., [`Self::int()`] returns `None` for the string `"1"`), while for forms values are parsed from strings.
/// If the value is absent but the field declares a default value, getters return the default.
#[derive(Debug)]
pub struct Field<'a> {
    source: &'a dyn Source,
    namespace: Namespace,
    root: &'static StructMetadata,
    parent: Option<&'static StructMetadata>,
    shape: Shape,
    path: Cow<'a, Path>,
    node: Option<Node<'a>>,
    param: Cow<'a, str>,
    key: &'static str,
    tags: &'static FieldTags,
    inherited_tags: Option<&'static FieldTags>,
    default: Option<&'static str>,
    rule: Rule,
}

impl<'a> Field<'a> {
    pub(crate) fn new(walker: &Walker<'a>, step: &'a Step, rule: Rule) -> Self {
        let source = walker.source();
        Self {
            source,
            namespace: walker.namespace(),
            root: walker.root(),
            parent: step.parent,
            shape: step.shape,
            node: source.resolve(&step.path),
            path: Cow::Borrowed(&step.path),
            param: Cow::Borrowed(&step.param),
            key: step.key,
            tags: step.tags,
            inherited_tags: step.inheritance.tags,
            default: step.default,
            rule,
        }
    }

    /// Returns the rule being checked.
    pub fn rule(&self) -> Rule {
        self.rule
    }

    /// Returns the shape of the destination.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Returns the kind of the destination.
    pub fn kind(&self) -> Kind {
        self.shape.kind()
    }

    /// Returns the namespace used to look up fields.
    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    /// Returns the request param name.
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Returns the path to the value in request data.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the Rust name of the field (for sequence elements and map values, the name of the containing field).
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Returns the default value declared for the field, if any.
    pub fn default_value(&self) -> Option<&'static str> {
        self.default
    }

    /// Returns the `pattern` attribute of the field, or of the field the current rule is inherited from.
    pub fn pattern(&self) -> Option<&'static str> {
        self.tags
            .pattern
            .or_else(|| self.inherited_tags.and_then(|tags| tags.pattern))
    }

    fn custom_message(&self) -> Option<&'static str> {
        self.tags
            .msg
            .or_else(|| self.inherited_tags.and_then(|tags| tags.msg))
    }

    fn time_options(&self) -> &'static TimeOptions {
        if self.tags.time != TimeOptions::DEFAULT {
            return &self.tags.time;
        }
        self.inherited_tags.map_or(&self.tags.time, |tags| &tags.time)
    }

    /// Checks whether the value is present in request data, or the field has a default value.
    pub fn exists(&self) -> bool {
        self.node.is_some() || self.default.is_some()
    }

    /// Checks whether the value is absent or empty. For forms, a value is empty if all its strings are empty;
    /// JSON values are never empty. A field with a default value is never empty.
    pub fn is_empty(&self) -> bool {
        if self.default.is_some() {
            return false;
        }
        match self.node {
            None => true,
            Some(Node::Values(values)) => values.iter().all(String::is_empty),
            Some(Node::Text(s)) => s.is_empty(),
            Some(Node::Files(files)) => files.is_empty(),
            Some(Node::Json(_) | Node::Form(_) | Node::File(_)) => false,
        }
    }

    /// Returns the string value. For forms with multiple values for the key, returns an empty string.
    pub fn str(&self) -> Option<&'a str> {
        match self.node {
            None => self.default,
            Some(Node::Json(Value::String(s))) => Some(s.as_str()),
            Some(Node::Values([single])) => Some(single.as_str()),
            Some(Node::Values(_)) => Some(""),
            Some(Node::Text(s)) => Some(s),
            Some(Node::Json(_) | Node::Form(_) | Node::Files(_) | Node::File(_)) => None,
        }
    }

    fn json(&self) -> Option<&'a Value> {
        match self.node {
            Some(Node::Json(value)) => Some(value),
            _ => None,
        }
    }

    /// Returns the value as a signed integer.
    pub fn int(&self) -> Option<i64> {
        match self.json() {
            Some(value) => value.as_i64(),
            None => self.str()?.parse().ok(),
        }
    }

    /// Returns the value as an unsigned integer.
    pub fn uint(&self) -> Option<u64> {
        match self.json() {
            Some(value) => value.as_u64(),
            None => self.str()?.parse().ok(),
        }
    }

    /// Returns the value as a floating-point number.
    pub fn float(&self) -> Option<f64> {
        match self.json() {
            Some(value) => value.as_f64(),
            None => self.str()?.parse().ok(),
        }
    }

    /// Returns the value as a boolean. Forms accept `1`, `t`, `true`, `0`, `f`, `false` etc.
    pub fn bool(&self) -> Option<bool> {
        match self.json() {
            Some(value) => value.as_bool(),
            None => parse_bool_flag(self.str()?),
        }
    }

    /// Checks whether the value is a boolean (for forms, whether it can be parsed as one).
    pub fn is_bool(&self) -> bool {
        self.bool().is_some()
    }

    /// Checks whether the value is a number (for forms, a decimal string).
    pub fn is_numeric(&self) -> bool {
        match self.json() {
            Some(value) => value.is_number(),
            None => self.str().is_some_and(is_numeric_str),
        }
    }

    /// Checks whether the value is a sequence (for forms, a list of values for the key).
    pub fn is_array(&self) -> bool {
        matches!(
            self.node,
            Some(Node::Json(Value::Array(_)) | Node::Values(_) | Node::Files(_))
        )
    }

    /// Checks whether the value is an object.
    pub fn is_object(&self) -> bool {
        matches!(self.node, Some(Node::Json(Value::Object(_)) | Node::Form(_)))
    }

    /// Returns the length of the value: the number of elements for sequences and objects,
    /// or the number of chars for strings.
    pub fn len(&self) -> usize {
        match self.node {
            None => self.default.map_or(0, |s| s.chars().count()),
            Some(Node::Json(Value::Array(items))) => items.len(),
            Some(Node::Json(Value::Object(map))) => map.len(),
            Some(Node::Json(Value::String(s))) => s.chars().count(),
            Some(Node::Text(s)) => s.chars().count(),
            Some(Node::Values(values)) => values.len(),
            Some(Node::Files(files)) => files.len(),
            Some(Node::Form(form)) => form.keys().count(),
            Some(Node::Json(_) | Node::File(_)) => 0,
        }
    }

    /// Returns keys of an object value.
    pub fn map_keys(&self) -> Vec<&'a str> {
        match self.json() {
            Some(Value::Object(map)) => map.keys().map(String::as_str).collect(),
            _ => vec![],
        }
    }

    /// Returns the value converted to a string on the best-effort basis. JSON values other than strings
    /// are serialized.
    pub fn text(&self) -> Cow<'a, str> {
        match self.json() {
            Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
            Some(value) => Cow::Owned(value.to_string()),
            None => Cow::Borrowed(self.str().unwrap_or_default()),
        }
    }

    /// Parses the value as a timestamp according to the time attributes of the field.
    pub fn time(&self) -> Option<DateTime<FixedOffset>> {
        if !self.exists() {
            return None;
        }
        self.parse_time().ok()
    }

    pub(crate) fn parse_time(&self) -> Result<DateTime<FixedOffset>, TimeError> {
        parse_time(&self.text(), self.time_options())
    }

    /// Returns a field for the child of this value. The child has no default value and inherits the tags of this field.
    pub fn child(&self, segment: Segment, shape: Shape) -> Self {
        let node = self.node.and_then(|node| node.child(&segment));
        Self {
            source: self.source,
            namespace: self.namespace,
            root: self.root,
            parent: None,
            shape,
            path: Cow::Owned(self.path.join(segment)),
            node,
            param: self.param.clone(),
            key: self.key,
            tags: &FieldTags::EMPTY,
            inherited_tags: self.inherited_tags.or(Some(self.tags)),
            default: None,
            rule: self.rule,
        }
    }

    /// Looks up a field declared in the same struct as this field by its Rust name.
    /// Returns `None` if this value is not a struct field or if the referenced field doesn't exist.
    pub fn sibling(&self, rust_name: &str) -> Option<Self> {
        let parent = self.parent?;
        self.struct_field(parent, self.path.parent(), rust_name)
    }

    /// Looks up a field starting from the root struct by a dot-separated chain of Rust names, e.g. `inner.start`.
    pub fn from_root(&self, rust_names: &str) -> Option<Self> {
        self.struct_field(self.root, Path::root(), rust_names)
    }

    fn struct_field(
        &self,
        mut metadata: &'static StructMetadata,
        mut path: Path,
        rust_names: &str,
    ) -> Option<Self> {
        let mut names = rust_names.split('.').peekable();
        loop {
            let name = names.next()?;
            let (parent, field) = metadata.find_field(name)?;
            let param = field.param_name(self.namespace);
            path = path.join(&*param);
            if names.peek().is_none() {
                return Some(Self {
                    source: self.source,
                    namespace: self.namespace,
                    root: self.root,
                    parent: Some(parent),
                    shape: field.shape(),
                    node: self.source.resolve(&path),
                    path: Cow::Owned(path),
                    param,
                    key: field.rust_name,
                    tags: &field.tags,
                    inherited_tags: None,
                    default: field.default_value(self.namespace),
                    rule: self.rule,
                });
            }

            let Shape::Struct(inner) = field.shape().deref() else {
                return None;
            };
            metadata = inner;
        }
    }

    fn message(&self) -> String {
        self.custom_message()
            .and_then(|msg| resolve_message(msg, self.rule))
            .unwrap_or_else(|| format!("the param {} is not valid", self.param))
    }

    /// Creates an error signalling that the current rule has failed.
    pub(crate) fn error(&self) -> ValidationError {
        ValidationError::field(
            self.param.clone().into_owned(),
            self.rule.name(),
            self.key,
            self.path.to_string(),
            self.message(),
        )
    }

    /// Creates an error signalling that the value cannot be converted to the destination type.
    /// The current rule must be a [coercion pseudo-rule](Rule::coercion()).
    pub(crate) fn coercion_error(&self) -> ValidationError {
        let cause = anyhow!(
            "the param {} data type is not {}",
            self.param,
            self.rule.name()
        );
        self.error().with_cause(cause)
    }

    pub(crate) fn schema_error(&self, kind: SchemaErrorKind) -> SchemaError {
        SchemaError::from(kind)
            .with_field(self.parent.map(|parent| parent.ty.name_in_code()), self.key)
            .with_path(self.path.to_string())
    }
}
