//! Metadata describing binding destinations.
//!
//! Metadata is generated by the [`Bind`](macro@crate::Bind) derive macro and is available via
//! [`DescribeParams::DESCRIPTION`](crate::DescribeParams::DESCRIPTION). It records, for each field of a bound struct,
//! its [shape](Shape), the names under which the field is looked up in request data, and the parsed
//! [rule chain](crate::rules::Rule) applied to it.

use std::{any, borrow::Cow, fmt};

use self::check::SchemaChecker;
use crate::{rules::Rule, utils::canonical_header_key};

#[doc(hidden)] // used in the derive macros
pub mod _private;
mod check;

/// Lazily evaluated shape of a value. Laziness is required to describe recursive types.
pub type ShapeFn = fn() -> Shape;

/// Shape of a binding destination.
#[derive(Clone, Copy)]
#[non_exhaustive]
pub enum Shape {
    /// Boolean value.
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// Floating-point number.
    Float,
    /// String.
    String,
    /// Timestamp.
    Time,
    /// Uploaded file.
    File,
    /// Untyped value bound verbatim from the request data; never validated.
    Any,
    /// Sequence with the specified element shape.
    Slice(ShapeFn),
    /// Map with string keys and the specified value shape.
    Map(ShapeFn),
    /// Optional value (i.e., a pointer) with the specified pointee shape.
    Optional(ShapeFn),
    /// Struct with the specified metadata.
    Struct(&'static StructMetadata),
}

impl fmt::Debug for Shape {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slice(item) => formatter.debug_tuple("Slice").field(&item()).finish(),
            Self::Map(value) => formatter.debug_tuple("Map").field(&value()).finish(),
            Self::Optional(pointee) => formatter.debug_tuple("Optional").field(&pointee()).finish(),
            Self::Struct(metadata) => formatter.debug_tuple("Struct").field(&metadata.ty).finish(),
            _ => fmt::Display::fmt(&self.kind(), formatter),
        }
    }
}

impl Shape {
    /// Strips [`Optional`](Self::Optional) wrappers from this shape.
    #[must_use]
    pub fn deref(self) -> Self {
        let mut shape = self;
        while let Self::Optional(pointee) = shape {
            shape = pointee();
        }
        shape
    }

    /// Returns the coarse-grained kind of this shape, looking through [`Optional`](Self::Optional) wrappers.
    pub fn kind(self) -> Kind {
        match self.deref() {
            Self::Bool => Kind::Bool,
            Self::Int => Kind::Int,
            Self::Uint => Kind::Uint,
            Self::Float => Kind::Float,
            Self::String => Kind::String,
            Self::Time => Kind::Time,
            Self::File => Kind::File,
            Self::Any => Kind::Any,
            Self::Slice(_) => Kind::Slice,
            Self::Map(_) => Kind::Map,
            Self::Struct(_) => Kind::Struct,
            Self::Optional(_) => unreachable!("stripped by `deref()`"),
        }
    }

    /// Returns the shape of elements if this is a collection.
    pub fn element(self) -> Option<Self> {
        match self.deref() {
            Self::Slice(item) | Self::Map(item) => Some(item()),
            _ => None,
        }
    }
}

/// Coarse-grained kind of a binding destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Boolean value.
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// Floating-point number.
    Float,
    /// String.
    String,
    /// Timestamp.
    Time,
    /// Uploaded file.
    File,
    /// Untyped value.
    Any,
    /// Sequence.
    Slice,
    /// Map with string keys.
    Map,
    /// Struct.
    Struct,
}

impl fmt::Display for Kind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl Kind {
    /// Returns a human-readable name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::String => "string",
            Self::Time => "time",
            Self::File => "file",
            Self::Any => "any",
            Self::Slice => "array",
            Self::Map => "object",
            Self::Struct => "struct",
        }
    }

    /// Checks whether this kind is a sequence or a map.
    pub const fn is_collection(self) -> bool {
        matches!(self, Self::Slice | Self::Map)
    }
}

/// Namespace selecting which name attribute is used to look up a field in request data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// `form` names. Used for URL-encoded and multipart forms and for query params.
    Form,
    /// `json` names.
    Json,
    /// `header` names. Names are canonicalized (e.g., `x-request-id` -> `X-Request-Id`).
    Header,
}

impl Namespace {
    /// Returns the attribute name for this namespace.
    pub const fn tag_name(self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::Json => "json",
            Self::Header => "header",
        }
    }
}

/// Rust type description.
#[derive(Clone, Copy, Eq)]
pub struct RustType {
    id: fn() -> any::TypeId,
    name_in_code: &'static str,
}

impl fmt::Debug for RustType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name_in_code)
    }
}

impl PartialEq for RustType {
    fn eq(&self, other: &Self) -> bool {
        (self.id)() == (other.id)()
    }
}

impl RustType {
    /// Creates a new type.
    pub const fn of<T: 'static>(name_in_code: &'static str) -> Self {
        Self {
            id: any::TypeId::of::<T>,
            name_in_code,
        }
    }

    /// Returns the unique ID of this type.
    pub fn id(&self) -> any::TypeId {
        (self.id)()
    }

    /// Returns the name of this type as specified in code.
    pub const fn name_in_code(&self) -> &'static str {
        self.name_in_code
    }
}

/// Options for parsing timestamps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeOptions {
    /// Layout: `RFC3339` (the default), `RFC2822`, `unix`, `unixmilli`, `unixmicro`, `unixnano`,
    /// or a `strftime`-style format.
    pub format: Option<&'static str>,
    /// Interpret timestamps without an offset as UTC.
    pub utc: bool,
    /// Zone for timestamps without an offset: `UTC`, `Local`, a fixed offset like `+08:00` or an IANA name
    /// like `Asia/Shanghai`.
    /// The default is the local zone.
    pub location: Option<&'static str>,
}

impl TimeOptions {
    /// Default options.
    pub const DEFAULT: Self = Self {
        format: None,
        utc: false,
        location: None,
    };
}

/// Binding attributes of a field.
#[derive(Debug, Clone, Copy)]
pub struct FieldTags {
    /// Name (and options, such as `default=`) in the `form` namespace.
    pub form: Option<&'static str>,
    /// Name (and options) in the `json` namespace.
    pub json: Option<&'static str>,
    /// Name (and options) in the `header` namespace.
    pub header: Option<&'static str>,
    /// Parsed rule chain.
    pub binding: &'static [Rule],
    /// Custom error message(s).
    pub msg: Option<&'static str>,
    /// Pattern for the `regex` rule.
    pub pattern: Option<&'static str>,
    /// Timestamp parsing options.
    pub time: TimeOptions,
}

impl FieldTags {
    /// Tags not specifying anything.
    pub const EMPTY: Self = Self {
        form: None,
        json: None,
        header: None,
        binding: &[],
        msg: None,
        pattern: None,
        time: TimeOptions::DEFAULT,
    };

    /// Returns the raw name attribute for the specified namespace.
    pub const fn name_tag(&self, namespace: Namespace) -> Option<&'static str> {
        match namespace {
            Namespace::Form => self.form,
            Namespace::Json => self.json,
            Namespace::Header => self.header,
        }
    }
}

/// Metadata for a single struct field.
#[derive(Debug, Clone, Copy)]
pub struct FieldMetadata {
    /// Name of the field in Rust code.
    pub rust_name: &'static str,
    /// Field type.
    pub ty: RustType,
    /// Shape of the field type.
    pub shape: ShapeFn,
    /// Whether the field is flattened into the containing struct (i.e., doesn't add a segment to the data path).
    pub flatten: bool,
    /// Binding attributes.
    pub tags: FieldTags,
}

impl FieldMetadata {
    /// Returns the shape of this field.
    pub fn shape(&self) -> Shape {
        (self.shape)()
    }

    fn name_segment(&self, namespace: Namespace) -> Option<&'static str> {
        let tag = self.tags.name_tag(namespace)?;
        Some(tag.split(',').next().unwrap_or(tag))
    }

    /// Returns the name used to look up this field in request data of the specified namespace.
    /// If the name attribute is absent, empty or `-`, the Rust name of the field is used.
    pub fn param_name(&self, namespace: Namespace) -> Cow<'static, str> {
        let name = match self.name_segment(namespace) {
            None | Some("" | "-") => self.rust_name,
            Some(name) => name,
        };
        if namespace == Namespace::Header {
            Cow::Owned(canonical_header_key(name))
        } else {
            Cow::Borrowed(name)
        }
    }

    /// Checks whether the field opts out of its own rules with the `-` name.
    pub fn skips_rules(&self, namespace: Namespace) -> bool {
        self.name_segment(namespace) == Some("-")
    }

    /// Returns the default value declared as a `default=` option of the name attribute.
    pub fn default_value(&self, namespace: Namespace) -> Option<&'static str> {
        let tag = self.tags.name_tag(namespace)?;
        tag.split(',')
            .skip(1)
            .find_map(|option| option.strip_prefix("default="))
    }
}

/// Metadata for a bound struct.
#[derive(Debug, Clone, Copy)]
pub struct StructMetadata {
    /// Type of the struct.
    pub ty: RustType,
    /// Fields in the declaration order.
    pub fields: &'static [FieldMetadata],
}

impl StructMetadata {
    /// Finds a field by its Rust name. Looks inside flattened fields as well; in this case,
    /// the returned struct metadata is the metadata of the flattened struct directly containing the field.
    pub fn find_field(
        &'static self,
        rust_name: &str,
    ) -> Option<(&'static Self, &'static FieldMetadata)> {
        let direct = self
            .fields
            .iter()
            .find(|field| !field.flatten && field.rust_name == rust_name);
        if let Some(field) = direct {
            return Some((self, field));
        }

        self.fields
            .iter()
            .filter(|field| field.flatten)
            .find_map(|field| match field.shape().deref() {
                Shape::Struct(inner) => inner.find_field(rust_name),
                _ => None,
            })
    }

    /// Checks rule chains for this struct and all nested structs. This allows detecting
    /// schema errors (unknown rules, misplaced `dive`s etc.) on startup or in tests rather than when handling requests.
    ///
    /// # Errors
    ///
    /// Returns the first encountered schema error.
    pub fn check_rules(&'static self) -> Result<(), crate::SchemaError> {
        SchemaChecker::default().check_struct(self)
    }
}
