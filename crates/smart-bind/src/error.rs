//! Binding and validation errors.

use std::{borrow::Cow, fmt};

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::metadata::Kind;

/// Error code shared by all request parameter errors.
pub const CODE_PARAMS_ERR: i32 = 1;

/// Kind of [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Error not attributable to a single field, e.g. a malformed request body.
    Global,
    /// Error concerning a specific field.
    Field,
}

impl ErrorKind {
    /// Returns the numeric code of this kind as exposed to API clients.
    pub const fn code(self) -> u8 {
        match self {
            Self::Global => 1,
            Self::Field => 2,
        }
    }
}

/// Error produced when request data fails to bind or to pass validation.
///
/// [`Display`](fmt::Display) outputs the resolved message only, which is suitable for showing to API clients.
/// The alternate form (`{:#}`) outputs a detailed description together with the cause of the error.
pub struct ValidationError {
    code: i32,
    kind: ErrorKind,
    param: String,
    rule_name: Cow<'static, str>,
    key: String,
    path: String,
    message: String,
    cause: Option<anyhow::Error>,
}

impl fmt::Debug for ValidationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ValidationError")
            .field("kind", &self.kind)
            .field("param", &self.param)
            .field("rule_name", &self.rule_name)
            .field("key", &self.key)
            .field("path", &self.path)
            .field("message", &self.message)
            .field("cause", &self.cause)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !formatter.alternate() {
            return formatter.write_str(&self.message);
        }

        match self.kind {
            ErrorKind::Field => write!(
                formatter,
                "the related param {} not valid in {}, the related Field Key is {}",
                self.param, self.rule_name, self.key
            )?,
            ErrorKind::Global => formatter.write_str(&self.message)?,
        }
        if let Some(cause) = &self.cause {
            write!(formatter, "\n{cause:#}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause = self.cause.as_ref()?;
        let cause: &(dyn std::error::Error + 'static) = cause.as_ref();
        Some(cause)
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 6)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("type", &self.kind.code())?;
        state.serialize_field("param", &self.param)?;
        state.serialize_field("rule", &self.rule_name)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("msg", &self.message)?;
        state.end()
    }
}

impl ValidationError {
    /// Creates a global error with the specified message.
    pub fn global(message: impl Into<String>) -> Self {
        Self {
            code: CODE_PARAMS_ERR,
            kind: ErrorKind::Global,
            param: String::new(),
            rule_name: Cow::Borrowed(""),
            key: String::new(),
            path: String::new(),
            message: message.into(),
            cause: None,
        }
    }

    pub(crate) fn field(
        param: String,
        rule_name: &'static str,
        key: &'static str,
        path: String,
        message: String,
    ) -> Self {
        Self {
            code: CODE_PARAMS_ERR,
            kind: ErrorKind::Field,
            param,
            rule_name: Cow::Borrowed(rule_name),
            key: key.to_owned(),
            path,
            message,
            cause: None,
        }
    }

    #[must_use]
    pub(crate) fn with_path(mut self, path: String) -> Self {
        self.path = path;
        self
    }

    /// Attaches a cause to this error.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Returns the error code. Currently, this is always [`CODE_PARAMS_ERR`].
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the name of the failing request param. Empty for global errors.
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Returns the name of the failed rule. For type coercion errors, this is the name of the expected type
    /// (e.g., `int` or `array`). Empty for global errors.
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// Returns the Rust name of the failing field. Empty for global errors.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the path to the failing value in the request data, e.g. `items[2].name`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the resolved error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the cause of this error, if any.
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }
}

/// Specific kind of a [`SchemaError`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaErrorKind {
    /// Rule is not registered.
    UnknownRule {
        /// Rule name.
        name: &'static str,
    },
    /// `dive` is applied to a value which is neither a sequence nor a map.
    DiveOnNonCollection {
        /// Kind of the value.
        kind: Kind,
    },
    /// `keys` / `endkeys` appear outside a `dive` for a map.
    KeysOutsideMap,
    /// `keys` doesn't have a matching `endkeys`, or vice versa.
    UnpairedKeys,
    /// `keys` block doesn't contain any rules.
    EmptyKeys,
    /// `dive` is used inside a `keys` block.
    DiveInsideKeys,
    /// `regex` rule is used without a `pattern`.
    MissingPattern,
    /// `pattern` is not a valid regular expression.
    InvalidPattern {
        /// Pattern.
        pattern: &'static str,
        /// Error message produced by the regex engine.
        message: String,
    },
    /// Rule value cannot be parsed.
    InvalidParam {
        /// Rule name.
        rule: &'static str,
        /// Rule value.
        value: &'static str,
        /// Human-readable description of what was expected.
        expected: &'static str,
    },
    /// Rule is not applicable to the kind of the value.
    UnsupportedKind {
        /// Rule name.
        rule: &'static str,
        /// Kind of the value.
        kind: Kind,
    },
    /// Rule refers to a field that does not exist.
    UnknownField {
        /// Rule name.
        rule: &'static str,
        /// Referenced field name.
        field: &'static str,
    },
    /// `time_location` is not a recognized time zone.
    InvalidLocation {
        /// Location specified for the field.
        location: &'static str,
    },
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRule { name } => write!(formatter, "rule `{name}` is not registered"),
            Self::DiveOnNonCollection { kind } => {
                write!(formatter, "`dive` can only be applied to sequences and maps, got {kind}")
            }
            Self::KeysOutsideMap => formatter
                .write_str("`keys` / `endkeys` can only directly follow a `dive` applied to a map"),
            Self::UnpairedKeys => formatter.write_str("`keys` and `endkeys` must come in pairs"),
            Self::EmptyKeys => formatter.write_str("`keys` block is empty"),
            Self::DiveInsideKeys => formatter.write_str("`dive` is not allowed inside a `keys` block"),
            Self::MissingPattern => {
                formatter.write_str("`regex` rule requires a `pattern` on the field")
            }
            Self::InvalidPattern { pattern, message } => {
                write!(formatter, "pattern `{pattern}` is invalid: {message}")
            }
            Self::InvalidParam {
                rule,
                value,
                expected,
            } => write!(
                formatter,
                "value `{value}` of rule `{rule}` is invalid; expected {expected}"
            ),
            Self::UnsupportedKind { rule, kind } => {
                write!(formatter, "rule `{rule}` cannot be applied to {kind}")
            }
            Self::UnknownField { rule, field } => {
                write!(formatter, "field `{field}` referenced by rule `{rule}` does not exist")
            }
            Self::InvalidLocation { location } => write!(
                formatter,
                "time location `{location}` is not supported; expected `UTC`, `Local`, a fixed offset or an IANA zone name"
            ),
        }
    }
}

/// Configuration error caused by an invalid binding schema (e.g., an unknown rule in the `binding` attribute).
///
/// Such errors signal a programming error rather than bad request data; they should not be converted
/// to a response for API clients. [`StructMetadata::check_rules()`](crate::metadata::StructMetadata::check_rules())
/// allows catching them on startup or in tests.
#[derive(Debug, Clone)]
pub struct SchemaError {
    kind: SchemaErrorKind,
    ty: Option<&'static str>,
    field: Option<&'static str>,
    path: Option<String>,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("invalid binding schema")?;
        match (self.ty, self.field) {
            (Some(ty), Some(field)) => write!(formatter, " for `{ty}.{field}`")?,
            (None, Some(field)) => write!(formatter, " for `{field}`")?,
            (Some(ty), None) => write!(formatter, " for `{ty}`")?,
            (None, None) => {}
        }
        if let Some(path) = &self.path {
            write!(formatter, " at `{path}`")?;
        }
        write!(formatter, ": {}", self.kind)
    }
}

impl std::error::Error for SchemaError {}

impl From<SchemaErrorKind> for SchemaError {
    fn from(kind: SchemaErrorKind) -> Self {
        Self {
            kind,
            ty: None,
            field: None,
            path: None,
        }
    }
}

impl SchemaError {
    pub(crate) fn with_field(mut self, ty: Option<&'static str>, field: &'static str) -> Self {
        self.ty = self.ty.or(ty);
        self.field = self.field.or(Some(field));
        self
    }

    pub(crate) fn with_path(mut self, path: String) -> Self {
        if !path.is_empty() {
            self.path.get_or_insert(path);
        }
        self
    }

    /// Returns the specific kind of this error.
    pub fn kind(&self) -> &SchemaErrorKind {
        &self.kind
    }

    /// Returns the Rust name of the type containing the misconfigured field, if known.
    pub fn ty(&self) -> Option<&'static str> {
        self.ty
    }

    /// Returns the Rust name of the misconfigured field, if known.
    pub fn field(&self) -> Option<&'static str> {
        self.field
    }

    /// Returns the request data path on which the error was encountered, if any.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

/// Error returned by binding operations.
#[derive(Debug)]
pub enum BindError {
    /// Request data is invalid.
    Validation(ValidationError),
    /// Binding schema is invalid.
    Schema(SchemaError),
}

impl fmt::Display for BindError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => fmt::Display::fmt(err, formatter),
            Self::Schema(err) => fmt::Display::fmt(err, formatter),
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Schema(err) => Some(err),
        }
    }
}

impl From<ValidationError> for BindError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<SchemaError> for BindError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

impl BindError {
    /// Returns the validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Schema(_) => None,
        }
    }

    /// Converts this error into a validation error.
    ///
    /// # Panics
    ///
    /// Panics if this is a schema error. Since schema errors indicate a broken binding schema, they should not be
    /// processed by request-handling code.
    #[track_caller]
    pub fn into_validation(self) -> ValidationError {
        match self {
            Self::Validation(err) => err,
            Self::Schema(err) => panic!("{err}"),
        }
    }

    /// Returns the schema error, if this is one.
    pub fn as_schema(&self) -> Option<&SchemaError> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Validation(_) => None,
        }
    }
}
