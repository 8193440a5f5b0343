//! `smart-bind` – schema-driven binding and validation of HTTP request data.
//!
//! # Overview
//!
//! The library binds request data (a JSON body, a URL-encoded or multipart form, a query string or headers)
//! to strongly typed *params* structs and validates it according to rule chains declared on the struct fields.
//! Binding and validation happen in a single pass: the walker descends the params type, looks up each field
//! in the request data, runs the field rules and converts the value to the field type.
//!
//! The defining feature of `smart-bind` is its schema-driven design. Each params type has associated
//! [metadata](metadata::StructMetadata) defined with the help of the [`Bind`](macro@Bind) derive macro. Metadata includes:
//!
//! - Field names for each [namespace](metadata::Namespace) (`form`, `json` and `header`), together with default values.
//! - [Rule chains](rules) parsed at compile time. Unknown rules and malformed chains are compile errors.
//! - Custom error messages, patterns for the `regex` rule and timestamp parsing options.
//!
//! The first failing rule stops binding and is reported as a [`ValidationError`] carrying the param name,
//! the rule name and a message which can be customized per rule. Misconfigured schemas (e.g., a `dive` applied
//! to a string) are reported as [`SchemaError`]s; these are programming errors and are never converted to responses.
//!
//! # Examples
//!
//! ## Binding JSON
//!
//! ```
//! use smart_bind::{Bind, testing};
//!
//! #[derive(Debug, Default, Bind)]
//! pub struct CreateUser {
//!     #[bind(json = "name", binding = "required,min=3,max=16")]
//!     pub name: String,
//!     #[bind(json = "age,default=18", binding = "gte=0,lte=150")]
//!     pub age: u32,
//!     #[bind(json = "emails", binding = "omitempty,dive,email")]
//!     pub emails: Vec<String>,
//! }
//!
//! let user: CreateUser = testing::bind_json(serde_json::json!({
//!     "name": "alice",
//!     "emails": ["alice@example.com"],
//! }))?;
//! assert_eq!(user.name, "alice");
//! assert_eq!(user.age, 18);
//!
//! let err = testing::bind_json::<CreateUser>(serde_json::json!({ "name": "al" })).unwrap_err();
//! assert_eq!(err.rule_name(), "min");
//! assert_eq!(err.to_string(), "the param name is not valid");
//! # anyhow::Ok(())
//! ```
//!
//! ## Binding HTTP requests
//!
//! ```
//! use smart_bind::{Bind, RequestExt};
//!
//! #[derive(Debug, Default, Bind)]
//! pub struct SearchParams {
//!     #[bind(form = "q", binding = "required", msg = "required='query is required'")]
//!     pub query: String,
//!     #[bind(form = "page,default=1", binding = "min=1")]
//!     pub page: u32,
//! }
//!
//! let request = http::Request::get("/search?q=rust").body(())?;
//! let mut params = SearchParams::default();
//! request.valid(&mut params)?;
//! assert_eq!(params.query, "rust");
//! assert_eq!(params.page, 1);
//!
//! let request = http::Request::get("/search").body(())?;
//! let err = request.valid(&mut SearchParams::default()).unwrap_err();
//! assert_eq!(err.to_string(), "query is required");
//! # anyhow::Ok(())
//! ```

// Documentation settings
#![doc(html_root_url = "https://docs.rs/smart-bind/0.1.0")] // x-release-please-version
#![cfg_attr(docsrs, feature(doc_cfg))]
// Linter settings
#![warn(missing_docs)]

/// Derives the [`DescribeParams`](trait@DescribeParams) and [`Bind`](trait@Bind) traits for a struct.
///
/// # Container attributes
///
/// ## `crate`
///
/// **Type:** path
///
/// Path to the `smart_bind` crate. Useful if the crate is re-exported.
///
/// # Field attributes
///
/// ## `form`, `json`, `header`
///
/// **Type:** string
///
/// Name of the field in the corresponding [namespace](metadata::Namespace), optionally followed
/// by comma-separated options. The only supported option is `default=VALUE`. If the name is absent or empty,
/// the Rust field name is used. The `-` name skips rules declared on the field.
///
/// ## `binding`
///
/// **Type:** string
///
/// Comma-separated [rule chain](rules), e.g. `required,min=3`.
///
/// ## `msg`
///
/// **Type:** string
///
/// Custom error message. Either a single message applied to all rules, or a list of `rule='message'` entries
/// with an optional `default='message'` fallback. Rules inherited through `dive` are prefixed with `>`
/// (one char per level), e.g. `>min='each tag must be longer'`.
///
/// ## `pattern`
///
/// **Type:** string
///
/// Regular expression for the `regex` rule.
///
/// ## `time_format`, `time_utc`, `time_location`
///
/// Timestamp parsing options; see [`TimeOptions`](metadata::TimeOptions).
///
/// ## `flatten`
///
/// Embeds a nested struct without adding a segment to the data path.
pub use smart_bind_derive::Bind;

pub use self::{
    binding::{Binder, Binding, BindOptions, BodyBinding, BodyCache, RequestBody, RequestExt},
    error::{BindError, CODE_PARAMS_ERR, ErrorKind, SchemaError, SchemaErrorKind, ValidationError},
    field::Field,
    walk::{Outcome, Step, Walker, bind_source},
};
use crate::metadata::{Shape, StructMetadata};

mod binding;
mod error;
mod field;
pub mod metadata;
pub mod rules;
pub mod source;
pub mod testing;
#[cfg(test)]
mod testonly;
mod time;
mod utils;
mod walk;

/// Describes a params type, i.e. a struct which request data is bound to.
pub trait DescribeParams: 'static {
    /// Provides the params description.
    const DESCRIPTION: StructMetadata;

    /// Returns a reference to the params description with a `'static` lifetime.
    fn metadata() -> &'static StructMetadata;
}

/// Type that request data can be bound to.
///
/// This trait is implemented for scalars (booleans, integers, floats and strings), sequences (`Vec`), maps with string keys,
/// `Option`s, `Box`es, timestamps ([`chrono::DateTime`]), uploaded files ([`FilePart`](source::FilePart))
/// and untyped JSON values. For structs, it can be derived using the [`Bind`](macro@Bind) macro.
pub trait Bind: Default + 'static {
    /// Returns the shape of this type.
    fn shape() -> Shape;

    /// Binds request data at the position specified by `step`.
    ///
    /// # Errors
    ///
    /// Returns an error if request data fails to bind or to pass validation.
    fn bind(&mut self, walker: &Walker<'_>, step: &Step) -> Result<Outcome, BindError>;
}
