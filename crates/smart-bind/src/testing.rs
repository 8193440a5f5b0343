//! Testing tools for params types.
//!
//! The helpers bind request data directly from documents, without constructing HTTP requests.
//! All helpers panic on [schema errors](crate::SchemaError) since these signal a broken params type
//! rather than invalid data.

use http::HeaderMap;
use serde_json::Value;

use crate::{
    Bind, BindError, DescribeParams, ValidationError, metadata::Namespace, source::FormData,
    walk::bind_source,
};

#[track_caller]
fn bind<T: DescribeParams + Bind>(
    source: &dyn crate::source::Source,
    namespace: Namespace,
) -> Result<T, ValidationError> {
    let mut params = T::default();
    bind_source(source, namespace, &mut params).map_err(BindError::into_validation)?;
    Ok(params)
}

/// Binds a JSON document to params of the specified type.
///
/// # Errors
///
/// Returns an error if the document fails to bind or to pass validation.
///
/// # Panics
///
/// Panics if the binding schema of `T` is invalid.
///
/// # Examples
///
/// ```
/// # use smart_bind::{testing, Bind};
/// #[derive(Debug, Default, Bind)]
/// struct Pagination {
///     #[bind(json = "limit,default=20", binding = "min=1,max=100")]
///     limit: u32,
///     #[bind(json = "offset")]
///     offset: u64,
/// }
///
/// let params: Pagination = testing::bind_json(serde_json::json!({ "offset": 40 }))?;
/// assert_eq!(params.limit, 20);
/// assert_eq!(params.offset, 40);
/// # anyhow::Ok(())
/// ```
#[track_caller]
pub fn bind_json<T: DescribeParams + Bind>(document: Value) -> Result<T, ValidationError> {
    bind(&document, Namespace::Json)
}

/// Binds form data (e.g., created with the [`form!`](crate::form!) macro) to params of the specified type.
///
/// # Errors
///
/// Returns an error if the form fails to bind or to pass validation.
///
/// # Panics
///
/// Panics if the binding schema of `T` is invalid.
///
/// # Examples
///
/// ```
/// # use smart_bind::{form, testing, Bind};
/// #[derive(Debug, Default, Bind)]
/// struct Filter {
///     #[bind(form = "tag", binding = "dive,alpha")]
///     tags: Vec<String>,
/// }
///
/// let filter: Filter = testing::bind_form(form!("tag": ["rust", "http"]))?;
/// assert_eq!(filter.tags, ["rust", "http"]);
///
/// let err = testing::bind_form::<Filter>(form!("tag": ["rust", "h2"])).unwrap_err();
/// assert_eq!(err.path(), "tag[1]");
/// # anyhow::Ok(())
/// ```
#[track_caller]
pub fn bind_form<T: DescribeParams + Bind>(form: FormData) -> Result<T, ValidationError> {
    bind(&form, Namespace::Form)
}

/// Binds headers to params of the specified type.
///
/// # Errors
///
/// Returns an error if the headers fail to bind or to pass validation.
///
/// # Panics
///
/// Panics if the binding schema of `T` is invalid.
#[track_caller]
pub fn bind_header<T: DescribeParams + Bind>(headers: &HeaderMap) -> Result<T, ValidationError> {
    bind(&FormData::from_headers(headers), Namespace::Header)
}
