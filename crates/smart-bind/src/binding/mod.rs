//! Binders reading request data from HTTP requests.
//!
//! A [`Binding`] selects where request data is taken from and which name attributes are used to look up fields:
//!
//! | Binding | Data | Namespace |
//! |:--------|:-----|:----------|
//! | [`Json`](Binding::Json) | JSON body | `json` |
//! | [`Form`](Binding::Form) | query string + URL-encoded or multipart body | `form` |
//! | [`FormMultipart`](Binding::FormMultipart) | multipart body (values and files) | `form` |
//! | [`Query`](Binding::Query) | query string | `form` |
//! | [`Header`](Binding::Header) | headers | `header` |
//!
//! Failures not attributable to a single field (e.g., a body that is not valid JSON) are reported as
//! [global](crate::ErrorKind::Global) validation errors.

use std::{borrow::Cow, io};

use http::{Method, Request, header};
use serde::Deserialize;

pub use self::context::{BodyCache, RequestExt};
use crate::{
    Bind, DescribeParams,
    error::{BindError, ValidationError},
    metadata::Namespace,
    source::{FormData, Source},
    walk::bind_source,
};

mod context;
mod multipart;
#[cfg(test)]
mod tests;

const INVALID_REQUEST: &str = "invalid request";
const READ_FAILED: &str = "read request data failed";
const INVALID_JSON: &str = "request data is not valid json";
const INVALID_DATA: &str = "request data not valid";

/// Request body that can be read by binders.
pub trait RequestBody {
    /// Reads the body. Returns `Ok(None)` if the request has no body.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the body cannot be read.
    fn read_body(&self) -> io::Result<Option<Cow<'_, [u8]>>>;
}

impl RequestBody for () {
    fn read_body(&self) -> io::Result<Option<Cow<'_, [u8]>>> {
        Ok(None)
    }
}

impl RequestBody for Vec<u8> {
    fn read_body(&self) -> io::Result<Option<Cow<'_, [u8]>>> {
        Ok(Some(Cow::Borrowed(self)))
    }
}

impl RequestBody for &[u8] {
    fn read_body(&self) -> io::Result<Option<Cow<'_, [u8]>>> {
        Ok(Some(Cow::Borrowed(self)))
    }
}

impl RequestBody for String {
    fn read_body(&self) -> io::Result<Option<Cow<'_, [u8]>>> {
        Ok(Some(Cow::Borrowed(self.as_bytes())))
    }
}

impl RequestBody for &str {
    fn read_body(&self) -> io::Result<Option<Cow<'_, [u8]>>> {
        Ok(Some(Cow::Borrowed(self.as_bytes())))
    }
}

impl<B: RequestBody> RequestBody for Option<B> {
    fn read_body(&self) -> io::Result<Option<Cow<'_, [u8]>>> {
        match self {
            Some(body) => body.read_body(),
            None => Ok(None),
        }
    }
}

/// Options for binders.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct BindOptions {
    /// Maximum size of a multipart body in bytes. The default is 32 MiB.
    pub max_memory: usize,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            max_memory: 32 << 20,
        }
    }
}

impl BindOptions {
    /// Sets the maximum size of a multipart body.
    #[must_use]
    pub fn with_max_memory(mut self, max_memory: usize) -> Self {
        self.max_memory = max_memory;
        self
    }
}

/// Binder reading request data from a specific part of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    /// JSON body.
    Json,
    /// Query string merged with a URL-encoded or multipart body.
    Form,
    /// Multipart body.
    FormMultipart,
    /// Query string.
    Query,
    /// Headers.
    Header,
}

impl Binding {
    /// Returns the name of this binding.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Form | Self::FormMultipart => "form",
            Self::Query => "query",
            Self::Header => "header",
        }
    }

    /// Returns the namespace used by this binding to look up fields.
    pub const fn namespace(self) -> Namespace {
        match self {
            Self::Json => Namespace::Json,
            Self::Form | Self::FormMultipart | Self::Query => Namespace::Form,
            Self::Header => Namespace::Header,
        }
    }

    /// Selects a binding based on the request method and content type: `GET` requests and bodies
    /// of unknown types are bound as forms.
    pub fn for_request(method: &Method, content_type: Option<&str>) -> Self {
        if method == Method::GET {
            return Self::Form;
        }
        match content_type.map(multipart::media_type).as_deref() {
            Some("application/json") => Self::Json,
            Some("multipart/form-data") => Self::FormMultipart,
            _ => Self::Form,
        }
    }

    /// Binds the request data to `dest` using default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the request data fails to bind or to pass validation, or if the binding schema
    /// of `T` is invalid.
    pub fn bind<T, B>(self, request: &Request<B>, dest: &mut T) -> Result<(), BindError>
    where
        T: DescribeParams + Bind,
        B: RequestBody,
    {
        Binder::default().bind(self, request, dest)
    }
}

/// Binding for request bodies that were read beforehand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyBinding {
    /// JSON body.
    Json,
    /// URL-encoded body.
    Form,
}

impl BodyBinding {
    /// Binds request data from `body` to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed, or if it fails to bind or to pass validation.
    #[tracing::instrument(level = "debug", skip_all, fields(binding = ?self, body.len = body.len()))]
    pub fn bind_body<T: DescribeParams + Bind>(self, body: &[u8], dest: &mut T) -> Result<(), BindError> {
        match self {
            Self::Json => bind_json(body, dest),
            Self::Form => bind_source(&FormData::from_urlencoded(body), Namespace::Form, dest),
        }
    }

    /// Reads the body from `reader` and binds it to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be read, or if [`Self::bind_body()`] fails.
    pub fn bind_reader<T: DescribeParams + Bind>(
        self,
        mut reader: impl io::Read,
        dest: &mut T,
    ) -> Result<(), BindError> {
        let mut body = vec![];
        reader.read_to_end(&mut body).map_err(read_error)?;
        self.bind_body(&body, dest)
    }
}

/// Binder with configurable [options](BindOptions).
#[derive(Debug, Clone, Default)]
pub struct Binder {
    options: BindOptions,
}

impl Binder {
    /// Creates a binder with the specified options.
    pub fn new(options: BindOptions) -> Self {
        Self { options }
    }

    /// Binds request data to `dest` using the specified binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the request data fails to bind or to pass validation, or if the binding schema
    /// of `T` is invalid.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(binding = binding.name(), method = %request.method(), uri = %request.uri())
    )]
    pub fn bind<T, B>(&self, binding: Binding, request: &Request<B>, dest: &mut T) -> Result<(), BindError>
    where
        T: DescribeParams + Bind,
        B: RequestBody,
    {
        match binding {
            Binding::Json => {
                let body = request.body().read_body().map_err(read_error)?;
                let body = body.ok_or_else(|| ValidationError::global(INVALID_REQUEST))?;
                bind_json(&body, dest)
            }
            Binding::Form => {
                let form = self.read_form(request)?;
                bind_source(&form, Namespace::Form, dest)
            }
            Binding::FormMultipart => {
                let form = self.read_multipart(request)?;
                bind_source(&form, Namespace::Form, dest)
            }
            Binding::Query => {
                let query = request.uri().query().unwrap_or_default();
                bind_source(&FormData::from_urlencoded(query.as_bytes()), Namespace::Form, dest)
            }
            Binding::Header => {
                bind_source(&FormData::from_headers(request.headers()), Namespace::Header, dest)
            }
        }
    }

    /// Collects body values followed by query values.
    fn read_form<B: RequestBody>(&self, request: &Request<B>) -> Result<FormData, ValidationError> {
        let content_type = content_type(request).map(multipart::media_type);
        let mut form = match content_type.as_deref() {
            Some("multipart/form-data") => self.read_multipart(request)?,
            Some("application/x-www-form-urlencoded") if has_form_body(request.method()) => {
                let body = request.body().read_body().map_err(read_error)?;
                FormData::from_urlencoded(body.as_deref().unwrap_or_default())
            }
            _ => FormData::default(),
        };
        if let Some(query) = request.uri().query() {
            form.extend_urlencoded(query.as_bytes());
        }
        Ok(form)
    }

    fn read_multipart<B: RequestBody>(&self, request: &Request<B>) -> Result<FormData, ValidationError> {
        let content_type = content_type(request).unwrap_or_default();
        let boundary = multipart::boundary(content_type)
            .map_err(|err| ValidationError::global(INVALID_DATA).with_cause(err))?;
        let body = request.body().read_body().map_err(read_error)?;
        let body = body.as_deref().unwrap_or_default();
        multipart::parse(body, boundary, self.options.max_memory).map_err(|err| {
            tracing::debug!(%err, "failed parsing multipart body");
            ValidationError::global(INVALID_DATA).with_cause(err)
        })
    }
}

fn content_type<B>(request: &Request<B>) -> Option<&str> {
    request.headers().get(header::CONTENT_TYPE)?.to_str().ok()
}

fn has_form_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

fn read_error(err: io::Error) -> ValidationError {
    tracing::debug!(%err, "failed reading request body");
    ValidationError::global(READ_FAILED).with_cause(err)
}

/// Binds a JSON body. An empty body is bound as an empty document, so that only required fields fail.
fn bind_json<T: DescribeParams + Bind>(body: &[u8], dest: &mut T) -> Result<(), BindError> {
    let document = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(body)
            .map_err(|err| ValidationError::global(INVALID_JSON).with_cause(err))?
    };
    bind_source(&document as &dyn Source, Namespace::Json, dest)
}
