//! Request-level helpers.

use std::{borrow::Cow, fmt, io};

use http::{Request, header};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use super::{Binding, BodyBinding, RequestBody, read_error};
use crate::{
    Bind, DescribeParams,
    error::{BindError, ValidationError},
};

/// Extension trait for [`Request`]s binding request data to params.
///
/// Unlike [`Binding::bind()`], methods return [`ValidationError`]s directly so that they can be converted to responses.
///
/// # Panics
///
/// All methods panic if the binding schema of the params type is invalid. Such errors can be detected in advance using
/// [`StructMetadata::check_rules()`](crate::metadata::StructMetadata::check_rules()).
pub trait RequestExt {
    /// Binds request data selecting the binding by the request method and content type
    /// (see [`Binding::for_request()`]).
    ///
    /// # Errors
    ///
    /// Returns an error if request data fails to bind or to pass validation.
    fn valid<T: DescribeParams + Bind>(&self, dest: &mut T) -> Result<(), ValidationError>;

    /// Binds request data using the specified binding.
    ///
    /// # Errors
    ///
    /// Returns an error if request data fails to bind or to pass validation.
    fn valid_with<T: DescribeParams + Bind>(
        &self,
        binding: Binding,
        dest: &mut T,
    ) -> Result<(), ValidationError>;

    /// Binds a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if request data fails to bind or to pass validation.
    fn valid_json<T: DescribeParams + Bind>(&self, dest: &mut T) -> Result<(), ValidationError> {
        self.valid_with(Binding::Json, dest)
    }

    /// Binds the query string.
    ///
    /// # Errors
    ///
    /// Returns an error if request data fails to bind or to pass validation.
    fn valid_query<T: DescribeParams + Bind>(&self, dest: &mut T) -> Result<(), ValidationError> {
        self.valid_with(Binding::Query, dest)
    }

    /// Binds headers.
    ///
    /// # Errors
    ///
    /// Returns an error if request data fails to bind or to pass validation.
    fn valid_header<T: DescribeParams + Bind>(&self, dest: &mut T) -> Result<(), ValidationError> {
        self.valid_with(Binding::Header, dest)
    }
}

impl<B: RequestBody> RequestExt for Request<B> {
    fn valid<T: DescribeParams + Bind>(&self, dest: &mut T) -> Result<(), ValidationError> {
        let content_type = self
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok());
        let binding = Binding::for_request(self.method(), content_type);
        self.valid_with(binding, dest)
    }

    #[track_caller]
    fn valid_with<T: DescribeParams + Bind>(
        &self,
        binding: Binding,
        dest: &mut T,
    ) -> Result<(), ValidationError> {
        binding.bind(self, dest).map_err(BindError::into_validation)
    }
}

/// Request body read from a reader at most once. Can be bound multiple times, e.g. to different params types
/// or by both a logging middleware and a handler.
pub struct BodyCache<R> {
    reader: Mutex<Option<R>>,
    bytes: OnceCell<Vec<u8>>,
}

impl<R> fmt::Debug for BodyCache<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BodyCache")
            .field("len", &self.bytes.get().map(Vec::len))
            .finish_non_exhaustive()
    }
}

impl<R: io::Read> BodyCache<R> {
    /// Wraps the specified reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
            bytes: OnceCell::new(),
        }
    }

    /// Returns the body, reading it if necessary.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the body cannot be read. The error is sticky: after a failed read,
    /// all subsequent calls fail.
    pub fn bytes(&self) -> io::Result<&[u8]> {
        let bytes = self.bytes.get_or_try_init(|| {
            let mut reader = self.reader.lock().take().ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "body reader failed previously")
            })?;
            let mut bytes = vec![];
            reader.read_to_end(&mut bytes)?;
            tracing::trace!(len = bytes.len(), "cached request body");
            Ok::<_, io::Error>(bytes)
        })?;
        Ok(bytes)
    }

    /// Binds the cached body to `dest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be read, or fails to bind or to pass validation.
    ///
    /// # Panics
    ///
    /// Panics if the binding schema of `T` is invalid.
    #[track_caller]
    pub fn bind_body_with<T: DescribeParams + Bind>(
        &self,
        binding: BodyBinding,
        dest: &mut T,
    ) -> Result<(), ValidationError> {
        let body = self.bytes().map_err(read_error)?;
        binding.bind_body(body, dest).map_err(BindError::into_validation)
    }
}

impl<R: io::Read> RequestBody for BodyCache<R> {
    fn read_body(&self) -> io::Result<Option<Cow<'_, [u8]>>> {
        self.bytes().map(|bytes| Some(Cow::Borrowed(bytes)))
    }
}
