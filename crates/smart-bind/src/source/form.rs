//! Form-backed request data.

use std::collections::BTreeMap;

use http::HeaderMap;

use super::{Node, Source, SourceKind};
use crate::utils::canonical_header_key;

/// File uploaded as a part of a multipart form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePart {
    /// Name of the form field.
    pub field_name: String,
    /// Original file name, if specified by the client.
    pub filename: Option<String>,
    /// Content type, if specified by the client.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Vec<u8>,
}

impl FilePart {
    /// Returns the size of the file in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Flat multimap of form values and uploaded files, used for URL-encoded forms, multipart forms,
/// query strings and headers.
///
/// Each key maps to a list of values; a bound field of a scalar type takes the value only if it's the only value
/// for the key. If a key is present both among values and files, files take precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    values: BTreeMap<String, Vec<String>>,
    files: BTreeMap<String, Vec<FilePart>>,
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut this = Self::default();
        this.extend(iter);
        this
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for FormData {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.append(key, value);
        }
    }
}

impl FormData {
    /// Parses URL-encoded data, such as a query string or an `application/x-www-form-urlencoded` body.
    pub fn from_urlencoded(input: &[u8]) -> Self {
        let mut this = Self::default();
        this.extend_urlencoded(input);
        this
    }

    /// Collects header values. Header names are converted to the canonical form, e.g. `x-request-id` -> `X-Request-Id`.
    /// Values that are not valid UTF-8 are converted lossily.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .iter()
            .map(|(name, value)| {
                let key = canonical_header_key(name.as_str());
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                (key, value)
            })
            .collect()
    }

    /// Adds URL-encoded data to this form.
    pub fn extend_urlencoded(&mut self, input: &[u8]) {
        self.extend(url::form_urlencoded::parse(input));
    }

    /// Appends a value for the specified key.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Appends a file. The file is stored under its [field name](FilePart::field_name).
    pub fn append_file(&mut self, file: FilePart) {
        self.files.entry(file.field_name.clone()).or_default().push(file);
    }

    /// Returns values for the specified key.
    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(Vec::as_slice)
    }

    /// Returns files for the specified key.
    pub fn files(&self, key: &str) -> Option<&[FilePart]> {
        self.files.get(key).map(Vec::as_slice)
    }

    /// Iterates over all value keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.values.keys().map(String::as_str)
    }

    /// Checks whether this form has neither values nor files.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.files.is_empty()
    }

    pub(super) fn get(&self, key: &str) -> Option<Node<'_>> {
        if let Some(files) = self.files.get(key) {
            return Some(Node::Files(files));
        }
        self.values.get(key).map(|values| Node::Values(values))
    }
}

impl Source for FormData {
    fn kind(&self) -> SourceKind {
        SourceKind::Form
    }

    fn root(&self) -> Option<Node<'_>> {
        Some(Node::Form(self))
    }
}
