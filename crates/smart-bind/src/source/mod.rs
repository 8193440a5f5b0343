//! Request data sources.
//!
//! A [`Source`] exposes request data as a tree of [`Node`]s addressed by [`Path`]s. There are two backends:
//! JSON documents ([`serde_json::Value`]) and flat forms ([`FormData`]) used for URL-encoded and multipart forms,
//! query strings and headers.

use std::fmt;

pub use self::{
    form::{FilePart, FormData},
    path::{Path, Segment},
};

#[macro_use]
mod macros;
mod form;
mod json;
mod path;

/// Kind of a [`Source`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Flat form data.
    Form,
    /// JSON document.
    Json,
}

/// Node in request data.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub enum Node<'a> {
    /// Non-null JSON value.
    Json(&'a serde_json::Value),
    /// Entire form.
    Form(&'a FormData),
    /// All values for a form key.
    Values(&'a [String]),
    /// Single form value.
    Text(&'a str),
    /// All files for a form key.
    Files(&'a [FilePart]),
    /// Single file.
    File(&'a FilePart),
}

impl<'a> Node<'a> {
    /// Returns a child node. JSON nulls are treated as absent values.
    pub fn child(self, segment: &Segment) -> Option<Self> {
        match (self, segment) {
            (Self::Json(value), Segment::Key(key)) => value.get(key.as_str()).and_then(Self::json),
            (Self::Json(value), Segment::Index(index)) => value.get(*index).and_then(Self::json),
            (Self::Form(form), Segment::Key(key)) => form.get(key),
            (Self::Values(values), Segment::Index(index)) => {
                values.get(*index).map(|value| Self::Text(value))
            }
            (Self::Files(files), Segment::Index(index)) => files.get(*index).map(Self::File),
            _ => None,
        }
    }

    fn json(value: &'a serde_json::Value) -> Option<Self> {
        (!value.is_null()).then_some(Self::Json(value))
    }
}

/// Source of request data.
pub trait Source: fmt::Debug {
    /// Returns the kind of this source.
    fn kind(&self) -> SourceKind;

    /// Returns the root node, or `None` if the source is empty.
    fn root(&self) -> Option<Node<'_>>;

    /// Resolves a node at the specified path.
    fn resolve(&self, path: &Path) -> Option<Node<'_>> {
        path.segments()
            .iter()
            .try_fold(self.root()?, |node, segment| node.child(segment))
    }
}
