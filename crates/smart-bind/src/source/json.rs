use serde_json::Value;

use super::{Node, Source, SourceKind};

impl Source for Value {
    fn kind(&self) -> SourceKind {
        SourceKind::Json
    }

    fn root(&self) -> Option<Node<'_>> {
        (!self.is_null()).then_some(Node::Json(self))
    }
}
