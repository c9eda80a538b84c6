//! Host tree engine error types.

use thiserror::Error;

use super::NodeId;

/// Failures raised by the host tree engine itself.
///
/// The template layer never invents new variants of these; it forwards them.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("markup parse error at position {position}: {message}")]
    Parse { position: u64, message: String },

    #[error("hierarchy request error: {0}")]
    HierarchyRequest(&'static str),

    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("node {0:?} has no parent")]
    Detached(NodeId),

    #[error("document {0:?} has no body element")]
    MissingBody(NodeId),

    #[error("instance accessors cannot be defined on this engine")]
    AccessorRestricted,

    #[error("failed to write markup: {0}")]
    Write(String),

    #[error("serialized markup is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_error_display() {
        let err = HostError::Parse {
            position: 12,
            message: "unexpected end".into(),
        };
        let display = format!("{err}");
        assert!(display.contains("position 12"));
        assert!(display.contains("unexpected end"));

        let err = HostError::HierarchyRequest("cannot insert a document");
        assert!(format!("{err}").contains("cannot insert a document"));
    }
}
