//! Template layer error types.

use thiserror::Error;

use crate::dom::{HostError, NodeId};

/// Errors surfaced by [`Templates`](super::Templates) operations.
///
/// Host engine failures pass through untouched.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error("template lists differ after cloning: {expected} in source, {found} in clone")]
    CloneMismatch { expected: usize, found: usize },

    #[error("template {0:?} has no content fragment")]
    MissingContent(NodeId),
}
