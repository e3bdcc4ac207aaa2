use thiserror::Error;

use crate::resolve::ResolutionError;
use crate::transport::TransportError;

/// Errors that end a reconciliation pass.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Desired state references an object the manager does not have.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    /// `flush` was asked to update a rule that was never matched.
    #[error("firewall rule '{rule}' was not found for update")]
    MissingTarget { rule: String },
    /// The matched rule carries no identifier to address the update to.
    #[error("firewall rule '{rule}' has no id; cannot update it")]
    MissingIdentifier { rule: String },
    /// The matched rule's identifier cannot be used as a request path segment.
    #[error("firewall rule '{rule}' has an unusable id '{id}'")]
    InvalidIdentifier { rule: String, id: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A fetched document did not have the expected shape.
    #[error("unexpected {what} document: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode firewall rule '{rule}': {source}")]
    Encode {
        rule: String,
        #[source]
        source: serde_json::Error,
    },
}
