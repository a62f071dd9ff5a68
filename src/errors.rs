use thiserror::Error;

/// Failures of the split engine. Both are recoverable: the caller surfaces a
/// retry prompt instead of aborting the store form.
#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("invalid food item {name:?}: {reason}")]
    InvalidItem { name: String, reason: &'static str },

    /// The store-authoring session was finalized before the current user had
    /// been resolved from the identity provider. The caller must wait for the
    /// identity fetch and retry, never substitute a placeholder submitter.
    #[error("submitter identity is not resolved yet")]
    MissingSubmitter,
}

pub type Result<T> = std::result::Result<T, SplitError>;
