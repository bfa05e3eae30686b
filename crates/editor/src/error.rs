use journaly_document::{ApplyError, ValueError};

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to apply edit: {0}")]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Document(#[from] ValueError),
    #[error("failed to read file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("invalid editor settings: {0}")]
    Settings(#[from] serde_json::Error),
    #[error("unknown command kind: {0}")]
    UnknownCommandKind(String),
}

/// What a dispatched command did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// The user dismissed a prompt or picker.
    Cancelled,
    /// The supplied URL was rejected and the host was notified.
    InvalidUrl,
    /// Nothing to do for this format or state.
    Ignored,
}
