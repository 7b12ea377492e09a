use thiserror::Error;

use crate::protocol::{ErrorCategory, ProtocolDiag};

/// Errors surfaced by the binding/execution core.
#[derive(Debug, Error)]
pub enum WirebindError {
    /// Invalid binder setup, detected at bind or descriptor-assembly time.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A protocol call failed. Carries the operation context plus the
    /// collaborator's own diagnostic text.
    #[error("{context} - {source}")]
    ProtocolError {
        context: String,
        source: ProtocolDiag,
    },

    /// Caller or wire contract violation while exchanging data.
    #[error("Data error: {0}")]
    DataError(String),

    /// Driver usage-contract violation (wrong lifecycle order).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl WirebindError {
    pub(crate) fn protocol(context: impl Into<String>, source: ProtocolDiag) -> Self {
        WirebindError::ProtocolError {
            context: context.into(),
            source,
        }
    }

    /// Whether the underlying protocol diagnostic reports a lost session
    /// rather than a statement-level failure.
    #[must_use]
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            WirebindError::ProtocolError { source, .. }
                if source.category() == ErrorCategory::Connection
        )
    }
}
