use std::error::Error as StdError;

use plcall_core::BlobFormat;

/// Errors raised while running a call plan.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A request or driver value does not fit the slot's kind.
    #[error("{path}: expected {expected}, found {found}")]
    Convert {
        path: String,
        expected: &'static str,
        found: String,
    },

    /// The driver reported a failure.
    #[error("driver error")]
    Driver(#[source] Box<dyn StdError + Send + Sync>),

    /// A bind was not in the state the plan expects.
    #[error("bind {index}: {message}")]
    Bind { index: usize, message: String },

    #[error("call cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{format:?} blob: {message}")]
    Blob { format: BlobFormat, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    pub fn driver(source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self::Driver(source.into())
    }

    pub fn convert(path: impl Into<String>, expected: &'static str, found: impl Into<String>) -> Self {
        Self::Convert {
            path: path.into(),
            expected,
            found: found.into(),
        }
    }

    pub(crate) fn blob(format: BlobFormat, message: impl ToString) -> Self {
        Self::Blob {
            format,
            message: message.to_string(),
        }
    }
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
