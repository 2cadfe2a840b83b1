use std::error::Error as StdError;

/// Errors raised by the compiler pipeline.
///
/// The function-scoped variants ([`Error::is_skippable`]) cost one function;
/// everything else aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No catalog object matches any shape of the reference.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Recognized, but not representable (e.g. a collection keyed by text).
    #[error("{name}: not supported: {reason}")]
    NotSupported { name: String, reason: String },

    #[error("{function}: table argument {argument:?} has no element type")]
    MissingElementType { function: String, argument: String },

    /// Catalog rows contradict each other (orphan child, level jump, ...).
    #[error("inconsistent catalog rows: {0}")]
    InternalConsistency(String),

    #[error("catalog query {query:?} failed")]
    Catalog {
        query: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("directive line {line}: {message}")]
    Directive { line: usize, message: String },

    #[error("catalog rows: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("type snapshot: {0}")]
    Snapshot(String),
}

impl Error {
    pub fn not_supported(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotSupported {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn catalog(
        query: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Catalog {
            query: query.into(),
            source: source.into(),
        }
    }

    /// Whether the error only invalidates the function being processed.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::UnknownType(_) | Self::NotSupported { .. } | Self::MissingElementType { .. }
        )
    }
}

/// Result type for compiler operations.
pub type Result<T> = std::result::Result<T, Error>;
