//! Error types for the query facade
//!
//! Markup parse errors never show up here: loading always degrades to a
//! best-effort tree. Everything else propagates to the caller as is.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Input to a load/translate entry point is not usable text
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Local path does not exist and does not look like a remote URI
    #[error("file {0} not found")]
    NotFound(String),

    #[error("could not load {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Outer replacement fragment parsed to more than one root node
    #[error("fragment must have exactly one root node")]
    InvalidFragment,

    /// The CSS-to-XPath converter is not available in this build
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unrecognized or read-only pseudo-property
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid query {query:?}: {reason}")]
    Query { query: String, reason: String },

    /// The handle's document has been dropped or reloaded
    #[error("node handle is detached from its document")]
    Detached,
}

impl Error {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
