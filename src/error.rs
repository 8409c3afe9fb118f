//! Error types for the registry, the compiler and evaluation
//!
//! Evaluation errors share one enum. The skip signal is the [`Error::Yield`]
//! variant; combinators that annotate errors wrap them in [`Error::Context`],
//! and [`Error::is_yield`] still recognizes the signal underneath.

use thiserror::Error;

/// Result of evaluating an operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors returned while evaluating a compiled tree.
#[derive(Debug, Error)]
pub enum Error {
    /// Omit the current value. Absorbed by `each` per element and by the
    /// guard path of `list`; propagated everywhere else.
    #[error("yield")]
    Yield,

    #[error("cannot convert {value} to {kind}")]
    Convert { kind: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),

    #[error("evaluation cancelled")]
    Cancelled,

    #[error("evaluation deadline exceeded")]
    DeadlineExceeded,

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error("{message}: {source}")]
    Context {
        message: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::Invalid(message.into())
    }

    /// Wrap this error with a message, keeping it as the source.
    pub fn context(self, message: impl Into<String>) -> Self {
        Error::Context {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// True when this error is, or wraps, the skip signal.
    pub fn is_yield(&self) -> bool {
        match self {
            Error::Yield => true,
            Error::Context { source, .. } => source.is_yield(),
            _ => false,
        }
    }
}

/// Adds `.context(..)` to evaluation results.
pub trait ResultExt<T> {
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(message))
    }
}

/// Registry name validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("invalid operation name `{0}`")]
    InvalidName(String),
}

/// Compilation failure. Every variant except `Load` names the document path
/// of the node that caused it.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{path}: unknown operation `{name}`")]
    UnknownOperation { path: String, name: String },

    #[error("{path}: cannot build `{name}`: {source}")]
    Construct {
        path: String,
        name: String,
        #[source]
        source: Error,
    },

    #[error("{path}: unsupported node: {kind}")]
    Unsupported { path: String, kind: String },

    #[error("{path}: document nested deeper than {limit} levels")]
    TooDeep { path: String, limit: usize },

    #[error("failed to load document: {0}")]
    Load(String),
}

impl From<serde_yaml::Error> for CompileError {
    fn from(e: serde_yaml::Error) -> Self {
        CompileError::Load(e.to_string())
    }
}

impl From<serde_json::Error> for CompileError {
    fn from(e: serde_json::Error) -> Self {
        CompileError::Load(e.to_string())
    }
}
