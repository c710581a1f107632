//! Unified error types for poldiff.
//!
//! Fatal conditions abort a diff run and surface as [`PolicyDiffError`].
//! Recoverable conditions (rules naming unknown symbols, unsupported
//! conditional expressions) never become errors; they are collected as
//! [`DiffWarning`](crate::diff::DiffWarning)s next to the result.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for poldiff operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum PolicyDiffError {
    /// The inputs cannot be diffed at all
    #[error("Invalid diff input: {context}")]
    FatalInput {
        context: String,
        #[source]
        source: FatalInputKind,
    },

    /// An allocation for a lookup index could not be satisfied
    #[error("Resources exhausted: {context}")]
    ResourceExhausted { context: String },

    /// Errors while loading a policy snapshot
    #[error("Failed to parse policy snapshot: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Reasons a diff run refuses to start.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FatalInputKind {
    #[error("'{kind}' requires MLS data but neither policy is MLS-enabled")]
    MlsKindOnNonMlsPolicies { kind: String },

    #[error("invalid type remap: {reason}")]
    InvalidTypeRemap { reason: String },

    #[error("type '{name}' is not a primary type of the {side} policy")]
    UnknownType { name: String, side: String },

    #[error("inconsistent policy: {reason}")]
    InvalidPolicy { reason: String },
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Invalid YAML structure: {0}")]
    InvalidYaml(String),

    #[error("Invalid field value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Snapshot too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for poldiff operations
pub type Result<T> = std::result::Result<T, PolicyDiffError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl PolicyDiffError {
    /// Create a fatal input error with context
    pub fn fatal(context: impl Into<String>, source: FatalInputKind) -> Self {
        Self::FatalInput {
            context: context.into(),
            source,
        }
    }

    /// Create a resource exhaustion error
    pub fn exhausted(context: impl Into<String>) -> Self {
        Self::ResourceExhausted {
            context: context.into(),
        }
    }

    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error aborted a run because of its inputs.
    #[must_use]
    pub const fn is_fatal_input(&self) -> bool {
        matches!(self, Self::FatalInput { .. })
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for PolicyDiffError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for PolicyDiffError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(
            "JSON deserialization",
            ParseErrorKind::InvalidJson(err.to_string()),
        )
    }
}

impl From<serde_yaml::Error> for PolicyDiffError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::parse(
            "YAML deserialization",
            ParseErrorKind::InvalidYaml(err.to_string()),
        )
    }
}

impl From<std::collections::TryReserveError> for PolicyDiffError {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::exhausted(err.to_string())
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings chain outward, so an error raised deep inside index
/// construction reads `"diffing av rules: indexing modified policy: ..."`.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<PolicyDiffError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

fn add_context_to_error(err: PolicyDiffError, new_ctx: &str) -> PolicyDiffError {
    match err {
        PolicyDiffError::FatalInput {
            context: existing,
            source,
        } => PolicyDiffError::FatalInput {
            context: chain_context(new_ctx, &existing),
            source,
        },
        PolicyDiffError::ResourceExhausted { context: existing } => {
            PolicyDiffError::ResourceExhausted {
                context: chain_context(new_ctx, &existing),
            }
        }
        PolicyDiffError::Parse {
            context: existing,
            source,
        } => PolicyDiffError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        PolicyDiffError::Io {
            path,
            message,
            source,
        } => PolicyDiffError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        PolicyDiffError::Config(msg) => PolicyDiffError::Config(chain_context(new_ctx, &msg)),
        PolicyDiffError::Validation(msg) => {
            PolicyDiffError::Validation(chain_context(new_ctx, &msg))
        }
    }
}

fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to an error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;

    /// Convert None to an error with context from a closure.
    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| PolicyDiffError::Validation(context.into()))
    }

    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| PolicyDiffError::Validation(f().into()))
    }
}
