//! Unified error types.

/// Boxed error returned by filters and actions that fail mid-chain.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type returned by castor's fallible operations.
///
/// Application-level failures (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// bootstrap misconfiguration, socket failures, and middleware that gave up
/// on a request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    /// A filter or action returned `Err` while a chain was running. Only the
    /// request that hit it is affected.
    #[error("middleware `{step}` failed: {source}")]
    Middleware {
        step: String,
        #[source]
        source: BoxError,
    },
}

/// Misconfiguration detected while bootstrapping. Never raised per request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("controller `{controller}` references filter `{filter}`, which was never registered")]
    UnresolvedFilter { controller: String, filter: String },

    #[error("filter `{filter}` registered twice with different stateful instances")]
    DuplicateFilter { filter: String },

    #[error("filter `{filter}` on controller `{controller}` sets both `only` and `except`")]
    ConflictingScope { controller: String, filter: String },

    #[error("controller `{controller}` declares action `{action}` more than once")]
    DuplicateAction { controller: String, action: String },

    #[error("cannot register {method} `{path}`: {reason}")]
    InvalidRoute { method: String, path: String, reason: String },
}
