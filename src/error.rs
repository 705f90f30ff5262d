//! Unified error type.

use thiserror::Error;

/// A boxed application error, the currency handlers and providers use to
/// report failures of their own.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by burrow's fallible operations.
///
/// Routing misses are not errors: they become a `404` response. This type
/// covers configuration mistakes (duplicate routes, unknown services),
/// infrastructure failures (binding, reading a body) and failures reported
/// by handlers.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{0}`")]
    InvalidAddr(String),

    /// A route with the same shape is already registered for the method.
    #[error("route already exists: {0}")]
    RouteExists(String),

    #[error("request body: {0}")]
    Body(#[from] hyper::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("service `{0}` not found")]
    ServiceNotFound(String),

    /// The service exists but is not of the requested type.
    #[error("service `{0}` has an unexpected type")]
    ServiceType(String),

    /// A provider's boot step or factory failed.
    #[error("service `{name}` failed to start: {source}")]
    Provider {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Handler(BoxError),
}

impl Error {
    /// Wraps an application error so it can be returned from a handler.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }
}
