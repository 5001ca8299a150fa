//! Error types for substitute creation.

use core::result::Result as CoreResult;

use thiserror::Error;

/// Result type for proxy operations.
pub type Result<T> = CoreResult<T, ProxyError>;

/// Errors raised while creating a substitute.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Engine error
    #[error(transparent)]
    Core(#[from] surrogate_core::Error),

    /// A partial substitute was requested for a type without real implementations.
    #[error("Cannot create a partial substitute for {0}: it has no implementation to call")]
    NoImplementation(&'static str),

    /// The proxy factory could not produce a proxy.
    #[error("Proxy generation failed: {0}")]
    Generation(String),
}
