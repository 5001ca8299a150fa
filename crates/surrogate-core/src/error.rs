use core::error::Error as StdError;
use core::result::Result as CoreResult;
use std::io::Error as IoError;
use std::sync::Arc;

use thiserror::Error;
use toml::de::Error as TomlError;

use crate::collection::Quantity;

/// Result type for engine operations.
pub type Result<T> = CoreResult<T, Error>;

/// Outcome of a routed call: the value surfaced to the caller, or the error it raises.
pub type CallResult = CoreResult<crate::Value, CallError>;

/// Errors raised by the substitution engine itself.
#[derive(Debug, Error)]
pub enum Error {
    /// A partial set of argument matchers was queued for a call.
    #[error(
        "{method}: {queued} argument matchers were queued but the method takes {expected} parameters"
    )]
    ArgumentMismatch {
        /// Method the matchers were dequeued for
        method: String,
        /// Parameter count of the method
        expected: usize,
        /// Number of matchers that were pending
        queued: usize,
    },

    /// A queued matcher describes a different type than the parameter it binds to.
    #[error("{method}: argument matcher {position} is for {found} but the parameter is {expected}")]
    MatcherTypeMismatch {
        /// Method the matcher was bound to
        method: String,
        /// Parameter position
        position: usize,
        /// Declared parameter type
        expected: &'static str,
        /// Type the matcher describes
        found: &'static str,
    },

    /// An invocation carried a different number of arguments than its method declares.
    #[error("{method}: called with {actual} arguments but the method takes {expected}")]
    ArityMismatch {
        /// Invoked method
        method: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// No default value can be synthesized for a return type.
    #[error("{method}: no default value available for return type {return_type}")]
    UnsupportedReturnType {
        /// Method whose default was requested
        method: String,
        /// Declared return type
        return_type: &'static str,
    },

    /// A routed value could not be converted to the caller's expected return type.
    #[error("{method}: expected a {expected} return value but the substitute produced {found}")]
    ReturnTypeMismatch {
        /// Invoked method
        method: String,
        /// Type the caller asked for
        expected: &'static str,
        /// Type that was produced
        found: &'static str,
    },

    /// A base implementation was requested for a call that has none.
    #[error("{0}: no base implementation is available")]
    BaseUnavailable(String),

    /// A response sequence with no responses was configured.
    #[error("Response sequence must contain at least one response")]
    EmptyResponseSequence,

    /// A verification query did not find the expected number of calls.
    #[error("Expected to receive {expected} matching {specification}, actually received {actual}")]
    ReceivedCallsMismatch {
        /// Rendered call specification
        specification: String,
        /// Expected quantity
        expected: Quantity,
        /// Number of matching calls found
        actual: usize,
    },

    /// Calls were not received in the expected order.
    #[error("Calls were not received in the expected order: expected {expected:?}, received {actual:?}")]
    CallsNotInOrder {
        /// Rendered expected sequence
        expected: Vec<String>,
        /// Rendered sequence of relevant received calls
        actual: Vec<String>,
    },

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),
}

impl Error {
    /// Whether this error reports a misconfigured matcher set at the call site.
    pub fn is_argument_misuse(&self) -> bool {
        matches!(
            self,
            Self::ArgumentMismatch { .. } | Self::MatcherTypeMismatch { .. }
        )
    }
}

/// Error surfaced from an intercepted call.
///
/// Configured error responses and errors from a base implementation share the
/// `Raised` variant, so callers cannot tell them apart.
#[derive(Debug, Clone, Error)]
pub enum CallError {
    /// Error raised by a configured response or by the real implementation.
    #[error("{0}")]
    Raised(Arc<dyn StdError + Send + Sync>),

    /// The engine failed to produce a response.
    #[error("Substitute engine error: {0}")]
    Engine(Arc<Error>),
}

impl CallError {
    /// Wrap an arbitrary error as a raised call error.
    pub fn raised<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Raised(Arc::new(error))
    }

    /// Downcast a raised error to a concrete type.
    pub fn downcast_raised<E: StdError + 'static>(&self) -> Option<&E> {
        match self {
            Self::Raised(error) => error.downcast_ref::<E>(),
            Self::Engine(_) => None,
        }
    }

    /// The engine error, if this call failed inside the engine.
    pub fn engine_error(&self) -> Option<&Error> {
        match self {
            Self::Engine(error) => Some(error),
            Self::Raised(_) => None,
        }
    }
}

impl From<Error> for CallError {
    fn from(error: Error) -> Self {
        Self::Engine(Arc::new(error))
    }
}
