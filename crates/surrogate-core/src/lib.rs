//! Call-routing and argument-matching engine for test substitutes.
//!
//! A substitute is a stand-in object whose methods are intercepted and handed
//! to a [`CallRouter`]. The router records every call, answers it from the
//! responses configured for matching [`CallSpecification`]s, and otherwise
//! falls through to the real implementation or a synthesized default.
//! Argument matchers registered before a call are queued per
//! [`ExecutionContext`] and bound to that call's parameters when it arrives.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::tests_outside_test_module,
        reason = "Allow for tests"
    )
)]

/// Argument matchers.
pub mod arg_spec;
/// Pending matchers, partitioned by execution context.
pub mod arg_queue;
/// Intercepted calls and deferred base implementations.
pub mod call;
/// Call specifications.
pub mod call_spec;
/// Received-call log and verification.
pub mod collection;
/// Engine configuration.
pub mod config;
/// Default return values.
pub mod defaults;
/// Error types and result definitions.
pub mod error;
/// Substitute identifiers.
pub mod ids;
/// Method identities.
pub mod method;
/// Configured responses.
pub mod results;
/// Per-substitute call routing.
pub mod router;
/// Synchronization helpers.
pub mod sync;
/// Dynamically typed argument and return values.
pub mod value;

pub use arg_queue::{ArgumentSpecificationQueue, ContextToken, ExecutionContext};
pub use arg_spec::{ArgumentMatcher, ArgumentSpecification};
pub use call::{BaseCall, Call, Invocation};
pub use call_spec::{ArgumentMatch, CallSpecification};
pub use collection::{CallCollection, Quantity, ReceivedCallsReport};
pub use config::EngineConfig;
pub use defaults::{DefaultValueProvider, StandardDefaults};
pub use error::{CallError, CallResult, Error, Result};
pub use ids::SubstituteId;
pub use method::{MethodBuilder, MethodIdentity, MethodSignature};
pub use results::{ComputeFn, ConfiguredResults, Response, ResponseSequence};
pub use router::{CallRouter, CallbackFn, DispatchMode, SubstituteKind};
pub use sync::IgnoreLock;
pub use value::{TypeKey, Value};
