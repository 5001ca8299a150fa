//! Substitute creation on top of the routing engine.
//!
//! A [`ProxyFactory`] generates proxies whose methods forward every call to a
//! [`ForwardingInterceptor`]. The [`SubstituteFactory`] wires a fresh router to
//! each proxy and switches it to full dispatch once construction is done.
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

/// Error types and result definitions.
pub mod error;
/// Substitute creation.
pub mod factory;
/// Proxy generation traits.
pub mod interceptable;
/// Call forwarding.
pub mod interceptor;

pub use error::{ProxyError, Result};
pub use factory::{Substitute, SubstituteFactory};
pub use interceptable::{Interceptable, ProxyFactory, ProxyKind};
pub use interceptor::ForwardingInterceptor;
