//! Pending argument matchers, partitioned per execution context.
//!
//! Matcher helpers run before the call they annotate, so the matchers they
//! produce wait here until the next call in the same execution context is
//! constructed. Partitioning by context keeps concurrent tests from binding
//! each other's matchers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};

use crate::arg_spec::ArgumentSpecification;
use crate::error::{Error, Result};
use crate::method::MethodIdentity;
use crate::sync::IgnoreLock as _;

/// Explicit execution-context token for callers that do not map one logical
/// flow of execution to one thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextToken(u64);

static NEXT_CONTEXT_TOKEN: AtomicU64 = AtomicU64::new(0);

impl ContextToken {
    /// Allocate a fresh token.
    #[must_use]
    pub fn new() -> Self {
        Self(NEXT_CONTEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ContextToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of the execution context that owns pending matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionContext {
    /// An OS thread
    Thread(ThreadId),
    /// An explicit token
    Token(ContextToken),
}

impl ExecutionContext {
    /// Context of the calling thread.
    pub fn current() -> Self {
        Self::Thread(thread::current().id())
    }
}

impl From<ContextToken> for ExecutionContext {
    fn from(token: ContextToken) -> Self {
        Self::Token(token)
    }
}

/// Buffer of argument matchers waiting for the call they apply to.
#[derive(Debug)]
pub struct ArgumentSpecificationQueue {
    pending: Mutex<HashMap<ExecutionContext, Vec<ArgumentSpecification>>>,
    check_types: bool,
}

impl ArgumentSpecificationQueue {
    /// Create an empty queue that checks matcher types against parameter types.
    #[must_use]
    pub fn new() -> Self {
        Self::with_type_checking(true)
    }

    /// Create an empty queue, choosing whether dequeued matchers must describe
    /// their parameter's declared type.
    #[must_use]
    pub fn with_type_checking(check_types: bool) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            check_types,
        }
    }

    /// Queue a matcher for the next call made in `context`.
    pub fn enqueue(&self, context: ExecutionContext, spec: ArgumentSpecification) {
        tracing::trace!("Queued argument matcher {} for {:?}", spec, context);
        self.pending
            .with_lock(|pending| pending.entry(context).or_default().push(spec));
    }

    /// Number of matchers waiting in `context`.
    pub fn pending_count(&self, context: ExecutionContext) -> usize {
        self.pending
            .with_lock(|pending| pending.get(&context).map_or(0, Vec::len))
    }

    /// Drop every matcher waiting in `context`.
    pub fn clear(&self, context: ExecutionContext) {
        self.pending.with_lock(|pending| pending.remove(&context));
    }

    /// Remove every matcher waiting in `context` and bind them to the
    /// parameters of `method`, matcher *i* to parameter *i*.
    ///
    /// Returns an empty list when nothing was queued. Methods without
    /// parameters take no matchers and leave the buffer untouched, so matchers
    /// queued for an enclosing call survive nested parameterless calls.
    /// Otherwise the buffer for `context` is cleared even when binding fails.
    ///
    /// # Errors
    /// Returns `ArgumentMismatch` when the number of queued matchers is neither
    /// zero nor the parameter count, and `MatcherTypeMismatch` when type
    /// checking is enabled and a matcher describes a different type than its
    /// parameter.
    pub fn dequeue_all_for(
        &self,
        context: ExecutionContext,
        method: &MethodIdentity,
    ) -> Result<Vec<ArgumentSpecification>> {
        let expected = method.parameter_count();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let queued = self
            .pending
            .with_lock(|pending| pending.remove(&context))
            .unwrap_or_default();

        if queued.is_empty() {
            return Ok(queued);
        }

        if queued.len() != expected {
            tracing::warn!(
                "Discarding {} queued argument matchers for {}: expected {}",
                queued.len(),
                method,
                expected
            );
            return Err(Error::ArgumentMismatch {
                method: method.to_string(),
                expected,
                queued: queued.len(),
            });
        }

        if self.check_types {
            for (position, (spec, parameter)) in
                queued.iter().zip(method.parameter_types()).enumerate()
            {
                if spec.for_type() != *parameter {
                    return Err(Error::MatcherTypeMismatch {
                        method: method.to_string(),
                        position,
                        expected: parameter.name(),
                        found: spec.for_type().name(),
                    });
                }
            }
        }

        Ok(queued
            .into_iter()
            .enumerate()
            .map(|(position, spec)| spec.bind(position))
            .collect())
    }
}

impl Default for ArgumentSpecificationQueue {
    fn default() -> Self {
        Self::new()
    }
}
