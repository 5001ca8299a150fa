//! Intercepted calls.

use core::any::Any;
use core::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use crate::arg_queue::{ArgumentSpecificationQueue, ExecutionContext};
use crate::arg_spec::ArgumentSpecification;
use crate::error::{CallResult, Error, Result};
use crate::ids::SubstituteId;
use crate::method::MethodIdentity;
use crate::sync::IgnoreLock as _;
use crate::value::Value;

type BaseThunk = Box<dyn FnOnce() -> CallResult + Send>;

/// Deferred, memoized invocation of the real implementation.
///
/// The thunk runs at most once; later invocations return the cached outcome,
/// so routing and the caller can both ask for the base result without
/// repeating its side effects.
pub struct BaseCall {
    thunk: Mutex<Option<BaseThunk>>,
    outcome: OnceLock<CallResult>,
}

impl BaseCall {
    /// Wrap the real implementation of one invocation.
    pub fn new<F>(thunk: F) -> Self
    where
        F: FnOnce() -> CallResult + Send + 'static,
    {
        Self {
            thunk: Mutex::new(Some(Box::new(thunk))),
            outcome: OnceLock::new(),
        }
    }

    /// Run the real implementation, or return its cached outcome.
    pub fn invoke(&self) -> CallResult {
        self.outcome
            .get_or_init(|| {
                let thunk = self.thunk.with_lock(Option::take);
                match thunk {
                    Some(run) => run(),
                    None => Err(Error::BaseUnavailable("base call".to_owned()).into()),
                }
            })
            .clone()
    }

    /// Whether the real implementation has already run.
    pub fn has_run(&self) -> bool {
        self.outcome.get().is_some()
    }
}

impl fmt::Debug for BaseCall {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BaseCall")
            .field("has_run", &self.has_run())
            .finish_non_exhaustive()
    }
}

/// Raw description of a trapped invocation, as produced by the interception layer.
#[derive(Debug)]
pub struct Invocation {
    method: MethodIdentity,
    arguments: Vec<Value>,
    target: SubstituteId,
    base: Option<BaseCall>,
    context: ExecutionContext,
}

impl Invocation {
    /// Describe a call of `method` on `target`, made from the current thread.
    pub fn new(method: MethodIdentity, arguments: Vec<Value>, target: SubstituteId) -> Self {
        Self {
            method,
            arguments,
            target,
            base: None,
            context: ExecutionContext::current(),
        }
    }

    /// Attach the real implementation.
    #[must_use]
    pub fn with_base<F>(mut self, thunk: F) -> Self
    where
        F: FnOnce() -> CallResult + Send + 'static,
    {
        self.base = Some(BaseCall::new(thunk));
        self
    }

    /// Attribute the call to an explicit execution context.
    #[must_use]
    pub fn in_context(mut self, context: impl Into<ExecutionContext>) -> Self {
        self.context = context.into();
        self
    }

    /// Invoked method.
    pub fn method(&self) -> &MethodIdentity {
        &self.method
    }

    /// Execution context the call was made from.
    pub fn context(&self) -> ExecutionContext {
        self.context
    }
}

/// Immutable record of one intercepted invocation.
pub struct Call {
    method: MethodIdentity,
    arguments: Vec<Value>,
    argument_specs: Vec<ArgumentSpecification>,
    target: SubstituteId,
    base: Option<Arc<BaseCall>>,
}

impl Call {
    /// Build a call from an invocation, binding the matchers pending in the
    /// invocation's execution context.
    ///
    /// # Errors
    /// Returns `ArgumentMismatch` or `MatcherTypeMismatch` for a bad matcher set,
    /// and `ArityMismatch` when the argument count differs from the method's
    /// parameter count.
    pub fn from_invocation(
        invocation: Invocation,
        queue: &ArgumentSpecificationQueue,
    ) -> Result<Self> {
        let Invocation {
            method,
            arguments,
            target,
            base,
            context,
        } = invocation;

        let argument_specs = queue.dequeue_all_for(context, &method)?;

        if arguments.len() != method.parameter_count() {
            return Err(Error::ArityMismatch {
                method: method.to_string(),
                expected: method.parameter_count(),
                actual: arguments.len(),
            });
        }

        Ok(Self {
            method,
            arguments,
            argument_specs,
            target,
            base: base.map(Arc::new),
        })
    }

    /// Invoked method.
    pub fn method(&self) -> &MethodIdentity {
        &self.method
    }

    /// Argument values in parameter order.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Argument at `index` as a `T`.
    pub fn arg<T: Any>(&self, index: usize) -> Option<&T> {
        self.arguments.get(index).and_then(Value::downcast_ref::<T>)
    }

    /// Matchers bound to this call's parameters; empty when none were queued.
    pub fn argument_specs(&self) -> &[ArgumentSpecification] {
        &self.argument_specs
    }

    /// Substitute the call was made on.
    pub fn target(&self) -> SubstituteId {
        self.target
    }

    /// Whether a real implementation is attached.
    pub fn has_base(&self) -> bool {
        self.base.is_some()
    }

    /// Run the real implementation, if one is attached.
    pub fn try_call_base(&self) -> Option<CallResult> {
        self.base.as_ref().map(|base| base.invoke())
    }

    /// Run the real implementation.
    ///
    /// # Errors
    /// Returns the implementation's error, or `BaseUnavailable` when the call
    /// has no real implementation.
    pub fn call_base(&self) -> CallResult {
        self.try_call_base()
            .unwrap_or_else(|| Err(Error::BaseUnavailable(self.method.to_string()).into()))
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Call")
            .field("method", &self.method)
            .field("arguments", &self.arguments)
            .field("target", &self.target)
            .field("has_base", &self.has_base())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Call {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arguments: Vec<String> = self
            .arguments
            .iter()
            .map(|argument| format!("{argument:?}"))
            .collect();
        write!(
            formatter,
            "{}({})",
            self.method.name(),
            arguments.join(", ")
        )
    }
}
