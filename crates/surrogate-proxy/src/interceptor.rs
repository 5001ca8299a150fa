//! Bridge between generated proxies and the call router.

use core::any::{Any, type_name};
use core::fmt;
use std::sync::Arc;

use surrogate_core::{
    CallError, CallResult, CallRouter, Error, Invocation, MethodIdentity, SubstituteId, Value,
};

/// Receives every method call a proxy intercepts and forwards it to the
/// substitute's router.
///
/// Proxies call [`Self::call`] for methods without a real implementation and
/// [`Self::call_with_base`] for methods that have one.
pub struct ForwardingInterceptor {
    router: Arc<CallRouter>,
}

impl ForwardingInterceptor {
    /// Create an interceptor forwarding to `router`.
    pub fn new(router: Arc<CallRouter>) -> Self {
        Self { router }
    }

    /// The router calls are forwarded to.
    pub fn router(&self) -> &Arc<CallRouter> {
        &self.router
    }

    /// Identity of the substitute.
    pub fn substitute_id(&self) -> SubstituteId {
        self.router.id()
    }

    /// Start routing and recording calls. Called once the proxy is fully
    /// constructed.
    pub fn switch_to_full_dispatch_mode(&self) {
        self.router.activate_full_dispatch();
    }

    /// Build an invocation of `method` on this substitute.
    pub fn invocation(&self, method: MethodIdentity, arguments: Vec<Value>) -> Invocation {
        Invocation::new(method, arguments, self.router.id())
    }

    /// Forward a prepared invocation.
    ///
    /// # Errors
    /// Returns whatever error routing the call produced.
    pub fn intercept(&self, invocation: Invocation) -> CallResult {
        self.router.intercept(invocation)
    }

    /// Forward a call without a real implementation and convert its result.
    ///
    /// # Errors
    /// Returns the routed error, or `ReturnTypeMismatch` when the routed value
    /// is not an `R`.
    pub fn call<R>(&self, method: MethodIdentity, arguments: Vec<Value>) -> Result<R, CallError>
    where
        R: Any + Clone,
    {
        let value = self.intercept(self.invocation(method.clone(), arguments))?;
        Self::convert(&method, value)
    }

    /// Forward a call whose real implementation is `base` and convert its result.
    ///
    /// # Errors
    /// Returns the routed error, or `ReturnTypeMismatch` when the routed value
    /// is not an `R`.
    pub fn call_with_base<R, F>(
        &self,
        method: MethodIdentity,
        arguments: Vec<Value>,
        base: F,
    ) -> Result<R, CallError>
    where
        R: Any + Clone + Send + Sync + fmt::Debug + PartialEq,
        F: FnOnce() -> Result<R, CallError> + Send + 'static,
    {
        let invocation = self
            .invocation(method.clone(), arguments)
            .with_base(move || base().map(Value::new));
        let value = self.intercept(invocation)?;
        Self::convert(&method, value)
    }

    fn convert<R: Any + Clone>(method: &MethodIdentity, value: Value) -> Result<R, CallError> {
        value.downcast::<R>().ok_or_else(|| {
            Error::ReturnTypeMismatch {
                method: method.to_string(),
                expected: type_name::<R>(),
                found: value.type_key().name(),
            }
            .into()
        })
    }
}

impl fmt::Debug for ForwardingInterceptor {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ForwardingInterceptor")
            .field("substitute", &self.router.id())
            .field("dispatch_mode", &self.router.dispatch_mode())
            .finish()
    }
}
