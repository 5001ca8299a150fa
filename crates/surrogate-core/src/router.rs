//! Call routing.
//!
//! The [`CallRouter`] is the dispatch kernel of one substitute. For each call it
//!
//! 1. records the call, before anything can fail;
//! 2. looks up the most recently configured specification accepting the call
//!    and takes its next response (sticky last);
//! 3. otherwise runs the real implementation, when the call has one and the
//!    substitute calls base by default;
//! 4. otherwise synthesizes a default for the declared return type.
//!
//! Router state sits behind one mutex per substitute. The lock is released
//! before callbacks, computed responses, and base implementations run, so
//! those may call back into the same substitute.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::arg_queue::{ArgumentSpecificationQueue, ExecutionContext};
use crate::arg_spec::ArgumentSpecification;
use crate::call::{Call, Invocation};
use crate::call_spec::CallSpecification;
use crate::collection::{CallCollection, Quantity, ReceivedCallsReport};
use crate::config::EngineConfig;
use crate::defaults::{DefaultValueProvider, StandardDefaults};
use crate::error::{CallResult, Error, Result};
use crate::ids::SubstituteId;
use crate::results::{ConfiguredResults, Response, ResponseSequence};
use crate::sync::IgnoreLock as _;

/// Side-effect action run for every matching routed call.
pub type CallbackFn = Arc<dyn Fn(&Call) + Send + Sync>;

/// Whether intercepted calls are routed and recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Bootstrap state while the proxy is being constructed
    Suspended,
    /// Calls are routed and recorded
    Active,
}

/// What a substitute stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstituteKind {
    /// Every call is substituted
    Pure,
    /// Unconfigured calls reach the real implementation
    Partial,
    /// Unconfigured calls are forwarded to a wrapped target
    Forwarding,
}

#[derive(Default)]
struct RouterState {
    results: ConfiguredResults,
    calls: CallCollection,
    callbacks: Vec<(CallSpecification, CallbackFn)>,
    base_exclusions: Vec<CallSpecification>,
}

/// Routing decision taken under the lock and acted on after releasing it.
struct Dispatch {
    response: Option<Response>,
    callbacks: Vec<CallbackFn>,
    base_excluded: bool,
}

/// Dispatch kernel of one substitute.
pub struct CallRouter {
    id: SubstituteId,
    kind: SubstituteKind,
    call_base_by_default: AtomicBool,
    full_dispatch: AtomicBool,
    state: Mutex<RouterState>,
    queue: Arc<ArgumentSpecificationQueue>,
    defaults: Arc<dyn DefaultValueProvider>,
}

impl CallRouter {
    /// Create a router in suspended dispatch mode.
    pub fn new(
        kind: SubstituteKind,
        queue: Arc<ArgumentSpecificationQueue>,
        defaults: Arc<dyn DefaultValueProvider>,
        config: &EngineConfig,
    ) -> Self {
        let call_base_by_default = config.call_base_by_default || kind != SubstituteKind::Pure;
        Self {
            id: SubstituteId::new(),
            kind,
            call_base_by_default: AtomicBool::new(call_base_by_default),
            full_dispatch: AtomicBool::new(false),
            state: Mutex::new(RouterState::default()),
            queue,
            defaults,
        }
    }

    /// Create a router with its own argument queue and the standard defaults.
    pub fn standalone(kind: SubstituteKind) -> Self {
        Self::new(
            kind,
            Arc::new(ArgumentSpecificationQueue::new()),
            Arc::new(StandardDefaults::new()),
            &EngineConfig::default(),
        )
    }

    /// Identity of the substitute this router serves.
    pub fn id(&self) -> SubstituteId {
        self.id
    }

    /// Kind of substitute.
    pub fn kind(&self) -> SubstituteKind {
        self.kind
    }

    /// Shared pending-matcher queue.
    pub fn argument_queue(&self) -> &Arc<ArgumentSpecificationQueue> {
        &self.queue
    }

    /// Whether unconfigured calls with a base implementation run it.
    pub fn call_base_by_default(&self) -> bool {
        self.call_base_by_default.load(Ordering::Acquire)
    }

    /// Set whether unconfigured calls with a base implementation run it.
    pub fn set_call_base_by_default(&self, call_base: bool) {
        self.call_base_by_default.store(call_base, Ordering::Release);
    }

    /// Current dispatch mode.
    pub fn dispatch_mode(&self) -> DispatchMode {
        if self.full_dispatch.load(Ordering::Acquire) {
            DispatchMode::Active
        } else {
            DispatchMode::Suspended
        }
    }

    /// Switch to full dispatch. One-way; calls intercepted earlier are not
    /// recorded retroactively.
    pub fn activate_full_dispatch(&self) {
        if !self.full_dispatch.swap(true, Ordering::AcqRel) {
            tracing::debug!("{} switched to full dispatch mode", self.id);
        }
    }

    /// Queue a matcher for the next call made on the current thread.
    pub fn enqueue_argument_matcher(&self, spec: ArgumentSpecification) {
        self.queue.enqueue(ExecutionContext::current(), spec);
    }

    /// Queue a matcher for the next call made in `context`.
    pub fn enqueue_argument_matcher_in(
        &self,
        context: impl Into<ExecutionContext>,
        spec: ArgumentSpecification,
    ) {
        self.queue.enqueue(context.into(), spec);
    }

    /// Configure responses for calls accepted by `spec`.
    pub fn configure_response(&self, spec: CallSpecification, responses: impl Into<ResponseSequence>) {
        let responses = responses.into();
        tracing::debug!(
            "{}: configuring {} response(s) for {}",
            self.id,
            responses.len(),
            spec
        );
        self.state
            .with_lock(|state| state.results.configure(spec, responses));
    }

    /// Run `callback` for every routed call accepted by `spec`, before its
    /// response is produced.
    pub fn add_callback<F>(&self, spec: CallSpecification, callback: F)
    where
        F: Fn(&Call) + Send + Sync + 'static,
    {
        let callback: CallbackFn = Arc::new(callback);
        self.state
            .with_lock(|state| state.callbacks.push((spec, callback)));
    }

    /// Never run the real implementation for unconfigured calls accepted by
    /// `spec`; they get a default value instead.
    pub fn exclude_from_base(&self, spec: CallSpecification) {
        self.state.with_lock(|state| state.base_exclusions.push(spec));
    }

    /// Entry point for the interception layer.
    ///
    /// Builds the call, binding any pending matchers. In full dispatch mode the
    /// call is routed; while suspended it is answered by the real implementation
    /// (when calling base by default) or a default value, and not recorded.
    ///
    /// # Errors
    /// Returns the configured or real implementation's error, or an engine
    /// error for matcher misuse and unsupported return types.
    pub fn intercept(&self, invocation: Invocation) -> CallResult {
        let call = Call::from_invocation(invocation, &self.queue)?;
        match self.dispatch_mode() {
            DispatchMode::Active => self.route(call),
            DispatchMode::Suspended => {
                tracing::trace!("{}: suspended dispatch for {}", self.id, call);
                if self.call_base_by_default()
                    && let Some(outcome) = call.try_call_base()
                {
                    return outcome;
                }
                self.default_for(&call)
            }
        }
    }

    /// Route a call: record it, then answer it.
    ///
    /// # Errors
    /// Returns the configured or real implementation's error, or
    /// `UnsupportedReturnType` when a default is needed and cannot be made.
    pub fn route(&self, call: Call) -> CallResult {
        let call = Arc::new(call);
        let dispatch = self.state.with_lock(|state| {
            state.calls.add(Arc::clone(&call));
            Dispatch {
                response: state.results.next_response_for(&call),
                callbacks: state
                    .callbacks
                    .iter()
                    .filter(|(spec, _)| spec.is_satisfied_by(&call))
                    .map(|(_, callback)| Arc::clone(callback))
                    .collect(),
                base_excluded: state
                    .base_exclusions
                    .iter()
                    .any(|spec| spec.is_satisfied_by(&call)),
            }
        });

        for callback in &dispatch.callbacks {
            callback(&call);
        }

        match dispatch.response {
            Some(response) => {
                tracing::debug!("{}: {} answered by {:?}", self.id, call, response);
                Self::resolve(&call, response)
            }
            None if !dispatch.base_excluded && self.call_base_by_default() && call.has_base() => {
                tracing::debug!("{}: {} falls through to base", self.id, call);
                call.call_base()
            }
            None => {
                tracing::debug!("{}: {} answered with default", self.id, call);
                self.default_for(&call)
            }
        }
    }

    fn resolve(call: &Call, response: Response) -> CallResult {
        match response {
            Response::Value(value) => Ok(value),
            Response::Raise(error) => Err(error),
            Response::Compute(compute) => compute(call),
            Response::CallBase => call.call_base(),
        }
    }

    fn default_for(&self, call: &Call) -> CallResult {
        let return_type = call.method().return_type();
        self.defaults.default_for(return_type).ok_or_else(|| {
            Error::UnsupportedReturnType {
                method: call.method().to_string(),
                return_type: return_type.name(),
            }
            .into()
        })
    }

    /// Every routed call, in order.
    pub fn received_calls(&self) -> Vec<Arc<Call>> {
        self.state.with_lock(|state| state.calls.all().to_vec())
    }

    /// Whether the calls accepted by `spec` satisfy `quantity`.
    pub fn query_received(&self, spec: &CallSpecification, quantity: Quantity) -> bool {
        self.state
            .with_lock(|state| state.calls.received(spec, quantity))
    }

    /// Structured report for a received-call query.
    pub fn received_calls_report(
        &self,
        spec: &CallSpecification,
        quantity: Quantity,
    ) -> ReceivedCallsReport {
        self.state.with_lock(|state| state.calls.report(spec, quantity))
    }

    /// Check that the calls accepted by `spec` satisfy `quantity`.
    ///
    /// # Errors
    /// Returns `ReceivedCallsMismatch` when they do not.
    pub fn check_received(&self, spec: &CallSpecification, quantity: Quantity) -> Result<()> {
        self.received_calls_report(spec, quantity).into_result()
    }

    /// Whether the calls accepted by any of `specs` happened in that order.
    pub fn received_in_order(&self, specs: &[CallSpecification]) -> bool {
        self.state
            .with_lock(|state| state.calls.received_in_order(specs))
    }

    /// Check that the calls accepted by any of `specs` happened in that order.
    ///
    /// # Errors
    /// Returns `CallsNotInOrder` when they did not.
    pub fn check_in_order(&self, specs: &[CallSpecification]) -> Result<()> {
        self.state.with_lock(|state| state.calls.check_in_order(specs))
    }
}

impl fmt::Debug for CallRouter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("CallRouter")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("dispatch_mode", &self.dispatch_mode())
            .field("call_base_by_default", &self.call_base_by_default())
            .finish_non_exhaustive()
    }
}
