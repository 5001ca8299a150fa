//! Substitute creation.

use core::ops::Deref;
use std::sync::Arc;

use surrogate_core::{
    ArgumentSpecificationQueue, CallRouter, DefaultValueProvider, EngineConfig, StandardDefaults,
    SubstituteKind,
};

use crate::error::{ProxyError, Result};
use crate::interceptable::{ProxyFactory, ProxyKind};
use crate::interceptor::ForwardingInterceptor;

/// A generated proxy together with the router behind it.
///
/// Dereferences to the proxy, so the substitute is called like the type it
/// stands in for; configuration and verification go through [`Self::router`].
#[derive(Debug)]
pub struct Substitute<P> {
    proxy: P,
    router: Arc<CallRouter>,
}

impl<P> Substitute<P> {
    /// The generated proxy.
    pub fn proxy(&self) -> &P {
        &self.proxy
    }

    /// The substitute's router.
    pub fn router(&self) -> &Arc<CallRouter> {
        &self.router
    }

    /// Split into the proxy and its router.
    pub fn into_parts(self) -> (P, Arc<CallRouter>) {
        (self.proxy, self.router)
    }
}

impl<P> Deref for Substitute<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.proxy
    }
}

/// Creates substitutes that share one matcher queue and set of defaults.
///
/// Every substitute the factory creates binds pending matchers from the same
/// queue, so a matcher registered on the current thread applies to whichever
/// substitute is called next.
pub struct SubstituteFactory {
    queue: Arc<ArgumentSpecificationQueue>,
    defaults: Arc<dyn DefaultValueProvider>,
    config: EngineConfig,
}

impl SubstituteFactory {
    /// Create a factory with the standard defaults.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_defaults(config, Arc::new(StandardDefaults::new()))
    }

    /// Create a factory with a custom default value provider.
    pub fn with_defaults(config: EngineConfig, defaults: Arc<dyn DefaultValueProvider>) -> Self {
        Self {
            queue: Arc::new(ArgumentSpecificationQueue::with_type_checking(
                config.check_matcher_types,
            )),
            defaults,
            config,
        }
    }

    /// Matcher queue shared by every substitute of this factory.
    pub fn argument_queue(&self) -> &Arc<ArgumentSpecificationQueue> {
        &self.queue
    }

    /// Configuration applied to new substitutes.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a substitute whose every call is substituted.
    ///
    /// # Errors
    /// Returns an error if the proxy cannot be generated.
    pub fn create<F: ProxyFactory>(&self, factory: &F) -> Result<Substitute<F::Proxy>> {
        self.build(factory, SubstituteKind::Pure, |interceptor| {
            factory.generate_proxy(interceptor)
        })
    }

    /// Create a substitute whose unconfigured calls run the real implementation.
    ///
    /// # Errors
    /// Returns `NoImplementation` for interface proxies, or an error if the
    /// proxy cannot be generated.
    pub fn create_partial<F: ProxyFactory>(&self, factory: &F) -> Result<Substitute<F::Proxy>> {
        if factory.kind() == ProxyKind::Interface {
            return Err(ProxyError::NoImplementation(factory.type_name()));
        }
        self.build(factory, SubstituteKind::Partial, |interceptor| {
            factory.generate_proxy(interceptor)
        })
    }

    /// Create a substitute whose unconfigured calls are forwarded to `target`.
    ///
    /// # Errors
    /// Returns an error if the proxy cannot be generated.
    pub fn create_for_target<F: ProxyFactory>(
        &self,
        factory: &F,
        target: F::Target,
    ) -> Result<Substitute<F::Proxy>> {
        self.build(factory, SubstituteKind::Forwarding, |interceptor| {
            factory.generate_proxy_for_target(interceptor, target)
        })
    }

    fn build<F, G>(
        &self,
        factory: &F,
        kind: SubstituteKind,
        generate: G,
    ) -> Result<Substitute<F::Proxy>>
    where
        F: ProxyFactory,
        G: FnOnce(Arc<ForwardingInterceptor>) -> Result<F::Proxy>,
    {
        let router = Arc::new(CallRouter::new(
            kind,
            Arc::clone(&self.queue),
            Arc::clone(&self.defaults),
            &self.config,
        ));
        let interceptor = Arc::new(ForwardingInterceptor::new(Arc::clone(&router)));
        let proxy = generate(Arc::clone(&interceptor))?;
        interceptor.switch_to_full_dispatch_mode();
        tracing::debug!(
            "Created {:?} substitute {} for {}",
            kind,
            router.id(),
            factory.type_name()
        );
        Ok(Substitute { proxy, router })
    }
}

impl Default for SubstituteFactory {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
