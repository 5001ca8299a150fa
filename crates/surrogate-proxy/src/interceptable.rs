//! Proxy generation seams.

use core::any::type_name;
use std::sync::Arc;

use crate::error::Result;
use crate::interceptor::ForwardingInterceptor;

/// Shape of the type a factory generates proxies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// Only method declarations; no call has a real implementation
    Interface,
    /// Some methods carry a real implementation that can be called as base
    Class,
}

/// Generates proxies whose methods forward to an interceptor.
pub trait ProxyFactory {
    /// Generated proxy type.
    type Proxy;
    /// Real object a forwarding proxy wraps.
    type Target;

    /// Shape of the proxied type.
    fn kind(&self) -> ProxyKind;

    /// Name of the proxied type, for diagnostics.
    fn type_name(&self) -> &'static str {
        type_name::<Self::Proxy>()
    }

    /// Generate a proxy with no wrapped target.
    ///
    /// Calls made while the proxy is being built reach the interceptor in
    /// suspended dispatch mode.
    ///
    /// # Errors
    /// Returns `Generation` when the proxy cannot be built.
    fn generate_proxy(&self, interceptor: Arc<ForwardingInterceptor>) -> Result<Self::Proxy>;

    /// Generate a proxy whose real implementations delegate to `target`.
    ///
    /// # Errors
    /// Returns `Generation` when the proxy cannot be built.
    fn generate_proxy_for_target(
        &self,
        interceptor: Arc<ForwardingInterceptor>,
        target: Self::Target,
    ) -> Result<Self::Proxy>;
}

/// Implemented by proxies to expose the interceptor they forward to.
pub trait Interceptable {
    /// The proxy's interceptor.
    fn interceptor(&self) -> &Arc<ForwardingInterceptor>;
}

impl<T: Interceptable + ?Sized> Interceptable for Arc<T> {
    fn interceptor(&self) -> &Arc<ForwardingInterceptor> {
        T::interceptor(self)
    }
}
