//! Method identity.
//!
//! A [`MethodIdentity`] is built once when a proxy is generated and then
//! attached to every call of that method. Overloads differ by parameter types,
//! generic methods differ per closed instantiation.

use core::fmt;
use core::hash::{Hash, Hasher};
use std::borrow::Cow;
use std::sync::Arc;

use crate::value::TypeKey;

/// Full signature of an interceptable method.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MethodSignature {
    /// Type that declares the method
    pub declaring_type: TypeKey,
    /// Method name
    pub name: Cow<'static, str>,
    /// Parameter types in declaration order
    pub parameter_types: Vec<TypeKey>,
    /// Generic arguments of a closed generic instantiation
    pub generic_arguments: Vec<TypeKey>,
    /// Declared return type (`()` for methods without a result)
    pub return_type: TypeKey,
}

/// Cheaply cloneable, hashable handle to a [`MethodSignature`].
#[derive(Clone)]
pub struct MethodIdentity(Arc<MethodSignature>);

impl MethodIdentity {
    /// Start describing a method declared on `D`.
    pub fn builder<D: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> MethodBuilder {
        MethodBuilder {
            signature: MethodSignature {
                declaring_type: TypeKey::of::<D>(),
                name: name.into(),
                parameter_types: Vec::new(),
                generic_arguments: Vec::new(),
                return_type: TypeKey::of::<()>(),
            },
        }
    }

    /// Wrap a complete signature.
    pub fn from_signature(signature: MethodSignature) -> Self {
        Self(Arc::new(signature))
    }

    /// Full signature.
    pub fn signature(&self) -> &MethodSignature {
        &self.0
    }

    /// Method name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Declaring type.
    pub fn declaring_type(&self) -> TypeKey {
        self.0.declaring_type
    }

    /// Parameter types in declaration order.
    pub fn parameter_types(&self) -> &[TypeKey] {
        &self.0.parameter_types
    }

    /// Number of declared parameters.
    pub fn parameter_count(&self) -> usize {
        self.0.parameter_types.len()
    }

    /// Generic arguments of the instantiation.
    pub fn generic_arguments(&self) -> &[TypeKey] {
        &self.0.generic_arguments
    }

    /// Declared return type.
    pub fn return_type(&self) -> TypeKey {
        self.0.return_type
    }
}

impl PartialEq for MethodIdentity {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for MethodIdentity {}

impl Hash for MethodIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for MethodIdentity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, formatter)
    }
}

impl fmt::Display for MethodIdentity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signature = &self.0;
        write!(formatter, "{}::{}", short_name(signature.declaring_type), signature.name)?;
        if !signature.generic_arguments.is_empty() {
            let generics: Vec<&str> = signature
                .generic_arguments
                .iter()
                .map(|generic| short_name(*generic))
                .collect();
            write!(formatter, "<{}>", generics.join(", "))?;
        }
        let parameters: Vec<&str> = signature
            .parameter_types
            .iter()
            .map(|parameter| short_name(*parameter))
            .collect();
        write!(formatter, "({})", parameters.join(", "))?;
        if !signature.return_type.is::<()>() {
            write!(formatter, " -> {}", short_name(signature.return_type))?;
        }
        Ok(())
    }
}

/// Last path segment of a type name, keeping generic arguments intact.
fn short_name(type_key: TypeKey) -> &'static str {
    let name = type_key.name();
    let path_end = name.find('<').unwrap_or(name.len());
    name[..path_end]
        .rfind("::")
        .map_or(name, |separator| &name[separator + 2..])
}

/// Builder for [`MethodIdentity`].
#[derive(Debug)]
pub struct MethodBuilder {
    signature: MethodSignature,
}

impl MethodBuilder {
    /// Append a parameter of type `T`.
    #[must_use]
    pub fn param<T: ?Sized + 'static>(mut self) -> Self {
        self.signature.parameter_types.push(TypeKey::of::<T>());
        self
    }

    /// Append a generic argument `T` of the closed instantiation.
    #[must_use]
    pub fn generic<T: ?Sized + 'static>(mut self) -> Self {
        self.signature.generic_arguments.push(TypeKey::of::<T>());
        self
    }

    /// Set the return type.
    #[must_use]
    pub fn returns<T: ?Sized + 'static>(mut self) -> Self {
        self.signature.return_type = TypeKey::of::<T>();
        self
    }

    /// Finish the identity.
    pub fn build(self) -> MethodIdentity {
        MethodIdentity::from_signature(self.signature)
    }
}
