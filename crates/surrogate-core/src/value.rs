//! Dynamically typed argument and return values.
//!
//! Intercepted calls carry their arguments as [`Value`]s. A value remembers its
//! runtime type and how it compares: values built with [`Value::new`] compare
//! structurally through `PartialEq`, values built with [`Value::reference`]
//! compare by pointer identity, the way reference arguments do. A structural
//! value never equals a reference value.

use core::any::{Any, TypeId, type_name};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ptr;
use std::sync::Arc;

/// Runtime type of a value or parameter.
///
/// Equality and hashing use the `TypeId` only; the name is kept for display.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Type key for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Underlying `TypeId`.
    pub fn id(self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    pub fn name(self) -> &'static str {
        self.name
    }

    /// Whether this key describes `T`.
    pub fn is<T: ?Sized + 'static>(self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name)
    }
}

trait Payload: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn equals(&self, other: &dyn Payload) -> bool;

    fn is_shared(&self) -> bool {
        false
    }

    fn shared(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        None
    }
}

struct Structural<T>(T);

impl<T: fmt::Debug> fmt::Debug for Structural<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, formatter)
    }
}

impl<T> Payload for Structural<T>
where
    T: Any + Send + Sync + fmt::Debug + PartialEq,
{
    fn as_any(&self) -> &dyn Any {
        &self.0
    }

    fn equals(&self, other: &dyn Payload) -> bool {
        !other.is_shared()
            && other
                .as_any()
                .downcast_ref::<T>()
                .is_some_and(|value| *value == self.0)
    }
}

struct Shared<T>(Arc<T>);

impl<T: fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "&{:?}", self.0)
    }
}

impl<T> Payload for Shared<T>
where
    T: Any + Send + Sync + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self.0.as_ref()
    }

    fn equals(&self, other: &dyn Payload) -> bool {
        other.is_shared()
            && other
                .as_any()
                .downcast_ref::<T>()
                .is_some_and(|value| ptr::eq(value, self.0.as_ref()))
    }

    fn is_shared(&self) -> bool {
        true
    }

    fn shared(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        let erased: Arc<dyn Any + Send + Sync> = Arc::<T>::clone(&self.0);
        Some(erased)
    }
}

/// A dynamically typed argument or return value.
#[derive(Clone)]
pub struct Value {
    payload: Arc<dyn Payload>,
    type_key: TypeKey,
}

impl Value {
    /// Wrap a value compared structurally with `PartialEq`.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Debug + PartialEq,
    {
        Self {
            payload: Arc::new(Structural(value)),
            type_key: TypeKey::of::<T>(),
        }
    }

    /// Wrap a shared value compared by reference identity.
    pub fn reference<T>(value: Arc<T>) -> Self
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        Self {
            payload: Arc::new(Shared(value)),
            type_key: TypeKey::of::<T>(),
        }
    }

    /// The unit value returned by methods without a result.
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Runtime type of the wrapped value.
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Whether the wrapped value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_key.is::<T>()
    }

    /// Whether this is the unit value.
    pub fn is_unit(&self) -> bool {
        self.is::<()>()
    }

    /// Whether this value compares by reference identity.
    pub fn is_reference(&self) -> bool {
        self.payload.is_shared()
    }

    /// Borrow the wrapped value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref::<T>()
    }

    /// Clone the wrapped value out as a `T`.
    pub fn downcast<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Recover the shared handle of a reference value.
    pub fn downcast_shared<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.payload
            .shared()
            .and_then(|shared| shared.downcast::<T>().ok())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.payload.equals(other.payload.as_ref())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.payload, formatter)
    }
}
