//! Default return values for calls nothing was configured for.

use core::any::{Any, TypeId};
use core::fmt;
use std::collections::HashMap;

use crate::value::{TypeKey, Value};

/// Synthesizes a default value for a declared return type.
pub trait DefaultValueProvider: Send + Sync {
    /// Default value for `return_type`, or `None` when the type is unsupported.
    fn default_for(&self, return_type: TypeKey) -> Option<Value>;
}

fn make_default<T>() -> Value
where
    T: Default + Any + Send + Sync + fmt::Debug + PartialEq,
{
    Value::new(T::default())
}

/// Registry of `Default` constructors keyed by type.
///
/// Starts with the unit type, `bool`, `char`, the numeric primitives, `String`,
/// and `Option`/`Vec` of `String`. Register further types with [`Self::register`].
pub struct StandardDefaults {
    factories: HashMap<TypeId, fn() -> Value>,
}

impl StandardDefaults {
    /// Registry with the built-in types.
    #[must_use]
    pub fn new() -> Self {
        let mut defaults = Self::empty();
        defaults.register::<()>();
        defaults.register::<bool>();
        defaults.register::<char>();
        defaults.register::<u8>();
        defaults.register::<u16>();
        defaults.register::<u32>();
        defaults.register::<u64>();
        defaults.register::<u128>();
        defaults.register::<usize>();
        defaults.register::<i8>();
        defaults.register::<i16>();
        defaults.register::<i32>();
        defaults.register::<i64>();
        defaults.register::<i128>();
        defaults.register::<isize>();
        defaults.register::<f32>();
        defaults.register::<f64>();
        defaults.register::<String>();
        defaults.register::<Option<String>>();
        defaults.register::<Vec<String>>();
        defaults
    }

    /// Registry with no types.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register `T::default()` as the default for `T`.
    pub fn register<T>(&mut self)
    where
        T: Default + Any + Send + Sync + fmt::Debug + PartialEq,
    {
        self.factories
            .insert(TypeId::of::<T>(), make_default::<T> as fn() -> Value);
    }

    /// Builder form of [`Self::register`].
    #[must_use]
    pub fn with<T>(mut self) -> Self
    where
        T: Default + Any + Send + Sync + fmt::Debug + PartialEq,
    {
        self.register::<T>();
        self
    }

    /// Whether `return_type` has a registered default.
    pub fn supports(&self, return_type: TypeKey) -> bool {
        self.factories.contains_key(&return_type.id())
    }
}

impl Default for StandardDefaults {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StandardDefaults {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StandardDefaults")
            .field("registered", &self.factories.len())
            .finish()
    }
}

impl DefaultValueProvider for StandardDefaults {
    fn default_for(&self, return_type: TypeKey) -> Option<Value> {
        self.factories.get(&return_type.id()).map(|factory| factory())
    }
}
