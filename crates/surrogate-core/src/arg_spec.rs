//! Positional argument matchers.

use core::any::Any;
use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::value::{TypeKey, Value};

/// Predicate deciding whether one argument satisfies a matcher.
pub trait ArgumentMatcher: Send + Sync {
    /// Check the argument.
    fn is_satisfied_by(&self, argument: &Value) -> bool;

    /// Human-readable description for diagnostics.
    fn describe(&self) -> String;
}

/// Identity of a matcher, used to decide whether two specifications are the same.
#[derive(Debug, Clone, PartialEq)]
enum MatcherKey {
    Any(TypeKey),
    Equals(Value),
    Custom(u64),
}

static NEXT_CUSTOM_KEY: AtomicU64 = AtomicU64::new(0);

fn next_custom_key() -> MatcherKey {
    MatcherKey::Custom(NEXT_CUSTOM_KEY.fetch_add(1, Ordering::Relaxed))
}

struct AnyArgument;

impl ArgumentMatcher for AnyArgument {
    fn is_satisfied_by(&self, _argument: &Value) -> bool {
        true
    }

    fn describe(&self) -> String {
        "any".to_owned()
    }
}

struct EqualArgument(Value);

impl ArgumentMatcher for EqualArgument {
    fn is_satisfied_by(&self, argument: &Value) -> bool {
        *argument == self.0
    }

    fn describe(&self) -> String {
        format!("{:?}", self.0)
    }
}

struct PredicateArgument<T, F> {
    description: String,
    predicate: F,
    argument_type: PhantomData<fn(&T)>,
}

impl<T, F> ArgumentMatcher for PredicateArgument<T, F>
where
    T: Any,
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, argument: &Value) -> bool {
        argument
            .downcast_ref::<T>()
            .is_some_and(|value| (self.predicate)(value))
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

/// A matcher for one argument position.
///
/// Specifications are created before the call they apply to, queued in the
/// [`ArgumentSpecificationQueue`](crate::ArgumentSpecificationQueue), and bound
/// to a parameter position when that call is constructed.
#[derive(Clone)]
pub struct ArgumentSpecification {
    for_type: TypeKey,
    matcher: Arc<dyn ArgumentMatcher>,
    key: MatcherKey,
    position: Option<usize>,
}

impl ArgumentSpecification {
    /// Match any argument of type `T`.
    pub fn any<T: Any>() -> Self {
        Self {
            for_type: TypeKey::of::<T>(),
            matcher: Arc::new(AnyArgument),
            key: MatcherKey::Any(TypeKey::of::<T>()),
            position: None,
        }
    }

    /// Match arguments equal to `value`.
    pub fn equal_to(value: Value) -> Self {
        Self {
            for_type: value.type_key(),
            key: MatcherKey::Equals(value.clone()),
            matcher: Arc::new(EqualArgument(value)),
            position: None,
        }
    }

    /// Match arguments of type `T` accepted by `predicate`.
    pub fn matching<T, F>(description: impl Into<String>, predicate: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::custom::<T>(PredicateArgument {
            description: description.into(),
            predicate,
            argument_type: PhantomData,
        })
    }

    /// Match arguments of type `T` with a custom matcher.
    pub fn custom<T: Any>(matcher: impl ArgumentMatcher + 'static) -> Self {
        Self {
            for_type: TypeKey::of::<T>(),
            matcher: Arc::new(matcher),
            key: next_custom_key(),
            position: None,
        }
    }

    /// Whether `argument` has the described type and satisfies the matcher.
    pub fn is_satisfied_by(&self, argument: &Value) -> bool {
        argument.type_key() == self.for_type && self.matcher.is_satisfied_by(argument)
    }

    /// Type this specification describes.
    pub fn for_type(&self) -> TypeKey {
        self.for_type
    }

    /// Parameter position, once bound to a call.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Whether `other` applies the same constraint.
    ///
    /// `any` and `equal_to` specifications compare by type and value; custom and
    /// predicate specifications are only the same as their own clones.
    pub fn same_constraint(&self, other: &Self) -> bool {
        self.for_type == other.for_type && self.key == other.key
    }

    /// Description for diagnostics.
    pub fn describe(&self) -> String {
        match &self.key {
            MatcherKey::Any(type_key) => format!("any {type_key}"),
            MatcherKey::Equals(_) | MatcherKey::Custom(_) => self.matcher.describe(),
        }
    }

    pub(crate) fn bind(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Debug for ArgumentSpecification {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ArgumentSpecification")
            .field("for_type", &self.for_type)
            .field("matcher", &self.describe())
            .field("position", &self.position)
            .finish()
    }
}

impl fmt::Display for ArgumentSpecification {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.describe())
    }
}
