//! Call specifications: reusable patterns over calls of one method.
//!
//! The same [`CallSpecification`] matching serves configured-result lookup and
//! received-call verification, so a matcher used to configure a response
//! accepts exactly the calls the same matcher verifies.

use core::fmt;

use crate::arg_spec::ArgumentSpecification;
use crate::call::Call;
use crate::error::{Error, Result};
use crate::method::MethodIdentity;
use crate::value::Value;

/// How one argument position is matched.
#[derive(Debug, Clone)]
pub enum ArgumentMatch {
    /// Equal to a recorded value (structural or reference equality)
    Literal(Value),
    /// Accepted by an explicit matcher
    Specified(ArgumentSpecification),
}

impl ArgumentMatch {
    /// Whether `argument` is accepted at this position.
    pub fn accepts(&self, argument: &Value) -> bool {
        match self {
            Self::Literal(expected) => argument == expected,
            Self::Specified(spec) => spec.is_satisfied_by(argument),
        }
    }

    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(first), Self::Literal(second)) => first == second,
            (Self::Specified(first), Self::Specified(second)) => first.same_constraint(second),
            _ => false,
        }
    }
}

impl fmt::Display for ArgumentMatch {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(formatter, "{value:?}"),
            Self::Specified(spec) => write!(formatter, "{spec}"),
        }
    }
}

impl From<Value> for ArgumentMatch {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<ArgumentSpecification> for ArgumentMatch {
    fn from(spec: ArgumentSpecification) -> Self {
        Self::Specified(spec)
    }
}

#[derive(Debug, Clone)]
enum ArgumentPattern {
    Positional(Vec<ArgumentMatch>),
    AnyArguments,
}

/// Pattern matching calls of one method by per-argument matchers.
#[derive(Debug, Clone)]
pub struct CallSpecification {
    method: MethodIdentity,
    arguments: ArgumentPattern,
}

impl CallSpecification {
    /// Pattern over `method` with one matcher per parameter.
    ///
    /// # Errors
    /// Returns `ArityMismatch` when the matcher count differs from the
    /// method's parameter count.
    pub fn new(method: MethodIdentity, arguments: Vec<ArgumentMatch>) -> Result<Self> {
        if arguments.len() != method.parameter_count() {
            return Err(Error::ArityMismatch {
                method: method.to_string(),
                expected: method.parameter_count(),
                actual: arguments.len(),
            });
        }
        Ok(Self {
            method,
            arguments: ArgumentPattern::Positional(arguments),
        })
    }

    /// Pattern over `method` requiring every argument to equal `values`.
    ///
    /// # Errors
    /// Returns `ArityMismatch` when the value count differs from the method's
    /// parameter count.
    pub fn with_values(method: MethodIdentity, values: Vec<Value>) -> Result<Self> {
        Self::new(method, values.into_iter().map(ArgumentMatch::from).collect())
    }

    /// Pattern accepting every call of `method`, whatever its arguments.
    pub fn with_any_arguments(method: MethodIdentity) -> Self {
        Self {
            method,
            arguments: ArgumentPattern::AnyArguments,
        }
    }

    /// Pattern derived from a call: bound matchers where the call has them,
    /// literal equality with the recorded arguments otherwise.
    pub fn from_call(call: &Call) -> Self {
        let arguments = if call.argument_specs().is_empty() {
            call.arguments()
                .iter()
                .cloned()
                .map(ArgumentMatch::Literal)
                .collect()
        } else {
            call.argument_specs()
                .iter()
                .cloned()
                .map(ArgumentMatch::Specified)
                .collect()
        };
        Self {
            method: call.method().clone(),
            arguments: ArgumentPattern::Positional(arguments),
        }
    }

    /// Same method, arguments ignored.
    #[must_use]
    pub fn ignoring_arguments(&self) -> Self {
        Self::with_any_arguments(self.method.clone())
    }

    /// Method this pattern applies to.
    pub fn method(&self) -> &MethodIdentity {
        &self.method
    }

    /// Whether `call` is accepted: identical method identity, and every
    /// argument accepted by its positional matcher.
    pub fn is_satisfied_by(&self, call: &Call) -> bool {
        if *call.method() != self.method {
            return false;
        }
        match &self.arguments {
            ArgumentPattern::AnyArguments => true,
            ArgumentPattern::Positional(matchers) => {
                matchers.len() == call.arguments().len()
                    && matchers
                        .iter()
                        .zip(call.arguments())
                        .all(|(matcher, argument)| matcher.accepts(argument))
            }
        }
    }

    /// Whether `other` describes the same pattern.
    pub fn same_as(&self, other: &Self) -> bool {
        if self.method != other.method {
            return false;
        }
        match (&self.arguments, &other.arguments) {
            (ArgumentPattern::AnyArguments, ArgumentPattern::AnyArguments) => true,
            (ArgumentPattern::Positional(first), ArgumentPattern::Positional(second)) => {
                first.len() == second.len()
                    && first
                        .iter()
                        .zip(second)
                        .all(|(left, right)| left.same_as(right))
            }
            _ => false,
        }
    }
}

impl fmt::Display for CallSpecification {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arguments {
            ArgumentPattern::AnyArguments => write!(formatter, "{}(..)", self.method.name()),
            ArgumentPattern::Positional(matchers) => {
                let rendered: Vec<String> =
                    matchers.iter().map(ToString::to_string).collect();
                write!(formatter, "{}({})", self.method.name(), rendered.join(", "))
            }
        }
    }
}
