//! Received-call log and verification queries.

use core::fmt;
use std::sync::Arc;

use crate::call::Call;
use crate::call_spec::CallSpecification;
use crate::error::{Error, Result};

/// Required number of matching calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// No matching call
    None,
    /// Exactly this many matching calls
    Exactly(usize),
    /// At least this many matching calls
    AtLeast(usize),
}

impl Quantity {
    /// Whether `count` matching calls satisfy this quantity.
    pub fn matches(self, count: usize) -> bool {
        match self {
            Self::None => count == 0,
            Self::Exactly(expected) => count == expected,
            Self::AtLeast(minimum) => count >= minimum,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => formatter.write_str("no calls"),
            Self::Exactly(1) => formatter.write_str("exactly 1 call"),
            Self::Exactly(count) => write!(formatter, "exactly {count} calls"),
            Self::AtLeast(1) => formatter.write_str("at least 1 call"),
            Self::AtLeast(count) => write!(formatter, "at least {count} calls"),
        }
    }
}

/// Structured outcome of a received-call query.
#[derive(Debug, Clone)]
pub struct ReceivedCallsReport {
    /// Rendered specification that was queried
    pub specification: String,
    /// Required quantity
    pub expected: Quantity,
    /// Calls accepted by the specification, in recorded order
    pub matching: Vec<Arc<Call>>,
    /// Calls of the same method the specification rejected, in recorded order
    pub related: Vec<Arc<Call>>,
}

impl ReceivedCallsReport {
    /// Number of matching calls.
    pub fn actual(&self) -> usize {
        self.matching.len()
    }

    /// Whether the quantity was satisfied.
    pub fn passed(&self) -> bool {
        self.expected.matches(self.actual())
    }

    /// Convert into a result.
    ///
    /// # Errors
    /// Returns `ReceivedCallsMismatch` when the quantity was not satisfied.
    pub fn into_result(self) -> Result<()> {
        if self.passed() {
            return Ok(());
        }
        Err(Error::ReceivedCallsMismatch {
            actual: self.actual(),
            specification: self.specification,
            expected: self.expected,
        })
    }
}

/// Append-only log of every routed call, in the order calls were received.
#[derive(Debug, Default)]
pub struct CallCollection {
    calls: Vec<Arc<Call>>,
}

impl CallCollection {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call.
    pub fn add(&mut self, call: Arc<Call>) {
        tracing::trace!("Recording call #{}: {}", self.calls.len(), call);
        self.calls.push(call);
    }

    /// All recorded calls in order.
    pub fn all(&self) -> &[Arc<Call>] {
        &self.calls
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Recorded calls accepted by `spec`, in order.
    pub fn matching<'calls>(
        &'calls self,
        spec: &'calls CallSpecification,
    ) -> impl Iterator<Item = &'calls Arc<Call>> {
        self.calls.iter().filter(|call| spec.is_satisfied_by(call))
    }

    /// Number of recorded calls accepted by `spec`.
    pub fn count_matching(&self, spec: &CallSpecification) -> usize {
        self.matching(spec).count()
    }

    /// Whether the number of calls accepted by `spec` satisfies `quantity`.
    pub fn received(&self, spec: &CallSpecification, quantity: Quantity) -> bool {
        quantity.matches(self.count_matching(spec))
    }

    /// Full report for a received-call query.
    pub fn report(&self, spec: &CallSpecification, quantity: Quantity) -> ReceivedCallsReport {
        let (matching, related): (Vec<_>, Vec<_>) = self
            .calls
            .iter()
            .filter(|call| call.method() == spec.method())
            .cloned()
            .partition(|call| spec.is_satisfied_by(call));
        ReceivedCallsReport {
            specification: spec.to_string(),
            expected: quantity,
            matching,
            related,
        }
    }

    /// Whether the calls accepted by any of `specs` occurred exactly in the
    /// order of `specs`.
    ///
    /// Calls not accepted by any specification are ignored; every relevant
    /// call must line up with the specification at the same position.
    pub fn received_in_order(&self, specs: &[CallSpecification]) -> bool {
        let relevant: Vec<&Arc<Call>> = self.relevant_calls(specs).collect();
        relevant.len() == specs.len()
            && relevant
                .iter()
                .zip(specs)
                .all(|(call, spec)| spec.is_satisfied_by(call))
    }

    /// Check that calls occurred in the order of `specs`.
    ///
    /// # Errors
    /// Returns `CallsNotInOrder` describing both sequences on mismatch.
    pub fn check_in_order(&self, specs: &[CallSpecification]) -> Result<()> {
        if self.received_in_order(specs) {
            return Ok(());
        }
        Err(Error::CallsNotInOrder {
            expected: specs.iter().map(ToString::to_string).collect(),
            actual: self
                .relevant_calls(specs)
                .map(ToString::to_string)
                .collect(),
        })
    }

    fn relevant_calls<'calls>(
        &'calls self,
        specs: &'calls [CallSpecification],
    ) -> impl Iterator<Item = &'calls Arc<Call>> {
        self.calls
            .iter()
            .filter(|call| specs.iter().any(|spec| spec.is_satisfied_by(call)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arg_queue::ArgumentSpecificationQueue;
    use crate::call::Invocation;
    use crate::ids::SubstituteId;
    use crate::method::MethodIdentity;
    use crate::value::Value;

    struct Door;

    fn open_method() -> MethodIdentity {
        MethodIdentity::builder::<Door>("open").build()
    }

    fn lock_method() -> MethodIdentity {
        MethodIdentity::builder::<Door>("lock").param::<u32>().build()
    }

    fn record(collection: &mut CallCollection, method: MethodIdentity, arguments: Vec<Value>) {
        let queue = ArgumentSpecificationQueue::new();
        let invocation = Invocation::new(method, arguments, SubstituteId::new());
        collection.add(Arc::new(Call::from_invocation(invocation, &queue).unwrap()));
    }

    fn open_spec() -> CallSpecification {
        CallSpecification::with_values(open_method(), Vec::new()).unwrap()
    }

    fn lock_spec(code: u32) -> CallSpecification {
        CallSpecification::with_values(lock_method(), vec![Value::new(code)]).unwrap()
    }

    #[test]
    fn test_quantity() {
        assert!(Quantity::None.matches(0));
        assert!(!Quantity::None.matches(1));
        assert!(Quantity::Exactly(2).matches(2));
        assert!(!Quantity::Exactly(2).matches(3));
        assert!(Quantity::AtLeast(2).matches(3));
        assert!(!Quantity::AtLeast(2).matches(1));
        assert_eq!(Quantity::Exactly(1).to_string(), "exactly 1 call");
        assert_eq!(Quantity::AtLeast(3).to_string(), "at least 3 calls");
    }

    #[test]
    fn test_counts_follow_recorded_order() {
        let mut collection = CallCollection::new();
        record(&mut collection, open_method(), Vec::new());
        record(&mut collection, lock_method(), vec![Value::new(7u32)]);
        record(&mut collection, open_method(), Vec::new());

        assert_eq!(collection.len(), 3);
        assert!(collection.received(&open_spec(), Quantity::Exactly(2)));
        assert!(collection.received(&lock_spec(7), Quantity::Exactly(1)));
        assert!(collection.received(&lock_spec(8), Quantity::None));
        assert_eq!(collection.all()[1].method(), &lock_method());
    }

    #[test]
    fn test_in_order() {
        let mut collection = CallCollection::new();
        record(&mut collection, open_method(), Vec::new());
        record(&mut collection, lock_method(), vec![Value::new(7u32)]);
        record(&mut collection, open_method(), Vec::new());

        assert!(collection.received_in_order(&[open_spec(), lock_spec(7), open_spec()]));
        assert!(!collection.received_in_order(&[open_spec(), lock_spec(7)]));
        assert!(!collection.received_in_order(&[lock_spec(7), open_spec(), open_spec()]));
        assert!(collection.received_in_order(&[lock_spec(7)]));

        let error = collection
            .check_in_order(&[lock_spec(7), open_spec(), open_spec()])
            .unwrap_err();
        assert!(matches!(error, Error::CallsNotInOrder { ref actual, .. } if actual.len() == 3));
    }

    #[test]
    fn test_report_separates_related_calls() {
        let mut collection = CallCollection::new();
        record(&mut collection, lock_method(), vec![Value::new(1u32)]);
        record(&mut collection, lock_method(), vec![Value::new(2u32)]);
        record(&mut collection, open_method(), Vec::new());

        let report = collection.report(&lock_spec(2), Quantity::Exactly(2));
        assert_eq!(report.actual(), 1);
        assert_eq!(report.related.len(), 1);
        assert!(!report.passed());

        let error = report.into_result().unwrap_err();
        assert_eq!(
            error.to_string(),
            "Expected to receive exactly 2 calls matching lock(2), actually received 1"
        );
    }
}
