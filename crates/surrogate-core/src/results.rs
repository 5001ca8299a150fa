//! Configured responses.
//!
//! Lookup is an ordered override list: the most recently configured
//! specification that accepts a call answers it. There is no "most specific
//! wins" scoring, so configuring `put(any, any)` after `put(1, "x")` shadows the
//! earlier, narrower entry for every call.

use core::error::Error as StdError;
use core::fmt;
use std::sync::Arc;

use crate::call::Call;
use crate::call_spec::CallSpecification;
use crate::error::{CallError, CallResult, Error, Result};
use crate::value::Value;

/// Computed response: runs for each matching call with the call in hand.
pub type ComputeFn = Arc<dyn Fn(&Call) -> CallResult + Send + Sync>;

/// One response producer.
#[derive(Clone)]
pub enum Response {
    /// Return a constant value
    Value(Value),
    /// Raise an error
    Raise(CallError),
    /// Compute the outcome from the call
    Compute(ComputeFn),
    /// Run the real implementation
    CallBase,
}

impl Response {
    /// Return `value`.
    pub fn value(value: Value) -> Self {
        Self::Value(value)
    }

    /// Raise `error`.
    pub fn raise<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Raise(CallError::raised(error))
    }

    /// Compute the outcome with `compute`.
    pub fn compute<F>(compute: F) -> Self
    where
        F: Fn(&Call) -> CallResult + Send + Sync + 'static,
    {
        Self::Compute(Arc::new(compute))
    }

    /// Description for diagnostics.
    pub fn description(&self) -> String {
        match self {
            Self::Value(value) => format!("[value] {value:?}"),
            Self::Raise(error) => format!("[raise] {error}"),
            Self::Compute(_) => "[compute]".to_owned(),
            Self::CallBase => "[call base]".to_owned(),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.description())
    }
}

/// Non-empty, ordered list of responses for one configuration.
#[derive(Debug, Clone)]
pub struct ResponseSequence {
    responses: Vec<Response>,
}

impl ResponseSequence {
    /// A single response, reused for every matching call.
    pub fn single(response: Response) -> Self {
        Self {
            responses: vec![response],
        }
    }

    /// Responses consumed one per matching call, the last one sticking.
    ///
    /// # Errors
    /// Returns `EmptyResponseSequence` when `responses` is empty.
    pub fn of(responses: Vec<Response>) -> Result<Self> {
        if responses.is_empty() {
            return Err(Error::EmptyResponseSequence);
        }
        Ok(Self { responses })
    }

    /// Constant values consumed one per matching call, the last one sticking.
    ///
    /// # Errors
    /// Returns `EmptyResponseSequence` when `values` is empty.
    pub fn values(values: impl IntoIterator<Item = Value>) -> Result<Self> {
        Self::of(values.into_iter().map(Response::Value).collect())
    }

    /// Number of responses in the sequence.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Whether this is a single constant value.
    pub fn is_single_value(&self) -> bool {
        matches!(self.responses.as_slice(), [Response::Value(_)])
    }
}

impl From<Response> for ResponseSequence {
    fn from(response: Response) -> Self {
        Self::single(response)
    }
}

#[derive(Debug)]
struct ConfiguredEntry {
    spec: CallSpecification,
    responses: Vec<Response>,
    next: usize,
}

impl ConfiguredEntry {
    /// Take the next response; once exhausted, the last one is reused.
    fn next_response(&mut self) -> Option<Response> {
        let last = self.responses.len().checked_sub(1)?;
        let index = self.next.min(last);
        if self.next <= last {
            self.next += 1;
        }
        self.responses.get(index).cloned()
    }
}

/// Responses configured per call specification.
#[derive(Debug, Default)]
pub struct ConfiguredResults {
    entries: Vec<ConfiguredEntry>,
}

impl ConfiguredResults {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure `responses` for calls accepted by `spec`.
    ///
    /// Configuring a specification equal to an existing one updates that entry
    /// instead of adding a new one: a single constant replaces its queued
    /// responses, any other sequence is appended after them. Either way the
    /// entry becomes the most recently configured.
    pub fn configure(&mut self, spec: CallSpecification, responses: ResponseSequence) {
        let existing = self
            .entries
            .iter()
            .position(|entry| entry.spec.same_as(&spec));

        let entry = match existing {
            Some(index) => {
                let mut entry = self.entries.remove(index);
                if responses.is_single_value() {
                    tracing::trace!("Replacing responses for {}", entry.spec);
                    entry.responses = responses.responses;
                    entry.next = 0;
                } else {
                    tracing::trace!(
                        "Appending {} responses for {}",
                        responses.len(),
                        entry.spec
                    );
                    entry.responses.extend(responses.responses);
                }
                entry
            }
            None => {
                tracing::trace!("Configuring {} responses for {}", responses.len(), spec);
                ConfiguredEntry {
                    spec,
                    responses: responses.responses,
                    next: 0,
                }
            }
        };
        self.entries.push(entry);
    }

    /// Take the next response of the most recently configured specification
    /// accepting `call`.
    pub fn next_response_for(&mut self, call: &Call) -> Option<Response> {
        self.entries
            .iter_mut()
            .rev()
            .find(|entry| entry.spec.is_satisfied_by(call))
            .and_then(ConfiguredEntry::next_response)
    }

    /// Whether any configured specification accepts `call`.
    pub fn has_response_for(&self, call: &Call) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.spec.is_satisfied_by(call))
    }

    /// Number of distinct configured specifications.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
