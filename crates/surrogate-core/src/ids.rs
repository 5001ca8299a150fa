//! Unique identifiers for substitutes.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one substitute instance; the target of every call made on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubstituteId(Uuid);

impl SubstituteId {
    /// Creates a new random substitute ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubstituteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubstituteId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "substitute-{}", self.0)
    }
}
