//! Errors raised while defining legacy classes

use strata_core::StrataError;
use thiserror::Error;

/// Result alias for legacy class definitions
pub type LegacyResult<T> = Result<T, LegacyError>;

/// Errors from the formal and informal class systems
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LegacyError {
    /// Formal class defined without a name
    #[error("Formal class name must not be empty")]
    EmptyName,

    /// Slot declared twice on the same class
    #[error("Slot @{slot} is declared twice in formal class {class}")]
    DuplicateSlot {
        /// Class being defined
        class: String,
        /// Slot name
        slot: String,
    },

    /// Slot redeclared with a type that differs from the inherited one
    #[error("Slot @{slot} of {class} must be {inherited} like the inherited slot, not {declared}")]
    SlotConflict {
        /// Class being defined
        class: String,
        /// Slot name
        slot: String,
        /// Type declared by a superclass
        inherited: String,
        /// Type declared here
        declared: String,
    },

    /// Informal object given an empty tag stack
    #[error("Informal objects need at least one non-empty tag")]
    EmptyTags,
}

impl From<LegacyError> for StrataError {
    fn from(err: LegacyError) -> Self {
        StrataError::InvalidClassSpec(err.to_string())
    }
}
