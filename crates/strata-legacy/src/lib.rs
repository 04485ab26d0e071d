//! Strata Legacy
//!
//! Concrete providers for the legacy class systems the core consumes:
//! - Formal slot-based classes with distance-ordered superclass
//!   linearization and validity hooks
//! - Informal tag-stack helpers

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod formal;
pub mod informal;

pub use error::{LegacyError, LegacyResult};
pub use formal::{SlotClass, SlotClassBuilder, Validity};
pub use informal::{informal_class, inherits, structure, subclass, tag_stack, unclass};
