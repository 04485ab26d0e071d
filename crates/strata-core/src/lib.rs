//! Strata Core
//!
//! Object runtime layered over heterogeneous host values:
//! - Class descriptors unifying native, base, informal and formal classes
//! - Typed properties with accessors, defaults and validation
//! - Generic functions with nested multi-argument dispatch
//!
//! The legacy class systems are consumed through read-only hooks; see the
//! `strata-legacy` crate for concrete providers.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod args;
pub mod class;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod generic;
pub mod object;
pub mod property;
pub mod registry;
pub mod runtime;
pub mod validate;
pub mod value;

pub use args::{Args, BoundArgs};
pub use class::{
    formal_chain, formal_key, is_a, ClassDescriptor, ClassKind, ClassUnion, FormalClass, FormalClassHandle,
    FormalInstance, InformalClass, NativeClass, NativeClassBuilder, ANY_KEY, DATA_PROPERTY, MISSING_KEY,
    ROOT_NAME,
};
pub use config::{RedefinitionPolicy, RuntimeOptions};
pub use dispatch::Candidate;
pub use error::{StrataError, StrataResult};
pub use generic::{Generic, GenericBuilder, Method};
pub use object::{new_object, Object};
pub use property::PropertySpec;
pub use registry::MethodTable;
pub use runtime::Runtime;
pub use validate::{validate, validate_formal, validate_value};
pub use value::{BaseType, Function, InformalValue, Value, CLASS_TAG, VARIADIC};
