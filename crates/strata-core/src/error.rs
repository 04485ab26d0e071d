//! Runtime errors
//!
//! Every failure is surfaced synchronously to the immediate caller. Nothing
//! here is retried or swallowed by the engine.

use thiserror::Error;

/// Result alias used throughout the runtime
pub type StrataResult<T> = Result<T, StrataError>;

/// Errors raised by class resolution, the object model and dispatch
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StrataError {
    /// A value could not be interpreted as a class, or a class definition is malformed
    #[error("Invalid class specification: {0}")]
    InvalidClassSpec(String),

    /// A property name is declared twice in the same inheritance line
    #[error("Duplicate property @{property} in class <{class}>")]
    DuplicateProperty {
        /// Class being defined
        class: String,
        /// Offending property name
        property: String,
    },

    /// Property is not part of the class's property table
    #[error("Can't find property <{class}>@{property}")]
    UnknownProperty {
        /// Class of the object
        class: String,
        /// Requested property name
        property: String,
    },

    /// Property has a getter but no setter
    #[error("Can't set read-only property <{class}>@{property}")]
    ReadOnlyProperty {
        /// Class of the object
        class: String,
        /// Property name
        property: String,
    },

    /// Value does not satisfy the property's type constraint
    #[error("<{class}>@{property} must be {expected}, not {actual}")]
    PropertyType {
        /// Class of the object
        class: String,
        /// Property name
        property: String,
        /// Declared type constraint
        expected: String,
        /// Class of the rejected value
        actual: String,
    },

    /// A validator (or the property-type pass) rejected the object
    #[error("<{class}> object is invalid:\n- {}", .messages.join("\n- "))]
    Validation {
        /// Class whose validator failed
        class: String,
        /// Messages reported by that validator
        messages: Vec<String>,
    },

    /// Generic declaration is malformed
    #[error("Invalid generic signature: {0}")]
    InvalidSignature(String),

    /// Method signature length differs from the generic's dispatch arguments
    #[error("Signature for `{generic}` must have {expected} class(es), not {actual}")]
    SignatureArity {
        /// Generic name
        generic: String,
        /// Number of dispatch arguments
        expected: usize,
        /// Length of the supplied signature
        actual: usize,
    },

    /// Method formals do not line up with the generic's formals
    #[error("Method for `{generic}` is incompatible with the generic: {reason}")]
    IncompatibleMethod {
        /// Generic name
        generic: String,
        /// Description of the mismatch
        reason: String,
    },

    /// No registered method applies to the call
    #[error("Can't find method for `{generic}({})`:\n{}", .dispatch_args.join(", "), describe_classes(.dispatch_args, .classes))]
    MethodNotFound {
        /// Generic name
        generic: String,
        /// Dispatch argument names
        dispatch_args: Vec<String>,
        /// Class description of each dispatch argument, in order
        classes: Vec<String>,
    },

    /// Call arguments could not be matched to the generic's formals
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A required argument was not supplied
    #[error("Argument `{0}` is missing, with no default")]
    MissingArgument(String),

    /// A constructor did not return an instance of its class
    #[error("Constructor for <{class}> {reason}")]
    InvalidConstructor {
        /// Class being constructed
        class: String,
        /// What went wrong
        reason: String,
    },

    /// Error raised by user supplied code (methods, accessors, constructors)
    #[error("{0}")]
    Custom(String),
}

fn describe_classes(names: &[String], classes: &[String]) -> String {
    names
        .iter()
        .zip(classes)
        .map(|(name, class)| format!("- {}: {}", name, class))
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<String> for StrataError {
    fn from(s: String) -> Self {
        StrataError::Custom(s)
    }
}

impl From<&str> for StrataError {
    fn from(s: &str) -> Self {
        StrataError::Custom(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_found_lists_every_argument() {
        let err = StrataError::MethodNotFound {
            generic: "combine".to_string(),
            dispatch_args: vec!["x".to_string(), "y".to_string()],
            classes: vec!["<Z>".to_string(), "<double>".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("combine(x, y)"));
        assert!(msg.contains("- x: <Z>"));
        assert!(msg.contains("- y: <double>"));
    }

    #[test]
    fn test_validation_message_joins_lines() {
        let err = StrataError::Validation {
            class: "Range".to_string(),
            messages: vec!["end must be >= start".to_string(), "start must be finite".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "<Range> object is invalid:\n- end must be >= start\n- start must be finite"
        );
    }

    #[test]
    fn test_custom_from_str() {
        let err: StrataError = "boom".into();
        assert_eq!(err, StrataError::Custom("boom".to_string()));
    }
}
