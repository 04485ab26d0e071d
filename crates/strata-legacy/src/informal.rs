//! Informal tag-stack objects
//!
//! An informal object is plain data wearing an ordered list of class tags.
//! Nothing checks that the data fits the tags.

use crate::error::{LegacyError, LegacyResult};
use strata_core::{InformalClass, Value};

/// Attach a tag stack to `data`, most specific tag first
///
/// Tagging an already informal value replaces its tags and keeps the data.
pub fn structure<I, S>(data: Value, tags: I) -> LegacyResult<Value>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
    if tags.is_empty() || tags.iter().any(String::is_empty) {
        return Err(LegacyError::EmptyTags);
    }
    Ok(Value::informal(tags, unclass(&data)))
}

/// Push `tag` on top of the value's tag stack
pub fn subclass(value: &Value, tag: impl Into<String>) -> LegacyResult<Value> {
    let mut tags = vec![tag.into()];
    if let Value::Informal(informal) = value {
        tags.extend(informal.tags.iter().cloned());
    }
    structure(value.clone(), tags)
}

/// Tag stack the value answers to, most specific first
///
/// Untagged values report their implicit class.
pub fn tag_stack(value: &Value) -> Vec<String> {
    value.class_chain().into_owned()
}

/// Check whether `tag` appears anywhere in the value's tag stack
pub fn inherits(value: &Value, tag: &str) -> bool {
    value.class_chain().iter().any(|t| t == tag)
}

/// Strip the tags, returning the underlying data
pub fn unclass(value: &Value) -> Value {
    match value {
        Value::Informal(informal) => informal.data.clone(),
        Value::Object(object) => object.data().cloned().unwrap_or_else(|| value.clone()),
        other => other.clone(),
    }
}

/// Informal class of a tagged value
pub fn informal_class(value: &Value) -> Option<InformalClass> {
    match value {
        Value::Informal(informal) => InformalClass::new(informal.tags.iter().cloned()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{ClassDescriptor, InformalClass};

    #[test]
    fn test_structure_requires_tags() {
        assert_eq!(
            structure(Value::integer(1), Vec::<String>::new()),
            Err(LegacyError::EmptyTags)
        );
        let value = structure(Value::integer(1), ["factor"]).unwrap();
        assert_eq!(tag_stack(&value), ["factor"]);
    }

    #[test]
    fn test_restructure_keeps_data() {
        let value = structure(Value::integer(1), ["factor"]).unwrap();
        let retagged = structure(value, ["other"]).unwrap();
        assert_eq!(unclass(&retagged), Value::integer(1));
        assert_eq!(tag_stack(&retagged), ["other"]);
    }

    #[test]
    fn test_subclass_prepends() {
        let factor = structure(Value::integer(1), ["factor"]).unwrap();
        let ordered = subclass(&factor, "ordered").unwrap();
        assert_eq!(tag_stack(&ordered), ["ordered", "factor"]);
        assert!(inherits(&ordered, "factor"));
        assert!(!inherits(&ordered, "numeric"));
    }

    #[test]
    fn test_implicit_class_of_untagged_values() {
        assert_eq!(tag_stack(&Value::double(1.0)), ["double"]);
        assert_eq!(unclass(&Value::double(1.0)), Value::double(1.0));
        assert!(informal_class(&Value::double(1.0)).is_none());
    }

    #[test]
    fn test_informal_class_matches_value() {
        let value = structure(Value::integer(1), ["ordered", "factor"]).unwrap();
        let class = informal_class(&value).unwrap();
        assert_eq!(class, InformalClass::new(["ordered", "factor"]).unwrap());
        assert!(value.is_a(&ClassDescriptor::Informal(class)));
    }
}
