//! Validation of native objects and formal instances

use crate::class::{is_a, ClassDescriptor, FormalInstance};
use crate::error::{StrataError, StrataResult};
use crate::object::Object;
use crate::value::Value;

/// Validate a native object
///
/// Every stored property is first checked against its declared type, with
/// all failures reported together. Then the validators of the class lineage
/// run from the root down to the object's own class; the first one to report
/// problems ends the walk.
pub fn validate(object: &Object) -> StrataResult<()> {
    let class = object.class();

    let mut problems = Vec::new();
    for spec in class.properties().iter().filter(|spec| spec.is_stored()) {
        let value = object.stored(spec.name()).cloned().unwrap_or(Value::Null);
        if let Err(err) = spec.check(class.key(), &value) {
            problems.push(err.to_string());
        }
    }
    if let Some(ty) = class.base_type() {
        let base = ClassDescriptor::Base(ty);
        match object.data() {
            Some(data) if is_a(Some(data), &base) => {}
            data => problems.push(format!(
                "Underlying data must be {}, not {}",
                base,
                data.map_or_else(|| "<MISSING>".to_string(), Value::describe)
            )),
        }
    }
    if !problems.is_empty() {
        return Err(StrataError::Validation {
            class: class.key().to_string(),
            messages: problems,
        });
    }

    for ancestor in class.lineage() {
        let Some(validator) = ancestor.validator() else {
            continue;
        };
        let messages = validator(object);
        if !messages.is_empty() {
            return Err(StrataError::Validation {
                class: class.key().to_string(),
                messages,
            });
        }
    }
    Ok(())
}

/// Validate a formal instance with the formal system's validity hooks
///
/// Hooks run from the most general superclass down to the instance's class.
pub fn validate_formal(instance: &FormalInstance) -> StrataResult<()> {
    let class = instance.class();
    let mut lineage = class.superclasses();
    lineage.reverse();
    lineage.push(class.clone());

    for ancestor in lineage {
        let messages = ancestor.validity(instance);
        if !messages.is_empty() {
            let name = match class.package() {
                Some(package) => format!("{}::{}", package, class.name()),
                None => class.name().to_string(),
            };
            return Err(StrataError::Validation { class: name, messages });
        }
    }
    Ok(())
}

/// Validate any value the runtime knows how to validate
///
/// Values other than native objects and formal instances are always valid.
pub fn validate_value(value: &Value) -> StrataResult<()> {
    match value {
        Value::Object(object) => validate(object),
        Value::Formal(instance) => validate_formal(instance),
        _ => Ok(()),
    }
}
