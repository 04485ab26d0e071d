//! Native objects
//!
//! An object is a value: `set` and `set_all` stage their changes on a copy,
//! validate the copy and only then hand it back. The receiver is never
//! touched, so a failed mutation leaves the caller's object as it was.

use crate::class::{is_a, ClassDescriptor, NativeClass, DATA_PROPERTY};
use crate::error::{StrataError, StrataResult};
use crate::property::PropertySpec;
use crate::validate;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Instance of a native class
#[derive(Clone)]
pub struct Object {
    class: Arc<NativeClass>,
    slots: FxHashMap<String, Value>,
    data: Option<Box<Value>>,
}

impl Object {
    /// Class the object was constructed from
    pub fn class(&self) -> &Arc<NativeClass> {
        &self.class
    }

    /// Display tag for legacy dispatch: the full ancestor chain
    pub fn tags(&self) -> &[String] {
        self.class.ancestors()
    }

    /// Base value, for classes that extend a base type
    pub fn data(&self) -> Option<&Value> {
        self.data.as_deref()
    }

    /// Raw slot value, bypassing getters
    pub fn stored(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Raw slot write, bypassing type checks, setters and validation
    ///
    /// Meant for accessor implementations. The next [`validate`](Self::validate)
    /// still type-checks every slot.
    pub fn store(&mut self, name: impl Into<String>, value: Value) {
        self.slots.insert(name.into(), value);
    }

    /// Read a property
    pub fn get(&self, name: &str) -> StrataResult<Value> {
        if name == DATA_PROPERTY && self.class.base_type().is_some() {
            return Ok(self.data().cloned().unwrap_or(Value::Null));
        }
        let spec = self.spec(name)?;
        match spec.get_fn() {
            Some(getter) => getter(self),
            None => Ok(self.slots.get(name).cloned().unwrap_or(Value::Null)),
        }
    }

    /// Write a property and validate the result
    pub fn set(&self, name: &str, value: Value) -> StrataResult<Object> {
        let staged = self.clone().stage(name, value)?;
        staged.validate()?;
        Ok(staged)
    }

    /// Write several properties, validating once at the end
    ///
    /// Intermediate states are never validated, so updates that are only
    /// consistent as a whole go through here.
    pub fn set_all<I, S>(&self, values: I) -> StrataResult<Object>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        let mut staged = self.clone();
        for (name, value) in values {
            staged = staged.stage(name.as_ref(), value)?;
        }
        staged.validate()?;
        Ok(staged)
    }

    /// Run the property-type pass and the validator chain
    pub fn validate(&self) -> StrataResult<()> {
        validate::validate(self)
    }

    /// Check whether the object is an instance of `class`
    pub fn is_a(&self, class: &ClassDescriptor) -> bool {
        match class {
            ClassDescriptor::Native(native) => self.tags().iter().any(|name| name == native.key()),
            other => is_a(Some(&Value::Object(self.clone())), other),
        }
    }

    fn spec(&self, name: &str) -> StrataResult<&PropertySpec> {
        self.class
            .properties()
            .get(name)
            .ok_or_else(|| StrataError::UnknownProperty {
                class: self.class.key().to_string(),
                property: name.to_string(),
            })
    }

    /// Type-check and apply one write without validating
    fn stage(mut self, name: &str, value: Value) -> StrataResult<Object> {
        if name == DATA_PROPERTY {
            if let Some(ty) = self.class.base_type() {
                if !is_a(Some(&value), &ClassDescriptor::Base(ty)) {
                    return Err(StrataError::PropertyType {
                        class: self.class.key().to_string(),
                        property: DATA_PROPERTY.to_string(),
                        expected: ClassDescriptor::Base(ty).to_string(),
                        actual: value.describe(),
                    });
                }
                self.data = Some(Box::new(value));
                return Ok(self);
            }
        }

        let class = self.class.clone();
        let spec = class
            .properties()
            .get(name)
            .ok_or_else(|| StrataError::UnknownProperty {
                class: class.key().to_string(),
                property: name.to_string(),
            })?;
        if spec.is_read_only() {
            return Err(StrataError::ReadOnlyProperty {
                class: class.key().to_string(),
                property: name.to_string(),
            });
        }
        spec.check(class.key(), &value)?;

        match spec.set_fn() {
            Some(setter) => setter(self, value),
            None => {
                self.slots.insert(name.to_string(), value);
                Ok(self)
            }
        }
    }
}

/// Root object initializer
///
/// Every constructor ends here. `parent` is either an instance of the
/// class's native parent, whose stored properties and base value are carried
/// over, or the base value of a class that extends a base type. Remaining
/// stored properties start from their defaults or from the empty value of
/// their type. `props` are applied as writes and the result is validated
/// once.
pub fn new_object<I>(class: &Arc<NativeClass>, parent: Option<Value>, props: I) -> StrataResult<Object>
where
    I: IntoIterator<Item = (String, Value)>,
{
    if class.is_abstract() {
        return Err(StrataError::InvalidClassSpec(format!(
            "can't construct an object from abstract class <{}>",
            class.key()
        )));
    }

    let mut object = Object {
        class: class.clone(),
        slots: FxHashMap::default(),
        data: None,
    };

    match parent {
        None => {}
        Some(Value::Object(parent)) if inherits_from_parent(class, &parent) => {
            for (name, value) in parent.slots {
                if class.properties().contains(&name) {
                    object.slots.insert(name, value);
                }
            }
            object.data = parent.data;
        }
        Some(value) => match class.base_type() {
            Some(ty) if is_a(Some(&value), &ClassDescriptor::Base(ty)) => {
                object.data = Some(Box::new(value));
            }
            _ => {
                return Err(StrataError::InvalidConstructor {
                    class: class.key().to_string(),
                    reason: format!("can't initialize from {}", value.describe()),
                })
            }
        },
    }

    let props: Vec<(String, Value)> = props.into_iter().collect();
    for spec in class.properties().iter() {
        if object.slots.contains_key(spec.name()) || props.iter().any(|(name, _)| name == spec.name()) {
            continue;
        }
        if let Some(value) = spec.initial_value()? {
            object.slots.insert(spec.name().to_string(), value);
        }
    }
    if object.data.is_none() {
        object.data = class.base_type().map(|ty| Box::new(ty.empty()));
    }

    for (name, value) in props {
        object = object.stage(&name, value)?;
    }
    object.validate()?;
    Ok(object)
}

fn inherits_from_parent(class: &NativeClass, parent: &Object) -> bool {
    match class.native_parent() {
        Some(native) => parent.class().ancestors().iter().any(|name| name == native.key()),
        None => false,
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct(self.class.key());
        for name in self.class.properties().names() {
            if let Some(value) = self.slots.get(name) {
                debug.field(name, value);
            }
        }
        if let Some(data) = &self.data {
            debug.field(DATA_PROPERTY, data);
        }
        debug.finish()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.class, &other.class) && self.slots == other.slots && self.data == other.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Args;
    use crate::value::BaseType;

    fn point() -> Arc<NativeClass> {
        NativeClass::builder("Point")
            .property(PropertySpec::new("x").typed(BaseType::Double))
            .property(PropertySpec::new("y").typed(BaseType::Double))
            .build()
            .unwrap()
    }

    #[test]
    fn test_typed_properties_start_empty() {
        let obj = point().construct(&Args::new()).unwrap();
        assert_eq!(obj.get("x").unwrap(), Value::Double(vec![]));
        assert_eq!(obj.tags(), ["Point", "object"]);
    }

    #[test]
    fn test_set_returns_new_object() {
        let obj = point().construct(&Args::new().named("x", 1.0)).unwrap();
        let moved = obj.set("x", Value::double(5.0)).unwrap();
        assert_eq!(moved.get("x").unwrap(), Value::double(5.0));
        assert_eq!(obj.get("x").unwrap(), Value::double(1.0));
    }

    #[test]
    fn test_unknown_property() {
        let obj = point().construct(&Args::new()).unwrap();
        assert!(matches!(obj.get("z"), Err(StrataError::UnknownProperty { .. })));
        assert!(matches!(
            obj.set("z", Value::double(1.0)),
            Err(StrataError::UnknownProperty { .. })
        ));
        assert!(matches!(
            point().construct(&Args::new().named("z", 1.0)),
            Err(StrataError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn test_type_checked_on_set() {
        let obj = point().construct(&Args::new()).unwrap();
        let err = obj.set("x", Value::string("one")).unwrap_err();
        assert_eq!(err.to_string(), "<Point>@x must be <double>, not <character>");
    }

    #[test]
    fn test_getter_and_setter() {
        let class = NativeClass::builder("Temp")
            .property(PropertySpec::new("celsius").typed(BaseType::Double))
            .property(
                PropertySpec::new("fahrenheit")
                    .getter(|obj| {
                        let c = obj.get("celsius")?.as_f64().unwrap_or_default();
                        Ok(Value::double(c * 9.0 / 5.0 + 32.0))
                    })
                    .setter(|mut obj, value| {
                        let f = value.as_f64().unwrap_or_default();
                        obj.store("celsius", Value::double((f - 32.0) * 5.0 / 9.0));
                        Ok(obj)
                    }),
            )
            .build()
            .unwrap();

        let obj = class.construct(&Args::new().named("celsius", 100.0)).unwrap();
        assert_eq!(obj.get("fahrenheit").unwrap(), Value::double(212.0));

        let obj = obj.set("fahrenheit", Value::double(32.0)).unwrap();
        assert_eq!(obj.get("celsius").unwrap(), Value::double(0.0));
    }

    #[test]
    fn test_read_only_rejected_at_construction() {
        let class = NativeClass::builder("Fixed")
            .property(PropertySpec::new("answer").getter(|_| Ok(Value::integer(42))))
            .build()
            .unwrap();
        assert!(matches!(
            class.construct(&Args::new().named("answer", 1i64)),
            Err(StrataError::ReadOnlyProperty { .. })
        ));
    }

    #[test]
    fn test_parent_instance_is_inherited() {
        let base = point();
        let labeled = NativeClass::builder("Labeled")
            .parent(&base)
            .property(PropertySpec::new("label").typed(BaseType::Character))
            .build()
            .unwrap();

        let p = base.construct(&Args::new().named("x", 1.0).named("y", 2.0)).unwrap();
        let obj = new_object(&labeled, Some(Value::Object(p)), vec![("label".to_string(), Value::string("a"))])
            .unwrap();
        assert_eq!(obj.get("x").unwrap(), Value::double(1.0));
        assert_eq!(obj.get("label").unwrap(), Value::string("a"));
        assert!(obj.is_a(&ClassDescriptor::Native(base)));
    }

    #[test]
    fn test_unrelated_parent_is_rejected() {
        let labeled = NativeClass::builder("Labeled").parent(point()).build().unwrap();
        let other = NativeClass::builder("Other").build().unwrap();
        let o = other.construct(&Args::new()).unwrap();
        let err = new_object(&labeled, Some(Value::Object(o)), Vec::new()).unwrap_err();
        assert!(matches!(err, StrataError::InvalidConstructor { .. }));
    }

    #[test]
    fn test_data_property() {
        let class = NativeClass::builder("Celsius")
            .parent(BaseType::Double)
            .build()
            .unwrap();
        let obj = class.construct(&Args::new()).unwrap();
        assert_eq!(obj.get(".data").unwrap(), Value::Double(vec![]));

        let obj = obj.set(".data", Value::double(4.0)).unwrap();
        assert_eq!(obj.data(), Some(&Value::double(4.0)));
        assert_eq!(Value::Object(obj.clone()).base_type(), BaseType::Double);
        assert!(matches!(
            obj.set(".data", Value::string("hot")),
            Err(StrataError::PropertyType { .. })
        ));
    }

    #[test]
    fn test_default_value_used() {
        let class = NativeClass::builder("Counter")
            .property(
                PropertySpec::new("count")
                    .typed(BaseType::Integer)
                    .default_value(Value::integer(0)),
            )
            .build()
            .unwrap();
        let obj = class.construct(&Args::new()).unwrap();
        assert_eq!(obj.get("count").unwrap(), Value::integer(0));
    }
}
