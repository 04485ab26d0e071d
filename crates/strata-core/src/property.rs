//! Property specifications and per-class property tables

use crate::class::{is_a, ClassDescriptor};
use crate::error::{StrataError, StrataResult};
use crate::object::Object;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Computes a property value from the object
pub type Getter = Arc<dyn Fn(&Object) -> StrataResult<Value> + Send + Sync>;

/// Applies a new property value; receives the staged object and returns it
pub type Setter = Arc<dyn Fn(Object, Value) -> StrataResult<Object> + Send + Sync>;

/// Produces a default value at construction time
pub type DefaultFn = Arc<dyn Fn() -> StrataResult<Value> + Send + Sync>;

/// A named, optionally typed unit of object state
#[derive(Clone)]
pub struct PropertySpec {
    name: String,
    class: Option<ClassDescriptor>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    default: Option<DefaultFn>,
}

impl PropertySpec {
    /// Untyped property with no accessors and no default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: None,
            getter: None,
            setter: None,
            default: None,
        }
    }

    /// Constrain values to `class`
    pub fn typed(mut self, class: impl Into<ClassDescriptor>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Compute the value on read
    pub fn getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Object) -> StrataResult<Value> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    /// Route writes through `setter`
    pub fn setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(Object, Value) -> StrataResult<Object> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Produce the initial value with `default`
    pub fn default_with<F>(mut self, default: F) -> Self
    where
        F: Fn() -> StrataResult<Value> + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(default));
        self
    }

    /// Start from a fixed value
    pub fn default_value(self, value: Value) -> Self {
        self.default_with(move || Ok(value.clone()))
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type, if any
    pub fn class(&self) -> Option<&ClassDescriptor> {
        self.class.as_ref()
    }

    /// Getter, if any
    pub fn get_fn(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    /// Setter, if any
    pub fn set_fn(&self) -> Option<&Setter> {
        self.setter.as_ref()
    }

    /// A getter without a setter makes the property read-only
    pub fn is_read_only(&self) -> bool {
        self.getter.is_some() && self.setter.is_none()
    }

    /// Whether the value lives in the object's slot store
    pub fn is_stored(&self) -> bool {
        self.getter.is_none()
    }

    /// Check `value` against the declared type
    pub fn check(&self, owner: &str, value: &Value) -> StrataResult<()> {
        match &self.class {
            Some(class) if !is_a(Some(value), class) => Err(StrataError::PropertyType {
                class: owner.to_string(),
                property: self.name.clone(),
                expected: class.to_string(),
                actual: value.describe(),
            }),
            _ => Ok(()),
        }
    }

    /// Slot value an object starts with
    ///
    /// `None` for computed properties. Otherwise the default, or the empty
    /// value of the declared type, or null when untyped.
    pub fn initial_value(&self) -> StrataResult<Option<Value>> {
        if !self.is_stored() {
            return Ok(None);
        }
        let value = match (&self.default, &self.class) {
            (Some(default), _) => default()?,
            (None, Some(class)) => class.empty_value()?,
            (None, None) => Value::Null,
        };
        Ok(Some(value))
    }
}

impl fmt::Debug for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySpec")
            .field("name", &self.name)
            .field("class", &self.class.as_ref().map(ToString::to_string))
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("default", &self.default.is_some())
            .finish()
    }
}

/// Ordered property table of a class, inherited properties first
#[derive(Clone, Default)]
pub struct PropertyTable {
    specs: Vec<Arc<PropertySpec>>,
    index: FxHashMap<String, usize>,
}

impl PropertyTable {
    /// Merge `own` after the parent's properties
    ///
    /// A name may appear only once across the whole inheritance line.
    pub fn build(class: &str, parent: &PropertyTable, own: Vec<PropertySpec>) -> StrataResult<Self> {
        let mut table = parent.clone();
        for spec in own {
            if spec.name.is_empty() {
                return Err(StrataError::InvalidClassSpec(format!(
                    "<{}> declares a property with an empty name",
                    class
                )));
            }
            if table.index.contains_key(&spec.name) {
                return Err(StrataError::DuplicateProperty {
                    class: class.to_string(),
                    property: spec.name,
                });
            }
            table.index.insert(spec.name.clone(), table.specs.len());
            table.specs.push(Arc::new(spec));
        }
        Ok(table)
    }

    /// Look up a property
    pub fn get(&self, name: &str) -> Option<&PropertySpec> {
        self.index.get(name).map(|&i| self.specs[i].as_ref())
    }

    /// Check if a property exists
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Property names in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|spec| spec.name())
    }

    /// Properties in table order
    pub fn iter(&self) -> impl Iterator<Item = &PropertySpec> {
        self.specs.iter().map(Arc::as_ref)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl fmt::Debug for PropertyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
