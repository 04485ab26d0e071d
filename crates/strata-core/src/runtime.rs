//! Embedding surface
//!
//! A [`Runtime`] owns name-indexed registries of classes and generics and
//! exposes the object-model and dispatch operations by name. Class and
//! method definitions may arrive at any point, including while other
//! threads dispatch; redefining a name replaces the previous definition.

use crate::args::Args;
use crate::class::{ClassDescriptor, NativeClass, NativeClassBuilder};
use crate::config::{RedefinitionPolicy, RuntimeOptions};
use crate::dispatch::Candidate;
use crate::error::{StrataError, StrataResult};
use crate::generic::{Generic, GenericBuilder, Method};
use crate::object::Object;
use crate::property::PropertySpec;
use crate::validate::validate_value;
use crate::value::{BaseType, Function, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Class and generic registries plus the operations over them
pub struct Runtime {
    options: RuntimeOptions,
    classes: RwLock<FxHashMap<String, ClassDescriptor>>,
    generics: RwLock<FxHashMap<String, Arc<Generic>>>,
}

impl Runtime {
    /// Create a runtime with default options
    pub fn new() -> Self {
        Self::with_options(RuntimeOptions::default())
    }

    /// Create a runtime with the given options
    ///
    /// Base types and the root class are registered up front.
    pub fn with_options(options: RuntimeOptions) -> Self {
        let mut classes = FxHashMap::default();
        for ty in BaseType::ALL {
            classes.insert(ty.name().to_string(), ClassDescriptor::Base(ty));
        }
        let root = NativeClass::root();
        classes.insert(root.key().to_string(), ClassDescriptor::Native(root));

        Self {
            options,
            classes: RwLock::new(classes),
            generics: RwLock::new(FxHashMap::default()),
        }
    }

    /// Options the runtime was created with
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Build and register a native class
    pub fn new_class(&self, builder: NativeClassBuilder) -> StrataResult<Arc<NativeClass>> {
        let class = builder.build()?;
        if let Some(max) = self.options.max_inheritance_depth {
            if class.depth() > max {
                return Err(StrataError::InvalidClassSpec(format!(
                    "<{}> is {} levels deep, the limit is {}",
                    class.key(),
                    class.depth(),
                    max
                )));
            }
        }
        self.register_class(ClassDescriptor::Native(class.clone()))?;
        Ok(class)
    }

    /// Register a class of any kind under its registration key
    pub fn register_class(&self, class: ClassDescriptor) -> StrataResult<()> {
        if matches!(class, ClassDescriptor::Union(_)) {
            return Err(StrataError::InvalidClassSpec(format!(
                "{} is a union and can't be registered by name",
                class
            )));
        }
        let key = class.register_key();
        let previous = self.classes.write().insert(key.clone(), class);
        if previous.is_some() {
            self.redefined("class", &key);
        }
        Ok(())
    }

    /// Registered class by key
    pub fn class(&self, name: &str) -> Option<ClassDescriptor> {
        self.classes.read().get(name).cloned()
    }

    /// Interpret a value as a class, looking up registered names first
    pub fn resolve_class(&self, value: &Value) -> StrataResult<ClassDescriptor> {
        if let Some(class) = value.as_str().and_then(|name| self.class(name)) {
            return Ok(class);
        }
        ClassDescriptor::classify(value)
    }

    /// Start a property specification
    pub fn new_property(name: impl Into<String>, class: Option<ClassDescriptor>) -> PropertySpec {
        let spec = PropertySpec::new(name);
        match class {
            Some(class) => spec.typed(class),
            None => spec,
        }
    }

    /// Create and register a generic with default formals
    pub fn new_generic<I, S>(&self, name: &str, dispatch_args: I) -> StrataResult<Arc<Generic>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.define_generic(Generic::builder(name).dispatch_args(dispatch_args))
    }

    /// Build and register a generic
    pub fn define_generic(&self, builder: GenericBuilder) -> StrataResult<Arc<Generic>> {
        let generic = builder.build()?;
        let previous = self
            .generics
            .write()
            .insert(generic.name().to_string(), generic.clone());
        if previous.is_some() {
            self.redefined("generic", generic.name());
        }
        Ok(generic)
    }

    /// Registered generic by name
    pub fn generic(&self, name: &str) -> Option<Arc<Generic>> {
        self.generics.read().get(name).cloned()
    }

    /// Register a method on a named generic
    ///
    /// Returns whether an existing method was replaced.
    pub fn register_method<I>(&self, generic: &str, signature: I, function: Function) -> StrataResult<bool>
    where
        I: IntoIterator<Item = ClassDescriptor>,
    {
        let generic = self.require_generic(generic)?;
        let replaced = generic.register(signature, function)?;
        if replaced {
            self.redefined("method", generic.name());
        }
        Ok(replaced)
    }

    /// Method registered for exactly `signature`
    pub fn lookup_method<I>(&self, generic: &str, signature: I) -> StrataResult<Option<Arc<Method>>>
    where
        I: IntoIterator<Item = ClassDescriptor>,
    {
        self.require_generic(generic)?.lookup(signature)
    }

    /// Remove the method registered for exactly `signature`
    pub fn remove_method<I>(&self, generic: &str, signature: I) -> StrataResult<bool>
    where
        I: IntoIterator<Item = ClassDescriptor>,
    {
        self.require_generic(generic)?.remove(signature)
    }

    /// Method dispatch would select for arguments of these classes
    pub fn resolve_method(&self, generic: &str, classes: &[ClassDescriptor]) -> StrataResult<Arc<Method>> {
        self.require_generic(generic)?.resolve(classes)
    }

    /// Candidate signatures for a call, in search order
    pub fn explain(&self, generic: &str, args: &Args) -> StrataResult<Vec<Candidate>> {
        self.require_generic(generic)?.explain(args)
    }

    /// Construct an instance of `class`
    pub fn construct(&self, class: &ClassDescriptor, args: &Args) -> StrataResult<Value> {
        class.construct(args)
    }

    /// Read a property
    pub fn get_prop(&self, object: &Object, name: &str) -> StrataResult<Value> {
        object.get(name)
    }

    /// Write a property, returning the updated object
    pub fn set_prop(&self, object: &Object, name: &str, value: Value) -> StrataResult<Object> {
        object.set(name, value)
    }

    /// Write several properties with a single validation
    pub fn set_props<I, S>(&self, object: &Object, values: I) -> StrataResult<Object>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: AsRef<str>,
    {
        object.set_all(values)
    }

    /// Validate a native object or formal instance
    pub fn validate(&self, value: &Value) -> StrataResult<()> {
        validate_value(value)
    }

    /// Call a named generic
    pub fn dispatch(&self, generic: &str, args: &Args) -> StrataResult<Value> {
        self.require_generic(generic)?.call(args)
    }

    fn require_generic(&self, name: &str) -> StrataResult<Arc<Generic>> {
        self.generic(name)
            .ok_or_else(|| StrataError::InvalidSignature(format!("no generic named `{}`", name)))
    }

    fn redefined(&self, what: &str, name: &str) {
        match self.options.redefinition {
            RedefinitionPolicy::Replace => debug!(kind = what, name, "replaced definition"),
            RedefinitionPolicy::Warn => warn!(kind = what, name, "replaced existing {}", what),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_types_preregistered() {
        let rt = Runtime::new();
        assert_eq!(rt.class("double"), Some(ClassDescriptor::Base(BaseType::Double)));
        assert_eq!(
            rt.class("object"),
            Some(ClassDescriptor::Native(NativeClass::root()))
        );
    }

    #[test]
    fn test_resolve_class_by_name() {
        let rt = Runtime::new();
        let point = rt.new_class(NativeClass::builder("Point")).unwrap();
        assert_eq!(
            rt.resolve_class(&Value::string("Point")).unwrap(),
            ClassDescriptor::Native(point)
        );
        assert_eq!(rt.resolve_class(&Value::string("ANY")).unwrap(), ClassDescriptor::Any);
        assert!(rt.resolve_class(&Value::string("Nope")).is_err());
    }

    #[test]
    fn test_depth_limit() {
        let rt = Runtime::with_options(RuntimeOptions::default().with_max_inheritance_depth(1));
        let a = rt.new_class(NativeClass::builder("A")).unwrap();
        let err = rt.new_class(NativeClass::builder("B").parent(&a)).unwrap_err();
        assert!(matches!(err, StrataError::InvalidClassSpec(_)));
        assert!(rt.class("B").is_none());
    }

    #[test]
    fn test_redefinition_replaces() {
        let rt = Runtime::with_options(RuntimeOptions::default().with_redefinition(RedefinitionPolicy::Warn));
        let first = rt.new_class(NativeClass::builder("A")).unwrap();
        let second = rt.new_class(NativeClass::builder("A")).unwrap();
        assert_ne!(ClassDescriptor::from(&first), ClassDescriptor::from(&second));
        assert_eq!(rt.class("A"), Some(ClassDescriptor::Native(second)));
    }

    #[test]
    fn test_unions_not_registrable() {
        let rt = Runtime::new();
        let union = ClassDescriptor::Union(crate::class::ClassUnion::numeric());
        assert!(rt.register_class(union).is_err());
    }

    #[test]
    fn test_unknown_generic() {
        let rt = Runtime::new();
        assert!(matches!(
            rt.dispatch("nope", &Args::new()),
            Err(StrataError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_dispatch_by_name() {
        let rt = Runtime::new();
        rt.new_generic("describe", ["x"]).unwrap();
        rt.register_method(
            "describe",
            [ClassDescriptor::Any],
            Function::new(["x"], |args| Ok(Value::string(args.value("x")?.describe()))),
        )
        .unwrap();
        assert_eq!(
            rt.dispatch("describe", &Args::new().arg(1i64)).unwrap(),
            Value::string("<integer>")
        );
        assert!(rt.lookup_method("describe", [ClassDescriptor::Any]).unwrap().is_some());

        let method = rt
            .resolve_method("describe", &[ClassDescriptor::Base(BaseType::Double)])
            .unwrap();
        assert_eq!(method.keys(), ["ANY"]);
        let candidates = rt.explain("describe", &Args::new().arg(1.0)).unwrap();
        assert_eq!(
            candidates.iter().map(|c| c.registered).collect::<Vec<_>>(),
            [false, true]
        );

        assert!(rt.remove_method("describe", [ClassDescriptor::Any]).unwrap());
    }
}
