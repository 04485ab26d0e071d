//! Native classes
//!
//! Single inheritance, memoized ancestor chains, merged property tables and
//! per-class validators. Classes are immutable once built and shared as
//! `Arc<NativeClass>`.

use super::{ClassDescriptor, ROOT_NAME};
use crate::args::Args;
use crate::error::{StrataError, StrataResult};
use crate::object::{new_object, Object};
use crate::property::{PropertySpec, PropertyTable};
use crate::value::BaseType;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Per-class validator; returns the problems found, empty when valid
pub type Validator = Arc<dyn Fn(&Object) -> Vec<String> + Send + Sync>;

/// Custom constructor; must finish by calling [`new_object`]
pub type Constructor = Arc<dyn Fn(&Arc<NativeClass>, &Args) -> StrataResult<Object> + Send + Sync>;

/// Name of the pseudo-property carrying the base value of classes that extend a base type
pub const DATA_PROPERTY: &str = ".data";

static ROOT: Lazy<Arc<NativeClass>> = Lazy::new(|| {
    Arc::new(NativeClass {
        name: ROOT_NAME.to_string(),
        package: None,
        key: ROOT_NAME.to_string(),
        parent: None,
        is_abstract: false,
        validator: None,
        properties: PropertyTable::default(),
        constructor: None,
        chain: vec![ROOT_NAME.to_string()],
    })
});

/// A class defined by this runtime
pub struct NativeClass {
    name: String,
    package: Option<String>,
    key: String,
    /// `None` only for the root
    parent: Option<ClassDescriptor>,
    is_abstract: bool,
    validator: Option<Validator>,
    properties: PropertyTable,
    constructor: Option<Constructor>,
    chain: Vec<String>,
}

impl NativeClass {
    /// Start defining a class
    pub fn builder(name: impl Into<String>) -> NativeClassBuilder {
        NativeClassBuilder {
            name: name.into(),
            package: None,
            parent: None,
            is_abstract: false,
            validator: None,
            properties: Vec::new(),
            constructor: None,
        }
    }

    /// The universal root class
    pub fn root() -> Arc<NativeClass> {
        ROOT.clone()
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning package, if any
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// Registration key (`package::name` or `name`)
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Direct parent; `None` for the root
    pub fn parent(&self) -> Option<&ClassDescriptor> {
        self.parent.as_ref()
    }

    /// Direct parent when it is a native class
    pub fn native_parent(&self) -> Option<&Arc<NativeClass>> {
        self.parent.as_ref().and_then(ClassDescriptor::as_native)
    }

    /// Base type this class (or a native ancestor) extends, if any
    pub fn base_type(&self) -> Option<BaseType> {
        match &self.parent {
            Some(ClassDescriptor::Base(ty)) => Some(*ty),
            Some(ClassDescriptor::Native(parent)) => parent.base_type(),
            _ => None,
        }
    }

    /// Check if this is the root class
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Check if the class can't be instantiated
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Validator declared on this class alone
    pub fn validator(&self) -> Option<&Validator> {
        self.validator.as_ref()
    }

    /// Property table, inherited properties first
    pub fn properties(&self) -> &PropertyTable {
        &self.properties
    }

    /// Memoized ancestor chain, this class first, ending at the root
    pub fn ancestors(&self) -> &[String] {
        &self.chain
    }

    /// Number of inheritance steps up to the root
    pub fn depth(&self) -> usize {
        self.chain.len() - 1
    }

    /// Native classes from the root down to `self`
    pub fn lineage(self: &Arc<Self>) -> Vec<Arc<NativeClass>> {
        let mut lineage = vec![self.clone()];
        let mut current = self.native_parent();
        while let Some(class) = current {
            lineage.push(class.clone());
            current = class.native_parent();
        }
        lineage.reverse();
        lineage
    }

    /// Construct an instance through the class constructor
    ///
    /// Without a custom constructor, named arguments are properties and a
    /// single positional argument (or `.data`) is the base value of classes
    /// that extend a base type.
    pub fn construct(self: &Arc<Self>, args: &Args) -> StrataResult<Object> {
        if self.is_abstract {
            return Err(StrataError::InvalidClassSpec(format!(
                "can't construct an object from abstract class <{}>",
                self.key
            )));
        }

        let Some(constructor) = &self.constructor else {
            return self.default_construct(args);
        };

        let object = constructor(self, args)?;
        if !Arc::ptr_eq(object.class(), self) {
            return Err(StrataError::InvalidConstructor {
                class: self.key.clone(),
                reason: format!("must return an object of class <{}>, not <{}>", self.key, object.class().key()),
            });
        }
        object.validate()?;
        Ok(object)
    }

    fn default_construct(self: &Arc<Self>, args: &Args) -> StrataResult<Object> {
        let mut data = None;
        let mut props = Vec::new();
        for (name, value) in args.iter() {
            match name {
                Some(DATA_PROPERTY) | None if self.base_type().is_some() && data.is_none() => {
                    data = Some(value.clone());
                }
                Some(name) => props.push((name.to_string(), value.clone())),
                None => {
                    return Err(StrataError::InvalidArgument(format!(
                        "properties of <{}> must be supplied by name",
                        self.key
                    )))
                }
            }
        }
        new_object(self, data, props)
    }
}

impl fmt::Debug for NativeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeClass")
            .field("key", &self.key)
            .field("chain", &self.chain)
            .field("abstract", &self.is_abstract)
            .field("properties", &self.properties)
            .finish()
    }
}

/// Builder for [`NativeClass`]
pub struct NativeClassBuilder {
    name: String,
    package: Option<String>,
    parent: Option<ClassDescriptor>,
    is_abstract: bool,
    validator: Option<Validator>,
    properties: Vec<PropertySpec>,
    constructor: Option<Constructor>,
}

impl NativeClassBuilder {
    /// Parent class; defaults to the root
    pub fn parent(mut self, parent: impl Into<ClassDescriptor>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Owning package, used to namespace the registration key
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Mark the class abstract
    pub fn abstract_class(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    /// Validator for this class
    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Object) -> Vec<String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Declare a property
    pub fn property(mut self, spec: PropertySpec) -> Self {
        self.properties.push(spec);
        self
    }

    /// Declare several properties
    pub fn properties<I>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = PropertySpec>,
    {
        self.properties.extend(specs);
        self
    }

    /// Custom constructor
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&Arc<NativeClass>, &Args) -> StrataResult<Object> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    /// Validate the definition and create the class
    pub fn build(self) -> StrataResult<Arc<NativeClass>> {
        if self.name.is_empty() {
            return Err(StrataError::InvalidClassSpec("class name must not be empty".to_string()));
        }
        let key = match &self.package {
            Some(package) => format!("{}::{}", package, self.name),
            None => self.name.clone(),
        };
        if key == super::ANY_KEY || key == super::MISSING_KEY || key == ROOT_NAME {
            return Err(StrataError::InvalidClassSpec(format!("`{}` is a reserved class name", key)));
        }

        let parent = self
            .parent
            .unwrap_or_else(|| ClassDescriptor::Native(NativeClass::root()));

        let (chain, inherited) = match &parent {
            ClassDescriptor::Native(p) => {
                if self.is_abstract && !p.is_abstract && !p.is_root() {
                    return Err(StrataError::InvalidClassSpec(format!(
                        "abstract class <{}> must have an abstract parent, not <{}>",
                        key,
                        p.key()
                    )));
                }
                let chain: Vec<String> = std::iter::once(key.clone())
                    .chain(p.ancestors().iter().cloned())
                    .collect();
                (chain, p.properties().clone())
            }
            ClassDescriptor::Base(ty) if *ty != BaseType::Null => {
                if self.is_abstract {
                    return Err(StrataError::InvalidClassSpec(format!(
                        "abstract class <{}> can't extend base type <{}>",
                        key, ty
                    )));
                }
                let chain = vec![key.clone(), ty.name().to_string(), ROOT_NAME.to_string()];
                (chain, PropertyTable::default())
            }
            other => {
                return Err(StrataError::InvalidClassSpec(format!(
                    "<{}> can't inherit from {}",
                    key, other
                )))
            }
        };

        if chain[1..].contains(&key) {
            return Err(StrataError::InvalidClassSpec(format!(
                "<{}> already appears among its own ancestors",
                key
            )));
        }

        let properties = PropertyTable::build(&key, &inherited, self.properties)?;

        debug!(class = %key, chain = ?chain, properties = properties.len(), "created class");

        Ok(Arc::new(NativeClass {
            name: self.name,
            package: self.package,
            key,
            parent: Some(parent),
            is_abstract: self.is_abstract,
            validator: self.validator,
            properties,
            constructor: self.constructor,
            chain,
        }))
    }
}
