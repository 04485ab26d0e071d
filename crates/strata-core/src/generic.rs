//! Generics and their method registries

use crate::args::{Args, BoundArgs};
use crate::class::ClassDescriptor;
use crate::dispatch::{self, Candidate};
use crate::error::{StrataError, StrataResult};
use crate::registry::MethodTable;
use crate::value::{Function, Value, VARIADIC};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A registered method implementation
#[derive(Debug, Clone)]
pub struct Method {
    generic: String,
    signature: Vec<ClassDescriptor>,
    keys: Vec<String>,
    function: Function,
}

impl Method {
    /// Create a method entry
    pub fn new(
        generic: impl Into<String>,
        signature: Vec<ClassDescriptor>,
        keys: Vec<String>,
        function: Function,
    ) -> Self {
        Self {
            generic: generic.into(),
            signature,
            keys,
            function,
        }
    }

    /// Name of the owning generic
    pub fn generic(&self) -> &str {
        &self.generic
    }

    /// Classes the method is registered for
    pub fn signature(&self) -> &[ClassDescriptor] {
        &self.signature
    }

    /// Registration keys of the signature
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Implementation
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Invoke the implementation with the original call arguments
    pub fn call(&self, args: &Args) -> StrataResult<Value> {
        self.function.call(args)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.generic)?;
        for (i, class) in self.signature.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", class)?;
        }
        write!(f, ")")
    }
}

/// A generic function
///
/// Dispatches on the leading subset of its formals named by
/// `dispatch_args`. The method table is published as an immutable
/// snapshot: writers build a new table and swap it in, readers take the
/// current `Arc` and never see a half-applied registration.
pub struct Generic {
    name: String,
    params: Vec<String>,
    dispatch_args: Vec<String>,
    methods: RwLock<Arc<MethodTable>>,
}

impl Generic {
    /// Start defining a generic
    pub fn builder(name: impl Into<String>) -> GenericBuilder {
        GenericBuilder {
            name: name.into(),
            dispatch_args: Vec::new(),
            params: None,
        }
    }

    /// Generic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Formal parameters
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Dispatch argument names, in dispatch order
    pub fn dispatch_args(&self) -> &[String] {
        &self.dispatch_args
    }

    /// Whether the generic accepts extra arguments
    pub fn is_variadic(&self) -> bool {
        self.params.iter().any(|p| p == VARIADIC)
    }

    /// Current method table
    pub fn snapshot(&self) -> Arc<MethodTable> {
        self.methods.read().clone()
    }

    /// Register `function` for `signature`
    ///
    /// Unions in the signature register the method for every member
    /// combination. An existing method with the same signature is replaced;
    /// the return value tells whether that happened.
    pub fn register<I>(&self, signature: I, function: Function) -> StrataResult<bool>
    where
        I: IntoIterator<Item = ClassDescriptor>,
    {
        let signature: Vec<ClassDescriptor> = signature.into_iter().collect();
        if signature.len() != self.dispatch_args.len() {
            return Err(StrataError::SignatureArity {
                generic: self.name.clone(),
                expected: self.dispatch_args.len(),
                actual: signature.len(),
            });
        }
        self.check_compatible(&function)?;

        let expanded = expand(&signature);
        let mut guard = self.methods.write();
        let mut table = MethodTable::clone(&guard);
        let mut replaced = false;
        for classes in expanded {
            let keys: Vec<String> = classes.iter().map(ClassDescriptor::register_key).collect();
            self.check_key_conflict(&table, &classes, &keys)?;
            let method = Method::new(self.name.clone(), classes, keys.clone(), function.clone());
            replaced |= table.insert(&keys, Arc::new(method)).is_some();
            debug!(generic = %self.name, signature = ?keys, replaced, "registered method");
        }
        *guard = Arc::new(table);
        Ok(replaced)
    }

    /// Remove the method registered for exactly `signature`
    ///
    /// Returns whether anything was removed.
    pub fn remove<I>(&self, signature: I) -> StrataResult<bool>
    where
        I: IntoIterator<Item = ClassDescriptor>,
    {
        let signature = self.checked_signature(signature)?;
        let mut guard = self.methods.write();
        let mut table = MethodTable::clone(&guard);
        let mut removed = false;
        for classes in expand(&signature) {
            let keys: Vec<String> = classes.iter().map(ClassDescriptor::register_key).collect();
            if table.remove(&keys).is_some() {
                removed = true;
                debug!(generic = %self.name, signature = ?keys, "removed method");
            }
        }
        if removed {
            *guard = Arc::new(table);
        }
        Ok(removed)
    }

    /// Method registered for exactly `signature`, ignoring inheritance
    pub fn lookup<I>(&self, signature: I) -> StrataResult<Option<Arc<Method>>>
    where
        I: IntoIterator<Item = ClassDescriptor>,
    {
        let signature = self.checked_signature(signature)?;
        let mut expanded = expand(&signature);
        if expanded.len() != 1 {
            return Err(StrataError::InvalidSignature(format!(
                "can't look up a single method of `{}` for a signature containing a union",
                self.name
            )));
        }
        let classes = expanded.remove(0);
        let keys: Vec<String> = classes.iter().map(ClassDescriptor::register_key).collect();
        Ok(self.snapshot().get(&keys).cloned())
    }

    /// Method dispatch would select for arguments of these classes
    pub fn resolve(&self, classes: &[ClassDescriptor]) -> StrataResult<Arc<Method>> {
        dispatch::resolve(self, classes)
    }

    /// Signatures of all registered methods, as registration keys
    pub fn methods(&self) -> Vec<Vec<String>> {
        self.snapshot().signatures()
    }

    /// Match call arguments against the generic's formals
    pub fn bind(&self, args: &Args) -> StrataResult<BoundArgs> {
        BoundArgs::bind(&self.params, args)
    }

    /// Dispatch a call
    pub fn call(&self, args: &Args) -> StrataResult<Value> {
        dispatch::dispatch(self, args)
    }

    /// Candidate signatures for a call, in search order
    pub fn explain(&self, args: &Args) -> StrataResult<Vec<Candidate>> {
        dispatch::explain(self, args)
    }

    /// Reject a class that would share a registration key with a different
    /// class already registered at the same position
    ///
    /// Informal keys are only the most specific tag, so `informal<ordered>`
    /// and `informal<ordered/factor>` collide.
    fn check_key_conflict(
        &self,
        table: &MethodTable,
        classes: &[ClassDescriptor],
        keys: &[String],
    ) -> StrataResult<()> {
        for method in table.methods() {
            for (i, (class, key)) in classes.iter().zip(keys).enumerate() {
                let existing = &method.signature()[i];
                if &method.keys()[i] != key || !collides(existing, class) {
                    continue;
                }
                return Err(StrataError::InvalidSignature(format!(
                    "{} and {} share the registration key `{}` in generic `{}`",
                    existing, class, key, self.name
                )));
            }
        }
        Ok(())
    }

    fn checked_signature<I>(&self, signature: I) -> StrataResult<Vec<ClassDescriptor>>
    where
        I: IntoIterator<Item = ClassDescriptor>,
    {
        let signature: Vec<ClassDescriptor> = signature.into_iter().collect();
        if signature.len() != self.dispatch_args.len() {
            return Err(StrataError::SignatureArity {
                generic: self.name.clone(),
                expected: self.dispatch_args.len(),
                actual: signature.len(),
            });
        }
        Ok(signature)
    }

    /// Check a method's formals against the generic's
    ///
    /// The shared leading formals must agree by name and position. A method
    /// may stop early only when the generic is variadic and every dispatch
    /// argument is still covered; it may add formals only when the generic
    /// is variadic.
    fn check_compatible(&self, function: &Function) -> StrataResult<()> {
        let incompatible = |reason: String| StrataError::IncompatibleMethod {
            generic: self.name.clone(),
            reason,
        };

        let generic_formals: Vec<&str> = self.formals().collect();
        let method_formals: Vec<&str> = function
            .params()
            .iter()
            .map(String::as_str)
            .filter(|p| *p != VARIADIC)
            .collect();

        let dots = |params: &[String]| params.iter().position(|p| p == VARIADIC);
        match (dots(function.params()), dots(self.params.as_slice())) {
            (Some(_), None) => {
                return Err(incompatible(
                    "method can't take `...` because the generic doesn't".to_string(),
                ));
            }
            (Some(method), Some(generic)) if method != generic => {
                return Err(incompatible(format!(
                    "`...` is formal {} in the method but formal {} in the generic",
                    method + 1,
                    generic + 1
                )));
            }
            _ => {}
        }

        for (i, (expected, actual)) in generic_formals.iter().zip(&method_formals).enumerate() {
            if expected != actual {
                return Err(incompatible(format!(
                    "formal {} is `{}` in the method but `{}` in the generic",
                    i + 1,
                    actual,
                    expected
                )));
            }
        }

        if method_formals.len() < generic_formals.len() {
            if !self.is_variadic() {
                return Err(incompatible(format!(
                    "method is missing formals: {}",
                    generic_formals[method_formals.len()..].join(", ")
                )));
            }
            if let Some(arg) = self
                .dispatch_args
                .iter()
                .find(|arg| !method_formals.contains(&arg.as_str()))
            {
                return Err(incompatible(format!("method is missing dispatch argument `{}`", arg)));
            }
        }

        if method_formals.len() > generic_formals.len() && !self.is_variadic() {
            return Err(incompatible(format!(
                "method has extra formals: {}",
                method_formals[generic_formals.len()..].join(", ")
            )));
        }

        Ok(())
    }

    fn formals(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .map(String::as_str)
            .filter(|p| *p != VARIADIC)
    }
}

impl fmt::Debug for Generic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generic")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("dispatch_args", &self.dispatch_args)
            .field("methods", &self.snapshot().len())
            .finish()
    }
}

/// Builder for [`Generic`]
pub struct GenericBuilder {
    name: String,
    dispatch_args: Vec<String>,
    params: Option<Vec<String>>,
}

impl GenericBuilder {
    /// Arguments to dispatch on, in dispatch order
    pub fn dispatch_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dispatch_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Full formal list; defaults to the dispatch arguments followed by `...`
    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = Some(params.into_iter().map(Into::into).collect());
        self
    }

    /// Validate the parameter contract and create the generic
    pub fn build(self) -> StrataResult<Arc<Generic>> {
        let invalid = |reason: String| StrataError::InvalidSignature(format!("generic `{}`: {}", self.name, reason));

        if self.name.is_empty() {
            return Err(StrataError::InvalidSignature("generic name must not be empty".to_string()));
        }
        if self.dispatch_args.is_empty() {
            return Err(invalid("needs at least one dispatch argument".to_string()));
        }

        let params = self.params.clone().unwrap_or_else(|| {
            let mut params = self.dispatch_args.clone();
            params.push(VARIADIC.to_string());
            params
        });

        if let Some(dup) = first_duplicate(&params) {
            return Err(invalid(format!("formal `{}` appears more than once", dup)));
        }
        if let Some(dup) = first_duplicate(&self.dispatch_args) {
            return Err(invalid(format!("dispatch argument `{}` appears more than once", dup)));
        }

        let mut last = None;
        for arg in &self.dispatch_args {
            if arg == VARIADIC {
                return Err(invalid("can't dispatch on `...`".to_string()));
            }
            let Some(position) = params.iter().position(|p| p == arg) else {
                return Err(invalid(format!("dispatch argument `{}` is not a formal", arg)));
            };
            if last.is_some_and(|last| position < last) {
                return Err(invalid(format!(
                    "dispatch argument `{}` is out of formal order",
                    arg
                )));
            }
            last = Some(position);
        }

        debug!(generic = %self.name, dispatch_args = ?self.dispatch_args, params = ?params, "created generic");

        Ok(Arc::new(Generic {
            name: self.name,
            params,
            dispatch_args: self.dispatch_args,
            methods: RwLock::new(Arc::new(MethodTable::new())),
        }))
    }
}

/// Two distinct classes with one registration key
///
/// Redefining a native class under the same name is a replacement, not a
/// collision.
fn collides(existing: &ClassDescriptor, class: &ClassDescriptor) -> bool {
    match (existing, class) {
        (ClassDescriptor::Informal(a), ClassDescriptor::Informal(b)) => a.tags() != b.tags(),
        _ => existing.kind() != class.kind(),
    }
}

fn first_duplicate(names: &[String]) -> Option<&str> {
    names
        .iter()
        .enumerate()
        .find(|(i, name)| names[..*i].contains(name))
        .map(|(_, name)| name.as_str())
}

/// Cartesian expansion of the unions in a signature
fn expand(signature: &[ClassDescriptor]) -> Vec<Vec<ClassDescriptor>> {
    let mut combos: Vec<Vec<ClassDescriptor>> = vec![Vec::with_capacity(signature.len())];
    for class in signature {
        let options: Vec<ClassDescriptor> = match class {
            ClassDescriptor::Union(union) => union.members().to_vec(),
            other => vec![other.clone()],
        };
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                options.iter().map(move |option| {
                    let mut next = prefix.clone();
                    next.push(option.clone());
                    next
                })
            })
            .collect();
    }
    combos
}
