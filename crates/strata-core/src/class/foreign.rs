//! Wrappers over the host's legacy class systems
//!
//! The runtime only reads from these systems: a value's tag stack, a formal
//! class's linearized superclasses, and its validity hook.

use crate::error::{StrataError, StrataResult};
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Prefix that keeps formal class keys apart from native and informal names
pub const FORMAL_PREFIX: &str = "formal/";

/// Legacy informal class: an ordered tag stack
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InformalClass {
    tags: Vec<String>,
}

impl InformalClass {
    /// Create from a non-empty tag stack, most specific tag first
    pub fn new<I, S>(tags: I) -> StrataResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        if tags.is_empty() || tags.iter().any(String::is_empty) {
            return Err(StrataError::InvalidClassSpec(
                "informal classes need at least one non-empty tag".to_string(),
            ));
        }
        Ok(Self { tags })
    }

    pub(crate) fn from_tags(tags: Vec<String>) -> Self {
        Self { tags }
    }

    /// Tag stack, most specific first
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Most specific tag; the key methods are registered under
    pub fn key(&self) -> &str {
        self.tags.first().map(String::as_str).unwrap_or_default()
    }
}

/// Read-only view of a class from the legacy formal system
pub trait FormalClass: fmt::Debug + Send + Sync {
    /// Class name
    fn name(&self) -> &str;

    /// Owning package, if any
    fn package(&self) -> Option<&str> {
        None
    }

    /// The formal system's own linearization of the superclasses, most
    /// specific first, excluding this class
    fn superclasses(&self) -> Vec<FormalClassHandle>;

    /// Validity hook for this class alone; an empty list means valid
    fn validity(&self, _instance: &FormalInstance) -> Vec<String> {
        Vec::new()
    }
}

/// Shared handle to a formal class
pub type FormalClassHandle = Arc<dyn FormalClass>;

/// Namespaced registration key of a formal class
pub fn formal_key(class: &dyn FormalClass) -> String {
    match class.package() {
        Some(package) => format!("{}{}::{}", FORMAL_PREFIX, package, class.name()),
        None => format!("{}{}", FORMAL_PREFIX, class.name()),
    }
}

/// Chain of a formal class: its own key followed by its linearization
pub fn formal_chain(class: &dyn FormalClass) -> Vec<String> {
    std::iter::once(formal_key(class))
        .chain(class.superclasses().iter().map(|sup| formal_key(sup.as_ref())))
        .collect()
}

/// Instance of a formal class
#[derive(Clone)]
pub struct FormalInstance {
    class: FormalClassHandle,
    slots: FxHashMap<String, Value>,
}

impl FormalInstance {
    /// Create an instance with no slots filled
    pub fn new(class: FormalClassHandle) -> Self {
        Self {
            class,
            slots: FxHashMap::default(),
        }
    }

    /// Class of the instance
    pub fn class(&self) -> &FormalClassHandle {
        &self.class
    }

    /// Slot value
    pub fn slot(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// Set a slot value
    pub fn set_slot(&mut self, name: impl Into<String>, value: Value) {
        self.slots.insert(name.into(), value);
    }

    /// Iterate over slots in unspecified order
    pub fn slots(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Debug for FormalInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormalInstance")
            .field("class", &formal_key(self.class.as_ref()))
            .field("slots", &self.slots)
            .finish()
    }
}

impl PartialEq for FormalInstance {
    fn eq(&self, other: &Self) -> bool {
        formal_key(self.class.as_ref()) == formal_key(other.class.as_ref()) && self.slots == other.slots
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Debug)]
    pub(crate) struct Fixture {
        pub(crate) name: &'static str,
        pub(crate) supers: Vec<FormalClassHandle>,
    }

    impl FormalClass for Fixture {
        fn name(&self) -> &str {
            self.name
        }

        fn package(&self) -> Option<&str> {
            Some("legacy")
        }

        fn superclasses(&self) -> Vec<FormalClassHandle> {
            self.supers.clone()
        }
    }

    #[test]
    fn test_informal_requires_tags() {
        assert!(InformalClass::new(Vec::<String>::new()).is_err());
        assert!(InformalClass::new([""]).is_err());
        let class = InformalClass::new(["ordered", "factor"]).unwrap();
        assert_eq!(class.key(), "ordered");
    }

    #[test]
    fn test_formal_chain_is_namespaced() {
        let base: FormalClassHandle = Arc::new(Fixture { name: "Shape", supers: vec![] });
        let circle = Fixture { name: "Circle", supers: vec![base] };
        assert_eq!(
            formal_chain(&circle),
            vec!["formal/legacy::Circle", "formal/legacy::Shape"]
        );
    }
}
