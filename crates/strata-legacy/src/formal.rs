//! Formal slot-based classes
//!
//! Classes declare typed slots and may contain (inherit from) any number of
//! other formal classes. Superclasses are linearized by inheritance
//! distance: direct superclasses first in declaration order, then theirs,
//! each class kept at its first (closest) occurrence.

use crate::error::{LegacyError, LegacyResult};
use std::fmt;
use std::sync::Arc;
use strata_core::{
    formal_key, is_a, Args, ClassDescriptor, FormalClass, FormalClassHandle, FormalInstance, StrataResult, Value,
};
use tracing::debug;

/// Extra validity check run after the slot type checks of its class
pub type Validity = Arc<dyn Fn(&FormalInstance) -> Vec<String> + Send + Sync>;

/// A class of the formal system
pub struct SlotClass {
    name: String,
    package: Option<String>,
    contains: Vec<Arc<SlotClass>>,
    linearization: Vec<Arc<SlotClass>>,
    slots: Vec<(String, ClassDescriptor)>,
    validity: Option<Validity>,
}

impl SlotClass {
    /// Start defining a class
    pub fn builder(name: impl Into<String>) -> SlotClassBuilder {
        SlotClassBuilder {
            name: name.into(),
            package: None,
            contains: Vec::new(),
            slots: Vec::new(),
            validity: None,
        }
    }

    /// Direct superclasses in declaration order
    pub fn contains(&self) -> &[Arc<SlotClass>] {
        &self.contains
    }

    /// Superclasses ordered by inheritance distance
    pub fn linearization(&self) -> &[Arc<SlotClass>] {
        &self.linearization
    }

    /// Slots declared on this class alone
    pub fn own_slots(&self) -> &[(String, ClassDescriptor)] {
        &self.slots
    }

    /// Type of a slot declared here or on any superclass
    pub fn slot_type(&self, name: &str) -> Option<&ClassDescriptor> {
        std::iter::once(self)
            .chain(self.linearization.iter().map(Arc::as_ref))
            .flat_map(|class| class.slots.iter())
            .find(|(slot, _)| slot == name)
            .map(|(_, class)| class)
    }

    /// Every slot name available on instances, own slots first
    pub fn slot_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for class in std::iter::once(self).chain(self.linearization.iter().map(Arc::as_ref)) {
            for (slot, _) in &class.slots {
                if !names.contains(&slot.as_str()) {
                    names.push(slot);
                }
            }
        }
        names
    }

    /// Class descriptor for this class
    pub fn descriptor(self: &Arc<Self>) -> ClassDescriptor {
        ClassDescriptor::Formal(self.clone())
    }

    /// Create a validated instance from named slot values
    pub fn instantiate<I, S>(self: &Arc<Self>, slots: I) -> StrataResult<Value>
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let mut args = Args::new();
        for (name, value) in slots {
            args.push_named(name, value);
        }
        self.descriptor().construct(&args)
    }

    fn is_class_of(&self, instance: &FormalInstance) -> bool {
        formal_key(instance.class().as_ref()) == formal_key(self)
    }
}

impl FormalClass for SlotClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    fn superclasses(&self) -> Vec<FormalClassHandle> {
        self.linearization
            .iter()
            .map(|class| class.clone() as FormalClassHandle)
            .collect()
    }

    fn validity(&self, instance: &FormalInstance) -> Vec<String> {
        let mut problems = Vec::new();

        if self.is_class_of(instance) {
            let known = self.slot_names();
            let mut unknown: Vec<&str> = instance
                .slots()
                .map(|(name, _)| name)
                .filter(|name| !known.contains(name))
                .collect();
            unknown.sort_unstable();
            for name in unknown {
                problems.push(format!("@{} is not a slot of class {}", name, self.name));
            }
        }

        for (slot, class) in &self.slots {
            if let Some(value) = instance.slot(slot) {
                if !is_a(Some(value), class) {
                    problems.push(format!("@{} must be {}, not {}", slot, class, value.describe()));
                }
            }
        }

        if problems.is_empty() {
            if let Some(validity) = &self.validity {
                problems = validity(instance);
            }
        }
        problems
    }
}

impl fmt::Debug for SlotClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotClass")
            .field("key", &formal_key(self))
            .field("contains", &self.contains.iter().map(|c| c.name.as_str()).collect::<Vec<_>>())
            .field("slots", &self.slots.iter().map(|(s, _)| s.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`SlotClass`]
pub struct SlotClassBuilder {
    name: String,
    package: Option<String>,
    contains: Vec<Arc<SlotClass>>,
    slots: Vec<(String, ClassDescriptor)>,
    validity: Option<Validity>,
}

impl SlotClassBuilder {
    /// Owning package
    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Add a direct superclass
    pub fn contains(mut self, class: &Arc<SlotClass>) -> Self {
        self.contains.push(class.clone());
        self
    }

    /// Declare a typed slot
    pub fn slot(mut self, name: impl Into<String>, class: impl Into<ClassDescriptor>) -> Self {
        self.slots.push((name.into(), class.into()));
        self
    }

    /// Extra validity check
    pub fn validity<F>(mut self, validity: F) -> Self
    where
        F: Fn(&FormalInstance) -> Vec<String> + Send + Sync + 'static,
    {
        self.validity = Some(Arc::new(validity));
        self
    }

    /// Create the class
    pub fn build(self) -> LegacyResult<Arc<SlotClass>> {
        if self.name.is_empty() {
            return Err(LegacyError::EmptyName);
        }

        for (i, (slot, _)) in self.slots.iter().enumerate() {
            if self.slots[..i].iter().any(|(other, _)| other == slot) {
                return Err(LegacyError::DuplicateSlot {
                    class: self.name.clone(),
                    slot: slot.clone(),
                });
            }
        }

        let linearization = linearize(&self.contains);
        for (slot, declared) in &self.slots {
            let inherited = linearization
                .iter()
                .flat_map(|class| class.slots.iter())
                .find(|(name, _)| name == slot);
            if let Some((_, inherited)) = inherited {
                if inherited.register_key() != declared.register_key() {
                    return Err(LegacyError::SlotConflict {
                        class: self.name.clone(),
                        slot: slot.clone(),
                        inherited: inherited.to_string(),
                        declared: declared.to_string(),
                    });
                }
            }
        }

        debug!(
            class = %self.name,
            superclasses = ?linearization.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "defined formal class"
        );

        Ok(Arc::new(SlotClass {
            name: self.name,
            package: self.package,
            contains: self.contains,
            linearization,
            slots: self.slots,
            validity: self.validity,
        }))
    }
}

/// Breadth-first by inheritance distance, first occurrence wins
fn linearize(direct: &[Arc<SlotClass>]) -> Vec<Arc<SlotClass>> {
    let mut order: Vec<Arc<SlotClass>> = Vec::new();
    let mut frontier: Vec<Arc<SlotClass>> = direct.to_vec();
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for class in frontier {
            if order.iter().any(|seen| Arc::ptr_eq(seen, &class)) {
                continue;
            }
            next.extend(class.contains.iter().cloned());
            order.push(class);
        }
        frontier = next;
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{BaseType, StrataError};

    fn names(classes: &[Arc<SlotClass>]) -> Vec<&str> {
        classes.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_linearization_by_distance() {
        let a = SlotClass::builder("A").build().unwrap();
        let b = SlotClass::builder("B").contains(&a).build().unwrap();
        let c = SlotClass::builder("C").build().unwrap();
        let d = SlotClass::builder("D").contains(&b).contains(&c).build().unwrap();
        assert_eq!(names(d.linearization()), ["B", "C", "A"]);
    }

    #[test]
    fn test_shared_ancestor_appears_once() {
        let base = SlotClass::builder("Base").build().unwrap();
        let left = SlotClass::builder("Left").contains(&base).build().unwrap();
        let right = SlotClass::builder("Right").contains(&base).build().unwrap();
        let diamond = SlotClass::builder("Diamond")
            .contains(&left)
            .contains(&right)
            .build()
            .unwrap();
        assert_eq!(names(diamond.linearization()), ["Left", "Right", "Base"]);
    }

    #[test]
    fn test_duplicate_and_conflicting_slots() {
        assert!(matches!(
            SlotClass::builder("A")
                .slot("x", BaseType::Double)
                .slot("x", BaseType::Double)
                .build(),
            Err(LegacyError::DuplicateSlot { .. })
        ));

        let a = SlotClass::builder("A").slot("x", BaseType::Double).build().unwrap();
        assert!(matches!(
            SlotClass::builder("B").contains(&a).slot("x", BaseType::Character).build(),
            Err(LegacyError::SlotConflict { .. })
        ));
    }

    #[test]
    fn test_instantiate_checks_slot_types() {
        let person = SlotClass::builder("Person")
            .package("people")
            .slot("name", BaseType::Character)
            .slot("age", BaseType::Double)
            .build()
            .unwrap();

        let ok = person.instantiate([("name", Value::string("Ada")), ("age", Value::double(36.0))]);
        assert!(ok.is_ok());

        let err = person
            .instantiate([("name", Value::string("Ada")), ("age", Value::string("old"))])
            .unwrap_err();
        match err {
            StrataError::Validation { class, messages } => {
                assert_eq!(class, "people::Person");
                assert_eq!(messages, ["@age must be <double>, not <character>"]);
            }
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_slot_rejected() {
        let point = SlotClass::builder("Point").slot("x", BaseType::Double).build().unwrap();
        assert!(matches!(
            point.instantiate([("z", Value::double(1.0))]),
            Err(StrataError::Validation { .. })
        ));
    }

    #[test]
    fn test_inherited_slots_are_known() {
        let base = SlotClass::builder("Base").slot("id", BaseType::Integer).build().unwrap();
        let derived = SlotClass::builder("Derived")
            .contains(&base)
            .slot("label", BaseType::Character)
            .build()
            .unwrap();
        assert_eq!(derived.slot_names(), ["label", "id"]);
        assert!(derived
            .instantiate([("id", Value::integer(1)), ("label", Value::string("x"))])
            .is_ok());
        assert!(derived.instantiate([("id", Value::string("1"))]).is_err());
    }

    #[test]
    fn test_custom_validity_runs_after_types() {
        let positive = SlotClass::builder("Positive")
            .slot("value", BaseType::Double)
            .validity(|instance| match instance.slot("value").and_then(Value::as_f64) {
                Some(v) if v <= 0.0 => vec!["@value must be positive".to_string()],
                _ => Vec::new(),
            })
            .build()
            .unwrap();
        assert!(positive.instantiate([("value", Value::double(1.0))]).is_ok());
        assert!(positive.instantiate([("value", Value::double(-1.0))]).is_err());
    }

    #[test]
    fn test_descriptor_chain() {
        let a = SlotClass::builder("A").package("pkg").build().unwrap();
        let b = SlotClass::builder("B").package("pkg").contains(&a).build().unwrap();
        assert_eq!(
            b.descriptor().ancestors().as_ref(),
            ["formal/pkg::B", "formal/pkg::A"]
        );
        assert_eq!(b.descriptor().to_string(), "formal<pkg::B>");
    }
}
