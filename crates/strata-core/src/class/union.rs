//! Class unions

use super::ClassDescriptor;
use crate::error::{StrataError, StrataResult};
use crate::value::BaseType;
use std::fmt;

/// Ordered set of two or more classes treated as one disjunctive type
///
/// Only used as a property type or as a signature element; registration
/// expands a union into one entry per member.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassUnion {
    members: Vec<ClassDescriptor>,
}

impl ClassUnion {
    /// Build a union
    ///
    /// Nested unions are flattened and duplicate members (by registration
    /// key) are dropped. A single surviving member is returned as itself
    /// rather than as a union.
    pub fn new<I>(classes: I) -> StrataResult<ClassDescriptor>
    where
        I: IntoIterator<Item = ClassDescriptor>,
    {
        let mut members: Vec<ClassDescriptor> = Vec::new();
        for class in classes {
            let flat = match class {
                ClassDescriptor::Union(inner) => inner.members,
                other => vec![other],
            };
            for member in flat {
                let key = member.register_key();
                if !members.iter().any(|m| m.register_key() == key) {
                    members.push(member);
                }
            }
        }

        match members.len() {
            0 => Err(StrataError::InvalidClassSpec(
                "a union needs at least one class".to_string(),
            )),
            1 => Ok(members.remove(0)),
            _ => Ok(ClassDescriptor::Union(ClassUnion { members })),
        }
    }

    /// `integer | double`
    pub fn numeric() -> ClassUnion {
        ClassUnion {
            members: vec![
                ClassDescriptor::Base(BaseType::Integer),
                ClassDescriptor::Base(BaseType::Double),
            ],
        }
    }

    /// Members in declaration order
    pub fn members(&self) -> &[ClassDescriptor] {
        &self.members
    }

    /// First member; construction defers to it
    pub fn first(&self) -> &ClassDescriptor {
        &self.members[0]
    }
}

impl fmt::Display for ClassUnion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, " or ")?;
            }
            write!(f, "{}", member)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::is_a;
    use crate::value::Value;

    #[test]
    fn test_union_flattens_and_dedups() {
        let inner = ClassUnion::new([
            ClassDescriptor::Base(BaseType::Integer),
            ClassDescriptor::Base(BaseType::Double),
        ])
        .unwrap();
        let outer = ClassUnion::new([
            inner,
            ClassDescriptor::Base(BaseType::Double),
            ClassDescriptor::Base(BaseType::Character),
        ])
        .unwrap();

        match outer {
            ClassDescriptor::Union(union) => assert_eq!(union.members().len(), 3),
            other => panic!("expected a union, got {}", other),
        }
    }

    #[test]
    fn test_single_member_collapses() {
        let class = ClassUnion::new([
            ClassDescriptor::Base(BaseType::Double),
            ClassDescriptor::Base(BaseType::Double),
        ])
        .unwrap();
        assert_eq!(class, ClassDescriptor::Base(BaseType::Double));
    }

    #[test]
    fn test_empty_union_is_invalid() {
        assert!(matches!(
            ClassUnion::new(Vec::new()),
            Err(StrataError::InvalidClassSpec(_))
        ));
    }

    #[test]
    fn test_membership_and_display() {
        let numeric = ClassDescriptor::Union(ClassUnion::numeric());
        assert!(is_a(Some(&Value::integer(1)), &numeric));
        assert!(is_a(Some(&Value::double(1.0)), &numeric));
        assert!(!is_a(Some(&Value::string("1")), &numeric));
        assert_eq!(numeric.to_string(), "<integer> or <double>");
        assert!(numeric.ancestors().is_empty());
        assert!(numeric.dispatch_chain().is_err());
    }

    #[test]
    fn test_empty_value_uses_first_member() {
        let numeric = ClassDescriptor::Union(ClassUnion::numeric());
        assert_eq!(numeric.empty_value().unwrap(), Value::Integer(vec![]));
    }
}
