//! Class descriptors
//!
//! A closed set of class kinds with one operation set over all of them:
//! classification, ancestor chains, instance tests, registration keys and
//! empty values. New foreign kinds are added by extending
//! [`ClassDescriptor`], never by subclassing.

mod foreign;
mod native;
mod union;

pub use foreign::{formal_chain, formal_key, FormalClass, FormalClassHandle, FormalInstance, InformalClass};
pub use native::{Constructor, NativeClass, NativeClassBuilder, Validator, DATA_PROPERTY};
pub use union::ClassUnion;

use crate::args::Args;
use crate::error::{StrataError, StrataResult};
use crate::validate::validate_formal;
use crate::value::{BaseType, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Registration key of [`ClassDescriptor::Any`]
pub const ANY_KEY: &str = "ANY";

/// Registration key of [`ClassDescriptor::Absent`]
pub const MISSING_KEY: &str = "MISSING";

/// Name of the universal root class present in every native chain
pub const ROOT_NAME: &str = "object";

/// Kind tag of a class descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Matches only an absent argument
    Absent,
    /// Matches every value
    Any,
    /// Host base storage kind
    Base,
    /// Legacy tag-stack class
    Informal,
    /// Legacy slot-based class
    Formal,
    /// Native class
    Native,
    /// Disjunction of classes
    Union,
}

/// Canonical representation of "a class"
#[derive(Debug, Clone)]
pub enum ClassDescriptor {
    /// Absence of a value
    Absent,
    /// Any value
    Any,
    /// Host base type
    Base(BaseType),
    /// Legacy informal class
    Informal(InformalClass),
    /// Legacy formal class
    Formal(FormalClassHandle),
    /// Native class
    Native(Arc<NativeClass>),
    /// Union of classes
    Union(ClassUnion),
}

impl ClassDescriptor {
    /// Interpret a host value as a class
    ///
    /// Accepts class objects, the name of a base type, and the special names
    /// `ANY` and `MISSING`. Anything else is `InvalidClassSpec`.
    pub fn classify(value: &Value) -> StrataResult<ClassDescriptor> {
        match value {
            Value::Class(class) => Ok(class.clone()),
            Value::Character(names) if names.len() == 1 => {
                let name = names[0].as_str();
                match name {
                    ANY_KEY => Ok(ClassDescriptor::Any),
                    MISSING_KEY => Ok(ClassDescriptor::Absent),
                    _ => BaseType::from_name(name)
                        .map(ClassDescriptor::Base)
                        .ok_or_else(|| {
                            StrataError::InvalidClassSpec(format!("`{}` is not the name of a base type", name))
                        }),
                }
            }
            other => Err(StrataError::InvalidClassSpec(format!(
                "can't convert {} to a class",
                other.describe()
            ))),
        }
    }

    /// Kind tag
    pub fn kind(&self) -> ClassKind {
        match self {
            ClassDescriptor::Absent => ClassKind::Absent,
            ClassDescriptor::Any => ClassKind::Any,
            ClassDescriptor::Base(_) => ClassKind::Base,
            ClassDescriptor::Informal(_) => ClassKind::Informal,
            ClassDescriptor::Formal(_) => ClassKind::Formal,
            ClassDescriptor::Native(_) => ClassKind::Native,
            ClassDescriptor::Union(_) => ClassKind::Union,
        }
    }

    /// Ancestor chain, most specific first
    ///
    /// `Absent`, `Any` and unions have no chain of their own.
    pub fn ancestors(&self) -> Cow<'_, [String]> {
        match self {
            ClassDescriptor::Absent | ClassDescriptor::Any | ClassDescriptor::Union(_) => {
                Cow::Owned(Vec::new())
            }
            ClassDescriptor::Base(ty) => Cow::Owned(vec![ty.name().to_string()]),
            ClassDescriptor::Informal(class) => Cow::Borrowed(class.tags()),
            ClassDescriptor::Formal(class) => Cow::Owned(formal_chain(class.as_ref())),
            ClassDescriptor::Native(class) => Cow::Borrowed(class.ancestors()),
        }
    }

    /// Names this class contributes when used as a resolution query
    ///
    /// Like [`ancestors`](Self::ancestors), except that `Absent` answers to
    /// the `MISSING` key. Unions are not dispatch targets.
    pub fn dispatch_chain(&self) -> StrataResult<Vec<String>> {
        match self {
            ClassDescriptor::Absent => Ok(vec![MISSING_KEY.to_string()]),
            ClassDescriptor::Union(union) => Err(StrataError::InvalidSignature(format!(
                "{} is a union and can't be dispatched on",
                union
            ))),
            other => Ok(other.ancestors().into_owned()),
        }
    }

    /// Canonical key used in method tables
    pub fn register_key(&self) -> String {
        match self {
            ClassDescriptor::Absent => MISSING_KEY.to_string(),
            ClassDescriptor::Any => ANY_KEY.to_string(),
            ClassDescriptor::Base(ty) => ty.name().to_string(),
            ClassDescriptor::Informal(class) => class.key().to_string(),
            ClassDescriptor::Formal(class) => formal_key(class.as_ref()),
            ClassDescriptor::Native(class) => class.key().to_string(),
            ClassDescriptor::Union(union) => union
                .members()
                .iter()
                .map(ClassDescriptor::register_key)
                .collect::<Vec<_>>()
                .join("|"),
        }
    }

    /// Value a property of this type starts with when nothing else is given
    pub fn empty_value(&self) -> StrataResult<Value> {
        match self {
            ClassDescriptor::Base(ty) => Ok(ty.empty()),
            ClassDescriptor::Native(class) => class.construct(&Args::new()).map(Value::Object),
            ClassDescriptor::Union(union) => union.first().empty_value(),
            ClassDescriptor::Absent
            | ClassDescriptor::Any
            | ClassDescriptor::Informal(_)
            | ClassDescriptor::Formal(_) => Ok(Value::Null),
        }
    }

    /// Construct an instance of this class
    ///
    /// Unions construct their first member. Base types take at most one
    /// positional value of that type. Formal classes take their slots as
    /// named arguments and run the formal system's validity hooks.
    pub fn construct(&self, args: &Args) -> StrataResult<Value> {
        match self {
            ClassDescriptor::Native(class) => class.construct(args).map(Value::Object),
            ClassDescriptor::Union(union) => union.first().construct(args),
            ClassDescriptor::Base(ty) => {
                let mut values = args.iter();
                match (values.next(), values.next()) {
                    (None, _) => Ok(ty.empty()),
                    (Some((None, value)), None) if value.class_of() == ClassDescriptor::Base(*ty) => {
                        Ok(value.clone())
                    }
                    _ => Err(StrataError::InvalidArgument(format!(
                        "<{}> is constructed from a single {} value",
                        ty, ty
                    ))),
                }
            }
            ClassDescriptor::Formal(class) => {
                let mut instance = FormalInstance::new(class.clone());
                for (name, value) in args.iter() {
                    let name = name.ok_or_else(|| {
                        StrataError::InvalidArgument(format!(
                            "slots of {} must be supplied by name",
                            self
                        ))
                    })?;
                    instance.set_slot(name, value.clone());
                }
                validate_formal(&instance)?;
                Ok(Value::Formal(Arc::new(instance)))
            }
            ClassDescriptor::Absent | ClassDescriptor::Any | ClassDescriptor::Informal(_) => Err(
                StrataError::InvalidClassSpec(format!("can't construct an object of class {}", self)),
            ),
        }
    }

    /// Native class, if this is one
    pub fn as_native(&self) -> Option<&Arc<NativeClass>> {
        match self {
            ClassDescriptor::Native(class) => Some(class),
            _ => None,
        }
    }
}

/// Instance test: is `value` (or the absence of one) a member of `class`?
///
/// Native, base and formal classes look for their key in the value's chain.
/// Informal classes only require every one of their tags to appear somewhere
/// in the value's chain; order is not checked.
pub fn is_a(value: Option<&Value>, class: &ClassDescriptor) -> bool {
    let value = match (value, class) {
        (_, ClassDescriptor::Any) => return true,
        (value, ClassDescriptor::Absent) => return value.is_none(),
        (_, ClassDescriptor::Union(union)) => {
            return union.members().iter().any(|member| is_a(value, member))
        }
        (None, _) => return false,
        (Some(value), _) => value,
    };

    let chain = value.class_chain();
    match class {
        ClassDescriptor::Informal(informal) => informal
            .tags()
            .iter()
            .all(|tag| chain.iter().any(|name| name == tag)),
        other => {
            let key = other.register_key();
            chain.iter().any(|name| *name == key)
        }
    }
}

impl fmt::Display for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassDescriptor::Absent => write!(f, "<{}>", MISSING_KEY),
            ClassDescriptor::Any => write!(f, "<{}>", ANY_KEY),
            ClassDescriptor::Base(ty) => write!(f, "<{}>", ty),
            ClassDescriptor::Informal(class) => write!(f, "informal<{}>", class.tags().join("/")),
            ClassDescriptor::Formal(class) => match class.package() {
                Some(package) => write!(f, "formal<{}::{}>", package, class.name()),
                None => write!(f, "formal<{}>", class.name()),
            },
            ClassDescriptor::Native(class) => write!(f, "<{}>", class.key()),
            ClassDescriptor::Union(union) => write!(f, "{}", union),
        }
    }
}

impl PartialEq for ClassDescriptor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ClassDescriptor::Absent, ClassDescriptor::Absent) => true,
            (ClassDescriptor::Any, ClassDescriptor::Any) => true,
            (ClassDescriptor::Base(a), ClassDescriptor::Base(b)) => a == b,
            (ClassDescriptor::Informal(a), ClassDescriptor::Informal(b)) => a == b,
            (ClassDescriptor::Formal(a), ClassDescriptor::Formal(b)) => {
                formal_key(a.as_ref()) == formal_key(b.as_ref())
            }
            (ClassDescriptor::Native(a), ClassDescriptor::Native(b)) => Arc::ptr_eq(a, b),
            (ClassDescriptor::Union(a), ClassDescriptor::Union(b)) => a == b,
            _ => false,
        }
    }
}

impl From<BaseType> for ClassDescriptor {
    fn from(ty: BaseType) -> Self {
        ClassDescriptor::Base(ty)
    }
}

impl From<Arc<NativeClass>> for ClassDescriptor {
    fn from(class: Arc<NativeClass>) -> Self {
        ClassDescriptor::Native(class)
    }
}

impl From<&Arc<NativeClass>> for ClassDescriptor {
    fn from(class: &Arc<NativeClass>) -> Self {
        ClassDescriptor::Native(class.clone())
    }
}

impl From<InformalClass> for ClassDescriptor {
    fn from(class: InformalClass) -> Self {
        ClassDescriptor::Informal(class)
    }
}

impl From<FormalClassHandle> for ClassDescriptor {
    fn from(class: FormalClassHandle) -> Self {
        ClassDescriptor::Formal(class)
    }
}

impl From<ClassUnion> for ClassDescriptor {
    fn from(union: ClassUnion) -> Self {
        ClassDescriptor::Union(union)
    }
}
