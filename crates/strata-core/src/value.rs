//! Host values
//!
//! The runtime sits on top of a host that already has three object
//! representations: plain base values, informal tag-stack values and formal
//! slot-based instances. [`Value`] is the closed set of everything the engine
//! can be handed; native objects are one more variant.

use crate::args::{Args, BoundArgs};
use crate::class::{ClassDescriptor, FormalInstance, InformalClass};
use crate::error::StrataResult;
use crate::object::Object;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Name of the variadic marker in parameter lists
pub const VARIADIC: &str = "...";

/// Tag carried by class objects that are passed around as values
pub const CLASS_TAG: &str = "class";

/// Base storage kinds of the host's primitive layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// The null value
    Null,
    /// Logical vector
    Logical,
    /// Integer vector
    Integer,
    /// Double vector
    Double,
    /// Character vector
    Character,
    /// Generic list
    List,
    /// Function
    Function,
    /// Unevaluated call
    Call,
}

impl BaseType {
    /// All base types, in declaration order
    pub const ALL: [BaseType; 8] = [
        BaseType::Null,
        BaseType::Logical,
        BaseType::Integer,
        BaseType::Double,
        BaseType::Character,
        BaseType::List,
        BaseType::Function,
        BaseType::Call,
    ];

    /// Host name of the storage kind
    pub fn name(&self) -> &'static str {
        match self {
            BaseType::Null => "NULL",
            BaseType::Logical => "logical",
            BaseType::Integer => "integer",
            BaseType::Double => "double",
            BaseType::Character => "character",
            BaseType::List => "list",
            BaseType::Function => "function",
            BaseType::Call => "call",
        }
    }

    /// Look up a base type by its host name
    pub fn from_name(name: &str) -> Option<BaseType> {
        BaseType::ALL.iter().copied().find(|ty| ty.name() == name)
    }

    /// Zero-length value of this kind
    pub fn empty(&self) -> Value {
        match self {
            BaseType::Null => Value::Null,
            BaseType::Logical => Value::Logical(Vec::new()),
            BaseType::Integer => Value::Integer(Vec::new()),
            BaseType::Double => Value::Double(Vec::new()),
            BaseType::Character => Value::Character(Vec::new()),
            BaseType::List => Value::List(Vec::new()),
            BaseType::Function => Value::Function(Function::new(Vec::<String>::new(), |_| Ok(Value::Null))),
            BaseType::Call => Value::Call(String::new()),
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Body of a host function
pub type FunctionBody = Arc<dyn Fn(&BoundArgs) -> StrataResult<Value> + Send + Sync>;

/// Host function: named formals plus a body
///
/// Used both for function values and for method implementations, so the
/// registry can check formals against a generic's parameter contract.
#[derive(Clone)]
pub struct Function {
    params: Vec<String>,
    body: FunctionBody,
}

impl Function {
    /// Create a function from its formals and body
    pub fn new<I, S, F>(params: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&BoundArgs) -> StrataResult<Value> + Send + Sync + 'static,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
            body: Arc::new(body),
        }
    }

    /// Formal parameter names, including the variadic marker if present
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Whether the formals end in (or contain) a variadic tail
    pub fn is_variadic(&self) -> bool {
        self.params.iter().any(|p| p == VARIADIC)
    }

    /// Run the body against already matched arguments
    pub fn invoke(&self, args: &BoundArgs) -> StrataResult<Value> {
        (self.body)(args)
    }

    /// Match `args` against this function's own formals and run it
    pub fn call(&self, args: &Args) -> StrataResult<Value> {
        let bound = BoundArgs::bind(&self.params, args)?;
        self.invoke(&bound)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function({})", self.params.join(", "))
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body) && self.params == other.params
    }
}

/// A base value wearing a legacy tag stack
#[derive(Debug, Clone, PartialEq)]
pub struct InformalValue {
    /// Tag stack, most specific first
    pub tags: Vec<String>,
    /// Underlying base value
    pub data: Value,
}

/// Any value the runtime can be handed
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null value
    Null,
    /// Logical vector
    Logical(Vec<bool>),
    /// Integer vector
    Integer(Vec<i64>),
    /// Double vector
    Double(Vec<f64>),
    /// Character vector
    Character(Vec<String>),
    /// Generic list
    List(Vec<Value>),
    /// Function
    Function(Function),
    /// Unevaluated call, kept as source text
    Call(String),
    /// Legacy informal object
    Informal(Arc<InformalValue>),
    /// Legacy formal instance
    Formal(Arc<FormalInstance>),
    /// Native object
    Object(Object),
    /// Class passed around as a value
    Class(ClassDescriptor),
}

impl Value {
    /// Scalar double
    pub fn double(v: f64) -> Self {
        Value::Double(vec![v])
    }

    /// Scalar integer
    pub fn integer(v: i64) -> Self {
        Value::Integer(vec![v])
    }

    /// Scalar logical
    pub fn logical(v: bool) -> Self {
        Value::Logical(vec![v])
    }

    /// Scalar string
    pub fn string(v: impl Into<String>) -> Self {
        Value::Character(vec![v.into()])
    }

    /// Wrap `data` in a legacy tag stack
    pub fn informal<I, S>(tags: I, data: Value) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Informal(Arc::new(InformalValue {
            tags: tags.into_iter().map(Into::into).collect(),
            data,
        }))
    }

    /// Check if this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// First element as f64 (doubles and integers)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => v.first().copied(),
            Value::Integer(v) => v.first().map(|i| *i as f64),
            _ => None,
        }
    }

    /// First element as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => v.first().copied(),
            _ => None,
        }
    }

    /// First element as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Logical(v) => v.first().copied(),
            _ => None,
        }
    }

    /// First element as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Character(v) => v.first().map(String::as_str),
            _ => None,
        }
    }

    /// Native object, if this is one
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Consume into a native object, if this is one
    pub fn into_object(self) -> Option<Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Storage kind as seen by the host's primitive layer
    ///
    /// Informal values and objects extending a base type report the kind of
    /// their underlying data; other composite values are stored as lists.
    pub fn base_type(&self) -> BaseType {
        match self {
            Value::Null => BaseType::Null,
            Value::Logical(_) => BaseType::Logical,
            Value::Integer(_) => BaseType::Integer,
            Value::Double(_) => BaseType::Double,
            Value::Character(_) => BaseType::Character,
            Value::List(_) => BaseType::List,
            Value::Function(_) => BaseType::Function,
            Value::Call(_) => BaseType::Call,
            Value::Informal(iv) => iv.data.base_type(),
            Value::Object(obj) => obj.data().map_or(BaseType::List, Value::base_type),
            Value::Formal(_) | Value::Class(_) => BaseType::List,
        }
    }

    /// The value's own class
    pub fn class_of(&self) -> ClassDescriptor {
        match self {
            Value::Informal(iv) => ClassDescriptor::Informal(InformalClass::from_tags(iv.tags.clone())),
            Value::Formal(instance) => ClassDescriptor::Formal(instance.class().clone()),
            Value::Object(obj) => ClassDescriptor::Native(obj.class().clone()),
            Value::Class(_) => ClassDescriptor::Informal(InformalClass::from_tags(vec![CLASS_TAG.to_string()])),
            other => ClassDescriptor::Base(other.base_type()),
        }
    }

    /// Ancestor chain of the value's own class, most specific first
    ///
    /// This is also the legacy tag stack the value answers to.
    pub fn class_chain(&self) -> Cow<'_, [String]> {
        match self {
            Value::Informal(iv) => Cow::Borrowed(&iv.tags),
            Value::Object(obj) => Cow::Borrowed(obj.class().ancestors()),
            other => Cow::Owned(other.class_of().ancestors().into_owned()),
        }
    }

    /// Check whether the value is an instance of `class`
    pub fn is_a(&self, class: &ClassDescriptor) -> bool {
        crate::class::is_a(Some(self), class)
    }

    /// Class description used in diagnostics
    pub fn describe(&self) -> String {
        self.class_of().to_string()
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::double(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::logical(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}
