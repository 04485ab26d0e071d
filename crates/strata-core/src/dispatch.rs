//! Method dispatch
//!
//! Nested single dispatch: the first dispatch argument is authoritative, the
//! second only breaks ties among signatures that agree on the first, and so
//! on. Within one position the argument's ancestor chain is tried most
//! specific first, with `ANY` tried last. When a name at some position has
//! no completion at the later positions, the walk backs up and tries the
//! next name. A method registered for an informal class is only selected
//! when the argument carries every tag of that class.
//!
//! Nothing is cached between calls; every dispatch walks the current
//! snapshot of the generic's method table.

use crate::args::Args;
use crate::class::{ClassDescriptor, ANY_KEY, MISSING_KEY};
use crate::error::{StrataError, StrataResult};
use crate::generic::{Generic, Method};
use crate::registry::{MethodNode, MethodTable};
use crate::value::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A signature dispatch would consider for a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Registration keys, one per dispatch argument
    pub signature: Vec<String>,
    /// Whether a method is registered for it
    pub registered: bool,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.registered { "*" } else { " " };
        write!(f, "{} ({})", marker, self.signature.join(", "))
    }
}

/// Find the most specific method for the given per-argument chains
pub fn find_method<'t, C>(table: &'t MethodTable, chains: &[C]) -> Option<&'t Arc<Method>>
where
    C: AsRef<[String]>,
{
    walk(table.root(), chains, 0)
}

fn walk<'t, C>(node: &'t MethodNode, chains: &[C], depth: usize) -> Option<&'t Arc<Method>>
where
    C: AsRef<[String]>,
{
    let Some(chain) = chains.get(depth) else {
        return node.method().filter(|method| accepts(method, chains));
    };
    chain
        .as_ref()
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(ANY_KEY))
        .find_map(|name| node.child(name).and_then(|child| walk(child, chains, depth + 1)))
}

/// An informal class is keyed by its first tag but only matches values
/// carrying all of its tags.
fn accepts<C>(method: &Method, chains: &[C]) -> bool
where
    C: AsRef<[String]>,
{
    method
        .signature()
        .iter()
        .zip(chains)
        .all(|(class, chain)| match class {
            ClassDescriptor::Informal(informal) => informal.tags().iter().all(|tag| chain.as_ref().contains(tag)),
            _ => true,
        })
}

/// Dispatch a call to `generic` and invoke the selected method
///
/// The method receives the original arguments, not the resolved classes.
pub fn dispatch(generic: &Generic, args: &Args) -> StrataResult<Value> {
    let bound = generic.bind(args)?;
    let values: Vec<Option<&Value>> = generic
        .dispatch_args()
        .iter()
        .map(|name| bound.get(name))
        .collect();
    let chains = chains_of(&values);

    let table = generic.snapshot();
    trace!(generic = %generic.name(), chains = ?chains, "dispatching");

    let method = find_method(&table, &chains).ok_or_else(|| StrataError::MethodNotFound {
        generic: generic.name().to_string(),
        dispatch_args: generic.dispatch_args().to_vec(),
        classes: values.iter().map(|value| describe(*value)).collect(),
    })?;
    trace!(generic = %generic.name(), signature = ?method.keys(), "selected method");

    method.call(args)
}

/// Method dispatch would select for arguments of the given classes
pub fn resolve(generic: &Generic, classes: &[ClassDescriptor]) -> StrataResult<Arc<Method>> {
    if classes.len() != generic.dispatch_args().len() {
        return Err(StrataError::SignatureArity {
            generic: generic.name().to_string(),
            expected: generic.dispatch_args().len(),
            actual: classes.len(),
        });
    }
    let chains = classes
        .iter()
        .map(ClassDescriptor::dispatch_chain)
        .collect::<StrataResult<Vec<_>>>()?;

    let table = generic.snapshot();
    find_method(&table, &chains)
        .cloned()
        .ok_or_else(|| StrataError::MethodNotFound {
            generic: generic.name().to_string(),
            dispatch_args: generic.dispatch_args().to_vec(),
            classes: classes.iter().map(ToString::to_string).collect(),
        })
}

/// Every signature the search for `args` visits, in search order
pub fn explain(generic: &Generic, args: &Args) -> StrataResult<Vec<Candidate>> {
    let bound = generic.bind(args)?;
    let values: Vec<Option<&Value>> = generic
        .dispatch_args()
        .iter()
        .map(|name| bound.get(name))
        .collect();
    let chains = chains_of(&values);
    let table = generic.snapshot();

    let mut candidates = vec![Vec::new()];
    for chain in &chains {
        let names: Vec<&str> = chain
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(ANY_KEY))
            .collect();
        candidates = candidates
            .into_iter()
            .flat_map(|prefix: Vec<String>| {
                names.iter().map(move |name| {
                    let mut next = prefix.clone();
                    next.push(name.to_string());
                    next
                })
            })
            .collect();
    }

    Ok(candidates
        .into_iter()
        .map(|signature| {
            let registered = table
                .get(&signature)
                .is_some_and(|method| accepts(method, &chains));
            Candidate { signature, registered }
        })
        .collect())
}

fn chains_of<'v>(values: &[Option<&'v Value>]) -> Vec<Cow<'v, [String]>> {
    values
        .iter()
        .map(|value| match *value {
            Some(value) => value.class_chain(),
            None => Cow::Owned(vec![MISSING_KEY.to_string()]),
        })
        .collect()
}

fn describe(value: Option<&Value>) -> String {
    value.map_or_else(|| ClassDescriptor::Absent.to_string(), Value::describe)
}
