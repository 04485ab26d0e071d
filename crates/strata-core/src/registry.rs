//! Per-generic method table
//!
//! A trie keyed by registration key, one level per dispatch argument. Each
//! complete path ends in exactly one method, so two entries with the same
//! signature can't coexist: inserting over an existing path replaces it.

use crate::generic::Method;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// One level of the method trie
#[derive(Debug, Clone, Default)]
pub struct MethodNode {
    children: FxHashMap<String, MethodNode>,
    method: Option<Arc<Method>>,
}

impl MethodNode {
    /// Child reached through `key`
    pub fn child(&self, key: &str) -> Option<&MethodNode> {
        self.children.get(key)
    }

    /// Method stored at the end of a complete signature
    pub fn method(&self) -> Option<&Arc<Method>> {
        self.method.as_ref()
    }

    fn is_empty(&self) -> bool {
        self.method.is_none() && self.children.is_empty()
    }

    fn remove(&mut self, keys: &[String]) -> Option<Arc<Method>> {
        let Some((first, rest)) = keys.split_first() else {
            return self.method.take();
        };
        let child = self.children.get_mut(first)?;
        let removed = child.remove(rest);
        if child.is_empty() {
            self.children.remove(first);
        }
        removed
    }

    fn each<'t>(&'t self, out: &mut Vec<&'t Arc<Method>>) {
        out.extend(self.method.iter());
        for child in self.children.values() {
            child.each(out);
        }
    }

    fn collect(&self, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        if self.method.is_some() {
            out.push(prefix.clone());
        }
        for (key, child) in &self.children {
            prefix.push(key.clone());
            child.collect(prefix, out);
            prefix.pop();
        }
    }
}

/// Immutable-once-published method table of one generic
///
/// Registration never edits a published table in place: the generic clones
/// it, applies the change and publishes the copy.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    root: MethodNode,
    len: usize,
}

impl MethodTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Root of the trie
    pub fn root(&self) -> &MethodNode {
        &self.root
    }

    /// Insert under `keys`, returning the method it replaces
    pub fn insert(&mut self, keys: &[String], method: Arc<Method>) -> Option<Arc<Method>> {
        let mut node = &mut self.root;
        for key in keys {
            node = node.children.entry(key.clone()).or_default();
        }
        let previous = node.method.replace(method);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Remove the method registered under exactly `keys`
    ///
    /// Branches left empty are pruned.
    pub fn remove(&mut self, keys: &[String]) -> Option<Arc<Method>> {
        let removed = self.root.remove(keys);
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Method registered under exactly `keys`
    pub fn get(&self, keys: &[String]) -> Option<&Arc<Method>> {
        keys.iter()
            .try_fold(&self.root, |node, key| node.child(key))
            .and_then(MethodNode::method)
    }

    /// Number of registered signatures
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no method is registered
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Every registered method, in no particular order
    pub fn methods(&self) -> Vec<&Arc<Method>> {
        let mut out = Vec::with_capacity(self.len);
        self.root.each(&mut out);
        out
    }

    /// All registered signatures as key vectors, sorted
    pub fn signatures(&self) -> Vec<Vec<String>> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect(&mut Vec::new(), &mut out);
        out.sort();
        out
    }
}
