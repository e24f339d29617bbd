//! Data trees and the collaborators the engines are built on.
//!
//! This module provides the data model shared by the diff and merge
//! engines:
//!
//! - [`Value`] - scalar and container values
//! - [`Node`] - an insertion-ordered map of string keys to values
//! - [`KeyPath`] - dotted-segment addressing into a tree
//!
//! `Node` carries the path-addressing collaborator interface: resolve,
//! create, and remove values at dotted key paths, and enumerate the key
//! paths a tree contains. Deep equality is `PartialEq` over the whole
//! tree; cycle-safe cloning is `Clone` (owned trees cannot be cyclic).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod errors;
pub mod path;
pub mod value;

pub use errors::TreeError;
pub use path::KeyPath;
pub use value::Value;

/// Options for key-path enumeration.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumerateOptions {
    /// Include every intermediate branch path, not only leaves.
    pub all_levels: bool,
    /// Descend into lists, enumerating elements as indexed paths.
    /// When false (the default), a list is opaque: its path is a leaf.
    pub diff_arrays: bool,
}

/// A map node in a data tree.
///
/// Keys keep insertion order, which the engines rely on: modifier output
/// follows enumeration order and merge constructors fold their entries in
/// the order they were written. Equality ignores order, matching deep
/// structural equality.
///
/// # Examples
///
/// ```
/// # use treepatch::{KeyPath, Node};
/// let mut node = Node::new();
/// node.set_path(&KeyPath::from("user.profile.name"), "Alice").unwrap();
/// let name = node.get_path(&KeyPath::from("user.profile.name")).unwrap();
/// assert_eq!(name.as_text(), Some("Alice"));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Node {
    children: IndexMap<String, Value>,
}

impl Node {
    /// Creates a new empty node.
    pub fn new() -> Self {
        Self {
            children: IndexMap::new(),
        }
    }

    /// Returns the number of direct keys.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if this node has no keys.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns true if the node contains the given direct key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.children.contains_key(key)
    }

    /// Gets a direct child by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.children.get(key)
    }

    /// Gets a mutable reference to a direct child by key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.children.get_mut(key)
    }

    /// Sets a direct key, returning the previous value if present.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.children.insert(key.into(), value.into())
    }

    /// Removes a direct key, returning its value if present.
    ///
    /// Preserves the insertion order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.children.shift_remove(key)
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.children.iter()
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.children.keys()
    }

    /// Retains only the entries for which the predicate returns true.
    pub fn retain(&mut self, keep: impl FnMut(&String, &mut Value) -> bool) {
        self.children.retain(keep);
    }

    /// Resolves the value at a dotted key path, or `None` if absent.
    ///
    /// Numeric segments index into lists. Traversal through a scalar
    /// yields `None`, never an error.
    pub fn get_path(&self, path: &KeyPath) -> Option<&Value> {
        let mut segments = path.components();
        let first = segments.next()?;
        let mut current = self.children.get(first)?;

        for segment in segments {
            current = match current {
                Value::Map(node) => node.children.get(segment)?,
                Value::List(items) => items.get(KeyPath::index_segment(segment)?)?,
                _ => return None,
            };
        }

        Some(current)
    }

    /// Resolves the map node at a path.
    ///
    /// Absence is `Ok(None)`; a present non-map value is a type mismatch.
    pub fn get_path_map(&self, path: &KeyPath) -> Result<Option<&Node>, TreeError> {
        match self.get_path(path) {
            None => Ok(None),
            Some(Value::Map(node)) => Ok(Some(node)),
            Some(other) => Err(TreeError::TypeMismatch {
                expected: "map".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// Resolves the list at a path.
    ///
    /// Absence is `Ok(None)`; a present non-list value is a type mismatch.
    pub fn get_path_list(&self, path: &KeyPath) -> Result<Option<&Vec<Value>>, TreeError> {
        match self.get_path(path) {
            None => Ok(None),
            Some(Value::List(items)) => Ok(Some(items)),
            Some(other) => Err(TreeError::TypeMismatch {
                expected: "list".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }

    /// Sets a value at a dotted key path, creating intermediate containers
    /// as needed and returning the previous value at that location.
    ///
    /// A numeric next segment creates a list (padded with `Null` up to the
    /// index); any other segment creates a map. Scalars blocking the path
    /// are replaced by fresh containers.
    pub fn set_path(&mut self, path: &KeyPath, value: impl Into<Value>) -> Result<Option<Value>, TreeError> {
        let segments: Vec<&str> = path.components().collect();
        if segments.is_empty() {
            return Err(TreeError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok(set_in_node(self, &segments, value.into()))
    }

    /// Removes the entry at a dotted key path, returning it if present.
    ///
    /// Removing a list element shifts later elements down. Absent paths
    /// are a no-op.
    pub fn unset_path(&mut self, path: &KeyPath) -> Option<Value> {
        let segments: Vec<&str> = path.components().collect();
        let (&last, parents) = segments.split_last()?;

        if parents.is_empty() {
            return self.children.shift_remove(last);
        }

        let mut current = self.children.get_mut(parents[0])?;
        for segment in &parents[1..] {
            current = match current {
                Value::Map(node) => node.children.get_mut(*segment)?,
                Value::List(items) => items.get_mut(KeyPath::index_segment(segment)?)?,
                _ => return None,
            };
        }

        match current {
            Value::Map(node) => node.children.shift_remove(last),
            Value::List(items) => {
                let index = KeyPath::index_segment(last)?;
                if index < items.len() {
                    Some(items.remove(index))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Enumerates the key paths reachable in this tree.
    ///
    /// Leaf-only by default; scalars, empty containers, and (unless
    /// `diff_arrays` is set) lists count as leaves. With `all_levels`,
    /// every intermediate branch path is included as well.
    pub fn key_paths(&self, options: &EnumerateOptions) -> Vec<KeyPath> {
        let mut out = Vec::new();
        collect_node_paths(self, &KeyPath::new(), options, &mut out);
        out
    }

    /// Recursively removes entries whose value is an empty map.
    ///
    /// Lists are left untouched; only map containers collapse.
    pub fn prune(&mut self) {
        self.children.retain(|_, value| {
            if let Value::Map(node) = value {
                node.prune();
                !node.is_empty()
            } else {
                true
            }
        });
    }

    /// Flattens this tree into a single-level node keyed by dotted paths.
    ///
    /// Lists are kept whole, matching default enumeration.
    pub fn flatten(&self) -> Node {
        let mut flat = Node::new();
        for path in self.key_paths(&EnumerateOptions::default()) {
            if let Some(value) = self.get_path(&path) {
                flat.set(path.as_str(), value.clone());
            }
        }
        flat
    }

    /// Expands dotted keys into nested structure, recursively.
    ///
    /// The inverse of [`Node::flatten`]; also applied to merge
    /// instructions before the object pass so instruction keys may be
    /// written as dotted paths.
    pub fn expand(&self) -> Node {
        let mut out = Node::new();
        for (key, value) in self.iter() {
            let expanded = match value {
                Value::Map(node) => Value::Map(node.expand()),
                other => other.clone(),
            };
            let path = KeyPath::from(key.as_str());
            if path.is_empty() {
                continue;
            }
            // Non-empty path, so set_path cannot fail.
            let _ = set_in_node(&mut out, &path.components().collect::<Vec<_>>(), expanded);
        }
        out
    }
}

fn empty_container(next_segment: &str) -> Value {
    if KeyPath::index_segment(next_segment).is_some() {
        Value::List(Vec::new())
    } else {
        Value::Map(Node::new())
    }
}

fn set_in_node(node: &mut Node, segments: &[&str], value: Value) -> Option<Value> {
    let key = segments[0];
    if segments.len() == 1 {
        return node.children.insert(key.to_string(), value);
    }

    let slot = node
        .children
        .entry(key.to_string())
        .or_insert_with(|| empty_container(segments[1]));
    if !slot.is_container() {
        *slot = empty_container(segments[1]);
    }
    set_in_value(slot, &segments[1..], value)
}

fn set_in_value(slot: &mut Value, segments: &[&str], value: Value) -> Option<Value> {
    match slot {
        Value::Map(node) => set_in_node(node, segments, value),
        Value::List(items) => {
            let Some(index) = KeyPath::index_segment(segments[0]) else {
                // Non-numeric segment on a list: the map shape wins.
                *slot = Value::Map(Node::new());
                return set_in_value(slot, segments, value);
            };
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            if segments.len() == 1 {
                let old = std::mem::replace(&mut items[index], value);
                return if old.is_null() { None } else { Some(old) };
            }
            if !items[index].is_container() {
                items[index] = empty_container(segments[1]);
            }
            set_in_value(&mut items[index], &segments[1..], value)
        }
        _ => None,
    }
}

fn collect_node_paths(node: &Node, prefix: &KeyPath, options: &EnumerateOptions, out: &mut Vec<KeyPath>) {
    for (key, value) in node.iter() {
        let path = prefix.clone().push(key.as_str());
        collect_value_paths(value, path, options, out);
    }
}

fn collect_value_paths(value: &Value, path: KeyPath, options: &EnumerateOptions, out: &mut Vec<KeyPath>) {
    match value {
        Value::Map(node) if !node.is_empty() => {
            if options.all_levels {
                out.push(path.clone());
            }
            collect_node_paths(node, &path, options, out);
        }
        Value::List(items) if options.diff_arrays && !items.is_empty() => {
            if options.all_levels {
                out.push(path.clone());
            }
            for (index, item) in items.iter().enumerate() {
                let item_path = path.clone().push(index.to_string());
                collect_value_paths(item, item_path, options, out);
            }
        }
        _ => out.push(path),
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(String, Value)> for Node {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            children: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Node {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.into_iter()
    }
}
