//! The diff engine: trees to minimal modifiers and back.
//!
//! [`diff`] compares two trees and expresses their difference as a
//! [`Modifier`]: the smallest set of field-level `set` and `unset`
//! operations that transforms the first tree into the second. [`apply`]
//! replays a modifier onto a tree in place. [`update`] orchestrates a
//! read-diff-apply-commit-verify cycle against a caller-supplied
//! [`Store`].
//!
//! The engine is a pure function over the trees passed to it: no state is
//! retained across calls.
//!
//! # Decision rules
//!
//! A path is *set* when its value in the next tree differs from the
//! previous tree under the per-type rules (lists and maps by deep
//! equality, dates by instant, numbers whenever the old value differs or
//! was not a number, other scalars by strict inequality when truthy).
//! A path is *unset* when a previously present value became absent, or a
//! container became empty. Falsy scalars are never set; "emptying" is
//! always expressed as an unset. Redundant descendant unsets are pruned:
//! an ancestor unset already clears its children.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::tree::{EnumerateOptions, KeyPath, Node, TreeError, Value};

pub mod errors;

pub use errors::DiffError;

/// A minimal set/unset instruction transforming one tree into another.
///
/// Invariant: no path in `unset` is an ancestor or descendant of another
/// path in `unset`. Wire shape:
///
/// ```json
/// { "set": { "c": "d" }, "unset": { "a": true } }
/// ```
///
/// Empty sections are omitted on the wire; a diff with neither is
/// represented as `None` at the API level, never as an empty modifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Modifier {
    /// Values to write, keyed by path, in enumeration order.
    pub set: IndexMap<KeyPath, Value>,
    /// Paths to remove.
    pub unset: BTreeSet<KeyPath>,
}

impl Modifier {
    /// Returns true if this modifier carries no operations.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Total number of operations.
    pub fn len(&self) -> usize {
        self.set.len() + self.unset.len()
    }
}

/// Options for [`diff`].
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Paths to exclude from both passes; a path is excluded when it
    /// equals or descends from any entry.
    pub ignored: Vec<KeyPath>,
    /// Re-diff against the applied result to catch containers the naive
    /// modifier would leave empty.
    pub prune_empty: bool,
}

/// Caller-supplied persistence used only by [`update`].
///
/// Both calls are treated as opaque synchronous functions; an
/// implementation backed by asynchronous I/O must resolve to a value
/// before returning.
pub trait Store {
    /// Reads the current authoritative tree, or `None` if absent.
    fn read(&mut self) -> crate::Result<Option<Node>>;

    /// Persists a new authoritative tree.
    fn commit(&mut self, tree: &Node) -> crate::Result<()>;
}

fn is_ignored(path: &KeyPath, ignored: &[KeyPath]) -> bool {
    ignored.iter().any(|prefix| prefix.covers(path))
}

/// Set decision: should `new` be written over `old`?
fn should_set(new: &Value, old: Option<&Value>) -> bool {
    match new {
        Value::List(_) | Value::Map(_) => old != Some(new),
        Value::Time(t) => match old {
            Some(Value::Time(prev)) => prev != t,
            // Transitioning into a date: an epoch instant counts as absent.
            _ => t.timestamp_millis() != 0,
        },
        Value::Int(_) | Value::Float(_) => {
            // A numeric zero arriving over a non-number still triggers a set.
            !matches!(old, Some(prev) if prev.is_number()) || old != Some(new)
        }
        scalar if scalar.is_truthy() => old != Some(new),
        // Falsy scalars are handled by the unset pass, never by set.
        _ => false,
    }
}

/// Unset decision: did the value at this path stop existing?
fn should_unset(new: Option<&Value>, old: &Value) -> bool {
    if matches!(old, Value::Time(_)) {
        return match new {
            None => true,
            Some(Value::Time(t)) => t.timestamp_millis() == 0,
            // A truthy replacement is recorded by the set pass instead.
            Some(other) => !other.is_truthy(),
        };
    }

    let old_present = old.is_truthy() || old.is_number();
    let new_present = new.is_some_and(|v| v.is_truthy() || v.is_number());
    if old_present && !new_present {
        return true;
    }

    match new {
        Some(Value::Map(node)) => node.is_empty(),
        Some(Value::List(items)) => items.is_empty(),
        _ => false,
    }
}

/// Computes the minimal modifier transforming `previous` into `next`.
///
/// Returns `None` when no change is detected. Applying the result to
/// `previous` reproduces `next` (see [`apply`]); lists are never diffed
/// element-wise, any inequality replaces the whole list.
pub fn diff(previous: &Node, next: &Node, options: &DiffOptions) -> Option<Modifier> {
    let mut modifier = Modifier::default();
    collect_sets(previous, next, options, &mut modifier);

    let branches = EnumerateOptions {
        all_levels: true,
        diff_arrays: false,
    };
    for path in previous.key_paths(&branches) {
        if is_ignored(&path, &options.ignored) {
            continue;
        }
        let Some(old) = previous.get_path(&path) else {
            continue;
        };
        if should_unset(next.get_path(&path), old) {
            modifier.unset.insert(path);
        }
    }

    // An ancestor unset already clears its children.
    let candidates: Vec<KeyPath> = modifier.unset.iter().cloned().collect();
    modifier
        .unset
        .retain(|path| !candidates.iter().any(|other| other.is_ancestor_of(path)));

    if modifier.is_empty() {
        return None;
    }

    if options.prune_empty {
        // Applying the naive modifier can leave behind now-empty
        // containers that themselves need unsetting; re-diff against the
        // applied result to catch them.
        let mut preview = previous.clone();
        if apply(&mut preview, &modifier).is_ok() {
            let inner = DiffOptions {
                ignored: options.ignored.clone(),
                prune_empty: false,
            };
            if let Some(pruned) = diff(previous, &preview, &inner) {
                modifier = pruned;
            }
        }
    }

    debug!(
        sets = modifier.set.len(),
        unsets = modifier.unset.len(),
        "computed modifier"
    );
    Some(modifier)
}

/// Computes only the set half of a diff: what `next` adds or changes,
/// never what it drops.
///
/// Useful for additive synchronization, where absence in `next` means
/// "unknown" rather than "deleted".
pub fn forward_diff(previous: &Node, next: &Node, options: &DiffOptions) -> Option<Modifier> {
    let mut modifier = Modifier::default();
    collect_sets(previous, next, options, &mut modifier);
    if modifier.is_empty() {
        None
    } else {
        Some(modifier)
    }
}

fn collect_sets(previous: &Node, next: &Node, options: &DiffOptions, modifier: &mut Modifier) {
    for path in next.key_paths(&EnumerateOptions::default()) {
        if is_ignored(&path, &options.ignored) {
            continue;
        }
        let Some(value) = next.get_path(&path) else {
            continue;
        };
        if should_set(value, previous.get_path(&path)) {
            modifier.set.insert(path, value.clone());
        }
    }
}

/// Applies a modifier to a tree in place.
///
/// Sets are written first (skipping falsy non-numeric values, mirroring
/// the set decision's asymmetry), then unsets remove their paths, then
/// map containers left empty are dropped.
pub fn apply(target: &mut Node, modifier: &Modifier) -> Result<(), TreeError> {
    for (path, value) in &modifier.set {
        if value.is_number() || value.is_truthy() {
            target.set_path(path, value.clone())?;
        }
    }
    for path in &modifier.unset {
        target.unset_path(path);
    }
    target.prune();
    Ok(())
}

/// Materializes a modifier as a tree: set paths carry their values,
/// unset paths become `Null` leaves.
pub fn modifier_to_tree(modifier: &Modifier) -> Result<Node, TreeError> {
    let mut tree = Node::new();
    for (path, value) in &modifier.set {
        tree.set_path(path, value.clone())?;
    }
    for path in &modifier.unset {
        tree.set_path(path, Value::Null)?;
    }
    Ok(tree)
}

/// Expresses a whole tree as a modifier (a diff against nothing).
pub fn tree_to_modifier(tree: &Node) -> Option<Modifier> {
    diff(&Node::new(), tree, &DiffOptions::default())
}

/// Re-roots every path in a modifier under a key.
pub fn scope_modifier(modifier: &Modifier, key: &str) -> Modifier {
    let root = KeyPath::from(key);
    Modifier {
        set: modifier
            .set
            .iter()
            .map(|(path, value)| (root.join(path), value.clone()))
            .collect(),
        unset: modifier.unset.iter().map(|path| root.join(path)).collect(),
    }
}

/// Reconciles a desired tree against a store.
///
/// Reads the current authoritative tree (absent baseline is fatal),
/// computes the modifier toward `desired`, and if there is one: applies
/// it to a clone of the baseline, commits the clone, and verifies the
/// clone deep-equals `desired`. A verification mismatch means the
/// diff/apply pair disagree and is reported as
/// [`DiffError::VerificationFailed`].
pub fn update<S: Store>(
    desired: &Node,
    store: &mut S,
    options: &DiffOptions,
) -> crate::Result<Option<Modifier>> {
    let current = store.read()?.ok_or(DiffError::NoBaseline)?;

    let Some(modifier) = diff(&current, desired, options) else {
        debug!("update: no change detected");
        return Ok(None);
    };

    let mut committed = current.clone();
    apply(&mut committed, &modifier)?;
    store.commit(&committed)?;

    if committed != *desired {
        return Err(DiffError::VerificationFailed.into());
    }

    debug!(operations = modifier.len(), "update committed");
    Ok(Some(modifier))
}

impl Serialize for Modifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut sections = 0;
        if !self.set.is_empty() {
            sections += 1;
        }
        if !self.unset.is_empty() {
            sections += 1;
        }

        let mut map = serializer.serialize_map(Some(sections))?;
        if !self.set.is_empty() {
            map.serialize_entry("set", &self.set)?;
        }
        if !self.unset.is_empty() {
            let unset: IndexMap<&KeyPath, bool> =
                self.unset.iter().map(|path| (path, true)).collect();
            map.serialize_entry("unset", &unset)?;
        }
        map.end()
    }
}

struct ModifierVisitor;

impl<'de> Visitor<'de> for ModifierVisitor {
    type Value = Modifier;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a modifier with optional set and unset sections")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Modifier, A::Error> {
        let mut modifier = Modifier::default();
        while let Some(section) = access.next_key::<String>()? {
            match section.as_str() {
                "set" => {
                    modifier.set = access.next_value()?;
                }
                "unset" => {
                    // Wire values are `true` markers; only the paths matter.
                    let entries: IndexMap<KeyPath, bool> = access.next_value()?;
                    modifier.unset = entries.into_keys().collect();
                }
                other => {
                    return Err(de::Error::unknown_field(other, &["set", "unset"]));
                }
            }
        }
        Ok(modifier)
    }
}

impl<'de> Deserialize<'de> for Modifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Modifier, D::Error> {
        deserializer.deserialize_map(ModifierVisitor)
    }
}
