//! The merge engine: operator-tagged recursive tree merging.
//!
//! [`merge`] combines a current value with an instruction under one of
//! nine [`Operator`]s. Instructions are ordinary trees in which a map key
//! of the form `<X` (the marker character followed by an operator tag)
//! switches the operator for its payload; everything else merges under
//! the operator inherited from the caller.
//!
//! Every operator has total behavior for both shapes:
//!
//! | op  | on lists                          | on map keys                          |
//! |-----|-----------------------------------|--------------------------------------|
//! | `=` | replace contents                  | merge all, then drop absent keys     |
//! | `+` | append missing elements           | merge unconditionally                |
//! | `-` | remove elements                   | delete keys with truthy instructions |
//! | `!` | append missing elements           | merge only currently-absent keys     |
//! | `&` | keep shared elements              | merge present keys, drop the rest    |
//! | `\|`| union without duplicates          | merge unconditionally                |
//! | `^` | symmetric difference              | toggle scalar assignments            |
//! | `?` | pairwise truthiness filter        | merge only currently-present keys    |
//! | `*` | pairwise filter, operands swapped | merge present keys, drop the rest    |
//!
//! Merging never mutates its inputs: the current value is consumed and a
//! new value is returned. `Ok(None)` means "no value" (merging nothing
//! with nothing), never an error.
//!
//! Falsy merge results are not written into maps; assigning a falsy value
//! to a key is expressed by deleting it with `-` instead. Numbers are the
//! exception: `0` is a value, not an absence.

use tracing::trace;

use crate::tree::{Node, Value};

pub mod errors;
pub mod list_ops;
pub mod operator;

pub use errors::MergeError;
pub use list_ops::{contains, contains_all, contains_any};
pub use operator::{Operator, TAG_MARKER};

use operator::tagged_entries;

/// Configuration for the merge engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeConfig {
    /// Reject assignments that change a truthy value's structural
    /// category (string to number, map to list, and so on). Off by
    /// default: merges coerce freely.
    pub strict_types: bool,
}

/// Merges an instruction into a value under an operator.
///
/// The three shape cases:
///
/// - current is a list: the instruction is applied with list set algebra
/// - current is a map: map instructions merge key-by-key; scalar
///   instructions either name keys to delete (`-`, `&`, `*`) or replace
///   the map
/// - current is a scalar or absent: constructor instructions (maps whose
///   every key is tagged) build a value from nothing and retry; plain
///   maps and scalars assign, subject to strict-mode type checks
///
/// # Examples
///
/// ```
/// # use treepatch::merge::{merge, MergeConfig, Operator};
/// # use treepatch::tree::Value;
/// let current = Value::from(vec![Value::Int(1), Value::Int(2)]);
/// let instruction = Value::from(vec![Value::Int(2), Value::Int(3)]);
/// let merged = merge(
///     Some(current),
///     &instruction,
///     Operator::Append,
///     &MergeConfig::default(),
/// )
/// .unwrap();
/// assert_eq!(
///     merged,
///     Some(Value::from(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
/// );
/// ```
pub fn merge(
    current: Option<Value>,
    instruction: &Value,
    operator: Operator,
    config: &MergeConfig,
) -> Result<Option<Value>, MergeError> {
    match current {
        Some(Value::List(mut items)) => {
            merge_list(&mut items, instruction, operator, config)?;
            Ok(Some(Value::List(items)))
        }
        Some(Value::Map(mut map)) => match instruction {
            Value::Map(node) => {
                merge_map(&mut map, node, operator, config)?;
                Ok(Some(Value::Map(map)))
            }
            other => merge_map_scalar(map, other, operator, config),
        },
        current => match instruction {
            Value::Map(node) if is_constructor(node) => match construct(node, config)? {
                Some(built) => merge(current, &built, operator, config),
                None => Ok(None),
            },
            Value::Map(node) => {
                guard_type_change(current.as_ref(), instruction, operator, config)?;
                let mut map = Node::new();
                merge_map(&mut map, node, Operator::Assign, config)?;
                Ok(Some(Value::Map(map)))
            }
            other => {
                guard_type_change(current.as_ref(), other, operator, config)?;
                Ok(Some(other.clone()))
            }
        },
    }
}

/// Builds a value from nothing out of a constructor instruction.
///
/// A constructor is a non-empty map whose every top-level key is tagged.
/// Entries fold in insertion order, each merging into the accumulator;
/// a step whose result is falsy and non-numeric is discarded and the
/// accumulator keeps its previous value.
pub fn construct(instruction: &Node, config: &MergeConfig) -> Result<Option<Value>, MergeError> {
    if !is_constructor(instruction) {
        return Err(MergeError::NotAConstructor);
    }

    let mut accumulator: Option<Value> = None;
    for (op, payload) in tagged_entries(instruction)? {
        let previous = accumulator.clone();
        accumulator = match merge(accumulator, payload, op, config)? {
            Some(value) if value.is_truthy() || value.is_number() => Some(value),
            _ => previous,
        };
    }
    Ok(accumulator)
}

/// Returns true if every top-level key of a non-empty map is tagged.
pub fn is_constructor(node: &Node) -> bool {
    !node.is_empty() && node.keys().all(|key| Operator::is_tagged_key(key))
}

fn merge_list(
    items: &mut Vec<Value>,
    instruction: &Value,
    operator: Operator,
    config: &MergeConfig,
) -> Result<(), MergeError> {
    match instruction {
        Value::Map(node) => {
            let entries = tagged_entries(node)?;
            if entries.is_empty() {
                // A plain map is a single element to operate with.
                return apply_singleton(items, instruction, operator);
            }
            for (sub_op, payload) in entries {
                merge_list(items, payload, sub_op, config)?;
            }
            Ok(())
        }
        Value::List(instruction) => {
            apply_list_op(items, instruction, operator);
            Ok(())
        }
        scalar => apply_singleton(items, scalar, operator),
    }
}

fn apply_singleton(
    items: &mut Vec<Value>,
    element: &Value,
    operator: Operator,
) -> Result<(), MergeError> {
    if operator == Operator::Assign {
        return Err(MergeError::ListReplacedWithScalar {
            operator: operator.tag(),
        });
    }
    apply_list_op(items, std::slice::from_ref(element), operator);
    Ok(())
}

fn apply_list_op(items: &mut Vec<Value>, instruction: &[Value], operator: Operator) {
    match operator {
        Operator::Assign => list_ops::assign(items, instruction),
        Operator::Append | Operator::Difference => list_ops::append_missing(items, instruction),
        Operator::Subtract => list_ops::subtract(items, instruction),
        Operator::Intersect => list_ops::intersect(items, instruction),
        Operator::Union => list_ops::union(items, instruction),
        Operator::SymmetricDifference => list_ops::symmetric_difference(items, instruction),
        Operator::Filter => {
            list_ops::compare_and_filter(items, instruction, |a, b| a.is_truthy() && b.is_truthy());
        }
        Operator::FilterSwapped => {
            list_ops::compare_and_filter(items, instruction, |a, b| b.is_truthy() && a.is_truthy());
        }
    }
}

fn merge_map(
    map: &mut Node,
    instruction: &Node,
    operator: Operator,
    config: &MergeConfig,
) -> Result<(), MergeError> {
    // Dotted instruction keys address nested structure.
    let instruction = instruction.expand();

    for (key, rhs) in instruction.iter() {
        if let Some(decoded) = Operator::decode_key(key) {
            // A tagged key applies its payload to the map as a whole.
            let sub_op = decoded?;
            trace!(operator = %sub_op, "tagged instruction on map");
            let snapshot = map.clone();
            match merge(Some(Value::Map(std::mem::take(map))), rhs, sub_op, config)? {
                Some(Value::Map(updated)) => *map = updated,
                Some(other) if other.is_truthy() || other.is_number() => {
                    // The map survived but the step produced a scalar for
                    // this slot; keep both.
                    *map = snapshot;
                    map.set(key.clone(), other);
                }
                _ => *map = snapshot,
            }
            continue;
        }

        let lhs = map.get(key).cloned();
        match operator {
            Operator::Subtract => {
                if rhs.is_truthy() {
                    map.remove(key);
                }
            }
            Operator::Difference => {
                if !lhs.as_ref().is_some_and(Value::is_truthy) {
                    merge_map_key(map, key, lhs, rhs, operator, config)?;
                }
            }
            Operator::Intersect | Operator::Filter | Operator::FilterSwapped => {
                if lhs.as_ref().is_some_and(Value::is_truthy) {
                    merge_map_key(map, key, lhs, rhs, operator, config)?;
                }
            }
            _ => merge_map_key(map, key, lhs, rhs, operator, config)?,
        }

        // The `=`/`&`/`*` cleanup runs after every plain key, not once at
        // the end: keys contributed by tagged entries survive unless a
        // plain key is processed after them. An instruction carrying only
        // tagged keys never triggers the cleanup.
        if matches!(
            operator,
            Operator::Assign | Operator::Intersect | Operator::FilterSwapped
        ) {
            map.retain(|key, _| instruction.contains_key(key));
        }
    }

    Ok(())
}

fn merge_map_key(
    map: &mut Node,
    key: &str,
    lhs: Option<Value>,
    rhs: &Value,
    operator: Operator,
    config: &MergeConfig,
) -> Result<(), MergeError> {
    let Some(assignment) = merge(lhs.clone(), rhs, operator, config)? else {
        return Ok(());
    };
    if !assignment.is_truthy() && !assignment.is_number() {
        return Ok(());
    }
    // Toggle: assigning the same scalar again under `^` clears it.
    if operator == Operator::SymmetricDifference
        && assignment.is_scalar()
        && lhs.as_ref() == Some(&assignment)
    {
        map.remove(key);
    } else {
        map.set(key, assignment);
    }
    Ok(())
}

/// A scalar instruction against a map: `-`, `&`, and `*` delete the key
/// the instruction names, everything else replaces the whole map.
fn merge_map_scalar(
    mut map: Node,
    instruction: &Value,
    operator: Operator,
    config: &MergeConfig,
) -> Result<Option<Value>, MergeError> {
    match operator {
        Operator::Intersect | Operator::FilterSwapped if !instruction.is_truthy() => {
            // Intersecting with nothing leaves nothing.
            Ok(Some(Value::Int(0)))
        }
        Operator::Intersect | Operator::FilterSwapped | Operator::Subtract => {
            if let Value::Text(key) = instruction {
                if instruction.is_truthy() {
                    map.remove(key);
                }
            }
            Ok(Some(Value::Map(map)))
        }
        _ => {
            let current = Value::Map(map);
            guard_type_change(Some(&current), instruction, operator, config)?;
            Ok(Some(instruction.clone()))
        }
    }
}

fn printable(value: &Value) -> String {
    match value {
        Value::Map(_) => "object".to_string(),
        other => other.to_string(),
    }
}

/// Strict-mode check: a truthy current value may not change structural
/// category. Falsy and absent values coerce freely even in strict mode.
fn guard_type_change(
    current: Option<&Value>,
    instruction: &Value,
    operator: Operator,
    config: &MergeConfig,
) -> Result<(), MergeError> {
    if !config.strict_types {
        return Ok(());
    }
    let Some(current) = current else {
        return Ok(());
    };
    if !current.is_truthy() || current.category() == instruction.category() {
        return Ok(());
    }
    Err(MergeError::TypeConversion {
        operator: operator.tag(),
        current: printable(current),
        instruction: printable(instruction),
        value: serde_json::to_string(instruction).unwrap_or_else(|_| instruction.to_string()),
    })
}
