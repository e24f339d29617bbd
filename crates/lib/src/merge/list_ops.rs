//! Set algebra over lists.
//!
//! Lists are treated as ordered sets under deep equality: every operator
//! here preserves the order of the side it keeps elements from, and
//! membership is deep structural equality, so `[1, 2]` is an element that
//! can be found inside `[[1, 2], 3]`.

use super::MergeError;
use crate::tree::Value;

/// Deep membership test: is `needle` an element of `set`?
///
/// A list needle matches when any element deep-equals it, same as any
/// other value.
pub fn contains(set: &[Value], needle: &Value) -> bool {
    set.iter().any(|element| element == needle)
}

/// Are any of `needles` elements of `set`?
pub fn contains_any(set: &[Value], needles: &Value) -> Result<bool, MergeError> {
    let Value::List(items) = needles else {
        return Err(MergeError::NotAList {
            operation: "contains_any",
        });
    };
    Ok(items.iter().any(|needle| contains(set, needle)))
}

/// Are all of `needles` elements of `set`?
pub fn contains_all(set: &[Value], needles: &Value) -> Result<bool, MergeError> {
    let Value::List(items) = needles else {
        return Err(MergeError::NotAList {
            operation: "contains_all",
        });
    };
    Ok(items.iter().all(|needle| contains(set, needle)))
}

/// `=`: replace the contents wholesale.
pub(crate) fn assign(target: &mut Vec<Value>, instruction: &[Value]) {
    target.clear();
    target.extend_from_slice(instruction);
}

/// `+` and `!`: append elements not already present.
pub(crate) fn append_missing(target: &mut Vec<Value>, instruction: &[Value]) {
    for element in instruction {
        if !contains(target, element) {
            target.push(element.clone());
        }
    }
}

/// `-`: remove the instruction's elements.
pub(crate) fn subtract(target: &mut Vec<Value>, instruction: &[Value]) {
    target.retain(|element| !contains(instruction, element));
}

/// `&`: keep only elements also present in the instruction.
pub(crate) fn intersect(target: &mut Vec<Value>, instruction: &[Value]) {
    target.retain(|element| contains(instruction, element));
}

/// `|`: deduplicate the target, then add the instruction's elements
/// without introducing duplicates.
pub(crate) fn union(target: &mut Vec<Value>, instruction: &[Value]) {
    let mut merged: Vec<Value> = Vec::with_capacity(target.len() + instruction.len());
    for element in target.drain(..) {
        if !contains(&merged, &element) {
            merged.push(element);
        }
    }
    for element in instruction {
        if !contains(&merged, element) {
            merged.push(element.clone());
        }
    }
    *target = merged;
}

/// `^`: elements in exactly one side, target's survivors first.
pub(crate) fn symmetric_difference(target: &mut Vec<Value>, instruction: &[Value]) {
    let original = std::mem::take(target);
    for element in &original {
        if !contains(instruction, element) {
            target.push(element.clone());
        }
    }
    for element in instruction {
        if !contains(&original, element) {
            target.push(element.clone());
        }
    }
}

/// `?` and `*`: pairwise zip keeping `target[i]` where the predicate
/// holds for `(target[i], instruction[i])`. Elements past the end of the
/// instruction are dropped.
pub(crate) fn compare_and_filter(
    target: &mut Vec<Value>,
    instruction: &[Value],
    keep: impl Fn(&Value, &Value) -> bool,
) {
    let original = std::mem::take(target);
    for (element, other) in original.into_iter().zip(instruction.iter()) {
        if keep(&element, other) {
            target.push(element);
        }
    }
}
