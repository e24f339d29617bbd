//! Merge operators and the tagged-key boundary adapter.
//!
//! Instructions select operators through *tagged keys*: map keys that are
//! exactly two characters, the first the reserved marker `<`, the second
//! the operator tag. Internally the operator is an explicit enum matched
//! exhaustively; this module is the only place the key convention is
//! decoded or encoded.
//!
//! ```
//! # use treepatch::merge::Operator;
//! assert_eq!(Operator::decode_key("<+"), Some(Ok(Operator::Append)));
//! assert_eq!(Operator::Append.encode_key(), "<+");
//! assert_eq!(Operator::decode_key("name"), None);
//! ```

use std::fmt;

use super::MergeError;
use crate::tree::{Node, Value};

/// The reserved first character of a tagged key.
pub const TAG_MARKER: char = '<';

/// One of the nine merge operators.
///
/// Each operator has total, independently defined behavior for lists and
/// for map keys; see the merge module documentation for both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `=` - replace entirely; at the map level, keys absent from the
    /// instruction are removed afterwards.
    Assign,
    /// `+` - append elements not already present; merge map keys
    /// unconditionally.
    Append,
    /// `-` - remove the instruction's elements; delete map keys with
    /// truthy instruction values.
    Subtract,
    /// `!` - add elements missing from the target; merge map keys only
    /// when currently absent.
    Difference,
    /// `&` - keep only elements also present in the instruction; merge
    /// map keys only when currently present, then drop keys absent from
    /// the instruction.
    Intersect,
    /// `|` - union without duplicates; merge map keys unconditionally.
    Union,
    /// `^` - symmetric difference; at the map level, toggle semantics.
    SymmetricDifference,
    /// `?` - pairwise filter keeping elements where both sides are
    /// present; merge map keys only when currently present.
    Filter,
    /// `*` - same filter with the operand order swapped; merge map keys
    /// only when currently present, then drop keys absent from the
    /// instruction.
    FilterSwapped,
}

impl Operator {
    /// Decodes an operator from its single-character tag.
    pub fn from_tag(tag: char) -> Result<Self, MergeError> {
        match tag {
            '=' => Ok(Operator::Assign),
            '+' => Ok(Operator::Append),
            '-' => Ok(Operator::Subtract),
            '!' => Ok(Operator::Difference),
            '&' => Ok(Operator::Intersect),
            '|' => Ok(Operator::Union),
            '^' => Ok(Operator::SymmetricDifference),
            '?' => Ok(Operator::Filter),
            '*' => Ok(Operator::FilterSwapped),
            other => Err(MergeError::UnknownOperator { tag: other }),
        }
    }

    /// The single-character tag for this operator.
    pub fn tag(self) -> char {
        match self {
            Operator::Assign => '=',
            Operator::Append => '+',
            Operator::Subtract => '-',
            Operator::Difference => '!',
            Operator::Intersect => '&',
            Operator::Union => '|',
            Operator::SymmetricDifference => '^',
            Operator::Filter => '?',
            Operator::FilterSwapped => '*',
        }
    }

    /// Returns true if a map key follows the tagged-key convention.
    ///
    /// The tag itself is not validated; decoding reports unknown tags.
    pub fn is_tagged_key(key: &str) -> bool {
        let mut chars = key.chars();
        chars.next() == Some(TAG_MARKER) && chars.next().is_some() && chars.next().is_none()
    }

    /// Decodes a map key: `None` for plain keys, `Some(Err)` for a tagged
    /// key selecting an unknown operator.
    pub fn decode_key(key: &str) -> Option<Result<Self, MergeError>> {
        if !Self::is_tagged_key(key) {
            return None;
        }
        let tag = key.chars().nth(1)?;
        Some(Self::from_tag(tag))
    }

    /// Encodes this operator as a tagged key.
    pub fn encode_key(self) -> String {
        let mut key = String::with_capacity(2);
        key.push(TAG_MARKER);
        key.push(self.tag());
        key
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Collects the tagged entries of an instruction node in insertion order.
///
/// Plain keys are skipped; a tagged key with an unknown operator is fatal.
pub(crate) fn tagged_entries(node: &Node) -> Result<Vec<(Operator, &Value)>, MergeError> {
    let mut entries = Vec::new();
    for (key, value) in node.iter() {
        if let Some(decoded) = Operator::decode_key(key) {
            entries.push((decoded?, value));
        }
    }
    Ok(entries)
}
