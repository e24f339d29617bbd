//! Key paths for hierarchical tree access.
//!
//! A [`KeyPath`] addresses a location inside a tree: an ordered list of
//! segments joined with `.` in the canonical textual form. Map keys are
//! arbitrary segments; segments that parse as unsigned integers address
//! list indices.
//!
//! Paths are automatically normalized on construction: empty components
//! produced by leading, trailing, or consecutive dots are dropped.
//!
//! ```
//! # use treepatch::KeyPath;
//! let path = KeyPath::from("user.profile.name");
//! assert_eq!(path.len(), 3);
//! assert_eq!(path.leaf(), Some("name"));
//! assert_eq!(KeyPath::from("user..name"), KeyPath::from("user.name"));
//! ```

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Normalizes a path string by dropping empty components.
pub fn normalize_path(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    input
        .split('.')
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// An owned, normalized key path.
///
/// Stored as the canonical dotted string so it doubles as the wire form
/// of modifier keys. Ordering is lexicographic over that string, which
/// sorts ancestors before their descendants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct KeyPath {
    inner: String,
}

impl KeyPath {
    /// Creates a new empty path.
    pub fn new() -> Self {
        Self {
            inner: String::new(),
        }
    }

    /// Creates a path by normalizing the input string.
    pub fn normalize(path: &str) -> Self {
        Self {
            inner: normalize_path(path),
        }
    }

    /// Adds a path fragment to the end of this path.
    ///
    /// Accepts single segments or dotted fragments; input is normalized.
    pub fn push(mut self, fragment: impl AsRef<str>) -> Self {
        let normalized = normalize_path(fragment.as_ref());
        if normalized.is_empty() {
            return self;
        }

        if self.inner.is_empty() {
            self.inner = normalized;
        } else {
            self.inner.push('.');
            self.inner.push_str(&normalized);
        }
        self
    }

    /// Joins this path with another path.
    pub fn join(&self, other: &KeyPath) -> Self {
        self.clone().push(other.as_str())
    }

    /// Returns an iterator over the path segments as string slices.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.inner.split('.').filter(|s| !s.is_empty())
    }

    /// Returns the number of segments in the path.
    pub fn len(&self) -> usize {
        if self.inner.is_empty() {
            0
        } else {
            self.inner.split('.').count()
        }
    }

    /// Returns `true` if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the parent path, or `None` if this path has at most one segment.
    pub fn parent(&self) -> Option<KeyPath> {
        self.inner.rfind('.').map(|last_dot| KeyPath {
            inner: self.inner[..last_dot].to_string(),
        })
    }

    /// Returns the last segment of the path, or `None` if empty.
    pub fn leaf(&self) -> Option<&str> {
        if self.inner.is_empty() {
            None
        } else {
            self.inner.split('.').next_back()
        }
    }

    /// Returns true if `other` is a strict descendant of this path.
    ///
    /// A path is never an ancestor of itself; the empty path is an
    /// ancestor of every non-empty path.
    pub fn is_ancestor_of(&self, other: &KeyPath) -> bool {
        if self.inner.is_empty() {
            return !other.inner.is_empty();
        }
        other.inner.len() > self.inner.len()
            && other.inner.starts_with(&self.inner)
            && other.inner.as_bytes()[self.inner.len()] == b'.'
    }

    /// Returns true if `other` equals this path or descends from it.
    pub fn covers(&self, other: &KeyPath) -> bool {
        self == other || self.is_ancestor_of(other)
    }

    /// Parses a segment as a list index.
    pub fn index_segment(segment: &str) -> Option<usize> {
        segment.parse().ok()
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for KeyPath {
    fn from(s: &str) -> Self {
        KeyPath::normalize(s)
    }
}

impl From<String> for KeyPath {
    fn from(s: String) -> Self {
        KeyPath::normalize(&s)
    }
}

impl FromStr for KeyPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(KeyPath::normalize(s))
    }
}

impl AsRef<str> for KeyPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_empty() {
            write!(f, "(empty path)")
        } else {
            write!(f, "{}", self.inner)
        }
    }
}

impl Serialize for KeyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}

impl<'de> Deserialize<'de> for KeyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(KeyPath::normalize(&raw))
    }
}
