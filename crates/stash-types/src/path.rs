use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Location of a field inside a registered value.
///
/// A path is a sequence of segments. A segment names an object field, or,
/// when the container it is applied to is an array, a decimal element
/// index. The interpretation is decided at resolution time because the
/// same textual segment (`"0"`) is a valid object field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// The empty path, addressing the value itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path such as `"settings.items.0"`.
    ///
    /// The empty string parses to the root path. Empty segments (`"a..b"`,
    /// leading or trailing dots) are rejected.
    pub fn parse(dotted: &str) -> Result<Self, TypeError> {
        if dotted.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in dotted.split('.') {
            if segment.is_empty() {
                return Err(TypeError::InvalidPath {
                    path: dotted.to_string(),
                    reason: "empty path segment".into(),
                });
            }
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Build a path from pre-split segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Remove and return the last segment.
    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// The path without its last segment. The root is its own parent.
    pub fn parent(&self) -> Self {
        let mut parent = self.clone();
        parent.pop();
        parent
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns `true` for the empty path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the empty path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Concatenate two paths.
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Interpret a segment as an array index.
    ///
    /// Only plain decimal digits are accepted; `"+1"` or `" 1"` are not
    /// indices.
    pub fn as_index(segment: &str) -> Option<usize> {
        if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        segment.parse().ok()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.segments.join("."))
    }
}

impl std::str::FromStr for FieldPath {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
