//! Segmented paths into form records.

use std::fmt;

/// A path into a record: the first segment names a field, the rest descend
/// into nested maps (by key) or arrays (by numeric index).
///
/// Form field names are free-form, so segments are not validated beyond
/// being non-empty.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldPath {
    pub segments: Vec<String>,
}

impl FieldPath {
    /// Parse a path string.
    ///
    /// # Path Syntax
    ///
    /// - Segments are separated by `.` or `/`
    /// - Empty segments are ignored (normalizes `a..b` and trailing separators)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use formstore_core::FieldPath;
    ///
    /// let path = FieldPath::parse("address.city");
    /// assert_eq!(path.len(), 2);
    /// assert_eq!(FieldPath::parse("scores/1"), FieldPath::parse("scores.1"));
    /// ```
    pub fn parse(s: &str) -> Self {
        FieldPath {
            segments: s
                .split(['.', '/'])
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// A single-segment path naming one field verbatim, separators included.
    pub fn field(name: impl Into<String>) -> Self {
        FieldPath {
            segments: vec![name.into()],
        }
    }

    /// Check if this path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Iterate over segments.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.segments.iter()
    }

    /// The field name this path starts at.
    pub fn head(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// The path below the field name.
    #[must_use]
    pub fn tail(&self) -> FieldPath {
        FieldPath {
            segments: self.segments.iter().skip(1).cloned().collect(),
        }
    }

    /// Get a slice of segments as a new path.
    pub fn slice(&self, start: usize, end: usize) -> FieldPath {
        FieldPath {
            segments: self.segments[start..end].to_vec(),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl std::ops::Index<usize> for FieldPath {
    type Output = String;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        FieldPath::parse(s)
    }
}
