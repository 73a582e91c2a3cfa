//! Field paths for addressing nested models
//!
//! Provides [`FieldPath`] for reading and deriving fields of models nested
//! inside other models (`owner.address.city`).

use crate::field::is_valid_field_name;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Dotted path through nested model fields
///
/// # Examples
/// - `["name"]` → `name`
/// - `["owner", "name"]` → `owner.name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Create path from segments
    ///
    /// # Errors
    /// Returns error if the path is empty or a segment is not a field name
    pub fn new(segments: Vec<String>) -> Result<Self, PathError> {
        if segments.is_empty() {
            return Err(PathError::EmptyPath);
        }
        for segment in &segments {
            check_segment(segment)?;
        }
        Ok(Self(segments))
    }

    /// Create path from a single field name
    ///
    /// # Errors
    /// Returns error if `segment` is not a field name
    pub fn single(segment: impl Into<String>) -> Result<Self, PathError> {
        Self::new(vec![segment.into()])
    }

    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a path has at least one segment
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First segment
    #[inline]
    #[must_use]
    pub fn first(&self) -> &str {
        &self.0[0]
    }

    /// Last segment (the field that is read or replaced)
    #[inline]
    #[must_use]
    pub fn last(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    /// Path without its last segment, `None` for single-segment paths
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.len() > 1 {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        } else {
            None
        }
    }

    /// Append a segment, returning new path
    ///
    /// # Errors
    /// Returns error if `segment` is not a field name
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, PathError> {
        let segment = segment.into();
        check_segment(&segment)?;
        let mut new = self.clone();
        new.0.push(segment);
        Ok(new)
    }

    /// Split into first segment and the remaining path (if any)
    #[must_use]
    pub fn split_first(&self) -> (&str, Option<Self>) {
        let rest = if self.0.len() > 1 {
            Some(Self(self.0[1..].to_vec()))
        } else {
            None
        };
        (self.first(), rest)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

fn check_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        Err(PathError::EmptySegment)
    } else if !is_valid_field_name(segment) {
        Err(PathError::InvalidSegment(segment.to_string()))
    } else {
        Ok(())
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathError::EmptyPath);
        }
        Self::new(s.split('.').map(str::to_string).collect())
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Errors related to field paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Path has no segments
    #[error("path is empty")]
    EmptyPath,

    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Segment is not a field name
    #[error("invalid segment: {0} (must be a field name)")]
    InvalidSegment(String),

    /// Intermediate segment does not hold a nested model
    #[error("'{segment}' does not hold a nested model")]
    NotAModel { segment: String },
}
