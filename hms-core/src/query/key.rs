//! Cache keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered sequence of segments naming one cached read result.
///
/// A collection key (`["patients"]`) is a prefix of the keys of its items
/// (`["patients", "42"]`) and of anything nested below them
/// (`["patients", "42", "medical-history"]`), which is what lets one
/// invalidation reach every view of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns a new key with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `self` equals `other` or is a leading subsequence of it.
    pub fn is_prefix_of(&self, other: &CacheKey) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for CacheKey {
    fn from(segments: [S; N]) -> Self {
        Self::new(segments)
    }
}

impl From<Vec<String>> for CacheKey {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching() {
        let patients = CacheKey::from(["patients"]);
        let patient = CacheKey::from(["patients", "42"]);
        let history = patient.child("medical-history");

        assert!(patients.is_prefix_of(&patients));
        assert!(patients.is_prefix_of(&patient));
        assert!(patients.is_prefix_of(&history));
        assert!(patient.is_prefix_of(&history));
        assert!(!patient.is_prefix_of(&patients));
    }

    #[test]
    fn test_prefix_is_segment_wise() {
        // "patient" is a string prefix of "patients" but not a segment prefix
        let patient = CacheKey::from(["patient"]);
        let patients = CacheKey::from(["patients"]);
        assert!(!patient.is_prefix_of(&patients));

        let staff = CacheKey::from(["staff"]);
        assert!(!staff.is_prefix_of(&patients));
    }

    #[test]
    fn test_display() {
        let key = CacheKey::from(["staff", "9", "tasks"]);
        assert_eq!(key.to_string(), "[staff, 9, tasks]");
        assert_eq!(key.len(), 3);
    }

    #[test]
    fn test_json_is_plain_array() {
        let key = CacheKey::from(["patients", "1"]);
        assert_eq!(serde_json::to_string(&key).unwrap(), r#"["patients","1"]"#);
    }
}
