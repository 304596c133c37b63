//! Configuration schema versioning

use serde::{Deserialize, Serialize};

/// Schema version of a configuration document.
///
/// Serialized either as a tag (`"latest"`, `"v1"`) or as a split
/// `{major, minor}` object. The two forms round-trip unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaVersion {
    Numeric { major: u32, minor: u32 },
    Tag(VersionTag),
}

/// Well-known schema version tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionTag {
    Latest,
    V1,
}

impl Default for SchemaVersion {
    fn default() -> Self {
        SchemaVersion::Tag(VersionTag::Latest)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        let v: SchemaVersion = serde_json::from_str("\"latest\"").unwrap();
        assert_eq!(v, SchemaVersion::Tag(VersionTag::Latest));
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"latest\"");

        let v: SchemaVersion = serde_json::from_str("\"v1\"").unwrap();
        assert_eq!(v, SchemaVersion::Tag(VersionTag::V1));
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"v1\"");
    }

    #[test]
    fn test_numeric_roundtrip() {
        let v: SchemaVersion = serde_json::from_str(r#"{"major": 1, "minor": 2}"#).unwrap();
        assert_eq!(v, SchemaVersion::Numeric { major: 1, minor: 2 });
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"major":1,"minor":2}"#
        );
    }

    #[test]
    fn test_default_is_latest() {
        assert_eq!(
            SchemaVersion::default(),
            SchemaVersion::Tag(VersionTag::Latest)
        );
    }
}
