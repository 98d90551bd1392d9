//! Canonical profile identifier.

use crate::{UuidError, UuidResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

use ::uuid::Uuid;

/// Number of hex characters shown in the human-facing tag id (`LT-xxxxxxxx`).
const DISPLAY_ID_LEN: usize = 8;

/// Identifier of one subject's emergency profile (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained UUID is guaranteed canonical, so it can be used directly
/// for path derivation and display.
///
/// # Construction
/// - [`ProfileId::new`] allocates a fresh identifier for a newly registered profile.
/// - [`ProfileId::parse`] validates an externally supplied identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileId(Uuid);

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileId {
    /// Generates a new random (v4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be in canonical form.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not exactly 32 lowercase hex characters.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "profile id must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }

        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("invalid profile id '{}': {}", input, e)))
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic: exactly 32 bytes, each `0-9` or `a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Short human-facing identifier printed on tags and shown on the emergency page,
    /// e.g. `LT-550e8400`.
    pub fn display_id(&self) -> String {
        let canonical = self.0.simple().to_string();
        format!("LT-{}", &canonical[..DISPLAY_ID_LEN])
    }

    /// Returns `parent_dir/<s1>/<s2>/<id>/` where `s1`/`s2` are the first four hex characters.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ProfileId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ProfileId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ProfileId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ProfileId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_canonical_id() {
        let id = ProfileId::new();
        let canonical = id.to_string();

        assert_eq!(canonical.len(), 32);
        assert!(ProfileId::is_canonical(&canonical));
    }

    #[test]
    fn test_parse_valid_canonical_id() {
        let canonical = "550e8400e29b41d4a716446655440000";
        let id = ProfileId::parse(canonical).expect("canonical id should parse");

        assert_eq!(id.to_string(), canonical);
    }

    #[test]
    fn test_parse_rejects_hyphenated_id() {
        let result = ProfileId::parse("550e8400-e29b-41d4-a716-446655440000");

        match result {
            Err(UuidError::InvalidInput(msg)) => {
                assert!(msg.contains("32 lowercase hex characters"));
            }
            _ => panic!("Expected InvalidInput error"),
        }
    }

    #[test]
    fn test_parse_rejects_non_canonical_inputs() {
        for input in [
            "550E8400E29B41D4A716446655440000",
            "550e8400e29b41d4a71644665544000",
            "550e8400e29b41d4a7164466554400000",
            "550e8400e29b41d4a716446655440zzz",
            "",
        ] {
            assert!(ProfileId::parse(input).is_err(), "{input:?} should fail");
        }
    }

    #[test]
    fn test_display_id_uses_prefix() {
        let id = ProfileId::parse("550e8400e29b41d4a716446655440000").unwrap();
        assert_eq!(id.display_id(), "LT-550e8400");
    }

    #[test]
    fn test_sharded_dir_structure() {
        let id = ProfileId::parse("550e8400e29b41d4a716446655440000").unwrap();
        let sharded = id.sharded_dir(Path::new("/profile_data/profiles"));

        assert_eq!(
            sharded,
            PathBuf::from("/profile_data/profiles/55/0e/550e8400e29b41d4a716446655440000")
        );
    }

    #[test]
    fn test_from_str_round_trips_display() {
        let canonical = "aabbccddeeff00112233445566778899";
        let id: ProfileId = canonical.parse().expect("should parse");
        assert_eq!(id.to_string(), canonical);
    }

    #[test]
    fn test_serde_rejects_non_canonical() {
        let err = serde_json::from_str::<ProfileId>("\"not-an-id\"").expect_err("should fail");
        assert!(err.to_string().contains("profile id"));
    }
}
