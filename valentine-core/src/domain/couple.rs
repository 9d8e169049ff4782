//! Couple identifier
//!
//! The couple ID names the shared cloud record two partners write to. It is
//! generated once per installation and can be replaced by the partner's ID
//! to join their session. Anyone holding the ID can read and overwrite the
//! record.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Local storage key holding the couple ID
pub const COUPLE_ID_KEY: &str = "valentine-couple-id";

const RANDOM_SUFFIX_LEN: usize = 9;

/// Characters with a meaning in database paths or URLs
const RESERVED_CHARS: [char; 7] = ['/', '.', '#', '$', '[', ']', '?'];

/// Opaque identifier of a shared cloud record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoupleId(String);

impl CoupleId {
    /// Generates a fresh identifier: `couple_<unix-millis>_<9 base36 chars>`
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..RANDOM_SUFFIX_LEN)
            .map(|_| std::char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
            .collect();

        Self(format!("couple_{}_{}", Utc::now().timestamp_millis(), suffix))
    }

    /// Parses user input into an identifier
    ///
    /// Surrounding whitespace is removed. No check is made that a session
    /// with this identifier exists.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyCoupleId`] for empty or blank input and
    /// [`CoreError::InvalidCoupleId`] when the identifier holds a path
    /// separator, a character reserved by the database or the URL, or a
    /// control character.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(CoreError::EmptyCoupleId);
        }
        if let Some(c) = trimmed
            .chars()
            .find(|c| RESERVED_CHARS.contains(c) || c.is_control())
        {
            return Err(CoreError::InvalidCoupleId(c));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CoupleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_shape() {
        let id = CoupleId::generate();
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "couple");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), RANDOM_SUFFIX_LEN);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_generate_is_random() {
        assert_ne!(CoupleId::generate(), CoupleId::generate());
    }

    #[test]
    fn test_parse_trims() {
        let id = CoupleId::parse("  couple_1_abc \n").unwrap();
        assert_eq!(id.as_str(), "couple_1_abc");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(CoupleId::parse("   "), Err(CoreError::EmptyCoupleId));
        assert_eq!(CoupleId::parse(""), Err(CoreError::EmptyCoupleId));
    }

    #[test]
    fn test_parse_rejects_path_characters() {
        assert_eq!(
            CoupleId::parse("partner/my"),
            Err(CoreError::InvalidCoupleId('/'))
        );
        assert_eq!(
            CoupleId::parse("abc#frag"),
            Err(CoreError::InvalidCoupleId('#'))
        );
        for input in ["a.b", "a$b", "a[0]", "a]", "a?auth=x", "a\u{7}b"] {
            assert!(
                matches!(CoupleId::parse(input), Err(CoreError::InvalidCoupleId(_))),
                "{input:?} should be rejected"
            );
        }
        assert!(CoupleId::parse("couple_1700000000000_abc-XYZ").is_ok());
    }

    #[test]
    fn test_generated_ids_parse() {
        let id = CoupleId::generate();
        assert_eq!(CoupleId::parse(id.as_str()).unwrap(), id);
    }
}
