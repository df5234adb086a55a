//! URL slug type.
//!
//! A slug is the URL-safe identifier derived from a store's display name.
//! Uniqueness across stores is enforced by the repository layer, which
//! counts existing slugs matching [`Slug::sibling_pattern`] and suffixes
//! `-N` on collision.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A URL-safe slug derived from a display name.
///
/// Slugification lower-cases the input, maps every run of non-alphanumeric
/// characters to a single hyphen, and trims leading/trailing hyphens:
///
/// ```
/// use storemap_core::Slug;
///
/// assert_eq!(Slug::from_name("Cafe Rio").as_str(), "cafe-rio");
/// assert_eq!(Slug::from_name("  Joe's -- Diner! ").as_str(), "joe-s-diner");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive the base slug for a display name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut out = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.trim().chars() {
            if c.is_alphanumeric() {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                for lower in c.to_lowercase() {
                    out.push(lower);
                }
            } else {
                pending_hyphen = true;
            }
        }

        Self(out)
    }

    /// Wrap an already-slugified string (e.g. a database value).
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The slug this base resolves to when `existing` stores already match
    /// its sibling pattern: the base itself for zero matches, otherwise
    /// `base-{existing + 1}`.
    #[must_use]
    pub fn deduplicated(&self, existing: u64) -> Self {
        if existing == 0 {
            self.clone()
        } else {
            Self(format!("{}-{}", self.0, existing + 1))
        }
    }

    /// Case-insensitive regex matching this base slug and its numbered
    /// variants (`base`, `base-2`, `base-3`, ...), for counting siblings.
    ///
    /// Slugs only contain `[a-z0-9-]`, so the base needs no escaping.
    #[must_use]
    pub fn sibling_pattern(&self) -> String {
        format!("^({})((-[0-9]*)?)$", self.0)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether slugification produced any characters at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_basic() {
        assert_eq!(Slug::from_name("Cafe Rio").as_str(), "cafe-rio");
        assert_eq!(Slug::from_name("CAFE RIO").as_str(), "cafe-rio");
    }

    #[test]
    fn test_from_name_collapses_separators() {
        assert_eq!(Slug::from_name("a  --  b").as_str(), "a-b");
        assert_eq!(Slug::from_name("Joe's Diner!").as_str(), "joe-s-diner");
    }

    #[test]
    fn test_from_name_trims_hyphens() {
        assert_eq!(Slug::from_name("--edge--").as_str(), "edge");
        assert_eq!(Slug::from_name("  spaced  ").as_str(), "spaced");
    }

    #[test]
    fn test_from_name_empty_input() {
        assert!(Slug::from_name("").is_empty());
        assert!(Slug::from_name("!!!").is_empty());
    }

    #[test]
    fn test_deduplicated_sequence() {
        let base = Slug::from_name("Cafe Rio");
        // First store keeps the base slug, second becomes -2, third -3.
        assert_eq!(base.deduplicated(0).as_str(), "cafe-rio");
        assert_eq!(base.deduplicated(1).as_str(), "cafe-rio-2");
        assert_eq!(base.deduplicated(2).as_str(), "cafe-rio-3");
    }

    #[test]
    fn test_sibling_pattern_shape() {
        let base = Slug::from_name("Cafe Rio");
        assert_eq!(base.sibling_pattern(), "^(cafe-rio)((-[0-9]*)?)$");
    }
}
