use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Maximum accepted SKU length in characters.
pub const MAX_SKU_LEN: usize = 64;

/// Stock-keeping unit identifier.
///
/// Keeps the casing it was created with for display, but uniqueness and
/// lookups go through [`Sku::key`], which ignores case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    /// Parses a SKU, trimming surrounding whitespace.
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid("SKU must not be empty"));
        }
        if trimmed.chars().count() > MAX_SKU_LEN {
            return Err(DomainError::invalid(format!(
                "SKU must be at most {MAX_SKU_LEN} characters"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the SKU as entered.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive storage key.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }

    /// Returns true if both SKUs name the same stock item.
    pub fn same_item(&self, other: &Sku) -> bool {
        self.key() == other.key()
    }
}

impl std::fmt::Display for Sku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Sku {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Sku::parse(&value)
    }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self {
        sku.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_keeps_casing() {
        let sku = Sku::parse("  Sku-001 ").unwrap();
        assert_eq!(sku.as_str(), "Sku-001");
        assert_eq!(sku.key(), "sku-001");
    }

    #[test]
    fn blank_sku_is_rejected() {
        assert!(matches!(
            Sku::parse("   "),
            Err(DomainError::InvalidRequest(_))
        ));
    }

    #[test]
    fn overlong_sku_is_rejected() {
        assert!(Sku::parse(&"x".repeat(MAX_SKU_LEN + 1)).is_err());
        assert!(Sku::parse(&"x".repeat(MAX_SKU_LEN)).is_ok());
    }

    #[test]
    fn same_item_ignores_case() {
        let a = Sku::parse("abc").unwrap();
        let b = Sku::parse("ABC").unwrap();
        assert!(a.same_item(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn deserializing_validates() {
        let ok: Sku = serde_json::from_str("\"SKU001\"").unwrap();
        assert_eq!(ok.as_str(), "SKU001");
        assert!(serde_json::from_str::<Sku>("\"  \"").is_err());
    }
}
