//! Postal address shared by user profiles and orders.

use serde::{Deserialize, Serialize};

/// A postal address.
///
/// Every field is optional: profiles may be partially filled in. Checkout
/// requires at least a street, city and country (see [`Address::is_shippable`]).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Returns a copy with every field trimmed and empty fields dropped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        fn clean(field: Option<&String>) -> Option<String> {
            field
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        }

        Self {
            street: clean(self.street.as_ref()),
            city: clean(self.city.as_ref()),
            state: clean(self.state.as_ref()),
            zip_code: clean(self.zip_code.as_ref()),
            country: clean(self.country.as_ref()),
        }
    }

    /// Whether the address has enough detail to ship an artwork to.
    #[must_use]
    pub fn is_shippable(&self) -> bool {
        let address = self.normalized();
        address.street.is_some() && address.city.is_some() && address.country.is_some()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_camel_case_with_missing_fields() {
        let address: Address =
            serde_json::from_str(r#"{"street":"1 Main St","zipCode":"12345"}"#).unwrap();
        assert_eq!(address.street.as_deref(), Some("1 Main St"));
        assert_eq!(address.zip_code.as_deref(), Some("12345"));
        assert!(address.city.is_none());
    }

    #[test]
    fn test_normalized_drops_blank_fields() {
        let address = Address {
            street: Some("  1 Main St ".to_string()),
            city: Some("   ".to_string()),
            ..Address::default()
        };
        let normalized = address.normalized();
        assert_eq!(normalized.street.as_deref(), Some("1 Main St"));
        assert!(normalized.city.is_none());
    }

    #[test]
    fn test_is_shippable() {
        let mut address = Address {
            street: Some("X".to_string()),
            city: Some("Lisbon".to_string()),
            ..Address::default()
        };
        assert!(!address.is_shippable());
        address.country = Some("Portugal".to_string());
        assert!(address.is_shippable());
    }
}
