//! Catalog classification enums.

use serde::de::IntoDeserializer;
use serde::de::value::StrDeserializer;
use serde::{Deserialize, Serialize};

/// Artistic style of an artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "gallery.artwork_style"))]
pub enum ArtworkStyle {
    Contemporary,
    Abstract,
    Realistic,
    Impressionist,
    Modern,
    Other,
}

/// Medium of an artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "gallery.artwork_category"))]
pub enum ArtworkCategory {
    Painting,
    Sculpture,
    Photography,
    #[serde(rename = "Digital Art")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "Digital Art"))]
    DigitalArt,
    #[serde(rename = "Mixed Media")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "Mixed Media"))]
    MixedMedia,
    Other,
}

/// Exhibition admission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "gallery.admission", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Admission {
    #[default]
    Free,
    Paid,
}

/// Parse a catalog enum from its wire name (its serialized string form).
///
/// Multipart forms carry these as plain text fields, so handlers go through
/// serde instead of duplicating the name tables.
///
/// # Errors
///
/// Returns the rejected input if it names no variant.
pub fn parse_wire_name<T: serde::de::DeserializeOwned>(value: &str) -> Result<T, String> {
    let name: StrDeserializer<'_, serde::de::value::Error> = value.trim().into_deserializer();
    T::deserialize(name).map_err(|_| value.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_wire_names_keep_spaces() {
        let json = serde_json::to_string(&ArtworkCategory::DigitalArt).unwrap();
        assert_eq!(json, "\"Digital Art\"");
        let parsed: ArtworkCategory = parse_wire_name("Mixed Media").unwrap();
        assert_eq!(parsed, ArtworkCategory::MixedMedia);
    }

    #[test]
    fn test_parse_wire_name_rejects_unknown() {
        assert_eq!(
            parse_wire_name::<ArtworkStyle>("Baroque").unwrap_err(),
            "Baroque"
        );
        assert_eq!(
            parse_wire_name::<ArtworkStyle>(" Abstract ").unwrap(),
            ArtworkStyle::Abstract
        );
    }

    #[test]
    fn test_admission_defaults_to_free() {
        assert_eq!(Admission::default(), Admission::Free);
        assert_eq!(parse_wire_name::<Admission>("paid").unwrap(), Admission::Paid);
    }
}
