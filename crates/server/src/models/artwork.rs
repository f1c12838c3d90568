//! Catalog artworks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use gallery_core::{ArtworkCategory, ArtworkId, ArtworkStyle, LineSnapshot};

use crate::services::uploads::{FormError, FormFields};

/// An artwork listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: ArtworkId,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub year: i32,
    pub style: ArtworkStyle,
    pub category: ArtworkCategory,
    pub dimensions: String,
    /// Public path of the uploaded image (`/uploads/artworks/...`).
    pub image: String,
    #[serde(rename = "arModelUrl")]
    pub ar_model_url: Option<String>,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

impl Artwork {
    /// The data a cart line copies when this artwork is added.
    #[must_use]
    pub fn snapshot(&self) -> LineSnapshot {
        LineSnapshot {
            artwork_id: self.id,
            title: self.title.clone(),
            price: self.price,
            image: self.image.clone(),
        }
    }
}

/// Validated artwork fields from an admin form, minus the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkDraft {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub year: i32,
    pub style: ArtworkStyle,
    pub category: ArtworkCategory,
    pub dimensions: String,
    pub ar_model_url: Option<String>,
    pub is_featured: bool,
}

impl ArtworkDraft {
    /// Build a draft from multipart text fields.
    ///
    /// # Errors
    ///
    /// Returns `FormError` naming the first missing or invalid field.
    pub fn from_form(fields: &FormFields) -> Result<Self, FormError> {
        let price: Decimal = fields.parse("price")?;
        if price.is_sign_negative() {
            return Err(FormError::Invalid {
                field: "price",
                reason: "must not be negative".to_string(),
            });
        }

        Ok(Self {
            title: fields.required("title")?.to_owned(),
            description: fields.required("description")?.to_owned(),
            price,
            year: fields.parse("year")?,
            style: fields.wire_enum("style")?,
            category: fields.wire_enum("category")?,
            dimensions: fields.required("dimensions")?.to_owned(),
            ar_model_url: fields.optional("arModelUrl").map(str::to_owned),
            is_featured: fields.flag("isFeatured"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            ("title", "  Harbour at Dusk "),
            ("description", "Oil on canvas"),
            ("price", "1250.50"),
            ("year", "2021"),
            ("style", "Impressionist"),
            ("category", "Mixed Media"),
            ("dimensions", "60x80cm"),
        ]
    }

    #[test]
    fn test_from_form_parses_and_trims() {
        let draft = ArtworkDraft::from_form(&fields(&complete())).unwrap();
        assert_eq!(draft.title, "Harbour at Dusk");
        assert_eq!(draft.price, Decimal::new(125_050, 2));
        assert_eq!(draft.category, ArtworkCategory::MixedMedia);
        assert!(!draft.is_featured);
        assert!(draft.ar_model_url.is_none());
    }

    #[test]
    fn test_from_form_rejects_negative_price() {
        let mut pairs = complete();
        pairs.retain(|(k, _)| *k != "price");
        pairs.push(("price", "-1"));
        let err = ArtworkDraft::from_form(&fields(&pairs)).unwrap_err();
        assert!(matches!(err, FormError::Invalid { field: "price", .. }));
    }

    #[test]
    fn test_from_form_rejects_unknown_style() {
        let mut pairs = complete();
        pairs.retain(|(k, _)| *k != "style");
        pairs.push(("style", "Baroque"));
        let err = ArtworkDraft::from_form(&fields(&pairs)).unwrap_err();
        assert!(matches!(err, FormError::Invalid { field: "style", .. }));
    }

    #[test]
    fn test_from_form_requires_title() {
        let mut pairs = complete();
        pairs.retain(|(k, _)| *k != "title");
        let err = ArtworkDraft::from_form(&fields(&pairs)).unwrap_err();
        assert_eq!(err, FormError::Missing("title"));
    }

    #[test]
    fn test_snapshot_copies_catalog_data() {
        let draft = ArtworkDraft::from_form(&fields(&complete())).unwrap();
        let artwork = Artwork {
            id: ArtworkId::new(3),
            title: draft.title,
            description: draft.description,
            price: draft.price,
            year: draft.year,
            style: draft.style,
            category: draft.category,
            dimensions: draft.dimensions,
            image: "/uploads/artworks/a.png".to_string(),
            ar_model_url: None,
            is_featured: true,
            created_at: Utc::now(),
        };
        let snapshot = artwork.snapshot();
        assert_eq!(snapshot.artwork_id, ArtworkId::new(3));
        assert_eq!(snapshot.price, Decimal::new(125_050, 2));
        assert_eq!(snapshot.image, "/uploads/artworks/a.png");
    }
}
