//! Artwork catalog repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use gallery_core::{ArtworkCategory, ArtworkId, ArtworkStyle, LineSnapshot};

use super::{ArtworkLookup, RepositoryError};
use crate::models::{Artwork, ArtworkDraft};

/// Maximum number of artworks on the featured shelf.
pub const FEATURED_LIMIT: i64 = 6;

#[derive(sqlx::FromRow)]
struct ArtworkRow {
    id: ArtworkId,
    title: String,
    description: String,
    price: Decimal,
    year: i32,
    style: ArtworkStyle,
    category: ArtworkCategory,
    dimensions: String,
    image: String,
    ar_model_url: Option<String>,
    is_featured: bool,
    created_at: DateTime<Utc>,
}

impl From<ArtworkRow> for Artwork {
    fn from(r: ArtworkRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            price: r.price,
            year: r.year,
            style: r.style,
            category: r.category,
            dimensions: r.dimensions,
            image: r.image,
            ar_model_url: r.ar_model_url,
            is_featured: r.is_featured,
            created_at: r.created_at,
        }
    }
}

/// Repository for artwork database operations.
pub struct ArtworkRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ArtworkRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All artworks, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Artwork>, RepositoryError> {
        let rows = sqlx::query_as::<_, ArtworkRow>(
            r"
            SELECT id, title, description, price, year, style, category,
                   dimensions, image, ar_model_url, is_featured, created_at
            FROM gallery.artworks
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Artwork::from).collect())
    }

    /// Featured artworks, newest first, at most [`FEATURED_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self) -> Result<Vec<Artwork>, RepositoryError> {
        let rows = sqlx::query_as::<_, ArtworkRow>(
            r"
            SELECT id, title, description, price, year, style, category,
                   dimensions, image, ar_model_url, is_featured, created_at
            FROM gallery.artworks
            WHERE is_featured
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            ",
        )
        .bind(FEATURED_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Artwork::from).collect())
    }

    /// Get an artwork by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ArtworkId) -> Result<Option<Artwork>, RepositoryError> {
        let row = sqlx::query_as::<_, ArtworkRow>(
            r"
            SELECT id, title, description, price, year, style, category,
                   dimensions, image, ar_model_url, is_featured, created_at
            FROM gallery.artworks
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Artwork::from))
    }

    /// Insert an artwork.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        draft: &ArtworkDraft,
        image: &str,
    ) -> Result<Artwork, RepositoryError> {
        let row = sqlx::query_as::<_, ArtworkRow>(
            r"
            INSERT INTO gallery.artworks
                (title, description, price, year, style, category,
                 dimensions, image, ar_model_url, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, title, description, price, year, style, category,
                      dimensions, image, ar_model_url, is_featured, created_at
            ",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.year)
        .bind(draft.style)
        .bind(draft.category)
        .bind(&draft.dimensions)
        .bind(image)
        .bind(&draft.ar_model_url)
        .bind(draft.is_featured)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace every field of an artwork. `image` of `None` keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the artwork does not exist.
    pub async fn update(
        &self,
        id: ArtworkId,
        draft: &ArtworkDraft,
        image: Option<&str>,
    ) -> Result<Artwork, RepositoryError> {
        let row = sqlx::query_as::<_, ArtworkRow>(
            r"
            UPDATE gallery.artworks
            SET title = $2, description = $3, price = $4, year = $5, style = $6,
                category = $7, dimensions = $8, image = COALESCE($9, image),
                ar_model_url = $10, is_featured = $11
            WHERE id = $1
            RETURNING id, title, description, price, year, style, category,
                      dimensions, image, ar_model_url, is_featured, created_at
            ",
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.year)
        .bind(draft.style)
        .bind(draft.category)
        .bind(&draft.dimensions)
        .bind(image)
        .bind(&draft.ar_model_url)
        .bind(draft.is_featured)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete an artwork, returning it.
    ///
    /// Existing cart lines and orders keep their snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the artwork does not exist.
    pub async fn delete(&self, id: ArtworkId) -> Result<Artwork, RepositoryError> {
        let row = sqlx::query_as::<_, ArtworkRow>(
            r"
            DELETE FROM gallery.artworks
            WHERE id = $1
            RETURNING id, title, description, price, year, style, category,
                      dimensions, image, ar_model_url, is_featured, created_at
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}

impl ArtworkLookup for ArtworkRepository<'_> {
    async fn snapshot(&self, id: ArtworkId) -> Result<Option<LineSnapshot>, RepositoryError> {
        Ok(self.get(id).await?.map(|artwork| artwork.snapshot()))
    }
}
