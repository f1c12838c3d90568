//! Exhibition repository.
//!
//! The date filters take "now" from the caller so that the filter and the
//! derived status of each returned exhibition agree.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use gallery_core::{Address, Admission, ExhibitionId};

use super::RepositoryError;
use crate::models::exhibition::DEFAULT_CURRENCY;
use crate::models::{Exhibition, ExhibitionDraft, ExhibitionStatus, Location, TicketPrice};

#[derive(sqlx::FromRow)]
struct ExhibitionRow {
    id: ExhibitionId,
    title: String,
    description: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    location_name: Option<String>,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    country: Option<String>,
    image: Option<String>,
    admission: Admission,
    price_amount: Option<Decimal>,
    price_currency: Option<String>,
    created_at: DateTime<Utc>,
}

impl ExhibitionRow {
    fn into_exhibition(self, now: DateTime<Utc>) -> Exhibition {
        Exhibition {
            id: self.id,
            status: ExhibitionStatus::at(self.start_date, self.end_date, now),
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            location: Location {
                name: self.location_name,
                address: Address {
                    street: self.street,
                    city: self.city,
                    state: self.state,
                    zip_code: self.zip_code,
                    country: self.country,
                },
            },
            image: self.image,
            admission: self.admission,
            price: self.price_amount.map(|amount| TicketPrice {
                amount,
                currency: self
                    .price_currency
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
            }),
            created_at: self.created_at,
        }
    }
}

/// Which slice of the exhibition calendar to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Every exhibition, latest start first.
    All,
    /// Running now, soonest ending first.
    Current,
    /// Not started yet, soonest start first.
    Upcoming,
    /// Already ended, most recently ended first.
    Past,
}

impl Window {
    const fn query(self) -> &'static str {
        match self {
            Self::All => {
                r"
                SELECT id, title, description, start_date, end_date, location_name,
                       street, city, state, zip_code, country, image, admission,
                       price_amount, price_currency, created_at
                FROM gallery.exhibitions
                ORDER BY start_date DESC, id DESC
                "
            }
            Self::Current => {
                r"
                SELECT id, title, description, start_date, end_date, location_name,
                       street, city, state, zip_code, country, image, admission,
                       price_amount, price_currency, created_at
                FROM gallery.exhibitions
                WHERE start_date <= $1 AND end_date >= $1
                ORDER BY end_date ASC, id ASC
                "
            }
            Self::Upcoming => {
                r"
                SELECT id, title, description, start_date, end_date, location_name,
                       street, city, state, zip_code, country, image, admission,
                       price_amount, price_currency, created_at
                FROM gallery.exhibitions
                WHERE start_date > $1
                ORDER BY start_date ASC, id ASC
                "
            }
            Self::Past => {
                r"
                SELECT id, title, description, start_date, end_date, location_name,
                       street, city, state, zip_code, country, image, admission,
                       price_amount, price_currency, created_at
                FROM gallery.exhibitions
                WHERE end_date < $1
                ORDER BY end_date DESC, id DESC
                "
            }
        }
    }
}

/// Repository for exhibition database operations.
pub struct ExhibitionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ExhibitionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List exhibitions in `window` as seen at `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        window: Window,
        now: DateTime<Utc>,
    ) -> Result<Vec<Exhibition>, RepositoryError> {
        let query = sqlx::query_as::<_, ExhibitionRow>(window.query());
        let query = if window == Window::All {
            query
        } else {
            query.bind(now)
        };
        let rows = query.fetch_all(self.pool).await?;

        Ok(rows.into_iter().map(|r| r.into_exhibition(now)).collect())
    }

    /// Get an exhibition by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: ExhibitionId,
        now: DateTime<Utc>,
    ) -> Result<Option<Exhibition>, RepositoryError> {
        let row = sqlx::query_as::<_, ExhibitionRow>(
            r"
            SELECT id, title, description, start_date, end_date, location_name,
                   street, city, state, zip_code, country, image, admission,
                   price_amount, price_currency, created_at
            FROM gallery.exhibitions
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| r.into_exhibition(now)))
    }

    /// Insert an exhibition.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        draft: &ExhibitionDraft,
        image: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Exhibition, RepositoryError> {
        let address = &draft.location.address;
        let row = sqlx::query_as::<_, ExhibitionRow>(
            r"
            INSERT INTO gallery.exhibitions
                (title, description, start_date, end_date, location_name,
                 street, city, state, zip_code, country, image, admission,
                 price_amount, price_currency)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, title, description, start_date, end_date, location_name,
                      street, city, state, zip_code, country, image, admission,
                      price_amount, price_currency, created_at
            ",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(&draft.location.name)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(&address.country)
        .bind(image)
        .bind(draft.admission)
        .bind(draft.price.as_ref().map(|p| p.amount))
        .bind(draft.price.as_ref().map(|p| p.currency.as_str()))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_exhibition(now))
    }

    /// Replace every field of an exhibition. `image` of `None` keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the exhibition does not exist.
    pub async fn update(
        &self,
        id: ExhibitionId,
        draft: &ExhibitionDraft,
        image: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Exhibition, RepositoryError> {
        let address = &draft.location.address;
        let row = sqlx::query_as::<_, ExhibitionRow>(
            r"
            UPDATE gallery.exhibitions
            SET title = $2, description = $3, start_date = $4, end_date = $5,
                location_name = $6, street = $7, city = $8, state = $9,
                zip_code = $10, country = $11, image = COALESCE($12, image),
                admission = $13, price_amount = $14, price_currency = $15
            WHERE id = $1
            RETURNING id, title, description, start_date, end_date, location_name,
                      street, city, state, zip_code, country, image, admission,
                      price_amount, price_currency, created_at
            ",
        )
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(&draft.location.name)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(&address.country)
        .bind(image)
        .bind(draft.admission)
        .bind(draft.price.as_ref().map(|p| p.amount))
        .bind(draft.price.as_ref().map(|p| p.currency.as_str()))
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into_exhibition(now))
    }

    /// Delete an exhibition, returning its image reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the exhibition does not exist.
    pub async fn delete(&self, id: ExhibitionId) -> Result<Option<String>, RepositoryError> {
        let image: Option<Option<String>> = sqlx::query_scalar(
            "DELETE FROM gallery.exhibitions WHERE id = $1 RETURNING image",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        image.ok_or(RepositoryError::NotFound)
    }
}
