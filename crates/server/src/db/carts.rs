//! Cart repository.
//!
//! A cart row holds the total and a `version` counter; its lines live in
//! `cart_items`. Every save rewrites the lines and bumps the version in one
//! transaction, guarded by the version the caller loaded.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use gallery_core::{ArtworkId, Cart, CartId, CartLine, UserId};

use super::{CartStore, RepositoryError};

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    total: Decimal,
    version: i64,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    artwork_id: ArtworkId,
    title: String,
    price: Decimal,
    image: String,
    quantity: i32,
}

impl TryFrom<CartLineRow> for CartLine {
    type Error = RepositoryError;

    fn try_from(r: CartLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(r.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative cart quantity {}", r.quantity))
        })?;

        Ok(Self {
            artwork_id: r.artwork_id,
            title: r.title,
            price: r.price,
            image: r.image,
            quantity,
        })
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CartStore for CartRepository<'_> {
    async fn load_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        sqlx::query("INSERT INTO gallery.carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| match e {
                // No such user: the token outlived its account
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    RepositoryError::NotFound
                }
                other => other.into(),
            })?;

        // The user (and the cart with it) may be deleted between the two statements
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, total, version, updated_at
            FROM gallery.carts
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let lines = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT artwork_id, title, price, image, quantity
            FROM gallery.cart_items
            WHERE cart_id = $1
            ORDER BY position
            ",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(CartLine::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        let mut cart = Cart {
            id: row.id,
            user_id: row.user_id,
            lines,
            total: row.total,
            version: row.version,
            updated_at: row.updated_at,
        };
        // The stored total is a cache; the lines are authoritative
        cart.recompute_total();
        Ok(cart)
    }

    async fn save(&self, cart: &Cart) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let saved = write_cart(&mut tx, cart).await?;
        tx.commit().await?;
        Ok(saved)
    }
}

/// Overwrite a cart's total and lines if its version still matches.
///
/// Runs on the caller's connection so checkout can empty the cart inside the
/// order transaction.
pub(super) async fn write_cart(
    conn: &mut PgConnection,
    cart: &Cart,
) -> Result<Cart, RepositoryError> {
    let bumped: Option<(i64, DateTime<Utc>)> = sqlx::query_as(
        r"
        UPDATE gallery.carts
        SET total = $2, version = version + 1, updated_at = NOW()
        WHERE id = $1 AND version = $3
        RETURNING version, updated_at
        ",
    )
    .bind(cart.id)
    .bind(cart.total)
    .bind(cart.version)
    .fetch_optional(&mut *conn)
    .await?;

    let Some((version, updated_at)) = bumped else {
        return Err(RepositoryError::Conflict(format!(
            "cart {} was modified concurrently",
            cart.id
        )));
    };

    sqlx::query("DELETE FROM gallery.cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .execute(&mut *conn)
        .await?;

    for (position, line) in (0_i32..).zip(&cart.lines) {
        let quantity = i32::try_from(line.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("cart quantity {} out of range", line.quantity))
        })?;

        sqlx::query(
            r"
            INSERT INTO gallery.cart_items
                (cart_id, artwork_id, title, price, image, quantity, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(cart.id)
        .bind(line.artwork_id)
        .bind(&line.title)
        .bind(line.price)
        .bind(&line.image)
        .bind(quantity)
        .bind(position)
        .execute(&mut *conn)
        .await?;
    }

    Ok(Cart {
        version,
        updated_at,
        ..cart.clone()
    })
}
