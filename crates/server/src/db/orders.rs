//! Order repository.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use gallery_core::{
    Address, ArtworkId, Cart, NewOrder, Order, OrderId, OrderLine, OrderStatus, PaymentMethod,
    UserId,
};

use super::carts::{CartRepository, write_cart};
use super::{CartStore, OrderStore, RepositoryError};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total: Decimal,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    country: Option<String>,
    payment_method: PaymentMethod,
    status: OrderStatus,
    tracking_number: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            lines,
            total: self.total,
            shipping_address: Address {
                street: self.street,
                city: self.city,
                state: self.state,
                zip_code: self.zip_code,
                country: self.country,
            },
            payment_method: self.payment_method,
            status: self.status,
            tracking_number: self.tracking_number,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    order_id: OrderId,
    artwork_id: ArtworkId,
    title: String,
    quantity: i32,
    price: Decimal,
}

impl TryFrom<OrderLineRow> for OrderLine {
    type Error = RepositoryError;

    fn try_from(r: OrderLineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(r.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("negative order quantity {}", r.quantity))
        })?;

        Ok(Self {
            artwork_id: r.artwork_id,
            title: r.title,
            quantity,
            price: r.price,
        })
    }
}

/// Repository for order database operations.
///
/// Also serves carts, so checkout can load and place through one store.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Attach lines to a batch of order rows, preserving row order.
    async fn with_lines(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();

        let line_rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT order_id, artwork_id, title, quantity, price
            FROM gallery.order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut lines: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for row in line_rows {
            let order_id = row.order_id;
            lines
                .entry(order_id)
                .or_default()
                .push(OrderLine::try_from(row)?);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_lines = lines.remove(&row.id).unwrap_or_default();
                row.into_order(order_lines)
            })
            .collect())
    }
}

impl CartStore for OrderRepository<'_> {
    async fn load_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        CartRepository::new(self.pool).load_or_create(user_id).await
    }

    async fn save(&self, cart: &Cart) -> Result<Cart, RepositoryError> {
        CartRepository::new(self.pool).save(cart).await
    }
}

impl OrderStore for OrderRepository<'_> {
    async fn place(&self, order: NewOrder, cart: &Cart) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let address = &order.shipping_address;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO gallery.orders
                (user_id, total, street, city, state, zip_code, country,
                 payment_method, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, total, street, city, state, zip_code, country,
                      payment_method, status, tracking_number, notes,
                      created_at, updated_at
            ",
        )
        .bind(order.user_id)
        .bind(order.total)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .bind(&address.country)
        .bind(order.payment_method)
        .bind(&order.notes)
        .fetch_one(&mut *tx)
        .await?;

        for (position, line) in (0_i32..).zip(&order.lines) {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "order quantity {} out of range",
                    line.quantity
                ))
            })?;

            sqlx::query(
                r"
                INSERT INTO gallery.order_items
                    (order_id, position, artwork_id, title, quantity, price)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(row.id)
            .bind(position)
            .bind(line.artwork_id)
            .bind(&line.title)
            .bind(quantity)
            .bind(line.price)
            .execute(&mut *tx)
            .await?;
        }

        let mut emptied = cart.clone();
        emptied.clear();
        // A stale cart aborts the whole checkout, order included
        write_cart(&mut tx, &emptied).await?;

        tx.commit().await?;
        Ok(row.into_order(order.lines))
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total, street, city, state, zip_code, country,
                   payment_method, status, tracking_number, notes,
                   created_at, updated_at
            FROM gallery.orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.with_lines(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total, street, city, state, zip_code, country,
                   payment_method, status, tracking_number, notes,
                   created_at, updated_at
            FROM gallery.orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.with_lines(rows).await
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total, street, city, state, zip_code, country,
                   payment_method, status, tracking_number, notes,
                   created_at, updated_at
            FROM gallery.orders
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        self.with_lines(rows).await
    }

    async fn update_status(
        &self,
        order: &Order,
        expected: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let updated_at: Option<DateTime<Utc>> = sqlx::query_scalar(
            r"
            UPDATE gallery.orders
            SET status = $2, tracking_number = $3, updated_at = NOW()
            WHERE id = $1 AND status = $4
            RETURNING updated_at
            ",
        )
        .bind(order.id)
        .bind(order.status)
        .bind(&order.tracking_number)
        .bind(expected)
        .fetch_optional(self.pool)
        .await?;

        if let Some(updated_at) = updated_at {
            return Ok(Order {
                updated_at,
                ..order.clone()
            });
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM gallery.orders WHERE id = $1)")
                .bind(order.id)
                .fetch_one(self.pool)
                .await?;
        if exists {
            Err(RepositoryError::Conflict(format!(
                "order {} changed status concurrently",
                order.id
            )))
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}
