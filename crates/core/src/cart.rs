//! The per-user cart aggregate.
//!
//! A cart holds at most one line per artwork. Each line snapshots the
//! artwork's title, price and image at the moment it was first added, so
//! later catalog edits never change what is already in a cart. The cart
//! `total` is derived: every mutating method recomputes it from the line
//! snapshots before returning.
//!
//! Persistence is not this module's concern. Stores load a [`Cart`], call
//! one of the mutating methods, and save the result together with its
//! `version` so concurrent writers can be detected.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{ArtworkId, CartId, UserId};

/// Errors raised by cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Quantity below 1 where a positive quantity is required.
    #[error("quantity must be at least 1 (got {0})")]
    InvalidQuantity(i64),

    /// No line for the artwork exists in the cart.
    #[error("artwork {0} is not in the cart")]
    LineNotFound(ArtworkId),

    /// The resulting quantity would exceed the per-line maximum.
    #[error("quantity for artwork {0} cannot exceed {max}", max = CartLine::MAX_QUANTITY)]
    QuantityTooLarge(ArtworkId),

    /// The resulting cart total would exceed what an order can record.
    #[error("cart total cannot exceed {max}", max = Cart::MAX_TOTAL)]
    TotalTooLarge,
}

/// Catalog data copied into a cart line when the artwork is first added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSnapshot {
    pub artwork_id: ArtworkId,
    pub title: String,
    pub price: Decimal,
    pub image: String,
}

/// One artwork in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub artwork_id: ArtworkId,
    pub title: String,
    /// Unit price at the time the line was created.
    pub price: Decimal,
    pub image: String,
    pub quantity: u32,
}

impl CartLine {
    /// Upper bound for a single line's quantity.
    pub const MAX_QUANTITY: u32 = 9_999;

    fn from_snapshot(snapshot: LineSnapshot, quantity: u32) -> Self {
        Self {
            artwork_id: snapshot.artwork_id,
            title: snapshot.title,
            price: snapshot.price,
            image: snapshot.image,
            quantity,
        }
    }

    /// Unit price multiplied by quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    #[serde(rename = "items")]
    pub lines: Vec<CartLine>,
    pub total: Decimal,
    /// Optimistic concurrency token, bumped by the store on every save.
    #[serde(skip)]
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Largest total a cart may reach. Matches the `NUMERIC(14,2)` columns
    /// that store cart and order totals.
    pub const MAX_TOTAL: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

    /// Create an empty cart.
    #[must_use]
    pub const fn empty(id: CartId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            lines: Vec::new(),
            total: Decimal::ZERO,
            version: 0,
            updated_at: now,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Find the line for an artwork.
    #[must_use]
    pub fn line(&self, artwork_id: ArtworkId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.artwork_id == artwork_id)
    }

    /// Add `quantity` units of an artwork.
    ///
    /// If the artwork already has a line, its quantity is increased and the
    /// original price snapshot is kept. Otherwise a new line is created from
    /// `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` if `quantity < 1`,
    /// `CartError::QuantityTooLarge` if the merged quantity would exceed
    /// [`CartLine::MAX_QUANTITY`], or `CartError::TotalTooLarge` if the cart
    /// total would exceed [`Cart::MAX_TOTAL`]. The cart is unchanged on error.
    pub fn add(&mut self, snapshot: LineSnapshot, quantity: i64) -> Result<(), CartError> {
        let artwork_id = snapshot.artwork_id;
        let quantity = positive_quantity(quantity)?;

        let (price, current) = self
            .line(artwork_id)
            .map_or((snapshot.price, 0), |line| (line.price, line.quantity));
        let merged = current
            .checked_add(quantity)
            .filter(|q| *q <= CartLine::MAX_QUANTITY)
            .ok_or(CartError::QuantityTooLarge(artwork_id))?;
        self.check_total(artwork_id, price, merged)?;

        match self
            .lines
            .iter_mut()
            .find(|line| line.artwork_id == artwork_id)
        {
            Some(line) => line.quantity = merged,
            None => self.lines.push(CartLine::from_snapshot(snapshot, merged)),
        }

        self.recompute_total();
        Ok(())
    }

    /// Set the quantity of an existing line to exactly `quantity`.
    ///
    /// A quantity of zero or less removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the artwork has no line,
    /// `CartError::QuantityTooLarge` if `quantity` exceeds the maximum, or
    /// `CartError::TotalTooLarge` if the cart total would exceed
    /// [`Cart::MAX_TOTAL`].
    pub fn set_quantity(&mut self, artwork_id: ArtworkId, quantity: i64) -> Result<(), CartError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.artwork_id == artwork_id)
            .ok_or(CartError::LineNotFound(artwork_id))?;

        if quantity <= 0 {
            self.lines.remove(index);
        } else {
            let quantity = u32::try_from(quantity)
                .ok()
                .filter(|q| *q <= CartLine::MAX_QUANTITY)
                .ok_or(CartError::QuantityTooLarge(artwork_id))?;
            if let Some(price) = self.lines.get(index).map(|line| line.price) {
                self.check_total(artwork_id, price, quantity)?;
            }
            if let Some(line) = self.lines.get_mut(index) {
                line.quantity = quantity;
            }
        }

        self.recompute_total();
        Ok(())
    }

    /// Remove the line for an artwork and return it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the artwork has no line.
    pub fn remove(&mut self, artwork_id: ArtworkId) -> Result<CartLine, CartError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.artwork_id == artwork_id)
            .ok_or(CartError::LineNotFound(artwork_id))?;
        let removed = self.lines.remove(index);
        self.recompute_total();
        Ok(removed)
    }

    /// Remove every line. Idempotent.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.recompute_total();
    }

    /// Recompute `total` from the line snapshots.
    pub fn recompute_total(&mut self) {
        self.total = self.lines.iter().map(CartLine::subtotal).sum();
    }

    /// Fail if giving `artwork_id` a line of `quantity` at `price` would
    /// push the total past [`Cart::MAX_TOTAL`].
    fn check_total(
        &self,
        artwork_id: ArtworkId,
        price: Decimal,
        quantity: u32,
    ) -> Result<(), CartError> {
        let others = self
            .lines
            .iter()
            .filter(|line| line.artwork_id != artwork_id)
            .try_fold(Decimal::ZERO, |sum, line| {
                line.price
                    .checked_mul(Decimal::from(line.quantity))
                    .and_then(|subtotal| sum.checked_add(subtotal))
            });
        let projected = others.and_then(|sum| {
            price
                .checked_mul(Decimal::from(quantity))
                .and_then(|subtotal| sum.checked_add(subtotal))
        });

        match projected {
            Some(total) if total <= Self::MAX_TOTAL => Ok(()),
            _ => Err(CartError::TotalTooLarge),
        }
    }
}

fn positive_quantity(quantity: i64) -> Result<u32, CartError> {
    if quantity < 1 {
        return Err(CartError::InvalidQuantity(quantity));
    }
    // Anything beyond u32 is certainly beyond MAX_QUANTITY.
    Ok(u32::try_from(quantity).unwrap_or(u32::MAX))
}
