//! Orders: immutable snapshots of a cart at checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cart::Cart;
use crate::types::{Address, ArtworkId, OrderId, OrderStatus, PaymentMethod, UserId};

/// Errors raised while building or updating orders.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Checkout was attempted with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The status change does not follow the order lifecycle.
    #[error("cannot move order from {from} to {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },
}

/// One purchased artwork, priced at the time of checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub artwork_id: ArtworkId,
    pub title: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// An order that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl NewOrder {
    /// Snapshot a cart into a pending order.
    ///
    /// The total is recomputed from the cart lines rather than read from the
    /// cart's cached total.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` if the cart has no lines.
    pub fn from_cart(
        cart: &Cart,
        shipping_address: Address,
        payment_method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<Self, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let lines: Vec<OrderLine> = cart
            .lines
            .iter()
            .map(|line| OrderLine {
                artwork_id: line.artwork_id,
                title: line.title.clone(),
                quantity: line.quantity,
                price: line.price,
            })
            .collect();
        let total = lines
            .iter()
            .map(|line| line.price * Decimal::from(line.quantity))
            .sum();

        Ok(Self {
            user_id: cart.user_id,
            lines,
            total,
            shipping_address: shipping_address.normalized(),
            payment_method,
            notes: notes
                .map(|n| n.trim().to_owned())
                .filter(|n| !n.is_empty()),
        })
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(rename = "items")]
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
    pub shipping_address: Address,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Materialize a persisted order from its draft. New orders start `pending`.
    #[must_use]
    pub fn from_new(id: OrderId, new: NewOrder, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            lines: new.lines,
            total: new.total,
            shipping_address: new.shipping_address,
            payment_method: new.payment_method,
            status: OrderStatus::Pending,
            tracking_number: None,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move the order to `next`, optionally replacing the tracking number.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::IllegalTransition` if the lifecycle forbids it;
    /// the order is unchanged in that case.
    pub fn transition(
        &mut self,
        next: OrderStatus,
        tracking_number: Option<String>,
    ) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        if let Some(tracking) = tracking_number
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
        {
            self.tracking_number = Some(tracking);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::LineSnapshot;
    use crate::types::CartId;

    fn address() -> Address {
        Address {
            street: Some("X".to_string()),
            city: Some("Porto".to_string()),
            country: Some("Portugal".to_string()),
            ..Address::default()
        }
    }

    fn cart_with(lines: &[(i32, i64, i64)]) -> Cart {
        let mut cart = Cart::empty(CartId::new(1), UserId::new(5), Utc::now());
        for (id, price, qty) in lines {
            let snapshot = LineSnapshot {
                artwork_id: ArtworkId::new(*id),
                title: format!("Artwork {id}"),
                price: Decimal::from(*price),
                image: String::new(),
            };
            cart.add(snapshot, *qty).unwrap();
        }
        cart
    }

    #[test]
    fn test_from_cart_copies_lines_and_total() {
        let cart = cart_with(&[(1, 100, 1), (2, 25, 4)]);
        let order =
            NewOrder::from_cart(&cart, address(), PaymentMethod::CreditCard, None).unwrap();

        assert_eq!(order.user_id, UserId::new(5));
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[1].quantity, 4);
        assert_eq!(order.lines[1].price, Decimal::from(25));
        assert_eq!(order.total, Decimal::from(200));
    }

    #[test]
    fn test_from_cart_rejects_empty_cart() {
        let cart = cart_with(&[]);
        assert_eq!(
            NewOrder::from_cart(&cart, address(), PaymentMethod::Paypal, None),
            Err(OrderError::EmptyCart)
        );
    }

    #[test]
    fn test_from_cart_drops_blank_notes() {
        let cart = cart_with(&[(1, 10, 1)]);
        let order = NewOrder::from_cart(
            &cart,
            address(),
            PaymentMethod::Stripe,
            Some("   ".to_string()),
        )
        .unwrap();
        assert!(order.notes.is_none());
    }

    #[test]
    fn test_new_orders_start_pending() {
        let cart = cart_with(&[(1, 100, 1)]);
        let draft = NewOrder::from_cart(&cart, address(), PaymentMethod::CreditCard, None).unwrap();
        let order = Order::from_new(OrderId::new(1), draft, Utc::now());
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.tracking_number.is_none());
    }

    #[test]
    fn test_transition_follows_lifecycle() {
        let cart = cart_with(&[(1, 100, 1)]);
        let draft = NewOrder::from_cart(&cart, address(), PaymentMethod::CreditCard, None).unwrap();
        let mut order = Order::from_new(OrderId::new(1), draft, Utc::now());

        order.transition(OrderStatus::Processing, None).unwrap();
        order
            .transition(OrderStatus::Shipped, Some("1Z999".to_string()))
            .unwrap();
        assert_eq!(order.tracking_number.as_deref(), Some("1Z999"));

        let err = order.transition(OrderStatus::Pending, None).unwrap_err();
        assert_eq!(
            err,
            OrderError::IllegalTransition {
                from: OrderStatus::Shipped,
                to: OrderStatus::Pending
            }
        );
        assert_eq!(order.status, OrderStatus::Shipped);
    }

    #[test]
    fn test_same_status_updates_tracking_only() {
        let cart = cart_with(&[(1, 100, 1)]);
        let draft = NewOrder::from_cart(&cart, address(), PaymentMethod::CreditCard, None).unwrap();
        let mut order = Order::from_new(OrderId::new(1), draft, Utc::now());

        order
            .transition(OrderStatus::Pending, Some("TRACK-1".to_string()))
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.tracking_number.as_deref(), Some("TRACK-1"));
    }
}
