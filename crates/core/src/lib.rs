//! Gallery Core - Shared domain types.
//!
//! This crate provides the types used across all gallery components:
//! - `server` - JSON API consumed by the single-page frontend
//! - `cli` - Command-line tools for migrations and admin provisioning
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain logic - no I/O, no
//! database access, no HTTP. The cart aggregate and the order snapshot live
//! here so their invariants can be tested without a store.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, addresses, and status enums
//! - [`cart`] - The per-user cart aggregate (merge, totals)
//! - [`order`] - Order snapshots and the status lifecycle

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod types;

pub use cart::{Cart, CartError, CartLine, LineSnapshot};
pub use order::{NewOrder, Order, OrderError, OrderLine};
pub use types::*;
