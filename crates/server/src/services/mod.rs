//! Business logic services for the gallery API.
//!
//! # Services
//!
//! - `auth` - Registration, login and bearer token keys
//! - `cart` - Per-user cart mutations under a lock
//! - `orders` - Checkout and order lifecycle
//! - `uploads` - Multipart form parsing and image storage

pub mod auth;
pub mod cart;
pub mod orders;
pub mod uploads;
