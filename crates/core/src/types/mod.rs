//! Core types for the gallery.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod catalog;
pub mod email;
pub mod id;
pub mod status;

pub use address::Address;
pub use catalog::{Admission, ArtworkCategory, ArtworkStyle, parse_wire_name};
pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
