//! Domain models owned by the server.
//!
//! Cart and order aggregates live in `gallery-core`; these are the records
//! that only the server reads and writes.

pub mod artwork;
pub mod exhibition;
pub mod user;

pub use artwork::{Artwork, ArtworkDraft};
pub use exhibition::{Exhibition, ExhibitionDraft, ExhibitionStatus, Location, TicketPrice};
pub use user::{User, UserUpdate};
