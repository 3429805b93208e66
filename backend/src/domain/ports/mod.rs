//! Domain ports defining the edges of the hexagon.
//!
//! Drivers for the document and relational stores implement [`Persistence`];
//! services depend on the trait only.

mod macros;
pub(crate) use macros::define_port_error;

mod persistence;

#[cfg(test)]
pub use persistence::MockPersistence;
pub use persistence::{BestEffort, Persistence, PersistenceError};
