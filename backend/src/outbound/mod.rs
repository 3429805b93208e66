//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: the MongoDB and PostgreSQL drivers
//! - **selector**: picks and installs one driver per process
//!
//! Adapters are thin translators between domain types and backend
//! representations. They contain no business logic.

pub mod persistence;
pub mod selector;
