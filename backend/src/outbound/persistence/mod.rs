//! Persistence drivers implementing the `Persistence` port.
//!
//! Two drivers live here:
//!
//! - **Relational**: PostgreSQL via Diesel with async support through
//!   `diesel-async` and `bb8` connection pooling, with TLS from rustls.
//! - **Document**: MongoDB via the official async driver.
//!
//! Row structs, table definitions and BSON document shapes are internal to
//! this module; only domain types cross the port. Backend errors are mapped
//! onto `PersistenceError` before they leave a driver.

mod diesel_error_mapping;
mod diesel_persistence;
mod models;
mod mongo_documents;
mod mongo_error_mapping;
mod mongo_persistence;
mod pool;
mod postgres_tls;
mod schema;
mod schema_sync;

pub use diesel_persistence::DieselPersistence;
pub use mongo_persistence::MongoPersistence;
pub use pool::{DbPool, PoolConfig, PoolError};
