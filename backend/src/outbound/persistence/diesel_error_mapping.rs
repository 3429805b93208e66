//! Diesel and pool error mapping for the relational driver.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::PersistenceError;

use super::pool::PoolError;

/// Map pool failures to connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> PersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            PersistenceError::connection(message)
        }
    }
}

/// Map Diesel errors onto the persistence taxonomy.
///
/// Backend detail is logged at `debug` and kept out of the returned message
/// except for constraint names, which help callers tell conflicts apart.
pub(crate) fn map_diesel_error(error: DieselError) -> PersistenceError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name().unwrap_or("unnamed constraint");
            match kind {
                DatabaseErrorKind::UniqueViolation => {
                    PersistenceError::conflict(format!("unique constraint violated: {constraint}"))
                }
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation => PersistenceError::validation(format!(
                    "constraint violated: {constraint}"
                )),
                DatabaseErrorKind::ClosedConnection => {
                    PersistenceError::connection("database connection closed")
                }
                _ => PersistenceError::query("database error"),
            }
        }
        DieselError::BrokenTransactionManager => {
            PersistenceError::connection("database connection unusable")
        }
        DieselError::SerializationError(_) | DieselError::DeserializationError(_) => {
            PersistenceError::query("row conversion failed")
        }
        DieselError::QueryBuilderError(_) => PersistenceError::query("database query error"),
        _ => PersistenceError::query("database error"),
    }
}
