//! MongoDB error mapping for the document driver.

use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use tracing::debug;

use crate::domain::ports::PersistenceError;

const DUPLICATE_KEY: i32 = 11000;
const DOCUMENT_VALIDATION_FAILURE: i32 = 121;

/// Coarse classification of a driver failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    /// Server error code reported by a write or command.
    Server(i32),
    /// Network, DNS, authentication or topology failure.
    Unreachable,
    Other,
}

fn classify(error: &MongoError) -> Failure {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => Failure::Server(write.code),
        ErrorKind::Command(command) => Failure::Server(command.code),
        ErrorKind::Io(_)
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::Authentication { .. } => Failure::Unreachable,
        _ => Failure::Other,
    }
}

fn to_persistence_error(failure: Failure) -> PersistenceError {
    match failure {
        Failure::Server(DUPLICATE_KEY) => PersistenceError::conflict("duplicate key"),
        Failure::Server(DOCUMENT_VALIDATION_FAILURE) => {
            PersistenceError::validation("document failed validation")
        }
        Failure::Server(code) => PersistenceError::query(format!("server error code {code}")),
        Failure::Unreachable => PersistenceError::connection("MongoDB unreachable"),
        Failure::Other => PersistenceError::query("database error"),
    }
}

/// Map MongoDB driver errors onto the persistence taxonomy.
///
/// The driver message can echo document values, so it is only logged at
/// `debug`.
pub(crate) fn map_mongo_error(error: MongoError) -> PersistenceError {
    let failure = classify(&error);
    debug!(?failure, %error, "mongodb operation failed");
    to_persistence_error(failure)
}

/// Errors raised while establishing the connection are always connection
/// errors.
pub(crate) fn map_connect_error(error: MongoError) -> PersistenceError {
    debug!(%error, "mongodb connect failed");
    PersistenceError::connection(format!("MongoDB connect failed: {}", error.kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;

    #[rstest]
    #[case(Failure::Server(11000), PersistenceError::conflict("duplicate key"))]
    #[case(
        Failure::Server(121),
        PersistenceError::validation("document failed validation")
    )]
    #[case(Failure::Server(2), PersistenceError::query("server error code 2"))]
    #[case(Failure::Unreachable, PersistenceError::connection("MongoDB unreachable"))]
    #[case(Failure::Other, PersistenceError::query("database error"))]
    fn failures_map_to_taxonomy(#[case] failure: Failure, #[case] expected: PersistenceError) {
        assert_eq!(to_persistence_error(failure), expected);
    }

    #[rstest]
    fn io_errors_are_unreachable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error = MongoError::from(ErrorKind::Io(Arc::new(io)));

        assert_eq!(classify(&error), Failure::Unreachable);
        assert!(matches!(
            map_mongo_error(error),
            PersistenceError::Connection { .. }
        ));
    }
}
