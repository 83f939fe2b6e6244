//! Diesel error mapping shared by the lending repositories.
//!
//! Serialization failures and deadlocks are reported as conflicts so the
//! domain retries them like a lost version check. Connection loss and pool
//! exhaustion become connection errors; everything else is a query error.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// SQLSTATE for `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

/// Constructors for a repository error enum.
pub(crate) struct ErrorConstructors<E> {
    pub connection: fn(String) -> E,
    pub query: fn(String) -> E,
    pub conflict: fn(String) -> E,
}

/// Map a pool failure onto the repository's connection variant.
pub(crate) fn map_pool_error<E>(error: PoolError, ctors: &ErrorConstructors<E>) -> E {
    (ctors.connection)(error.message().to_owned())
}

/// Map a Diesel failure onto the repository's error variants.
pub(crate) fn map_diesel_error<E>(error: DieselError, ctors: &ErrorConstructors<E>) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(%error, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, info) => {
            (ctors.conflict)(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::Unknown, info)
            if is_deadlock(info.as_ref()) =>
        {
            (ctors.conflict)(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            (ctors.connection)("database connection error".to_owned())
        }
        DieselError::DatabaseError(_, info) => (ctors.query)(info.message().to_owned()),
        DieselError::NotFound => (ctors.query)("record not found".to_owned()),
        other => (ctors.query)(other.to_string()),
    }
}

fn is_deadlock(info: &(dyn diesel::result::DatabaseErrorInformation + Send + Sync)) -> bool {
    info.message().contains("deadlock detected")
        || info
            .details()
            .is_some_and(|details| details.contains(DEADLOCK_DETECTED))
}
