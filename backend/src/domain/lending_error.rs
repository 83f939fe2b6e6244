//! Closed error set returned by the lending services.
//!
//! Every failure a caller can observe is one of these variants. Adapter
//! errors are folded into the two storage kinds before they leave the domain,
//! and [`crate::domain::Error`] is the only translation towards transports.

use thiserror::Error;

use super::{
    BookId, BookValidationError, RentalId, RentalStatus, RentalTransitionError,
    RentalValidationError,
};

/// Failure raised by inventory and rental lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LendingError {
    /// No book exists with the given id.
    #[error("book {book_id} not found")]
    BookNotFound { book_id: BookId },
    /// No rental exists with the given id.
    #[error("rental {rental_id} not found")]
    RentalNotFound { rental_id: RentalId },
    /// Every copy of the book is checked out.
    #[error("book {book_id} has no available copies")]
    OutOfStock { book_id: BookId },
    /// A release would push available copies above the total.
    #[error("book {book_id} already has every copy available")]
    CapacityExceeded { book_id: BookId },
    /// The rental is already returned.
    #[error("rental {rental_id} is {status}")]
    RentalNotActive {
        rental_id: RentalId,
        status: RentalStatus,
    },
    /// The requested extension is outside `1..=max_days`.
    #[error("extension of {days} days is outside 1..={max_days}")]
    InvalidExtension { days: i64, max_days: u32 },
    /// A capacity change was rejected.
    #[error("invalid capacity for book {book_id}: {reason}")]
    InvalidCapacity { book_id: BookId, reason: String },
    /// The due date precedes the rental date.
    #[error("invalid rental period: {reason}")]
    InvalidRentalPeriod { reason: String },
    /// A pagination cursor could not be decoded.
    #[error("invalid page cursor: {reason}")]
    InvalidCursor { reason: String },
    /// Optimistic concurrency retries ran out.
    #[error("{resource} kept changing concurrently after {attempts} attempts")]
    ConcurrentModification { resource: String, attempts: u32 },
    /// The backing store could not be reached.
    #[error("storage unavailable: {message}")]
    StorageUnavailable { message: String },
    /// The backing store rejected or failed a query.
    #[error("storage failure: {message}")]
    Storage { message: String },
}

impl LendingError {
    /// Shorthand for [`LendingError::InvalidExtension`].
    pub fn invalid_extension(days: i64, max_days: u32) -> Self {
        Self::InvalidExtension { days, max_days }
    }

    /// Shorthand for [`LendingError::InvalidCapacity`].
    pub fn invalid_capacity(book_id: BookId, error: &BookValidationError) -> Self {
        Self::InvalidCapacity {
            book_id,
            reason: error.to_string(),
        }
    }

    /// Shorthand for [`LendingError::ConcurrentModification`].
    pub fn concurrent_modification(resource: impl Into<String>, attempts: u32) -> Self {
        Self::ConcurrentModification {
            resource: resource.into(),
            attempts,
        }
    }

    /// Shorthand for [`LendingError::StorageUnavailable`].
    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    /// Shorthand for [`LendingError::Storage`].
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

impl From<RentalTransitionError> for LendingError {
    fn from(value: RentalTransitionError) -> Self {
        match value {
            RentalTransitionError::NotActive { rental_id, status } => {
                Self::RentalNotActive { rental_id, status }
            }
            RentalTransitionError::DueDateOutOfRange { rental_id } => Self::InvalidRentalPeriod {
                reason: format!("extended due date for rental {rental_id} is out of range"),
            },
        }
    }
}

impl From<RentalValidationError> for LendingError {
    fn from(value: RentalValidationError) -> Self {
        Self::InvalidRentalPeriod {
            reason: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Message and conversion coverage.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn not_active_transition_maps_to_rental_not_active() {
        let rental_id = RentalId::random();
        let err = LendingError::from(RentalTransitionError::NotActive {
            rental_id,
            status: RentalStatus::Returned,
        });
        assert_eq!(
            err,
            LendingError::RentalNotActive {
                rental_id,
                status: RentalStatus::Returned,
            }
        );
    }

    #[rstest]
    fn out_of_range_due_date_maps_to_invalid_period() {
        let err = LendingError::from(RentalTransitionError::DueDateOutOfRange {
            rental_id: RentalId::random(),
        });
        assert!(matches!(err, LendingError::InvalidRentalPeriod { .. }));
    }

    #[rstest]
    fn messages_carry_identifiers() {
        let book_id = BookId::random();
        let err = LendingError::OutOfStock { book_id };
        assert!(err.to_string().contains(&book_id.to_string()));
    }
}
