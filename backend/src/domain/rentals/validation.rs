//! Rental validation and conversion helpers.

use super::{Rental, RentalDraft, RentalStatus, RentalValidationError};

impl TryFrom<RentalDraft> for Rental {
    type Error = RentalValidationError;

    fn try_from(value: RentalDraft) -> Result<Self, Self::Error> {
        if value.due_date < value.rental_date {
            return Err(RentalValidationError::DueBeforeRentalDate {
                rental_date: value.rental_date,
                due_date: value.due_date,
            });
        }

        match (value.status, value.return_date) {
            (RentalStatus::Returned, None) => {
                return Err(RentalValidationError::ReturnedWithoutReturnDate);
            }
            (status @ (RentalStatus::Active | RentalStatus::Overdue), Some(_)) => {
                return Err(RentalValidationError::ReturnDateWithoutReturnedStatus { status });
            }
            _ => {}
        }

        Ok(Self {
            id: value.id,
            book_id: value.book_id,
            user_id: value.user_id,
            rental_date: value.rental_date,
            due_date: value.due_date,
            return_date: value.return_date,
            status: value.status,
            version: value.version,
        })
    }
}
