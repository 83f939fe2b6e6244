//! Rental aggregate and lifecycle states.
//!
//! A rental records one borrowed copy. Transitions are pure: each returns the
//! next state with its version bumped, and persistence adapters accept the
//! write only when the stored version still matches. That version check is
//! what serializes return, extension and overdue reconciliation on the same
//! rental.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RentalId;

mod rental;
#[cfg(test)]
mod tests;
mod validation;

pub use rental::{Rental, RentalDraft};

/// Lifecycle state of a rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    /// The copy is checked out and not yet due.
    Active,
    /// The copy came back; terminal.
    Returned,
    /// The copy is checked out past its due date.
    Overdue,
}

impl RentalStatus {
    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Returned => "returned",
            Self::Overdue => "overdue",
        }
    }

    /// Whether a rental in this state still holds a reserved copy.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::Overdue)
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when stored status text is not a known state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRentalStatusError(String);

impl fmt::Display for ParseRentalStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown rental status: {}", self.0)
    }
}

impl std::error::Error for ParseRentalStatusError {}

impl FromStr for RentalStatus {
    type Err = ParseRentalStatusError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "active" => Ok(Self::Active),
            "returned" => Ok(Self::Returned),
            "overdue" => Ok(Self::Overdue),
            other => Err(ParseRentalStatusError(other.to_owned())),
        }
    }
}

/// Validation errors raised by rental constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RentalValidationError {
    DueBeforeRentalDate {
        rental_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    },
    ReturnDateWithoutReturnedStatus {
        status: RentalStatus,
    },
    ReturnedWithoutReturnDate,
}

impl fmt::Display for RentalValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DueBeforeRentalDate {
                rental_date,
                due_date,
            } => write!(
                f,
                "rental due date {due_date} must not precede rental date {rental_date}"
            ),
            Self::ReturnDateWithoutReturnedStatus { status } => {
                write!(f, "a {status} rental must not carry a return date")
            }
            Self::ReturnedWithoutReturnDate => {
                write!(f, "a returned rental must carry a return date")
            }
        }
    }
}

impl std::error::Error for RentalValidationError {}

/// Errors raised by lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RentalTransitionError {
    /// The rental is no longer open.
    NotActive {
        rental_id: RentalId,
        status: RentalStatus,
    },
    /// The extended due date is not representable.
    DueDateOutOfRange { rental_id: RentalId },
}

impl fmt::Display for RentalTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotActive { rental_id, status } => {
                write!(f, "rental {rental_id} is {status}")
            }
            Self::DueDateOutOfRange { rental_id } => {
                write!(f, "extended due date for rental {rental_id} is out of range")
            }
        }
    }
}

impl std::error::Error for RentalTransitionError {}
