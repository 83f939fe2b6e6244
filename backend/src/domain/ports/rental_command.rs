//! Driving port for rental lifecycle mutations.
//!
//! Create reserves a copy before the rental exists, return releases it and
//! settles the late fee, extend moves the due date without touching
//! inventory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BookId, LateFee, LendingError, Rental, RentalId, RentalStatus, UserId};

/// Serializable rental payload for driving ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalPayload {
    pub id: RentalId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub rental_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: RentalStatus,
    pub version: u64,
}

impl From<&Rental> for RentalPayload {
    fn from(value: &Rental) -> Self {
        Self {
            id: value.id(),
            book_id: value.book_id(),
            user_id: value.user_id(),
            rental_date: value.rental_date(),
            due_date: value.due_date(),
            return_date: value.return_date(),
            status: value.status(),
            version: value.version(),
        }
    }
}

impl From<Rental> for RentalPayload {
    fn from(value: Rental) -> Self {
        Self::from(&value)
    }
}

/// Request to open a rental.
///
/// `rental_date` defaults to now and `due_date` to the rental date plus the
/// policy's default loan length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentalRequest {
    pub book_id: BookId,
    pub user_id: UserId,
    #[serde(default)]
    pub rental_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Response from opening a rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentalResponse {
    pub rental: RentalPayload,
    pub available_copies: u32,
}

/// Request to close a rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRentalRequest {
    pub rental_id: RentalId,
}

/// What happened to the late fee after a return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ChargeOutcome {
    /// The rental came back on time or the rate is zero.
    NotRequired,
    /// The collector accepted the charge.
    Submitted,
    /// The collector failed; the return itself still stands.
    Failed { reason: String },
}

/// Response from closing a rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRentalResponse {
    pub rental: RentalPayload,
    pub late_fee: LateFee,
    pub charge: ChargeOutcome,
}

/// Request to push a due date forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendRentalRequest {
    pub rental_id: RentalId,
    pub days: i64,
}

/// Response from extending a rental.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendRentalResponse {
    pub rental: RentalPayload,
}

/// Driving port for rental write operations.
///
/// # Examples
///
/// ```rust,no_run
/// # use lending::domain::{BookId, UserId};
/// # use lending::domain::ports::{CreateRentalRequest, RentalCommand};
/// # async fn example(command: &dyn RentalCommand) -> Result<(), lending::domain::LendingError> {
/// let response = command
///     .create_rental(CreateRentalRequest {
///         book_id: BookId::random(),
///         user_id: UserId::random(),
///         rental_date: None,
///         due_date: None,
///     })
///     .await?;
/// assert!(response.rental.return_date.is_none());
/// # Ok(())
/// # }
/// ```
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RentalCommand: Send + Sync {
    /// Reserve a copy and open an `Active` rental.
    ///
    /// Fails with `InvalidRentalPeriod` before reserving when the due date
    /// precedes the rental date; reserve failures (`OutOfStock`,
    /// `BookNotFound`) propagate unchanged and nothing is created.
    async fn create_rental(
        &self,
        request: CreateRentalRequest,
    ) -> Result<CreateRentalResponse, LendingError>;

    /// Close an `Active` or `Overdue` rental, release its copy and charge any
    /// late fee.
    async fn return_rental(
        &self,
        request: ReturnRentalRequest,
    ) -> Result<ReturnRentalResponse, LendingError>;

    /// Push the due date of an open rental forward by `days`.
    async fn extend_rental(
        &self,
        request: ExtendRentalRequest,
    ) -> Result<ExtendRentalResponse, LendingError>;
}
