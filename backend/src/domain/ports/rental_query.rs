//! Driving port for rental reads.
//!
//! Reads never write. Overdue classification comes from the reconciler; the
//! report only reports what is stored.

use async_trait::async_trait;
use pagination::{Page, PageRequest};
use serde::Serialize;

use crate::domain::{LateFee, LendingError, RentalId, RentalStatus};

use super::rental_command::RentalPayload;

/// Request to fetch one rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetRentalRequest {
    pub rental_id: RentalId,
}

/// Response for a single rental lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetRentalResponse {
    pub rental: RentalPayload,
    pub accrued_fee: LateFee,
}

/// Request to page through rentals in one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRentalsRequest {
    pub status: RentalStatus,
    pub page: PageRequest,
}

/// One page of rentals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRentalsResponse {
    pub page: Page<RentalPayload>,
}

/// Request to page through the overdue report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverdueReportRequest {
    pub page: PageRequest,
}

/// An overdue rental with the fee it has accrued so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueRentalEntry {
    pub rental: RentalPayload,
    pub accrued_fee: LateFee,
}

/// One page of the overdue report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueReportResponse {
    pub page: Page<OverdueRentalEntry>,
}

/// Driving port for rental read operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RentalQuery: Send + Sync {
    /// Fetch one rental with the fee it has accrued at the current time.
    async fn get_rental(&self, request: GetRentalRequest)
    -> Result<GetRentalResponse, LendingError>;

    /// Page through rentals stored in `status`.
    async fn list_rentals(
        &self,
        request: ListRentalsRequest,
    ) -> Result<ListRentalsResponse, LendingError>;

    /// Page through rentals stored as `Overdue` with their accrued fees.
    async fn overdue_report(
        &self,
        request: OverdueReportRequest,
    ) -> Result<OverdueReportResponse, LendingError>;
}
