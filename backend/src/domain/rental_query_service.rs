//! Rental read services.
//!
//! These never write: overdue classification is the reconciler's job, and a
//! rental past due but not yet reconciled is listed under the status it is
//! stored with.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::{Cursor, Page, PageRequest};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{
    GetRentalRequest, GetRentalResponse, ListRentalsRequest, ListRentalsResponse,
    OverdueRentalEntry, OverdueReportRequest, OverdueReportResponse, RentalPayload, RentalQuery,
    RentalRepository,
};
use crate::domain::{LendingError, Rental, RentalId, RentalPolicy, RentalStatus, fees};

use super::rental_service::{load_rental, map_rental_error};

/// Keyset position encoded in rental page cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct RentalCursorKey {
    after: RentalId,
}

fn decode_after(page: &PageRequest) -> Result<Option<RentalId>, LendingError> {
    page.cursor()
        .map(|cursor| {
            cursor
                .decode::<RentalCursorKey>()
                .map(|key| key.after)
                .map_err(|err| LendingError::InvalidCursor {
                    reason: err.to_string(),
                })
        })
        .transpose()
}

/// Trim a `limit + 1` read to `limit` items and derive the next cursor.
fn into_page(mut rentals: Vec<Rental>, limit: usize) -> Result<Page<Rental>, LendingError> {
    if rentals.len() <= limit {
        return Ok(Page::new(rentals, None));
    }
    rentals.truncate(limit);
    let next_cursor = rentals
        .last()
        .map(|last| Cursor::encode(&RentalCursorKey { after: last.id() }))
        .transpose()
        .map_err(|err| LendingError::InvalidCursor {
            reason: err.to_string(),
        })?;
    Ok(Page::new(rentals, next_cursor))
}

/// Rental service implementing the rental query driving port.
#[derive(Clone)]
pub struct RentalQueryService<R> {
    rentals: Arc<R>,
    clock: Arc<dyn Clock>,
    policy: RentalPolicy,
}

impl<R> RentalQueryService<R> {
    /// Create a query service; accrued fees use `policy`'s daily rate.
    pub fn new(rentals: Arc<R>, clock: Arc<dyn Clock>, policy: RentalPolicy) -> Self {
        Self {
            rentals,
            clock,
            policy,
        }
    }
}

impl<R> RentalQueryService<R>
where
    R: RentalRepository,
{
    async fn page_by_status(
        &self,
        status: RentalStatus,
        page: &PageRequest,
    ) -> Result<Page<Rental>, LendingError> {
        let after = decode_after(page)?;
        let limit = page.limit();
        let rentals = self
            .rentals
            .list_by_status(status, after, limit.saturating_add(1))
            .await
            .map_err(map_rental_error)?;
        into_page(rentals, limit)
    }
}

#[async_trait]
impl<R> RentalQuery for RentalQueryService<R>
where
    R: RentalRepository,
{
    async fn get_rental(
        &self,
        request: GetRentalRequest,
    ) -> Result<GetRentalResponse, LendingError> {
        let rental = load_rental(self.rentals.as_ref(), request.rental_id).await?;
        let accrued_fee =
            fees::late_fee(&rental, self.clock.utc(), self.policy.late_fee_per_day());
        Ok(GetRentalResponse {
            rental: RentalPayload::from(rental),
            accrued_fee,
        })
    }

    async fn list_rentals(
        &self,
        request: ListRentalsRequest,
    ) -> Result<ListRentalsResponse, LendingError> {
        let page = self.page_by_status(request.status, &request.page).await?;
        Ok(ListRentalsResponse {
            page: page.map(RentalPayload::from),
        })
    }

    async fn overdue_report(
        &self,
        request: OverdueReportRequest,
    ) -> Result<OverdueReportResponse, LendingError> {
        let page = self
            .page_by_status(RentalStatus::Overdue, &request.page)
            .await?;
        let now = self.clock.utc();
        let rate = self.policy.late_fee_per_day();
        Ok(OverdueReportResponse {
            page: page.map(|rental| OverdueRentalEntry {
                accrued_fee: fees::late_fee(&rental, now, rate),
                rental: RentalPayload::from(rental),
            }),
        })
    }
}
