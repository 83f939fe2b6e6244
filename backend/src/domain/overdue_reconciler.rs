//! Overdue reconciliation.
//!
//! Scans `Active` rentals due before `now` in id-ordered batches and moves
//! each to `Overdue` with a versioned write. A rental returned or extended
//! between the scan and the write fails the version check, is re-read, and is
//! left alone when it no longer qualifies.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::ports::{OverdueReconciliation, ReconcileReport, RentalRepository};
use crate::domain::{ConflictRetryPolicy, LendingError, Rental, RentalId};

use super::rental_service::{load_rental, map_rental_error, write_versioned};
use super::retry::Attempt;

/// Default number of rentals read per reconciliation batch.
pub const DEFAULT_RECONCILE_BATCH_SIZE: usize = 100;

/// Reconciler implementing the overdue reconciliation driving port.
#[derive(Clone)]
pub struct OverdueReconciler<R> {
    rentals: Arc<R>,
    retry: ConflictRetryPolicy,
    batch_size: usize,
}

impl<R> OverdueReconciler<R> {
    /// Create a reconciler over the rental repository.
    pub fn new(rentals: Arc<R>) -> Self {
        Self {
            rentals,
            retry: ConflictRetryPolicy::default(),
            batch_size: DEFAULT_RECONCILE_BATCH_SIZE,
        }
    }

    /// Set the scan batch size. Zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Replace the conflict retry budget.
    #[must_use]
    pub fn with_retry(mut self, retry: ConflictRetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl<R> OverdueReconciler<R>
where
    R: RentalRepository,
{
    /// Move one listed rental to `Overdue`, re-reading after a lost race.
    ///
    /// Returns `None` when the rental no longer qualifies.
    async fn mark_overdue(
        &self,
        listed: Rental,
        now: DateTime<Utc>,
    ) -> Result<Option<Rental>, LendingError> {
        let rentals = self.rentals.as_ref();
        let rental_id = listed.id();
        let mut snapshot = Some(listed);
        self.retry
            .run("rental", move || {
                let cached = snapshot.take();
                async move {
                    let current = match cached {
                        Some(rental) => rental,
                        None => match load_rental(rentals, rental_id).await {
                            Ok(rental) => rental,
                            Err(LendingError::RentalNotFound { .. }) => {
                                return Ok(Attempt::Complete(None));
                            }
                            Err(other) => return Err(other),
                        },
                    };
                    let Some(next) = current.marked_overdue(now) else {
                        return Ok(Attempt::Complete(None));
                    };
                    Ok(match write_versioned(rentals, next, current.version()).await? {
                        Attempt::Complete(marked) => Attempt::Complete(Some(marked)),
                        Attempt::Conflicted => Attempt::Conflicted,
                    })
                }
            })
            .await
    }

    async fn reconcile_batch(
        &self,
        batch: Vec<Rental>,
        now: DateTime<Utc>,
        report: &mut ReconcileReport,
    ) -> Result<(), LendingError> {
        for rental in batch {
            let rental_id = rental.id();
            match self.mark_overdue(rental, now).await {
                Ok(Some(marked)) => {
                    debug!(%rental_id, due_date = %marked.due_date(), "rental marked overdue");
                    report.newly_overdue.push(rental_id);
                }
                Ok(None) => debug!(%rental_id, "rental no longer qualifies"),
                Err(LendingError::ConcurrentModification { attempts, .. }) => {
                    warn!(%rental_id, attempts, "rental kept changing; left for the next run");
                    report.contended.push(rental_id);
                }
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<R> OverdueReconciliation for OverdueReconciler<R>
where
    R: RentalRepository,
{
    async fn reconcile(&self, now: DateTime<Utc>) -> Result<ReconcileReport, LendingError> {
        let mut report = ReconcileReport::default();
        let mut after: Option<RentalId> = None;
        loop {
            let batch = self
                .rentals
                .list_active_due_before(now, after, self.batch_size)
                .await
                .map_err(map_rental_error)?;
            let Some(last) = batch.last() else {
                break;
            };
            after = Some(last.id());
            let last_batch = batch.len() < self.batch_size;
            report.scanned += batch.len();
            self.reconcile_batch(batch, now, &mut report).await?;
            if last_batch {
                break;
            }
        }
        info!(
            %now,
            scanned = report.scanned,
            newly_overdue = report.newly_overdue.len(),
            contended = report.contended.len(),
            "overdue reconciliation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "overdue_reconciler_tests.rs"]
mod tests;
