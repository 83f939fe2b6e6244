//! Driving port for overdue reconciliation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{LendingError, RentalId};

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Active rentals examined that were due before the run's `now`.
    pub scanned: usize,
    /// Rentals this run moved to `Overdue`, in id order.
    pub newly_overdue: Vec<RentalId>,
    /// Rentals skipped because their writes kept conflicting.
    pub contended: Vec<RentalId>,
}

/// Driving port for reclassifying past-due rentals.
///
/// Intended for an external scheduler. Running it twice with the same `now`
/// reports nothing new the second time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OverdueReconciliation: Send + Sync {
    /// Move every `Active` rental due before `now` to `Overdue`.
    async fn reconcile(&self, now: DateTime<Utc>) -> Result<ReconcileReport, LendingError>;
}
