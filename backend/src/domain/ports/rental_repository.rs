//! Port for rental persistence.
//!
//! Writes after the initial insert go through a version check so concurrent
//! return, extension and reconciliation on one rental serialize on the store.
//! Listings are keyset-paginated on the rental id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Rental, RentalId, RentalStatus};

use super::define_port_error;

define_port_error! {
    /// Errors raised by rental repository adapters.
    pub enum RentalRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "rental repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "rental repository query failed: {message}",
        /// The store aborted the write because of a concurrent transaction.
        Conflict { message: String } =>
            "rental repository write conflicted: {message}",
    }
}

/// Port for storing rentals and scanning them by lifecycle state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RentalRepository: Send + Sync {
    /// Find a rental by id.
    async fn find_by_id(
        &self,
        rental_id: &RentalId,
    ) -> Result<Option<Rental>, RentalRepositoryError>;

    /// Persist a new rental.
    async fn insert(&self, rental: &Rental) -> Result<(), RentalRepositoryError>;

    /// Overwrite a stored rental when its stored version equals
    /// `expected_version`.
    ///
    /// Returns `false` when the rental is missing or another writer moved it
    /// on; nothing is written in that case.
    async fn update_if_version(
        &self,
        rental: &Rental,
        expected_version: u64,
    ) -> Result<bool, RentalRepositoryError>;

    /// Up to `limit` rentals in `status`, ordered by id, strictly after
    /// `after` when given.
    async fn list_by_status(
        &self,
        status: RentalStatus,
        after: Option<RentalId>,
        limit: usize,
    ) -> Result<Vec<Rental>, RentalRepositoryError>;

    /// Up to `limit` `Active` rentals due strictly before `now`, ordered by
    /// id, strictly after `after` when given.
    async fn list_active_due_before(
        &self,
        now: DateTime<Utc>,
        after: Option<RentalId>,
        limit: usize,
    ) -> Result<Vec<Rental>, RentalRepositoryError>;
}

/// Fixture implementation for tests that do not exercise rental storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureRentalRepository;

#[async_trait]
impl RentalRepository for FixtureRentalRepository {
    async fn find_by_id(
        &self,
        _rental_id: &RentalId,
    ) -> Result<Option<Rental>, RentalRepositoryError> {
        Ok(None)
    }

    async fn insert(&self, _rental: &Rental) -> Result<(), RentalRepositoryError> {
        Ok(())
    }

    async fn update_if_version(
        &self,
        _rental: &Rental,
        _expected_version: u64,
    ) -> Result<bool, RentalRepositoryError> {
        Ok(false)
    }

    async fn list_by_status(
        &self,
        _status: RentalStatus,
        _after: Option<RentalId>,
        _limit: usize,
    ) -> Result<Vec<Rental>, RentalRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_active_due_before(
        &self,
        _now: DateTime<Utc>,
        _after: Option<RentalId>,
        _limit: usize,
    ) -> Result<Vec<Rental>, RentalRepositoryError> {
        Ok(Vec::new())
    }
}
