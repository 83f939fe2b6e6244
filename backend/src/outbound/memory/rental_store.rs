//! In-memory `RentalRepository`.
//!
//! Rentals live in a map ordered by id, so keyset listings are range scans.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::ops::Bound;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{RentalRepository, RentalRepositoryError};
use crate::domain::{Rental, RentalId, RentalStatus};

use super::lock;

/// Rentals kept in a process-local ordered map.
#[derive(Debug, Default)]
pub struct InMemoryRentalStore {
    rentals: Mutex<BTreeMap<RentalId, Rental>>,
}

impl InMemoryRentalStore {
    /// Number of stored rentals in `status`.
    pub fn count_by_status(&self, status: RentalStatus) -> usize {
        lock(&self.rentals)
            .values()
            .filter(|rental| rental.status() == status)
            .count()
    }

    fn scan(
        &self,
        after: Option<RentalId>,
        limit: usize,
        keep: impl Fn(&Rental) -> bool,
    ) -> Vec<Rental> {
        let lower = after.map_or(Bound::Unbounded, Bound::Excluded);
        lock(&self.rentals)
            .range((lower, Bound::Unbounded))
            .map(|(_, rental)| rental)
            .filter(|rental| keep(rental))
            .take(limit)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RentalRepository for InMemoryRentalStore {
    async fn find_by_id(
        &self,
        rental_id: &RentalId,
    ) -> Result<Option<Rental>, RentalRepositoryError> {
        Ok(lock(&self.rentals).get(rental_id).cloned())
    }

    async fn insert(&self, rental: &Rental) -> Result<(), RentalRepositoryError> {
        match lock(&self.rentals).entry(rental.id()) {
            Entry::Occupied(_) => Err(RentalRepositoryError::query(format!(
                "rental {} already exists",
                rental.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(rental.clone());
                Ok(())
            }
        }
    }

    async fn update_if_version(
        &self,
        rental: &Rental,
        expected_version: u64,
    ) -> Result<bool, RentalRepositoryError> {
        let mut rentals = lock(&self.rentals);
        match rentals.get_mut(&rental.id()) {
            Some(stored) if stored.version() == expected_version => {
                *stored = rental.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_status(
        &self,
        status: RentalStatus,
        after: Option<RentalId>,
        limit: usize,
    ) -> Result<Vec<Rental>, RentalRepositoryError> {
        Ok(self.scan(after, limit, |rental| rental.status() == status))
    }

    async fn list_active_due_before(
        &self,
        now: DateTime<Utc>,
        after: Option<RentalId>,
        limit: usize,
    ) -> Result<Vec<Rental>, RentalRepositoryError> {
        Ok(self.scan(after, limit, |rental| {
            rental.status() == RentalStatus::Active && rental.due_date() < now
        }))
    }
}
