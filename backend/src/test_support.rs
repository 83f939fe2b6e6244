//! Test utilities for the lending crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`), which
//! reach them through the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{LateFeeCharge, PaymentCollector, PaymentCollectorError};
use crate::domain::{
    ConflictRetryPolicy, InventoryLedger, OverdueReconciler, RentalCommandService, RentalPolicy,
    RentalQueryService,
};
use crate::outbound::memory::{InMemoryBookStore, InMemoryRentalStore};

/// Clock whose time only moves when a test moves it.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Jump to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    /// Move forward by whole days.
    pub fn advance_days(&self, days: i64) {
        *self.lock_clock() += TimeDelta::days(days);
    }

    /// Move forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Payment collector that records charges and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingPaymentCollector {
    charges: Mutex<Vec<LateFeeCharge>>,
    failure: Mutex<Option<String>>,
}

impl RecordingPaymentCollector {
    /// Reject every later charge with `message`.
    pub fn fail_with(&self, message: impl Into<String>) {
        *lock(&self.failure) = Some(message.into());
    }

    /// Charges accepted so far.
    pub fn charges(&self) -> Vec<LateFeeCharge> {
        lock(&self.charges).clone()
    }
}

#[async_trait]
impl PaymentCollector for RecordingPaymentCollector {
    async fn charge(&self, charge: &LateFeeCharge) -> Result<(), PaymentCollectorError> {
        if let Some(message) = lock(&self.failure).clone() {
            return Err(PaymentCollectorError::unavailable(message));
        }
        lock(&self.charges).push(charge.clone());
        Ok(())
    }
}

/// Rental commands over the in-memory stores.
pub type InMemoryCommands =
    RentalCommandService<InMemoryBookStore, InMemoryRentalStore, RecordingPaymentCollector>;

/// Every lending service wired to the in-memory stores and one clock.
#[derive(Clone)]
pub struct InMemoryLending {
    /// Clock shared by every service.
    pub clock: Arc<MutableClock>,
    /// Book counters.
    pub books: Arc<InMemoryBookStore>,
    /// Stored rentals.
    pub rentals: Arc<InMemoryRentalStore>,
    /// Late fee charges submitted on return.
    pub payments: Arc<RecordingPaymentCollector>,
    /// Inventory commands.
    pub inventory: Arc<InventoryLedger<InMemoryBookStore>>,
    /// Rental lifecycle commands.
    pub commands: Arc<InMemoryCommands>,
    /// Rental reads.
    pub queries: Arc<RentalQueryService<InMemoryRentalStore>>,
    /// Overdue reconciliation.
    pub reconciler: Arc<OverdueReconciler<InMemoryRentalStore>>,
}

impl InMemoryLending {
    /// Wire the services starting at `now`.
    pub fn new(now: DateTime<Utc>, policy: RentalPolicy, retry: ConflictRetryPolicy) -> Self {
        let clock = Arc::new(MutableClock::new(now));
        let books = Arc::new(InMemoryBookStore::default());
        let rentals = Arc::new(InMemoryRentalStore::default());
        let payments = Arc::new(RecordingPaymentCollector::default());
        let ledger = InventoryLedger::new(Arc::clone(&books), retry);
        let commands = RentalCommandService::new(
            ledger.clone(),
            Arc::clone(&rentals),
            Arc::clone(&payments),
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .with_policy(policy)
        .with_retry(retry);
        let queries = RentalQueryService::new(
            Arc::clone(&rentals),
            Arc::clone(&clock) as Arc<dyn Clock>,
            policy,
        );
        let reconciler = OverdueReconciler::new(Arc::clone(&rentals)).with_retry(retry);
        Self {
            clock,
            books,
            rentals,
            payments,
            inventory: Arc::new(ledger),
            commands: Arc::new(commands),
            queries: Arc::new(queries),
            reconciler: Arc::new(reconciler),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
