//! Rental lifecycle commands.
//!
//! Every state change on an existing rental is computed from a fresh read and
//! written with the version that read returned. A losing writer re-reads and
//! tries again under the conflict retry policy, so a return racing an
//! extension or a reconciliation sees the other's result instead of
//! overwriting it.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{error, info, warn};

use crate::domain::ports::{
    BookRepository, ChargeOutcome, CreateRentalRequest, CreateRentalResponse, ExtendRentalRequest,
    ExtendRentalResponse, LateFeeCharge, PaymentCollector, RentalCommand, RentalPayload,
    RentalRepository, RentalRepositoryError, ReturnRentalRequest, ReturnRentalResponse,
};
use crate::domain::{
    ConflictRetryPolicy, InventoryLedger, LateFee, LendingError, Rental, RentalId, RentalPolicy,
    fees,
};

use super::retry::Attempt;

pub(crate) fn map_rental_error(error: RentalRepositoryError) -> LendingError {
    match error {
        RentalRepositoryError::Connection { message } => {
            LendingError::storage_unavailable(message)
        }
        RentalRepositoryError::Query { message } | RentalRepositoryError::Conflict { message } => {
            LendingError::storage(message)
        }
    }
}

pub(crate) async fn load_rental<R: RentalRepository + ?Sized>(
    rentals: &R,
    rental_id: RentalId,
) -> Result<Rental, LendingError> {
    rentals
        .find_by_id(&rental_id)
        .await
        .map_err(map_rental_error)?
        .ok_or(LendingError::RentalNotFound { rental_id })
}

/// Write `next` if the stored rental is still at `expected_version`.
pub(crate) async fn write_versioned<R: RentalRepository + ?Sized>(
    rentals: &R,
    next: Rental,
    expected_version: u64,
) -> Result<Attempt<Rental>, LendingError> {
    match rentals.update_if_version(&next, expected_version).await {
        Ok(true) => Ok(Attempt::Complete(next)),
        Ok(false) | Err(RentalRepositoryError::Conflict { .. }) => Ok(Attempt::Conflicted),
        Err(other) => Err(map_rental_error(other)),
    }
}

/// Rental service implementing the rental command driving port.
#[derive(Clone)]
pub struct RentalCommandService<B, R, P> {
    ledger: InventoryLedger<B>,
    rentals: Arc<R>,
    payments: Arc<P>,
    clock: Arc<dyn Clock>,
    policy: RentalPolicy,
    retry: ConflictRetryPolicy,
}

impl<B, R, P> RentalCommandService<B, R, P> {
    /// Create a command service with default policy and retry budget.
    ///
    /// # Examples
    /// ```
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// # use lending::domain::{ConflictRetryPolicy, InventoryLedger, RentalCommandService};
    /// # use lending::outbound::memory::{InMemoryBookStore, InMemoryRentalStore};
    /// # use lending::domain::ports::FixturePaymentCollector;
    /// let ledger = InventoryLedger::new(
    ///     Arc::new(InMemoryBookStore::default()),
    ///     ConflictRetryPolicy::default(),
    /// );
    /// let _service = RentalCommandService::new(
    ///     ledger,
    ///     Arc::new(InMemoryRentalStore::default()),
    ///     Arc::new(FixturePaymentCollector),
    ///     Arc::new(DefaultClock),
    /// );
    /// ```
    pub fn new(
        ledger: InventoryLedger<B>,
        rentals: Arc<R>,
        payments: Arc<P>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            rentals,
            payments,
            clock,
            policy: RentalPolicy::default(),
            retry: ConflictRetryPolicy::default(),
        }
    }

    /// Replace the lending policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RentalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the conflict retry budget for rental writes.
    #[must_use]
    pub fn with_retry(mut self, retry: ConflictRetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl<B, R, P> RentalCommandService<B, R, P>
where
    B: BookRepository,
    R: RentalRepository,
    P: PaymentCollector,
{
    async fn release_after_failed_insert(&self, rental: &Rental, cause: &LendingError) {
        let book_id = rental.book_id();
        match self.ledger.release(book_id).await {
            Ok(_) => warn!(
                %book_id,
                rental_id = %rental.id(),
                %cause,
                "rental insert failed; reserved copy released"
            ),
            Err(release_error) => error!(
                %book_id,
                rental_id = %rental.id(),
                %cause,
                %release_error,
                "rental insert failed and the reserved copy could not be released"
            ),
        }
    }

    /// Reopen a rental whose returned copy could not be released.
    async fn undo_return(&self, before: &Rental, returned: &Rental, cause: &LendingError) {
        let rental_id = returned.id();
        let reopened = returned.return_undone(before);
        match write_versioned(self.rentals.as_ref(), reopened, returned.version()).await {
            Ok(Attempt::Complete(_)) => warn!(
                %rental_id,
                book_id = %returned.book_id(),
                %cause,
                "copy release failed; return undone"
            ),
            Ok(Attempt::Conflicted) => error!(
                %rental_id,
                %cause,
                "copy release failed and the returned rental changed before it could be reopened"
            ),
            Err(undo_error) => error!(
                %rental_id,
                %cause,
                %undo_error,
                "copy release failed and the return could not be undone"
            ),
        }
    }

    async fn settle_fee(&self, rental: &Rental, fee: LateFee) -> ChargeOutcome {
        if !fee.is_chargeable() {
            return ChargeOutcome::NotRequired;
        }
        let charge = LateFeeCharge {
            rental_id: rental.id(),
            user_id: rental.user_id(),
            late_days: fee.late_days(),
            amount: fee.amount(),
        };
        match self.payments.charge(&charge).await {
            Ok(()) => {
                info!(
                    rental_id = %rental.id(),
                    late_days = fee.late_days(),
                    amount = %fee.amount(),
                    "late fee submitted"
                );
                ChargeOutcome::Submitted
            }
            Err(err) => {
                warn!(rental_id = %rental.id(), error = %err, "late fee charge failed");
                ChargeOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl<B, R, P> RentalCommand for RentalCommandService<B, R, P>
where
    B: BookRepository,
    R: RentalRepository,
    P: PaymentCollector,
{
    async fn create_rental(
        &self,
        request: CreateRentalRequest,
    ) -> Result<CreateRentalResponse, LendingError> {
        let rental_date = request.rental_date.unwrap_or_else(|| self.clock.utc());
        let due_date = match request.due_date {
            Some(due_date) => due_date,
            None => rental_date
                .checked_add_signed(self.policy.default_rental_period())
                .ok_or_else(|| LendingError::InvalidRentalPeriod {
                    reason: "default due date is out of range".to_owned(),
                })?,
        };
        let rental = Rental::open(
            RentalId::random(),
            request.book_id,
            request.user_id,
            rental_date,
            due_date,
        )?;

        let book = self.ledger.reserve(request.book_id).await?;

        if let Err(err) = self.rentals.insert(&rental).await {
            let cause = map_rental_error(err);
            self.release_after_failed_insert(&rental, &cause).await;
            return Err(cause);
        }

        info!(
            rental_id = %rental.id(),
            book_id = %rental.book_id(),
            due_date = %rental.due_date(),
            "rental created"
        );
        Ok(CreateRentalResponse {
            rental: RentalPayload::from(&rental),
            available_copies: book.available_copies(),
        })
    }

    async fn return_rental(
        &self,
        request: ReturnRentalRequest,
    ) -> Result<ReturnRentalResponse, LendingError> {
        let rental_id = request.rental_id;
        let rentals = self.rentals.as_ref();
        let clock = &self.clock;
        let (before, returned) = self
            .retry
            .run("rental", move || async move {
                let current = load_rental(rentals, rental_id).await?;
                let next = current.returned_at(clock.utc())?;
                Ok(match write_versioned(rentals, next, current.version()).await? {
                    Attempt::Complete(returned) => Attempt::Complete((current, returned)),
                    Attempt::Conflicted => Attempt::Conflicted,
                })
            })
            .await?;

        match self.ledger.release(returned.book_id()).await {
            Ok(_) => {}
            // The shelf is already full, so the copy is back; keep the return.
            Err(err @ LendingError::CapacityExceeded { .. }) => return Err(err),
            Err(err) => {
                self.undo_return(&before, &returned, &err).await;
                return Err(err);
            }
        }

        let fee = fees::late_fee(&returned, self.clock.utc(), self.policy.late_fee_per_day());
        info!(
            %rental_id,
            book_id = %returned.book_id(),
            late_days = fee.late_days(),
            "rental returned"
        );
        let charge = self.settle_fee(&returned, fee).await;
        Ok(ReturnRentalResponse {
            rental: RentalPayload::from(&returned),
            late_fee: fee,
            charge,
        })
    }

    async fn extend_rental(
        &self,
        request: ExtendRentalRequest,
    ) -> Result<ExtendRentalResponse, LendingError> {
        let extension = self.policy.extension(request.days)?;
        let rental_id = request.rental_id;
        let rentals = self.rentals.as_ref();
        let clock = &self.clock;
        let extended = self
            .retry
            .run("rental", move || async move {
                let current = load_rental(rentals, rental_id).await?;
                let next = current.extended_by(extension, clock.utc())?;
                write_versioned(rentals, next, current.version()).await
            })
            .await?;

        info!(
            %rental_id,
            days = request.days,
            due_date = %extended.due_date(),
            status = %extended.status(),
            "rental extended"
        );
        Ok(ExtendRentalResponse {
            rental: RentalPayload::from(&extended),
        })
    }
}

#[cfg(test)]
#[path = "rental_service_tests.rs"]
mod tests;
