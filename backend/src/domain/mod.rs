//! Lending domain: inventory, rentals, fees and the services that drive them.
//!
//! Purpose: keep per-book copy counters and the rental lifecycle consistent
//! under concurrent access, and derive overdue state and late fees from that
//! lifecycle.
//!
//! Public surface:
//! - [`Book`] and [`Rental`] aggregates with pure transitions.
//! - [`fees`] for late fee arithmetic.
//! - [`InventoryLedger`], [`RentalCommandService`], [`OverdueReconciler`] and
//!   [`RentalQueryService`], which implement the driving ports in [`ports`].
//! - [`LendingError`], the closed failure set, and [`Error`], its
//!   transport-agnostic translation.

pub mod error;
pub mod fees;
pub mod ports;

mod book;
mod identifiers;
mod inventory_ledger;
mod lending_error;
mod overdue_reconciler;
mod policy;
mod rental_query_service;
mod rental_service;
mod rentals;
mod retry;

pub use self::book::{Book, BookValidationError, CapacityAdjustment};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::fees::{DailyRate, LateFee, RateError};
pub use self::identifiers::{BookId, RentalId, UserId};
pub use self::inventory_ledger::InventoryLedger;
pub use self::lending_error::LendingError;
pub use self::overdue_reconciler::{DEFAULT_RECONCILE_BATCH_SIZE, OverdueReconciler};
pub use self::policy::RentalPolicy;
pub use self::rental_query_service::RentalQueryService;
pub use self::rental_service::RentalCommandService;
pub use self::rentals::{
    ParseRentalStatusError, Rental, RentalDraft, RentalStatus, RentalTransitionError,
    RentalValidationError,
};
pub use self::retry::ConflictRetryPolicy;
