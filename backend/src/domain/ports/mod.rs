//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod book_repository;
mod inventory_command;
mod overdue_reconciliation;
mod payment_collector;
mod rental_command;
mod rental_query;
mod rental_repository;

#[cfg(test)]
pub use book_repository::MockBookRepository;
pub use book_repository::{BookRepository, BookRepositoryError, FixtureBookRepository};
#[cfg(test)]
pub use inventory_command::MockInventoryCommand;
pub use inventory_command::{
    AddBookRequest, AdjustCapacityRequest, BookPayload, BookResponse, InventoryCommand,
};
#[cfg(test)]
pub use overdue_reconciliation::MockOverdueReconciliation;
pub use overdue_reconciliation::{OverdueReconciliation, ReconcileReport};
#[cfg(test)]
pub use payment_collector::MockPaymentCollector;
pub use payment_collector::{
    FixturePaymentCollector, LateFeeCharge, PaymentCollector, PaymentCollectorError,
};
#[cfg(test)]
pub use rental_command::MockRentalCommand;
pub use rental_command::{
    ChargeOutcome, CreateRentalRequest, CreateRentalResponse, ExtendRentalRequest,
    ExtendRentalResponse, RentalCommand, RentalPayload, ReturnRentalRequest,
    ReturnRentalResponse,
};
#[cfg(test)]
pub use rental_query::MockRentalQuery;
pub use rental_query::{
    GetRentalRequest, GetRentalResponse, ListRentalsRequest, ListRentalsResponse,
    OverdueRentalEntry, OverdueReportRequest, OverdueReportResponse, RentalQuery,
};
#[cfg(test)]
pub use rental_repository::MockRentalRepository;
pub use rental_repository::{FixtureRentalRepository, RentalRepository, RentalRepositoryError};
