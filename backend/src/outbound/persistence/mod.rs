//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repository implementations translate between Diesel rows and domain types
//! and hold no lending rules. Every counter change and every rental write
//! after insert is a single guarded `UPDATE`, so two transactions racing on
//! one row serialize in PostgreSQL instead of in process memory.
//!
//! # Example
//!
//! ```ignore
//! use lending::outbound::persistence::{DbPool, DieselBookRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/lending")).await?;
//! let books = DieselBookRepository::new(pool);
//! ```

mod diesel_book_repository;
mod diesel_error_mapping;
mod diesel_rental_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_book_repository::DieselBookRepository;
pub use diesel_rental_repository::DieselRentalRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
