//! Inventory-consistent rental lifecycle engine for a book lending service.
//!
//! The [`domain`] module owns copy counters, the rental lifecycle and late
//! fees behind driving and driven ports. [`outbound`] holds the storage
//! adapters: an in-memory pair for tests and embedded use, and the Diesel
//! PostgreSQL adapters for production. [`config`] loads lending settings.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
