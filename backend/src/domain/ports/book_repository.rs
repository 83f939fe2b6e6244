//! Port for book inventory persistence.
//!
//! The counter primitives are conditional: each applies its change in one
//! atomic step only when the guard holds, and reports a miss as `None`
//! without saying why. The inventory ledger classifies misses.

use async_trait::async_trait;

use crate::domain::{Book, BookId, CapacityAdjustment};

use super::define_port_error;

define_port_error! {
    /// Errors raised by book repository adapters.
    pub enum BookRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "book repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "book repository query failed: {message}",
        /// The store aborted the write because of a concurrent transaction.
        Conflict { message: String } =>
            "book repository write conflicted: {message}",
    }
}

/// Port for reading books and mutating their copy counters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Find a book by id.
    async fn find_by_id(&self, book_id: &BookId) -> Result<Option<Book>, BookRepositoryError>;

    /// Persist a new book.
    async fn insert(&self, book: &Book) -> Result<(), BookRepositoryError>;

    /// Decrement `available_copies` by one when it is positive.
    ///
    /// Returns the updated book, or `None` when the book is missing or has no
    /// copy left.
    async fn reserve_copy(&self, book_id: &BookId) -> Result<Option<Book>, BookRepositoryError>;

    /// Increment `available_copies` by one when it is below the total.
    ///
    /// Returns the updated book, or `None` when the book is missing or every
    /// copy is already available.
    async fn release_copy(&self, book_id: &BookId) -> Result<Option<Book>, BookRepositoryError>;

    /// Replace both counters when no checked-out copy would be revoked.
    ///
    /// Returns the updated book, or `None` when the book is missing or
    /// `total - available` exceeds the copies the adjustment leaves for open
    /// rentals.
    async fn resize(
        &self,
        book_id: &BookId,
        adjustment: &CapacityAdjustment,
    ) -> Result<Option<Book>, BookRepositoryError>;
}

/// Fixture implementation for tests that do not exercise inventory.
///
/// Reports every book as missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBookRepository;

#[async_trait]
impl BookRepository for FixtureBookRepository {
    async fn find_by_id(&self, _book_id: &BookId) -> Result<Option<Book>, BookRepositoryError> {
        Ok(None)
    }

    async fn insert(&self, _book: &Book) -> Result<(), BookRepositoryError> {
        Ok(())
    }

    async fn reserve_copy(&self, _book_id: &BookId) -> Result<Option<Book>, BookRepositoryError> {
        Ok(None)
    }

    async fn release_copy(&self, _book_id: &BookId) -> Result<Option<Book>, BookRepositoryError> {
        Ok(None)
    }

    async fn resize(
        &self,
        _book_id: &BookId,
        _adjustment: &CapacityAdjustment,
    ) -> Result<Option<Book>, BookRepositoryError> {
        Ok(None)
    }
}
