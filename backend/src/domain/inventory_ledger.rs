//! Inventory ledger: the only writer of book copy counters.
//!
//! Each operation is one conditional update in the store. When the update
//! matches nothing the ledger reads the book once to tell a missing book from
//! an empty or full shelf.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::domain::ports::{
    AddBookRequest, AdjustCapacityRequest, BookPayload, BookRepository, BookRepositoryError,
    BookResponse, InventoryCommand,
};
use crate::domain::{Book, BookId, CapacityAdjustment, ConflictRetryPolicy, LendingError};

use super::retry::Attempt;

pub(crate) fn map_book_error(error: BookRepositoryError) -> LendingError {
    match error {
        BookRepositoryError::Connection { message } => LendingError::storage_unavailable(message),
        BookRepositoryError::Query { message } | BookRepositoryError::Conflict { message } => {
            LendingError::storage(message)
        }
    }
}

fn attempt_result<T>(
    result: Result<T, BookRepositoryError>,
) -> Result<Attempt<T>, LendingError> {
    match result {
        Ok(value) => Ok(Attempt::Complete(value)),
        Err(BookRepositoryError::Conflict { message }) => {
            debug!(%message, "book write conflicted");
            Ok(Attempt::Conflicted)
        }
        Err(other) => Err(map_book_error(other)),
    }
}

/// Per-book copy counter with atomic reserve, release and resize.
pub struct InventoryLedger<B> {
    books: Arc<B>,
    retry: ConflictRetryPolicy,
}

impl<B> Clone for InventoryLedger<B> {
    fn clone(&self) -> Self {
        Self {
            books: Arc::clone(&self.books),
            retry: self.retry,
        }
    }
}

impl<B> InventoryLedger<B> {
    /// Create a ledger over the book repository.
    pub fn new(books: Arc<B>, retry: ConflictRetryPolicy) -> Self {
        Self { books, retry }
    }
}

impl<B> InventoryLedger<B>
where
    B: BookRepository,
{
    /// Load a book or fail with [`LendingError::BookNotFound`].
    pub async fn book(&self, book_id: BookId) -> Result<Book, LendingError> {
        self.books
            .find_by_id(&book_id)
            .await
            .map_err(map_book_error)?
            .ok_or(LendingError::BookNotFound { book_id })
    }

    /// Take one copy off the shelf.
    ///
    /// Succeeds iff `available_copies > 0` at the moment of the update.
    pub async fn reserve(&self, book_id: BookId) -> Result<Book, LendingError> {
        let books = &self.books;
        let reserved = self
            .retry
            .run("book", move || async move {
                attempt_result(books.reserve_copy(&book_id).await)
            })
            .await?;
        if let Some(book) = reserved {
            debug!(%book_id, available = book.available_copies(), "copy reserved");
            return Ok(book);
        }
        self.book(book_id).await?;
        Err(LendingError::OutOfStock { book_id })
    }

    /// Put one copy back on the shelf.
    ///
    /// Succeeds iff `available_copies < total_copies` at the moment of the
    /// update. A miss on an existing book means the ledger and the rentals
    /// disagree, so it is logged as a defect before being returned.
    pub async fn release(&self, book_id: BookId) -> Result<Book, LendingError> {
        let books = &self.books;
        let released = self
            .retry
            .run("book", move || async move {
                attempt_result(books.release_copy(&book_id).await)
            })
            .await?;
        if let Some(book) = released {
            debug!(%book_id, available = book.available_copies(), "copy released");
            return Ok(book);
        }
        let book = self.book(book_id).await?;
        error!(
            %book_id,
            total = book.total_copies(),
            available = book.available_copies(),
            "release would exceed capacity"
        );
        Err(LendingError::CapacityExceeded { book_id })
    }

    /// Replace both counters without revoking a checked-out copy.
    pub async fn resize(
        &self,
        book_id: BookId,
        new_total: i64,
        new_available: i64,
    ) -> Result<Book, LendingError> {
        let adjustment = CapacityAdjustment::new(new_total, new_available)
            .map_err(|err| LendingError::invalid_capacity(book_id, &err))?;
        let books = &self.books;
        let resized = self
            .retry
            .run("book", move || async move {
                match attempt_result(books.resize(&book_id, &adjustment).await)? {
                    Attempt::Complete(Some(resized)) => Ok(Attempt::Complete(resized)),
                    Attempt::Complete(None) => {
                        classify_resize_miss(books.as_ref(), book_id, adjustment).await
                    }
                    Attempt::Conflicted => Ok(Attempt::Conflicted),
                }
            })
            .await?;
        info!(
            %book_id,
            total = resized.total_copies(),
            available = resized.available_copies(),
            "book capacity adjusted"
        );
        Ok(resized)
    }
}

/// Decide why a resize matched nothing.
///
/// A book that would now accept the adjustment changed between the update
/// and the read, so the attempt counts as a conflict.
async fn classify_resize_miss<B: BookRepository>(
    books: &B,
    book_id: BookId,
    adjustment: CapacityAdjustment,
) -> Result<Attempt<Book>, LendingError> {
    let book = books
        .find_by_id(&book_id)
        .await
        .map_err(map_book_error)?
        .ok_or(LendingError::BookNotFound { book_id })?;
    match book.with_capacity(adjustment) {
        Ok(_) => Ok(Attempt::Conflicted),
        Err(err) => Err(LendingError::invalid_capacity(book_id, &err)),
    }
}

#[async_trait]
impl<B> InventoryCommand for InventoryLedger<B>
where
    B: BookRepository,
{
    async fn add_book(&self, request: AddBookRequest) -> Result<BookResponse, LendingError> {
        let book = Book::from_counts(request.book_id, request.total_copies, request.total_copies)
            .map_err(|err| LendingError::invalid_capacity(request.book_id, &err))?;
        self.books.insert(&book).await.map_err(map_book_error)?;
        info!(book_id = %book.id(), total = book.total_copies(), "book added");
        Ok(BookResponse {
            book: BookPayload::from(&book),
        })
    }

    async fn adjust_capacity(
        &self,
        request: AdjustCapacityRequest,
    ) -> Result<BookResponse, LendingError> {
        let book = Self::resize(
            self,
            request.book_id,
            request.new_total,
            request.new_available,
        )
        .await?;
        Ok(BookResponse {
            book: BookPayload::from(&book),
        })
    }
}

#[cfg(test)]
#[path = "inventory_ledger_tests.rs"]
mod tests;
