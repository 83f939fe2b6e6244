//! In-memory `BookRepository`.
//!
//! Each book sits behind its own mutex, so counter updates on one title never
//! wait for another title.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;

use crate::domain::ports::{BookRepository, BookRepositoryError};
use crate::domain::{Book, BookId, CapacityAdjustment};

use super::{lock, read, write};

type BookCell = Arc<Mutex<Book>>;

/// Book counters kept in a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    books: RwLock<HashMap<BookId, BookCell>>,
}

impl InMemoryBookStore {
    /// Create a store seeded with `books`.
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let cells = books
            .into_iter()
            .map(|book| (book.id(), Arc::new(Mutex::new(book))))
            .collect();
        Self {
            books: RwLock::new(cells),
        }
    }

    fn cell(&self, book_id: &BookId) -> Option<BookCell> {
        read(&self.books).get(book_id).cloned()
    }

    /// Apply `step` under the book's lock and keep the result when it
    /// succeeds.
    fn swap(&self, book_id: &BookId, step: impl FnOnce(&Book) -> Option<Book>) -> Option<Book> {
        let cell = self.cell(book_id)?;
        let mut stored = lock(&cell);
        let next = step(&stored)?;
        *stored = next.clone();
        Some(next)
    }
}

#[async_trait]
impl BookRepository for InMemoryBookStore {
    async fn find_by_id(&self, book_id: &BookId) -> Result<Option<Book>, BookRepositoryError> {
        let Some(cell) = self.cell(book_id) else {
            return Ok(None);
        };
        let book = lock(&cell).clone();
        Ok(Some(book))
    }

    async fn insert(&self, book: &Book) -> Result<(), BookRepositoryError> {
        match write(&self.books).entry(book.id()) {
            Entry::Occupied(_) => Err(BookRepositoryError::query(format!(
                "book {} already exists",
                book.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(book.clone())));
                Ok(())
            }
        }
    }

    async fn reserve_copy(&self, book_id: &BookId) -> Result<Option<Book>, BookRepositoryError> {
        Ok(self.swap(book_id, Book::with_copy_reserved))
    }

    async fn release_copy(&self, book_id: &BookId) -> Result<Option<Book>, BookRepositoryError> {
        Ok(self.swap(book_id, Book::with_copy_released))
    }

    async fn resize(
        &self,
        book_id: &BookId,
        adjustment: &CapacityAdjustment,
    ) -> Result<Option<Book>, BookRepositoryError> {
        Ok(self.swap(book_id, |book| book.with_capacity(*adjustment).ok()))
    }
}
