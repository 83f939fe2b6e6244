//! PostgreSQL-backed `BookRepository`.
//!
//! Each counter primitive is one `UPDATE ... WHERE <guard> RETURNING`, so the
//! check and the write happen under the row lock PostgreSQL takes for the
//! update. Zero rows back means the guard failed or the book is missing.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{BookRepository, BookRepositoryError};
use crate::domain::{Book, BookId, CapacityAdjustment};

use super::diesel_error_mapping::{ErrorConstructors, map_diesel_error, map_pool_error};
use super::models::BookRow;
use super::pool::{DbPool, PoolError};
use super::schema::books;

const ERRORS: ErrorConstructors<BookRepositoryError> = ErrorConstructors {
    connection: |message| BookRepositoryError::connection(message),
    query: |message| BookRepositoryError::query(message),
    conflict: |message| BookRepositoryError::conflict(message),
};

fn pool_error(error: PoolError) -> BookRepositoryError {
    map_pool_error(error, &ERRORS)
}

fn diesel_error(error: diesel::result::Error) -> BookRepositoryError {
    map_diesel_error(error, &ERRORS)
}

fn row_to_book(row: BookRow) -> Result<Book, BookRepositoryError> {
    Book::from_counts(
        BookId::from_uuid(row.id),
        row.total_copies,
        row.available_copies,
    )
    .map_err(|err| BookRepositoryError::query(format!("stored book {}: {err}", row.id)))
}

fn book_to_row(book: &Book) -> BookRow {
    BookRow {
        id: *book.id().as_uuid(),
        total_copies: i64::from(book.total_copies()),
        available_copies: i64::from(book.available_copies()),
    }
}

/// Diesel-backed implementation of the book repository port.
#[derive(Clone)]
pub struct DieselBookRepository {
    pool: DbPool,
}

impl DieselBookRepository {
    /// Create a repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepository for DieselBookRepository {
    async fn find_by_id(&self, book_id: &BookId) -> Result<Option<Book>, BookRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = books::table
            .filter(books::id.eq(book_id.as_uuid()))
            .select(BookRow::as_select())
            .first::<BookRow>(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(row_to_book).transpose()
    }

    async fn insert(&self, book: &Book) -> Result<(), BookRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::insert_into(books::table)
            .values(&book_to_row(book))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn reserve_copy(&self, book_id: &BookId) -> Result<Option<Book>, BookRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = diesel::update(
            books::table
                .filter(books::id.eq(book_id.as_uuid()))
                .filter(books::available_copies.gt(0)),
        )
        .set(books::available_copies.eq(books::available_copies - 1))
        .returning(BookRow::as_returning())
        .get_result::<BookRow>(&mut conn)
        .await
        .optional()
        .map_err(diesel_error)?;

        row.map(row_to_book).transpose()
    }

    async fn release_copy(&self, book_id: &BookId) -> Result<Option<Book>, BookRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = diesel::update(
            books::table
                .filter(books::id.eq(book_id.as_uuid()))
                .filter(books::available_copies.lt(books::total_copies)),
        )
        .set(books::available_copies.eq(books::available_copies + 1))
        .returning(BookRow::as_returning())
        .get_result::<BookRow>(&mut conn)
        .await
        .optional()
        .map_err(diesel_error)?;

        row.map(row_to_book).transpose()
    }

    async fn resize(
        &self,
        book_id: &BookId,
        adjustment: &CapacityAdjustment,
    ) -> Result<Option<Book>, BookRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let for_open_rentals = i64::from(adjustment.copies_for_open_rentals());

        let row = diesel::update(
            books::table
                .filter(books::id.eq(book_id.as_uuid()))
                .filter((books::total_copies - books::available_copies).le(for_open_rentals)),
        )
        .set((
            books::total_copies.eq(i64::from(adjustment.new_total())),
            books::available_copies.eq(i64::from(adjustment.new_available())),
        ))
        .returning(BookRow::as_returning())
        .get_result::<BookRow>(&mut conn)
        .await
        .optional()
        .map_err(diesel_error)?;

        row.map(row_to_book).transpose()
    }
}
