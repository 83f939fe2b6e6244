//! Internal Diesel row structs.
//!
//! Rows never leave the persistence layer; repositories convert them through
//! the validating domain constructors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{books, rentals};

/// Row read from and written to the books table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookRow {
    pub id: Uuid,
    pub total_copies: i64,
    pub available_copies: i64,
}

/// Row read from and inserted into the rentals table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = rentals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RentalRow {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: Uuid,
    pub rental_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: String,
    pub version: i64,
}

/// Mutable rental columns written by a versioned update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = rentals)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct RentalUpdate<'a> {
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: &'a str,
    pub version: i64,
}
