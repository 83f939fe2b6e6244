//! PostgreSQL-backed `RentalRepository`.
//!
//! Versioned writes are `UPDATE rentals SET ... WHERE id = $1 AND version =
//! $2`; the affected row count tells the caller whether it won.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RentalRepository, RentalRepositoryError};
use crate::domain::{BookId, Rental, RentalDraft, RentalId, RentalStatus, UserId};

use super::diesel_error_mapping::{ErrorConstructors, map_diesel_error, map_pool_error};
use super::models::{RentalRow, RentalUpdate};
use super::pool::{DbPool, PoolError};
use super::schema::rentals;

const ERRORS: ErrorConstructors<RentalRepositoryError> = ErrorConstructors {
    connection: |message| RentalRepositoryError::connection(message),
    query: |message| RentalRepositoryError::query(message),
    conflict: |message| RentalRepositoryError::conflict(message),
};

fn pool_error(error: PoolError) -> RentalRepositoryError {
    map_pool_error(error, &ERRORS)
}

fn diesel_error(error: diesel::result::Error) -> RentalRepositoryError {
    map_diesel_error(error, &ERRORS)
}

fn stored_version(version: u64) -> Result<i64, RentalRepositoryError> {
    i64::try_from(version)
        .map_err(|_| RentalRepositoryError::query(format!("version {version} out of range")))
}

fn query_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn row_to_rental(row: RentalRow) -> Result<Rental, RentalRepositoryError> {
    let RentalRow {
        id,
        book_id,
        user_id,
        rental_date,
        due_date,
        return_date,
        status,
        version,
    } = row;
    let corrupt = |detail: String| RentalRepositoryError::query(format!("stored rental {id}: {detail}"));

    let status: RentalStatus = status.parse().map_err(|err| corrupt(format!("{err}")))?;
    let version = u64::try_from(version).map_err(|_| corrupt(format!("negative version {version}")))?;

    Rental::new(RentalDraft {
        id: RentalId::from_uuid(id),
        book_id: BookId::from_uuid(book_id),
        user_id: UserId::from_uuid(user_id),
        rental_date,
        due_date,
        return_date,
        status,
        version,
    })
    .map_err(|err| corrupt(err.to_string()))
}

fn rental_to_row(rental: &Rental) -> Result<RentalRow, RentalRepositoryError> {
    Ok(RentalRow {
        id: *rental.id().as_uuid(),
        book_id: *rental.book_id().as_uuid(),
        user_id: *rental.user_id().as_uuid(),
        rental_date: rental.rental_date(),
        due_date: rental.due_date(),
        return_date: rental.return_date(),
        status: rental.status().as_str().to_owned(),
        version: stored_version(rental.version())?,
    })
}

fn rows_to_rentals(rows: Vec<RentalRow>) -> Result<Vec<Rental>, RentalRepositoryError> {
    rows.into_iter().map(row_to_rental).collect()
}

/// Diesel-backed implementation of the rental repository port.
#[derive(Clone)]
pub struct DieselRentalRepository {
    pool: DbPool,
}

impl DieselRentalRepository {
    /// Create a repository over the given pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RentalRepository for DieselRentalRepository {
    async fn find_by_id(
        &self,
        rental_id: &RentalId,
    ) -> Result<Option<Rental>, RentalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row = rentals::table
            .filter(rentals::id.eq(rental_id.as_uuid()))
            .select(RentalRow::as_select())
            .first::<RentalRow>(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(row_to_rental).transpose()
    }

    async fn insert(&self, rental: &Rental) -> Result<(), RentalRepositoryError> {
        let row = rental_to_row(rental)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::insert_into(rentals::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn update_if_version(
        &self,
        rental: &Rental,
        expected_version: u64,
    ) -> Result<bool, RentalRepositoryError> {
        let expected = stored_version(expected_version)?;
        let changes = RentalUpdate {
            due_date: rental.due_date(),
            return_date: rental.return_date(),
            status: rental.status().as_str(),
            version: stored_version(rental.version())?,
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let updated = diesel::update(
            rentals::table
                .filter(rentals::id.eq(rental.id().as_uuid()))
                .filter(rentals::version.eq(expected)),
        )
        .set(&changes)
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;

        Ok(updated == 1)
    }

    async fn list_by_status(
        &self,
        status: RentalStatus,
        after: Option<RentalId>,
        limit: usize,
    ) -> Result<Vec<Rental>, RentalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let mut query = rentals::table
            .filter(rentals::status.eq(status.as_str()))
            .select(RentalRow::as_select())
            .order(rentals::id.asc())
            .limit(query_limit(limit))
            .into_boxed();
        if let Some(after) = after {
            query = query.filter(rentals::id.gt(*after.as_uuid()));
        }

        let rows = query
            .load::<RentalRow>(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows_to_rentals(rows)
    }

    async fn list_active_due_before(
        &self,
        now: DateTime<Utc>,
        after: Option<RentalId>,
        limit: usize,
    ) -> Result<Vec<Rental>, RentalRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let mut query = rentals::table
            .filter(rentals::status.eq(RentalStatus::Active.as_str()))
            .filter(rentals::due_date.lt(now))
            .select(RentalRow::as_select())
            .order(rentals::id.asc())
            .limit(query_limit(limit))
            .into_boxed();
        if let Some(after) = after {
            query = query.filter(rentals::id.gt(*after.as_uuid()));
        }

        let rows = query
            .load::<RentalRow>(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows_to_rentals(rows)
    }
}
