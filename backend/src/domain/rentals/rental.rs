//! Rental entity and its lifecycle transitions.

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::{BookId, RentalId, UserId};

use super::{RentalStatus, RentalTransitionError, RentalValidationError};

/// Input payload for [`Rental::new`].
#[derive(Debug, Clone)]
pub struct RentalDraft {
    pub id: RentalId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub rental_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: RentalStatus,
    pub version: u64,
}

/// One borrowed copy of a book.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use lending::domain::{BookId, Rental, RentalId, RentalStatus, UserId};
///
/// let rented = Utc::now();
/// let rental = Rental::open(
///     RentalId::random(),
///     BookId::random(),
///     UserId::random(),
///     rented,
///     rented + Duration::days(14),
/// )?;
/// assert_eq!(rental.status(), RentalStatus::Active);
/// assert!(rental.is_overdue(rented + Duration::days(15)));
/// # Ok::<(), lending::domain::RentalValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rental {
    pub(super) id: RentalId,
    pub(super) book_id: BookId,
    pub(super) user_id: UserId,
    pub(super) rental_date: DateTime<Utc>,
    pub(super) due_date: DateTime<Utc>,
    pub(super) return_date: Option<DateTime<Utc>>,
    pub(super) status: RentalStatus,
    pub(super) version: u64,
}

impl Rental {
    /// Creates a validated rental from stored or assembled fields.
    pub fn new(draft: RentalDraft) -> Result<Self, RentalValidationError> {
        Self::try_from(draft)
    }

    /// Opens a new active rental at version zero.
    pub fn open(
        id: RentalId,
        book_id: BookId,
        user_id: UserId,
        rental_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Result<Self, RentalValidationError> {
        Self::new(RentalDraft {
            id,
            book_id,
            user_id,
            rental_date,
            due_date,
            return_date: None,
            status: RentalStatus::Active,
            version: 0,
        })
    }

    /// Returns the rental id.
    pub fn id(&self) -> RentalId {
        self.id
    }

    /// Returns the borrowed book.
    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    /// Returns the borrower.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns when the copy was checked out.
    pub fn rental_date(&self) -> DateTime<Utc> {
        self.rental_date
    }

    /// Returns when the copy is due back.
    pub fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }

    /// Returns when the copy came back, if it has.
    pub fn return_date(&self) -> Option<DateTime<Utc>> {
        self.return_date
    }

    /// Returns the lifecycle state.
    pub fn status(&self) -> RentalStatus {
        self.status
    }

    /// Returns the optimistic-concurrency version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the rental still holds a reserved copy.
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Whether the rental is open and its due date lies before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.due_date < now
    }

    /// Closes the rental at `returned_at`.
    ///
    /// Accepted from both `Active` and `Overdue`.
    pub fn returned_at(&self, returned_at: DateTime<Utc>) -> Result<Self, RentalTransitionError> {
        self.ensure_open()?;
        Ok(Self {
            return_date: Some(returned_at),
            status: RentalStatus::Returned,
            version: self.next_version(),
            ..self.clone()
        })
    }

    /// Reclassifies an active rental as overdue.
    ///
    /// Returns `None` when nothing changes: the rental is not `Active` or is
    /// not yet past due. That makes reconciliation idempotent.
    #[must_use]
    pub fn marked_overdue(&self, now: DateTime<Utc>) -> Option<Self> {
        if self.status != RentalStatus::Active || self.due_date >= now {
            return None;
        }
        Some(Self {
            status: RentalStatus::Overdue,
            version: self.next_version(),
            ..self.clone()
        })
    }

    /// Pushes the due date forward by `extension`.
    ///
    /// An overdue rental whose new due date is no longer before `now` goes
    /// back to `Active`; one that is still past due stays `Overdue`.
    pub fn extended_by(
        &self,
        extension: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Self, RentalTransitionError> {
        self.ensure_open()?;
        let due_date = self.due_date.checked_add_signed(extension).ok_or(
            RentalTransitionError::DueDateOutOfRange {
                rental_id: self.id,
            },
        )?;
        let status = if due_date < now {
            self.status
        } else {
            RentalStatus::Active
        };
        Ok(Self {
            due_date,
            status,
            version: self.next_version(),
            ..self.clone()
        })
    }

    /// Reopens a returned rental as it stood in `before`.
    ///
    /// Used when the returned copy could not be put back on the shelf. The
    /// version still moves forward so writers holding either snapshot lose.
    #[must_use]
    pub(crate) fn return_undone(&self, before: &Self) -> Self {
        Self {
            version: self.next_version(),
            ..before.clone()
        }
    }

    fn ensure_open(&self) -> Result<(), RentalTransitionError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(RentalTransitionError::NotActive {
                rental_id: self.id,
                status: self.status,
            })
        }
    }

    fn next_version(&self) -> u64 {
        self.version.saturating_add(1)
    }
}
