//! Book inventory state owned by the inventory ledger.
//!
//! A [`Book`] pairs a title with its copy counters. Every constructor and
//! transition keeps `available_copies <= total_copies`; values that would
//! break the invariant are unrepresentable, so adapters cannot hand the domain
//! an inconsistent counter without going through [`Book::new`].

use std::fmt;

use serde::Serialize;

use super::BookId;

/// Validation errors raised by book constructors and capacity changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    /// A copy count was negative.
    NegativeCopies { field: &'static str, value: i64 },
    /// A copy count does not fit the supported range.
    CopiesOutOfRange { field: &'static str, value: i64 },
    /// More copies would be available than exist.
    AvailableExceedsTotal { available: u32, total: u32 },
    /// The change would revoke copies currently held by open rentals.
    RevokesHeldCopies { held: u32, new_total: u32, new_available: u32 },
}

impl fmt::Display for BookValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeCopies { field, value } => {
                write!(f, "{field} must not be negative (got {value})")
            }
            Self::CopiesOutOfRange { field, value } => {
                write!(f, "{field} is out of range (got {value})")
            }
            Self::AvailableExceedsTotal { available, total } => write!(
                f,
                "available copies ({available}) must not exceed total copies ({total})"
            ),
            Self::RevokesHeldCopies {
                held,
                new_total,
                new_available,
            } => write!(
                f,
                "{held} copies are checked out; total {new_total} with {new_available} \
                 available would revoke a held copy"
            ),
        }
    }
}

impl std::error::Error for BookValidationError {}

/// Copy counters for one title.
///
/// # Examples
///
/// ```
/// use lending::domain::{Book, BookId};
///
/// let book = Book::new(BookId::random(), 2, 1)?;
/// assert_eq!(book.checked_out_copies(), 1);
/// let reserved = book.with_copy_reserved().expect("one copy left");
/// assert_eq!(reserved.available_copies(), 0);
/// assert!(reserved.with_copy_reserved().is_none());
/// # Ok::<(), lending::domain::BookValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    id: BookId,
    total_copies: u32,
    available_copies: u32,
}

impl Book {
    /// Build a book, rejecting `available_copies > total_copies`.
    pub fn new(
        id: BookId,
        total_copies: u32,
        available_copies: u32,
    ) -> Result<Self, BookValidationError> {
        if available_copies > total_copies {
            return Err(BookValidationError::AvailableExceedsTotal {
                available: available_copies,
                total: total_copies,
            });
        }
        Ok(Self {
            id,
            total_copies,
            available_copies,
        })
    }

    /// Build a book from signed storage columns.
    pub fn from_counts(
        id: BookId,
        total_copies: i64,
        available_copies: i64,
    ) -> Result<Self, BookValidationError> {
        let total = copy_count("total_copies", total_copies)?;
        let available = copy_count("available_copies", available_copies)?;
        Self::new(id, total, available)
    }

    /// Returns the book id.
    pub fn id(&self) -> BookId {
        self.id
    }

    /// Returns the number of copies the library owns.
    pub fn total_copies(&self) -> u32 {
        self.total_copies
    }

    /// Returns the number of copies on the shelf.
    pub fn available_copies(&self) -> u32 {
        self.available_copies
    }

    /// Returns the number of copies backing open rentals.
    pub fn checked_out_copies(&self) -> u32 {
        self.total_copies.saturating_sub(self.available_copies)
    }

    /// State after one copy is reserved, or `None` when none is available.
    #[must_use]
    pub fn with_copy_reserved(&self) -> Option<Self> {
        let available_copies = self.available_copies.checked_sub(1)?;
        Some(Self {
            available_copies,
            ..self.clone()
        })
    }

    /// State after one copy is returned, or `None` when every copy is
    /// already on the shelf.
    #[must_use]
    pub fn with_copy_released(&self) -> Option<Self> {
        if self.available_copies >= self.total_copies {
            return None;
        }
        Some(Self {
            available_copies: self.available_copies.saturating_add(1),
            ..self.clone()
        })
    }

    /// State after an administrative resize.
    pub fn with_capacity(
        &self,
        adjustment: CapacityAdjustment,
    ) -> Result<Self, BookValidationError> {
        let held = self.checked_out_copies();
        if !adjustment.preserves_held(held) {
            return Err(BookValidationError::RevokesHeldCopies {
                held,
                new_total: adjustment.new_total,
                new_available: adjustment.new_available,
            });
        }
        Self::new(self.id, adjustment.new_total, adjustment.new_available)
    }
}

/// Validated target counts for an administrative resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityAdjustment {
    new_total: u32,
    new_available: u32,
}

impl CapacityAdjustment {
    /// Validate the requested counts independently of any stored book.
    ///
    /// Rejects negative values and `new_available > new_total`. Whether the
    /// change would revoke held copies depends on the stored book and is
    /// checked atomically by the ledger.
    pub fn new(new_total: i64, new_available: i64) -> Result<Self, BookValidationError> {
        let total = copy_count("total_copies", new_total)?;
        let available = copy_count("available_copies", new_available)?;
        if available > total {
            return Err(BookValidationError::AvailableExceedsTotal {
                available,
                total,
            });
        }
        Ok(Self {
            new_total: total,
            new_available: available,
        })
    }

    /// Requested total copies.
    pub fn new_total(&self) -> u32 {
        self.new_total
    }

    /// Requested available copies.
    pub fn new_available(&self) -> u32 {
        self.new_available
    }

    /// Number of copies this adjustment leaves for open rentals.
    pub fn copies_for_open_rentals(&self) -> u32 {
        self.new_total.saturating_sub(self.new_available)
    }

    /// Whether `held` checked-out copies still fit after the resize.
    ///
    /// Leaving more than `held` copies off the shelf is accepted: the extra
    /// copies are withheld from lending (damaged, in repair) and come back
    /// through a later resize. Every outstanding return still finds room.
    pub fn preserves_held(&self, held: u32) -> bool {
        held <= self.copies_for_open_rentals()
    }
}

fn copy_count(field: &'static str, value: i64) -> Result<u32, BookValidationError> {
    if value < 0 {
        return Err(BookValidationError::NegativeCopies { field, value });
    }
    u32::try_from(value).map_err(|_| BookValidationError::CopiesOutOfRange { field, value })
}
