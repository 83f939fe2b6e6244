//! Driving port for administrative inventory changes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Book, BookId, LendingError};

/// Serializable copy counters for driving ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub id: BookId,
    pub total_copies: u32,
    pub available_copies: u32,
}

impl From<&Book> for BookPayload {
    fn from(value: &Book) -> Self {
        Self {
            id: value.id(),
            total_copies: value.total_copies(),
            available_copies: value.available_copies(),
        }
    }
}

/// Request to register a title with its copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddBookRequest {
    pub book_id: BookId,
    pub total_copies: i64,
}

/// Request to resize a title's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustCapacityRequest {
    pub book_id: BookId,
    pub new_total: i64,
    pub new_available: i64,
}

/// Response carrying the stored counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub book: BookPayload,
}

/// Driving port for inventory administration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryCommand: Send + Sync {
    /// Register a title with every copy available.
    async fn add_book(&self, request: AddBookRequest) -> Result<BookResponse, LendingError>;

    /// Replace a title's counters without revoking a checked-out copy.
    ///
    /// Rejects negative counts, `new_available > new_total` and any change
    /// that leaves fewer than `total - available` copies for open rentals.
    async fn adjust_capacity(
        &self,
        request: AdjustCapacityRequest,
    ) -> Result<BookResponse, LendingError>;
}
