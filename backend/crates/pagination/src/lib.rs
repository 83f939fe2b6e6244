//! Opaque cursor and pagination envelope primitives.
//!
//! Listings page through keyset-ordered data. The position of the last item a
//! client has seen is serialised to JSON and wrapped in URL-safe base64 so the
//! key shape stays private to the server. [`PageRequest`] carries a validated
//! limit plus an optional cursor, and [`Page`] is the envelope returned to the
//! caller.
//!
//! # Examples
//!
//! ```
//! use pagination::{Cursor, Page, PageRequest};
//!
//! let cursor = Cursor::encode(&42_u64)?;
//! let request = PageRequest::new(10)?.with_cursor(cursor.clone());
//! assert_eq!(request.cursor().map(|c| c.decode::<u64>()).transpose()?, Some(42));
//!
//! let page = Page::new(vec![1, 2, 3], Some(cursor));
//! assert_eq!(page.items().len(), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default number of items returned when the caller does not ask for a limit.
pub const DEFAULT_LIMIT: usize = 20;

/// Largest page a caller may request.
pub const MAX_LIMIT: usize = 100;

/// Errors raised while building page requests or decoding cursors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    /// The requested limit falls outside `1..=MAX_LIMIT`.
    #[error("page limit must be between 1 and {max} (got {requested})")]
    InvalidLimit {
        /// Limit supplied by the caller.
        requested: usize,
        /// Upper bound accepted by the server.
        max: usize,
    },
    /// The cursor text is not valid base64.
    #[error("cursor is not valid base64: {message}")]
    MalformedCursor {
        /// Decoder diagnostic.
        message: String,
    },
    /// The cursor decoded but its payload does not match the expected key.
    #[error("cursor payload is invalid: {message}")]
    InvalidCursorPayload {
        /// Serde diagnostic.
        message: String,
    },
}

/// Opaque position marker handed back to clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Serialise a keyset position into an opaque cursor.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::InvalidCursorPayload`] when the key cannot
    /// be serialised to JSON.
    pub fn encode<K: Serialize>(key: &K) -> Result<Self, PaginationError> {
        let json = serde_json::to_vec(key).map_err(|err| {
            PaginationError::InvalidCursorPayload {
                message: err.to_string(),
            }
        })?;
        Ok(Self(URL_SAFE_NO_PAD.encode(json)))
    }

    /// Wrap cursor text received from a client without decoding it.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Recover the keyset position carried by the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::MalformedCursor`] for text that is not
    /// base64 and [`PaginationError::InvalidCursorPayload`] when the payload
    /// does not deserialise into `K`.
    pub fn decode<K: DeserializeOwned>(&self) -> Result<K, PaginationError> {
        let bytes =
            URL_SAFE_NO_PAD
                .decode(self.0.as_bytes())
                .map_err(|err| PaginationError::MalformedCursor {
                    message: err.to_string(),
                })?;
        serde_json::from_slice(&bytes).map_err(|err| PaginationError::InvalidCursorPayload {
            message: err.to_string(),
        })
    }

    /// Borrow the encoded cursor text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated request for one page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    limit: usize,
    cursor: Option<Cursor>,
}

impl PageRequest {
    /// Build a request for the first page with `limit` items.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError::InvalidLimit`] when `limit` is zero or
    /// larger than [`MAX_LIMIT`].
    pub fn new(limit: usize) -> Result<Self, PaginationError> {
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PaginationError::InvalidLimit {
                requested: limit,
                max: MAX_LIMIT,
            });
        }
        Ok(Self {
            limit,
            cursor: None,
        })
    }

    /// Continue from the position held by `cursor`.
    #[must_use]
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Maximum number of items to return.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Cursor to resume from, if any.
    #[must_use]
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            cursor: None,
        }
    }
}

/// One page of results plus the cursor for the following page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    /// Build a page envelope.
    #[must_use]
    pub fn new(items: Vec<T>, next_cursor: Option<Cursor>) -> Self {
        Self { items, next_cursor }
    }

    /// Items on this page in listing order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        self.items.as_slice()
    }

    /// Consume the page, returning its items.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Cursor for the next page; `None` on the last page.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.next_cursor.as_ref()
    }

    /// Convert every item while keeping the cursor.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }

    /// Build the absolute link for the next page from `base`.
    ///
    /// Existing `cursor` and `limit` query parameters on `base` are replaced;
    /// all other parameters are preserved.
    #[must_use]
    pub fn next_link(&self, base: &Url, limit: usize) -> Option<Url> {
        let cursor = self.next_cursor.as_ref()?;
        let mut link = base.clone();
        let retained: Vec<(String, String)> = base
            .query_pairs()
            .filter(|(key, _)| key != "cursor" && key != "limit")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        {
            let mut pairs = link.query_pairs_mut();
            pairs.clear();
            for (key, value) in &retained {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("limit", &limit.to_string());
            pairs.append_pair("cursor", cursor.as_str());
        }
        Some(link)
    }
}
