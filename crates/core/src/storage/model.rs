//! Address record and pagination types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest page a listing may return.
pub const PAGINATION_LIMIT: u32 = 100;

/// A postal-code record.
///
/// A code that covers several streets or ranges is stored as one envelope
/// whose `children` hold one entry per match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub cep: String,
    pub state: String,
    pub city: String,
    pub neighborhood: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Limit/offset pair for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u64,
}

impl Pagination {
    /// Build a page window. Sizes outside `1..=PAGINATION_LIMIT` fall back to
    /// the limit.
    pub fn new(per_page: u32, page: u32) -> Self {
        let limit = if per_page < 1 || per_page > PAGINATION_LIMIT { PAGINATION_LIMIT } else { per_page };
        Self { limit, offset: u64::from(page) * u64::from(limit) }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(PAGINATION_LIMIT, 0)
    }
}

/// Filter for [`Storage::list`](super::Storage::list).
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    /// Two-letter state (UF). Required.
    pub state: String,
    pub pagination: Option<Pagination>,
}
