//! Pagination for the console's data grids.
//!
//! Grids page through results with `limit` and `page` (or a raw `offset`).
//! When `page` is provided it takes precedence over `offset`. The default
//! page size matches the console's booking grid (20 rows).
//!
//! ```ignore
//! // GET /api/bookings?limit=20&page=3
//! let offset = params.offset(); // 40
//! let meta = PaginationMeta::new(total, &params);
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::serde::deserialize_optional_parsed;

/// Rows per page when the client doesn't ask for a size.
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Upper bound on rows per page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters for pagination. Out-of-range values are clamped rather
/// than rejected: `limit` to `1..=MAX_PAGE_SIZE`, `offset` to `>= 0` and the
/// 1-indexed `page` to `>= 1`.
#[derive(Debug, Clone, Default, Hash, Deserialize, ToSchema)]
pub struct PaginationParams {
    /// Rows per page (1-100, default: 20)
    #[serde(default, deserialize_with = "deserialize_optional_parsed")]
    pub limit: Option<i64>,
    /// Rows to skip (ignored if `page` is set)
    #[serde(default, deserialize_with = "deserialize_optional_parsed")]
    pub offset: Option<i64>,
    /// Page number (1-indexed)
    #[serde(default, deserialize_with = "deserialize_optional_parsed")]
    pub page: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.map_or(DEFAULT_PAGE_SIZE, |l| l.clamp(1, MAX_PAGE_SIZE))
    }

    #[must_use]
    pub fn page(&self) -> Option<i64> {
        self.page.map(|p| p.max(1))
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        self.page()
            .map(|page| (page - 1).saturating_mul(self.limit()))
            .or(self.offset)
            .unwrap_or(0)
            .max(0)
    }
}

/// Metadata returned alongside a page of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    /// Total number of rows matching the filters
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    /// Current page, when page-based pagination was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    /// Whether rows exist past this page
    pub has_more: bool,
}

impl PaginationMeta {
    pub fn new(total: i64, params: &PaginationParams) -> Self {
        let (limit, offset) = (params.limit(), params.offset());
        Self {
            total,
            limit,
            offset,
            page: params.page(),
            has_more: total > offset.saturating_add(limit),
        }
    }
}
