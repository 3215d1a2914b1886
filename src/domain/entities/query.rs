use serde::{Deserialize, Serialize};

use crate::domain::entities::enrollment::{EnrollmentRecord, RecordField};
use crate::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Search, filter, sort and page parameters of one table view.
///
/// `page` is 1-based. An empty `state_filter` means all states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub search_term: String,
    pub state_filter: String,
    pub sort_field: Option<RecordField>,
    pub sort_direction: SortDirection,
    pub page: i64,
    pub page_size: i64,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            search_term: String::new(),
            state_filter: String::new(),
            sort_field: None,
            sort_direction: SortDirection::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QuerySpec {
    pub fn with_page(&self, page: i64) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    pub fn has_filters(&self) -> bool {
        !self.search_term.is_empty() || !self.state_filter.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub rows: Vec<EnrollmentRecord>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("page_size must be greater than zero (got {0})")]
    InvalidPageSize(i64),
    #[error("page must be 1 or greater (got {0})")]
    InvalidPage(i64),
    #[error("page_size {page_size} exceeds the maximum of {max}")]
    PageSizeTooLarge { page_size: i64, max: i64 },
    #[error("unknown sort field: {0}")]
    UnknownSortField(String),
}

/// One page as returned by a server-paginated backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePayload {
    pub rows: Vec<EnrollmentRecord>,
    pub total: usize,
    #[serde(default = "first_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn first_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl From<PagePayload> for QueryResult {
    fn from(payload: PagePayload) -> Self {
        QueryResult {
            rows: payload.rows,
            total: payload.total,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("page payload is missing a rows array")]
    MissingRows,
    #[error("page payload holds {rows} rows but limit is {limit}")]
    OversizedPage { rows: usize, limit: i64 },
    #[error("malformed page payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decodes a `{ rows, total, page, limit }` backend page.
///
/// A `null` or absent `rows` is an integration bug and is reported instead
/// of being read as an empty page.
pub fn decode_page_payload(json: &str) -> Result<PagePayload, PayloadError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    match value.get("rows") {
        Some(rows) if rows.is_array() => {}
        _ => return Err(PayloadError::MissingRows),
    }

    let payload: PagePayload = serde_json::from_value(value)?;
    if payload.limit > 0 && payload.rows.len() as i64 > payload.limit {
        return Err(PayloadError::OversizedPage {
            rows: payload.rows.len(),
            limit: payload.limit,
        });
    }
    Ok(payload)
}
