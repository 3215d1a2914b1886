use std::cmp::Ordering;

use crate::domain::entities::enrollment::{EnrollmentRecord, RecordField};
use crate::domain::entities::query::{QueryError, QueryResult, QuerySpec, SortDirection};
use crate::domain::entities::summary::NormalizationPolicy;
use crate::MAX_PAGE_SIZE;

/// Filters, sorts and paginates an in-memory record collection.
///
/// The engine never mutates its input and never clamps the requested page:
/// a page past the end yields no rows with the full match count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableQueryEngine {
    policy: NormalizationPolicy,
    max_page_size: i64,
}

impl Default for TableQueryEngine {
    fn default() -> Self {
        Self {
            policy: NormalizationPolicy::Exact,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl TableQueryEngine {
    pub fn new(policy: NormalizationPolicy, max_page_size: i64) -> Self {
        Self {
            policy,
            max_page_size,
        }
    }

    pub fn policy(&self) -> NormalizationPolicy {
        self.policy
    }

    pub fn validate(&self, spec: &QuerySpec) -> Result<(), QueryError> {
        if spec.page_size <= 0 {
            return Err(QueryError::InvalidPageSize(spec.page_size));
        }
        if spec.page_size > self.max_page_size {
            return Err(QueryError::PageSizeTooLarge {
                page_size: spec.page_size,
                max: self.max_page_size,
            });
        }
        if spec.page <= 0 {
            return Err(QueryError::InvalidPage(spec.page));
        }
        Ok(())
    }

    pub fn query(
        &self,
        records: &[EnrollmentRecord],
        spec: &QuerySpec,
    ) -> Result<QueryResult, QueryError> {
        self.validate(spec)?;

        let matching = self.matching(records, spec);
        let total = matching.len();

        let start = (spec.page - 1).saturating_mul(spec.page_size);
        let start = usize::try_from(start).unwrap_or(usize::MAX);
        let page_size = usize::try_from(spec.page_size).unwrap_or(usize::MAX);

        let rows = matching
            .into_iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        Ok(QueryResult { rows, total })
    }

    /// Every record passing the state filter and search, in result order.
    pub fn matching<'a>(
        &self,
        records: &'a [EnrollmentRecord],
        spec: &QuerySpec,
    ) -> Vec<&'a EnrollmentRecord> {
        let needle = spec.search_term.to_lowercase();
        let mut matching: Vec<&EnrollmentRecord> = records
            .iter()
            .filter(|record| {
                spec.state_filter.is_empty() || self.policy.matches(&record.state, &spec.state_filter)
            })
            .filter(|record| needle.is_empty() || matches_search(record, &needle))
            .collect();

        if let Some(field) = spec.sort_field {
            // sort_by is stable, so equal keys keep their input order in both directions.
            matching.sort_by(|left, right| {
                let ordering = compare_by_field(left, right, field);
                match spec.sort_direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        matching
    }
}

/// Runs `spec` with the default engine (exact matching).
pub fn query(records: &[EnrollmentRecord], spec: &QuerySpec) -> Result<QueryResult, QueryError> {
    TableQueryEngine::default().query(records, spec)
}

pub fn page_count(total: usize, page_size: i64) -> usize {
    match usize::try_from(page_size) {
        Ok(size) if size > 0 => total.div_ceil(size),
        _ => 0,
    }
}

fn matches_search(record: &EnrollmentRecord, needle: &str) -> bool {
    [&record.state, &record.district, &record.date]
        .into_iter()
        .any(|value| value.to_lowercase().contains(needle))
}

fn compare_by_field(left: &EnrollmentRecord, right: &EnrollmentRecord, field: RecordField) -> Ordering {
    if field.is_numeric() {
        return left
            .count(field)
            .unwrap_or(0)
            .cmp(&right.count(field).unwrap_or(0));
    }
    collate(
        left.text(field).unwrap_or(""),
        right.text(field).unwrap_or(""),
    )
}

/// Locale-style ordering: letters compare case-folded first; on a tie the
/// lowercase form sorts before the uppercase one.
pub fn collate(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right).reverse())
}
