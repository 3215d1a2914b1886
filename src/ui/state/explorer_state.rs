use std::time::{Duration, Instant};

use crate::domain::engine::query_engine::page_count;
use crate::domain::entities::enrollment::RecordField;
use crate::domain::entities::query::{QueryResult, QuerySpec, SortDirection};

/// Holds a typed search term back until it has been stable for `delay`.
#[derive(Debug, Clone)]
pub struct SearchDebounce {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl SearchDebounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, term: &str, now: Instant) {
        self.pending = Some((term.to_string(), now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Releases the pending term once `delay` has passed since the last push.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) >= self.delay);
        if due {
            self.pending.take().map(|(term, _)| term)
        } else {
            None
        }
    }
}

/// Transient view state of the explorer table.
///
/// Any change to the search term, state filter, sort or page size moves the
/// view back to page 1 so a shrinking result set never strands it.
#[derive(Debug, Clone)]
pub struct ExplorerState {
    spec: QuerySpec,
    total: usize,
    debounce: SearchDebounce,
}

impl ExplorerState {
    pub fn new(page_size: i64, debounce: Duration) -> Self {
        Self {
            spec: QuerySpec {
                page_size,
                ..QuerySpec::default()
            },
            total: 0,
            debounce: SearchDebounce::new(debounce),
        }
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Records a keystroke; the query only changes once `tick` releases it.
    pub fn type_search(&mut self, term: &str, now: Instant) {
        self.debounce.push(term, now);
    }

    /// Returns true when a debounced search was applied and the view needs
    /// a fresh query.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.debounce.poll(now) {
            Some(term) => self.set_search_term(&term),
            None => false,
        }
    }

    pub fn set_search_term(&mut self, term: &str) -> bool {
        if self.spec.search_term == term {
            return false;
        }
        self.spec.search_term = term.to_string();
        self.spec.page = 1;
        true
    }

    pub fn set_state_filter(&mut self, state: &str) -> bool {
        if self.spec.state_filter == state {
            return false;
        }
        self.spec.state_filter = state.to_string();
        self.spec.page = 1;
        true
    }

    /// Same field flips the direction; a new field starts ascending.
    pub fn toggle_sort(&mut self, field: RecordField) {
        if self.spec.sort_field == Some(field) {
            self.spec.sort_direction = self.spec.sort_direction.toggled();
        } else {
            self.spec.sort_field = Some(field);
            self.spec.sort_direction = SortDirection::Asc;
        }
        self.spec.page = 1;
    }

    pub fn clear_sort(&mut self) {
        self.spec.sort_field = None;
        self.spec.sort_direction = SortDirection::Asc;
        self.spec.page = 1;
    }

    pub fn set_page_size(&mut self, page_size: i64) {
        self.spec.page_size = page_size;
        self.spec.page = 1;
    }

    pub fn go_to_page(&mut self, page: i64) {
        let last = self.page_count().max(1) as i64;
        self.spec.page = page.clamp(1, last);
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.spec.page + 1);
    }

    pub fn previous_page(&mut self) {
        self.go_to_page(self.spec.page - 1);
    }

    pub fn apply_result(&mut self, result: &QueryResult) {
        self.total = result.total;
    }

    pub fn page_count(&self) -> usize {
        page_count(self.total, self.spec.page_size)
    }

    /// 1-based inclusive row range shown for a page holding `rows` rows.
    pub fn showing_range(&self, rows: usize) -> Option<(usize, usize)> {
        if rows == 0 {
            return None;
        }
        let page_size = usize::try_from(self.spec.page_size).ok()?;
        let page = usize::try_from(self.spec.page).ok()?;
        let first = (page - 1) * page_size + 1;
        Some((first, first + rows - 1))
    }

    pub fn status_line(&self, rows: usize) -> String {
        match self.showing_range(rows) {
            Some((first, last)) => format!("Showing {first}–{last} of {}", self.total),
            None => format!("Showing 0 of {}", self.total),
        }
    }
}
