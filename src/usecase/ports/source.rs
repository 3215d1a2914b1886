use std::sync::Arc;

use crate::domain::engine::aggregation::known_states;
use crate::domain::engine::query_engine::TableQueryEngine;
use crate::domain::entities::enrollment::EnrollmentRecord;
use crate::domain::entities::query::{QueryError, QueryResult, QuerySpec};
use crate::usecase::ports::repo::{EnrollmentRepository, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("backend returned {rows} rows for page_size {page_size}")]
    OversizedPage { rows: usize, page_size: i64 },
}

/// Where the explorer gets its rows from.
///
/// `fetch` answers one page. `collect` returns every record, or every
/// record matching `filter` in result order, for roll-ups that must not
/// depend on pagination.
pub trait RecordSource: Send + Sync {
    fn fetch(&self, spec: &QuerySpec) -> Result<QueryResult, SourceError>;
    fn collect(&self, filter: Option<&QuerySpec>) -> Result<Vec<EnrollmentRecord>, SourceError>;
    fn states(&self) -> Result<Vec<String>, SourceError>;
}

/// The whole dataset is in memory; the engine does all the work.
pub struct FullCollectionSource {
    records: Arc<Vec<EnrollmentRecord>>,
    engine: TableQueryEngine,
}

impl FullCollectionSource {
    pub fn new(records: Vec<EnrollmentRecord>, engine: TableQueryEngine) -> Self {
        Self {
            records: Arc::new(records),
            engine,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSource for FullCollectionSource {
    fn fetch(&self, spec: &QuerySpec) -> Result<QueryResult, SourceError> {
        Ok(self.engine.query(&self.records, spec)?)
    }

    fn collect(&self, filter: Option<&QuerySpec>) -> Result<Vec<EnrollmentRecord>, SourceError> {
        Ok(match filter {
            Some(spec) => self
                .engine
                .matching(&self.records, spec)
                .into_iter()
                .cloned()
                .collect(),
            None => self.records.as_ref().clone(),
        })
    }

    fn states(&self) -> Result<Vec<String>, SourceError> {
        Ok(known_states(&self.records))
    }
}

/// The backend filters, sorts and pages; only the current page is shipped.
pub struct PagedRemoteSource {
    repo: Arc<dyn EnrollmentRepository>,
    engine: TableQueryEngine,
}

impl PagedRemoteSource {
    pub fn new(repo: Arc<dyn EnrollmentRepository>, engine: TableQueryEngine) -> Self {
        Self { repo, engine }
    }
}

impl RecordSource for PagedRemoteSource {
    fn fetch(&self, spec: &QuerySpec) -> Result<QueryResult, SourceError> {
        self.engine.validate(spec)?;
        let payload = self.repo.query_page(spec)?;
        if payload.rows.len() as i64 > spec.page_size {
            return Err(SourceError::OversizedPage {
                rows: payload.rows.len(),
                page_size: spec.page_size,
            });
        }
        Ok(payload.into())
    }

    fn collect(&self, filter: Option<&QuerySpec>) -> Result<Vec<EnrollmentRecord>, SourceError> {
        let records = self.repo.load_all()?;
        Ok(match filter {
            Some(spec) => self
                .engine
                .matching(&records, spec)
                .into_iter()
                .cloned()
                .collect(),
            None => records,
        })
    }

    fn states(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.repo.list_states()?)
    }
}
