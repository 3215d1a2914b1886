use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::engine::aggregation::{
    choropleth, enrollment_timeline, state_distribution, summarize_with,
};
use crate::domain::entities::query::{QueryResult, QuerySpec};
use crate::domain::entities::summary::{
    ChoroplethPoint, NormalizationPolicy, StateTotal, SummaryStats, TimelinePoint,
};
use crate::usecase::ports::source::{RecordSource, SourceError};

/// Which rows the summary cards are computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryScope {
    /// Every record the source holds.
    #[default]
    All,
    /// Every record matching the current search and state filter.
    Matching,
    /// Only the rows on the current page.
    CurrentPage,
}

pub struct QueryService {
    source: Arc<dyn RecordSource>,
    policy: NormalizationPolicy,
}

impl QueryService {
    pub fn new(source: Arc<dyn RecordSource>, policy: NormalizationPolicy) -> Self {
        Self { source, policy }
    }

    pub fn query_page(&self, spec: &QuerySpec) -> Result<QueryResult, SourceError> {
        let result = self.source.fetch(spec)?;
        info!(
            page = spec.page,
            page_size = spec.page_size,
            rows = result.rows.len(),
            total = result.total,
            "query page served"
        );
        Ok(result)
    }

    pub fn summarize(
        &self,
        scope: SummaryScope,
        spec: &QuerySpec,
    ) -> Result<SummaryStats, SourceError> {
        let records = match scope {
            SummaryScope::All => self.source.collect(None)?,
            SummaryScope::Matching => self.source.collect(Some(spec))?,
            SummaryScope::CurrentPage => self.source.fetch(spec)?.rows,
        };
        debug!(?scope, records = records.len(), "summarizing records");
        Ok(summarize_with(&records, self.policy))
    }

    pub fn states(&self) -> Result<Vec<String>, SourceError> {
        self.source.states()
    }

    pub fn state_distribution(&self, limit: usize) -> Result<Vec<StateTotal>, SourceError> {
        Ok(state_distribution(&self.source.collect(None)?, limit))
    }

    pub fn timeline(&self) -> Result<Vec<TimelinePoint>, SourceError> {
        Ok(enrollment_timeline(&self.source.collect(None)?))
    }

    pub fn choropleth(&self) -> Result<Vec<ChoroplethPoint>, SourceError> {
        Ok(choropleth(&self.source.collect(None)?))
    }
}
