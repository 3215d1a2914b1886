use crate::domain::entities::dataset::{DatasetKind, ImportId, ImportMeta};
use crate::domain::entities::enrollment::EnrollmentRecord;
use crate::domain::entities::query::{PagePayload, QuerySpec};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepoError {
    #[error("{0}")]
    Message(String),
}

impl RepoError {
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        RepoError::Message(format!("{err:#}"))
    }
}

/// Storage backend for enrollment rows. A backend that can filter, sort and
/// page on its own answers `query_page` with one ready page.
pub trait EnrollmentRepository: Send + Sync {
    fn init(&self) -> Result<(), RepoError>;

    fn insert_records(
        &self,
        meta: NewImportMeta,
        records: &[EnrollmentRecord],
    ) -> Result<ImportId, RepoError>;
    fn query_page(&self, spec: &QuerySpec) -> Result<PagePayload, RepoError>;
    fn load_all(&self) -> Result<Vec<EnrollmentRecord>, RepoError>;
    fn list_states(&self) -> Result<Vec<String>, RepoError>;
    fn list_imports(&self) -> Result<Vec<ImportMeta>, RepoError>;
    fn purge_import(&self, id: ImportId) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImportMeta {
    pub kind: DatasetKind,
    pub source_path: String,
}
