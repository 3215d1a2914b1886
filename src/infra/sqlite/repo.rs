use std::path::PathBuf;

use crate::domain::entities::dataset::{ImportId, ImportMeta};
use crate::domain::entities::enrollment::EnrollmentRecord;
use crate::domain::entities::query::{PagePayload, QuerySpec};
use crate::domain::entities::summary::NormalizationPolicy;
use crate::infra::sqlite::queries::{
    insert_records, list_imports, list_states, load_all_records, purge_import, query_page,
};
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::repo::{EnrollmentRepository, NewImportMeta, RepoError};

pub struct SqliteRepo {
    pub db_path: PathBuf,
    pub policy: NormalizationPolicy,
}

impl SqliteRepo {
    pub fn new(db_path: PathBuf, policy: NormalizationPolicy) -> Self {
        Self { db_path, policy }
    }
}

impl EnrollmentRepository for SqliteRepo {
    fn init(&self) -> Result<(), RepoError> {
        init_db(&self.db_path).map_err(RepoError::from_anyhow)
    }

    fn insert_records(
        &self,
        meta: NewImportMeta,
        records: &[EnrollmentRecord],
    ) -> Result<ImportId, RepoError> {
        insert_records(&self.db_path, meta.kind, &meta.source_path, records)
            .map(ImportId)
            .map_err(RepoError::from_anyhow)
    }

    fn query_page(&self, spec: &QuerySpec) -> Result<PagePayload, RepoError> {
        query_page(&self.db_path, spec, self.policy).map_err(RepoError::from_anyhow)
    }

    fn load_all(&self) -> Result<Vec<EnrollmentRecord>, RepoError> {
        load_all_records(&self.db_path).map_err(RepoError::from_anyhow)
    }

    fn list_states(&self) -> Result<Vec<String>, RepoError> {
        list_states(&self.db_path).map_err(RepoError::from_anyhow)
    }

    fn list_imports(&self) -> Result<Vec<ImportMeta>, RepoError> {
        list_imports(&self.db_path).map_err(RepoError::from_anyhow)
    }

    fn purge_import(&self, id: ImportId) -> Result<(), RepoError> {
        purge_import(&self.db_path, id.0).map_err(RepoError::from_anyhow)
    }
}
