use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::entities::dataset::{DatasetKind, ImportId, ImportMeta, ImportResult};
use crate::domain::entities::enrollment::EnrollmentRecord;
use crate::infra::import::csv::read_enrollment_csv;
use crate::infra::import::layout::consolidate;
use crate::infra::import::xlsx::read_enrollment_xlsx;
use crate::usecase::ports::repo::{EnrollmentRepository, NewImportMeta};

pub struct ImportService {
    repo: Arc<dyn EnrollmentRepository>,
}

impl ImportService {
    pub fn new(repo: Arc<dyn EnrollmentRepository>) -> Self {
        Self { repo }
    }

    pub fn import_csv(&self, path: &Path, kind: DatasetKind) -> Result<ImportResult> {
        let records = read_enrollment_csv(path, kind)?;
        self.store(path, kind, records)
    }

    pub fn import_xlsx(
        &self,
        path: &Path,
        kind: DatasetKind,
        sheet: Option<&str>,
    ) -> Result<ImportResult> {
        let records = read_enrollment_xlsx(path, kind, sheet)?;
        self.store(path, kind, records)
    }

    pub fn list_imports(&self) -> Result<Vec<ImportMeta>> {
        Ok(self.repo.list_imports()?)
    }

    pub fn purge_import(&self, id: ImportId) -> Result<()> {
        self.repo
            .purge_import(id)
            .with_context(|| format!("failed to purge import #{}", id.0))?;
        info!(import_id = id.0, "import purged");
        Ok(())
    }

    fn store(
        &self,
        path: &Path,
        kind: DatasetKind,
        records: Vec<EnrollmentRecord>,
    ) -> Result<ImportResult> {
        let read = records.len();
        let records = consolidate(records);
        let meta = NewImportMeta {
            kind,
            source_path: path.to_string_lossy().into_owned(),
        };
        let import_id = self
            .repo
            .insert_records(meta, &records)
            .with_context(|| format!("failed to store rows from {}", path.display()))?;

        info!(
            import_id = import_id.0,
            kind = kind.as_str(),
            read,
            stored = records.len(),
            "import finished"
        );
        Ok(ImportResult {
            import_id,
            row_count: records.len() as i64,
        })
    }
}
