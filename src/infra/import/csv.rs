use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::domain::entities::dataset::DatasetKind;
use crate::domain::entities::enrollment::EnrollmentRecord;
use crate::infra::import::layout::ColumnMap;

pub fn read_enrollment_csv(csv_path: &Path, kind: DatasetKind) -> Result<Vec<EnrollmentRecord>> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    read_enrollment_records(reader, kind)
        .with_context(|| format!("failed to import csv: {}", csv_path.display()))
}

pub fn read_enrollment_rows<R: Read>(input: R, kind: DatasetKind) -> Result<Vec<EnrollmentRecord>> {
    let reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    read_enrollment_records(reader, kind)
}

fn read_enrollment_records<R: Read>(
    mut reader: csv::Reader<R>,
    kind: DatasetKind,
) -> Result<Vec<EnrollmentRecord>> {
    let headers = reader
        .headers()
        .context("failed to read csv headers")?
        .clone();
    if headers.is_empty() {
        anyhow::bail!("csv header is required")
    }
    let columns = ColumnMap::resolve(&headers.iter().collect::<Vec<_>>(), kind)?;

    let mut records = Vec::new();
    let mut skipped = 0_usize;
    for (row_idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to parse csv record {}", row_idx + 1))?;
        let row: Vec<&str> = record.iter().collect();
        match columns.record(&row) {
            Some(enrollment) => records.push(enrollment),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, kind = kind.as_str(), "dropped csv rows without a state");
    }
    Ok(records)
}
