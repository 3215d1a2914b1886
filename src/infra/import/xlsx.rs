use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use tracing::warn;

use crate::domain::entities::dataset::DatasetKind;
use crate::domain::entities::enrollment::EnrollmentRecord;
use crate::infra::import::layout::ColumnMap;

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        // Counts arrive as floats; keep them integral so digit parsing holds.
        Data::Float(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// Reads one worksheet (the first one when `sheet` is `None`). The first row
/// holds the headers.
pub fn read_enrollment_xlsx(
    xlsx_path: &Path,
    kind: DatasetKind,
    sheet: Option<&str>,
) -> Result<Vec<EnrollmentRecord>> {
    let mut workbook = open_workbook_auto(xlsx_path)
        .with_context(|| format!("failed to open xlsx: {}", xlsx_path.display()))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .with_context(|| format!("workbook has no sheets: {}", xlsx_path.display()))?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet: {sheet_name}"))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());
    let headers = rows
        .next()
        .with_context(|| format!("sheet {sheet_name} has no header row"))?;
    let columns = ColumnMap::resolve(&headers, kind)
        .with_context(|| format!("unexpected layout in sheet: {sheet_name}"))?;

    let mut records = Vec::new();
    let mut skipped = 0_usize;
    for row in rows {
        match columns.record(&row) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, sheet = %sheet_name, "dropped xlsx rows without a state");
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_to_string_keeps_whole_floats_integral() {
        assert_eq!(cell_to_string(&Data::Float(1204.0)), "1204");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::String("Goa".to_string())), "Goa");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    #[test]
    fn missing_workbook_is_reported_with_path() {
        let path = std::env::temp_dir().join("samvidhan-missing-workbook.xlsx");

        let err = read_enrollment_xlsx(&path, DatasetKind::Enrollment, None)
            .expect_err("missing workbook should fail");

        assert!(
            err.to_string().contains("failed to open xlsx"),
            "unexpected error: {err:#}"
        );
    }
}
