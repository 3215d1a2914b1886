use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, types::Value};
use tracing::debug;

use crate::domain::entities::dataset::{DatasetKind, ImportId, ImportMeta};
use crate::domain::entities::enrollment::{EnrollmentRecord, RecordField};
use crate::domain::entities::query::{PagePayload, QuerySpec, SortDirection};
use crate::domain::entities::summary::NormalizationPolicy;
use crate::infra::sqlite::schema::{init_db, open_connection, FOLD_FN, FOLD_TRIM_FN};

const RECORD_COLUMNS: &str =
    "date, state, district, pincode, age_0_5, age_5_17, age_18_greater";

fn count_to_sql(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn read_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<EnrollmentRecord> {
    let count = |idx: usize| -> rusqlite::Result<u64> {
        let value: Option<i64> = row.get(idx)?;
        Ok(value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0))
    };
    Ok(EnrollmentRecord {
        date: row.get(0)?,
        state: row.get(1)?,
        district: row.get(2)?,
        pincode: row.get::<_, Option<String>>(3)?.filter(|code| !code.is_empty()),
        age_0_5: count(4)?,
        age_5_17: count(5)?,
        age_18_greater: count(6)?,
    })
}

pub fn insert_records(
    db_path: &Path,
    kind: DatasetKind,
    source_path: &str,
    records: &[EnrollmentRecord],
) -> Result<i64> {
    init_db(db_path)?;
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start import transaction")?;

    tx.execute(
        "INSERT INTO import_batch(kind, source_path, row_count) VALUES (?1, ?2, 0)",
        params![kind.as_str(), source_path],
    )
    .context("failed to insert import batch")?;
    let import_id = tx.last_insert_rowid();

    let mut insert_row = tx
        .prepare(&format!(
            "INSERT INTO enrollment(import_id, {RECORD_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ))
        .context("failed to prepare enrollment insert")?;
    for record in records {
        insert_row
            .execute(params![
                import_id,
                record.date,
                record.state,
                record.district,
                record.pincode,
                count_to_sql(record.age_0_5),
                count_to_sql(record.age_5_17),
                count_to_sql(record.age_18_greater),
            ])
            .context("failed to insert enrollment row")?;
    }
    drop(insert_row);

    tx.execute(
        "UPDATE import_batch SET row_count = ?1 WHERE id = ?2",
        params![records.len() as i64, import_id],
    )
    .context("failed to update import row_count")?;

    tx.commit().context("failed to commit import transaction")?;
    Ok(import_id)
}

fn sort_clause(field: RecordField, direction: SortDirection) -> String {
    let (forward, backward) = match direction {
        SortDirection::Asc => ("ASC", "DESC"),
        SortDirection::Desc => ("DESC", "ASC"),
    };
    let column = field.name();
    if field.is_numeric() {
        return format!("{column} {forward}, id ASC");
    }
    let expr = if field == RecordField::Pincode {
        "COALESCE(pincode, '')".to_string()
    } else {
        column.to_string()
    };
    format!("{FOLD_FN}({expr}) {forward}, {expr} {backward}, id ASC")
}

/// Filters, sorts and pages inside SQLite. Ties fall back to insertion
/// order so pages agree with the in-memory engine over `load_all_records`.
pub fn query_page(
    db_path: &Path,
    spec: &QuerySpec,
    policy: NormalizationPolicy,
) -> Result<PagePayload> {
    if spec.page_size <= 0 {
        anyhow::bail!("page_size must be greater than zero")
    }
    if spec.page <= 0 {
        anyhow::bail!("page must be 1 or greater")
    }

    init_db(db_path)?;
    let conn = open_connection(db_path)?;

    let mut filter_clauses = vec!["1 = 1".to_string()];
    let mut filter_params = Vec::<Value>::new();

    if !spec.state_filter.is_empty() {
        match policy {
            NormalizationPolicy::Exact => filter_clauses.push("state = ?".to_string()),
            NormalizationPolicy::CaseInsensitiveTrimmed => {
                filter_clauses.push(format!("{FOLD_TRIM_FN}(state) = ?"))
            }
        }
        filter_params.push(Value::Text(
            policy.normalize(&spec.state_filter).into_owned(),
        ));
    }

    let needle = spec.search_term.to_lowercase();
    if !needle.is_empty() {
        filter_clauses.push(format!(
            "(instr({FOLD_FN}(state), ?) > 0
              OR instr({FOLD_FN}(district), ?) > 0
              OR instr({FOLD_FN}(date), ?) > 0)"
        ));
        for _ in 0..3 {
            filter_params.push(Value::Text(needle.clone()));
        }
    }

    let where_sql = filter_clauses.join(" AND ");

    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM enrollment WHERE {where_sql}"),
            rusqlite::params_from_iter(filter_params.iter().cloned()),
            |row| row.get(0),
        )
        .context("failed to query filtered row count")?;

    let order_sql = match spec.sort_field {
        Some(field) => sort_clause(field, spec.sort_direction),
        None => "id ASC".to_string(),
    };
    let offset = (spec.page - 1).saturating_mul(spec.page_size);

    let row_sql = format!(
        "SELECT {RECORD_COLUMNS}
         FROM enrollment
         WHERE {where_sql}
         ORDER BY {order_sql}
         LIMIT ? OFFSET ?"
    );
    debug!(sql = %row_sql, offset, "paging enrollment rows");

    let mut row_params = filter_params;
    row_params.push(Value::Integer(spec.page_size));
    row_params.push(Value::Integer(offset));

    let mut row_stmt = conn
        .prepare(&row_sql)
        .context("failed to prepare page query")?;
    let rows = row_stmt
        .query_map(rusqlite::params_from_iter(row_params), read_record)
        .context("failed to query page rows")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect page rows")?;

    Ok(PagePayload {
        rows,
        total: usize::try_from(total).unwrap_or(0),
        page: spec.page,
        limit: spec.page_size,
    })
}

pub fn load_all_records(db_path: &Path) -> Result<Vec<EnrollmentRecord>> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM enrollment ORDER BY id ASC"
        ))
        .context("failed to prepare full load query")?;
    let records = stmt
        .query_map([], read_record)
        .context("failed to query enrollment rows")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect enrollment rows")?;
    Ok(records)
}

pub fn list_states(db_path: &Path) -> Result<Vec<String>> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(
            "SELECT DISTINCT state
             FROM enrollment
             WHERE state <> ''
             ORDER BY state ASC",
        )
        .context("failed to prepare states query")?;
    let states = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("failed to query states")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect states")?;
    Ok(states)
}

pub fn list_imports(db_path: &Path) -> Result<Vec<ImportMeta>> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(
            "SELECT id, kind, source_path, row_count, imported_at
             FROM import_batch
             ORDER BY id DESC",
        )
        .context("failed to prepare imports query")?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .context("failed to query imports")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect imports")?;

    rows.into_iter()
        .map(|(id, kind, source_path, row_count, imported_at)| {
            let kind = DatasetKind::parse(&kind)
                .with_context(|| format!("unknown dataset kind on import #{id}: {kind}"))?;
            Ok(ImportMeta {
                id: ImportId(id),
                kind,
                source_path,
                row_count,
                imported_at,
            })
        })
        .collect()
}

pub fn purge_import(db_path: &Path, import_id: i64) -> Result<()> {
    init_db(db_path)?;
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start purge transaction")?;
    tx.execute(
        "DELETE FROM enrollment WHERE import_id = ?1",
        params![import_id],
    )
    .with_context(|| format!("failed to delete rows for import #{import_id}"))?;
    let removed = tx
        .execute("DELETE FROM import_batch WHERE id = ?1", params![import_id])
        .with_context(|| format!("failed to delete import #{import_id}"))?;
    if removed == 0 {
        anyhow::bail!("import #{import_id} does not exist")
    }
    tx.commit().context("failed to commit purge transaction")?;
    Ok(())
}
