use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::Connection;

use crate::domain::engine::query_engine::TableQueryEngine;
use crate::domain::entities::dataset::{DatasetKind, ImportId, ImportMeta};
use crate::domain::entities::enrollment::{EnrollmentRecord, RecordField};
use crate::domain::entities::query::{PagePayload, QueryError, QuerySpec, SortDirection};
use crate::domain::entities::summary::{NormalizationPolicy, SummaryStats};
use crate::infra::sqlite::queries::{
    insert_records, list_imports, list_states, load_all_records, purge_import, query_page,
};
use crate::infra::sqlite::repo::SqliteRepo;
use crate::infra::sqlite::schema::init_db;
use crate::usecase::ports::repo::{EnrollmentRepository, NewImportMeta, RepoError};
use crate::usecase::ports::source::{
    FullCollectionSource, PagedRemoteSource, RecordSource, SourceError,
};
use crate::usecase::services::import_service::ImportService;
use crate::usecase::services::query_service::{QueryService, SummaryScope};
use crate::*;

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("samvidhan-{prefix}-{nanos}"))
}

fn sample_records() -> Vec<EnrollmentRecord> {
    vec![
        EnrollmentRecord::new("2024-01-01", "Bihar", "Patna", [10, 20, 30]).with_pincode("800001"),
        EnrollmentRecord::new("2024-01-02", "Bihar", "Gaya", [5, 5, 5]).with_pincode("823001"),
        EnrollmentRecord::new("2024-02-03", "Kerala", "Kochi", [7, 0, 12]),
        EnrollmentRecord::new("2024-02-03", "kerala", "kollam", [1, 1, 1]),
        EnrollmentRecord::new("2024-03-10", "Assam", "Patharkandi", [3, 9, 0]),
        EnrollmentRecord::new("2024-03-11", "Bihar", "patna", [2, 2, 2]),
        EnrollmentRecord::new("2024-03-12", "Goa", "North Goa", [0, 4, 8]).with_pincode("403001"),
    ]
}

fn seeded_db(prefix: &str) -> (PathBuf, PathBuf) {
    let temp_dir = unique_test_dir(prefix);
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("enrollment.sqlite");
    init_db(&db_path).expect("init_db should succeed");
    insert_records(&db_path, DatasetKind::Enrollment, "sample.csv", &sample_records())
        .expect("records should be inserted");
    (temp_dir, db_path)
}

#[test]
fn init_db_creates_required_tables() {
    let temp_dir = unique_test_dir("init-db");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("enrollment.sqlite");

    let result = init_db(&db_path);

    assert!(result.is_ok(), "init_db should succeed: {result:?}");

    let conn = Connection::open(&db_path).expect("should open sqlite db");
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('import_batch','enrollment')",
            [],
            |row| row.get(0),
        )
        .expect("table count query should succeed");

    assert_eq!(table_count, 2, "required tables should exist");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn inserted_records_load_back_in_insertion_order() {
    let (temp_dir, db_path) = seeded_db("load-all");

    let loaded = load_all_records(&db_path).expect("records should load");

    assert_eq!(loaded, sample_records());
    assert_eq!(loaded[2].pincode, None, "missing pincode should stay missing");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn sqlite_pages_agree_with_in_memory_engine() {
    let (temp_dir, db_path) = seeded_db("paged-agreement");
    let records = load_all_records(&db_path).expect("records should load");
    let engine = TableQueryEngine::default();

    let mut specs = Vec::new();
    for field in RecordField::ALL {
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            specs.push(QuerySpec {
                sort_field: Some(field),
                sort_direction: direction,
                page_size: 3,
                ..QuerySpec::default()
            });
        }
    }
    specs.push(QuerySpec {
        search_term: "PAT".to_string(),
        page_size: 2,
        ..QuerySpec::default()
    });
    specs.push(QuerySpec {
        state_filter: "Bihar".to_string(),
        search_term: "2024-03".to_string(),
        sort_field: Some(RecordField::District),
        page_size: 1,
        ..QuerySpec::default()
    });

    for spec in specs {
        for page in 1..=4 {
            let spec = spec.with_page(page);
            let expected = engine.query(&records, &spec).expect("engine query");
            let payload = query_page(&db_path, &spec, NormalizationPolicy::Exact)
                .expect("sqlite query");

            assert_eq!(payload.total, expected.total, "total for {spec:?}");
            assert_eq!(payload.rows, expected.rows, "rows for {spec:?}");
            assert_eq!(payload.page, page);
            assert_eq!(payload.limit, spec.page_size);
        }
    }

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn sqlite_state_filter_follows_normalization_policy() {
    let (temp_dir, db_path) = seeded_db("state-policy");
    let spec = QuerySpec {
        state_filter: " KERALA ".to_string(),
        ..QuerySpec::default()
    };

    let exact = query_page(&db_path, &spec, NormalizationPolicy::Exact).expect("exact query");
    assert_eq!(exact.total, 0);

    let relaxed = query_page(&db_path, &spec, NormalizationPolicy::CaseInsensitiveTrimmed)
        .expect("relaxed query");
    assert_eq!(relaxed.total, 2);
    let districts: Vec<&str> = relaxed.rows.iter().map(|row| row.district.as_str()).collect();
    assert_eq!(districts, vec!["Kochi", "kollam"]);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn sqlite_pages_agree_with_engine_on_non_ascii_labels() {
    let (temp_dir, db_path) = seeded_db("non-ascii");
    let extra = vec![
        EnrollmentRecord::new("2024-04-01", "ÉTAT", "ÖRT", [4, 4, 4]),
        EnrollmentRecord::new("2024-04-02", "\u{a0}état\t", "örebro", [1, 0, 0]),
        EnrollmentRecord::new("2024-04-03", "Étoile", "Ängel", [0, 2, 0]),
        EnrollmentRecord::new("2024-04-04", "Goa", "Panaji", [3, 3, 3]),
    ];
    insert_records(&db_path, DatasetKind::Demographic, "extra.csv", &extra)
        .expect("extra records should be inserted");
    let records = load_all_records(&db_path).expect("records should load");

    let mut specs = vec![
        QuerySpec {
            search_term: "état".to_string(),
            ..QuerySpec::default()
        },
        QuerySpec {
            search_term: "ÖR".to_string(),
            ..QuerySpec::default()
        },
        QuerySpec {
            state_filter: "état".to_string(),
            ..QuerySpec::default()
        },
        QuerySpec {
            state_filter: " ÉTAT ".to_string(),
            ..QuerySpec::default()
        },
    ];
    for field in [RecordField::State, RecordField::District] {
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            specs.push(QuerySpec {
                sort_field: Some(field),
                sort_direction: direction,
                page_size: 4,
                ..QuerySpec::default()
            });
        }
    }

    for policy in [NormalizationPolicy::Exact, NormalizationPolicy::CaseInsensitiveTrimmed] {
        let engine = TableQueryEngine::new(policy, MAX_PAGE_SIZE);
        for spec in &specs {
            for page in 1..=3 {
                let spec = spec.with_page(page);
                let expected = engine.query(&records, &spec).expect("engine query");
                let payload = query_page(&db_path, &spec, policy).expect("sqlite query");

                assert_eq!(payload.total, expected.total, "total for {policy:?} {spec:?}");
                assert_eq!(payload.rows, expected.rows, "rows for {policy:?} {spec:?}");
            }
        }
    }

    let searched = query_page(
        &db_path,
        &QuerySpec {
            search_term: "état".to_string(),
            ..QuerySpec::default()
        },
        NormalizationPolicy::Exact,
    )
    .expect("sqlite query");
    assert_eq!(searched.total, 2, "upper-case ÉTAT folds onto the search term");

    let filtered = query_page(
        &db_path,
        &QuerySpec {
            state_filter: "état".to_string(),
            ..QuerySpec::default()
        },
        NormalizationPolicy::CaseInsensitiveTrimmed,
    )
    .expect("sqlite query");
    let districts: Vec<&str> = filtered.rows.iter().map(|row| row.district.as_str()).collect();
    assert_eq!(districts, vec!["ÖRT", "örebro"], "non-breaking space and tab are trimmed");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn sqlite_query_page_rejects_invalid_paging() {
    let (temp_dir, db_path) = seeded_db("invalid-paging");

    let err = query_page(
        &db_path,
        &QuerySpec {
            page_size: 0,
            ..QuerySpec::default()
        },
        NormalizationPolicy::Exact,
    )
    .expect_err("page_size 0 should fail");
    assert!(err.to_string().contains("page_size"), "unexpected error: {err:#}");

    let err = query_page(
        &db_path,
        &QuerySpec::default().with_page(0),
        NormalizationPolicy::Exact,
    )
    .expect_err("page 0 should fail");
    assert!(err.to_string().contains("page must be"), "unexpected error: {err:#}");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn list_states_returns_sorted_distinct_labels() {
    let (temp_dir, db_path) = seeded_db("list-states");

    let states = list_states(&db_path).expect("states should load");

    assert_eq!(states, vec!["Assam", "Bihar", "Goa", "Kerala", "kerala"]);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn purge_import_removes_only_its_rows() {
    let (temp_dir, db_path) = seeded_db("purge");
    let second = vec![EnrollmentRecord::new("2024-04-01", "Punjab", "Amritsar", [1, 2, 3])];
    let second_id = insert_records(&db_path, DatasetKind::Biometric, "bio.csv", &second)
        .expect("second import should be inserted");

    let imports = list_imports(&db_path).expect("imports should list");
    assert_eq!(imports.len(), 2);
    assert_eq!(imports[0].id, ImportId(second_id), "newest import first");
    assert_eq!(imports[0].kind, DatasetKind::Biometric);
    assert_eq!(imports[0].row_count, 1);
    assert_eq!(imports[1].row_count, sample_records().len() as i64);

    let first_id = imports[1].id.0;
    purge_import(&db_path, first_id).expect("purge should succeed");

    assert_eq!(load_all_records(&db_path).expect("records should load"), second);
    let err = purge_import(&db_path, first_id).expect_err("second purge should fail");
    assert!(err.to_string().contains("does not exist"), "unexpected error: {err:#}");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn import_service_reads_all_layouts_and_consolidates_each_file() {
    let temp_dir = unique_test_dir("import-service");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let db_path = temp_dir.join("enrollment.sqlite");

    let enrollment_csv = temp_dir.join("enrollment.csv");
    fs::write(
        &enrollment_csv,
        "date,state,district,pincode,age_0_5,age_5_17,age_18_greater\n\
         01-03-2025,Bihar,Patna,800001,10,20,30\n\
         01-03-2025,Bihar,Patna,800001,1,2,3\n\
         ,,,,,,\n\
         02-03-2025,Kerala,Kochi,682001,\"1,204\",0,5\n",
    )
    .expect("should write enrollment csv");

    let demographic_csv = temp_dir.join("demographic.csv");
    fs::write(
        &demographic_csv,
        "date,state,district,pincode,demo_age_5_17,demo_age_17_\n\
         01-03-2025,Goa,North Goa,403001,4,6\n",
    )
    .expect("should write demographic csv");

    let biometric_csv = temp_dir.join("biometric.csv");
    fs::write(
        &biometric_csv,
        "date,state,district,pincode,bio_age_5_17,bio_age_17_\n\
         01-03-2025,Goa,North Goa,403001,2,2\n",
    )
    .expect("should write biometric csv");

    let repo: Arc<dyn EnrollmentRepository> =
        Arc::new(SqliteRepo::new(db_path.clone(), NormalizationPolicy::Exact));
    let service = ImportService::new(repo.clone());

    let enrolled = service
        .import_csv(&enrollment_csv, DatasetKind::Enrollment)
        .expect("enrollment import should succeed");
    assert_eq!(enrolled.row_count, 2, "duplicate Patna rows merge, blank row drops");

    service
        .import_csv(&demographic_csv, DatasetKind::Demographic)
        .expect("demographic import should succeed");
    service
        .import_csv(&biometric_csv, DatasetKind::Biometric)
        .expect("biometric import should succeed");

    let records = repo.load_all().expect("records should load");
    assert_eq!(records.len(), 4);
    assert_eq!(
        records[0],
        EnrollmentRecord::new("2025-03-01", "Bihar", "Patna", [11, 22, 33]).with_pincode("800001")
    );
    assert_eq!(records[1].age_0_5, 1204);
    assert_eq!(records[2].age_0_5, 0, "demographic layout has no 0-5 band");
    assert_eq!(records[2].age_5_17, 4);
    assert_eq!(records[2].age_18_greater, 6);

    let imports: Vec<ImportMeta> = service.list_imports().expect("imports should list");
    let kinds: Vec<DatasetKind> = imports.iter().map(|meta| meta.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DatasetKind::Biometric,
            DatasetKind::Demographic,
            DatasetKind::Enrollment
        ]
    );

    service
        .purge_import(enrolled.import_id)
        .expect("purge should succeed");
    assert_eq!(repo.load_all().expect("records should load").len(), 2);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn import_service_rejects_headers_without_count_columns() {
    let temp_dir = unique_test_dir("import-bad-header");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let csv_path = temp_dir.join("bad.csv");
    fs::write(&csv_path, "date,state,district\n01-03-2025,Goa,North Goa\n")
        .expect("should write csv");

    let repo: Arc<dyn EnrollmentRepository> = Arc::new(SqliteRepo::new(
        temp_dir.join("enrollment.sqlite"),
        NormalizationPolicy::Exact,
    ));
    let err = ImportService::new(repo.clone())
        .import_csv(&csv_path, DatasetKind::Enrollment)
        .expect_err("missing count columns should fail");

    assert!(
        format!("{err:#}").contains("count columns"),
        "unexpected error: {err:#}"
    );
    assert!(repo.list_imports().expect("imports should list").is_empty());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn paged_and_full_sources_summarize_the_same_way() {
    let (temp_dir, db_path) = seeded_db("summary-scopes");
    let repo: Arc<dyn EnrollmentRepository> =
        Arc::new(SqliteRepo::new(db_path.clone(), NormalizationPolicy::Exact));
    let records = repo.load_all().expect("records should load");

    let full = QueryService::new(
        Arc::new(FullCollectionSource::new(records, TableQueryEngine::default())),
        NormalizationPolicy::Exact,
    );
    let paged = QueryService::new(
        Arc::new(PagedRemoteSource::new(repo, TableQueryEngine::default())),
        NormalizationPolicy::Exact,
    );

    let spec = QuerySpec {
        state_filter: "Bihar".to_string(),
        page_size: 2,
        ..QuerySpec::default()
    };

    for service in [&full, &paged] {
        assert_eq!(
            service.summarize(SummaryScope::All, &spec).expect("all"),
            SummaryStats {
                record_count: 7,
                total_enrollments: 127,
                distinct_states: 5,
                distinct_districts: 7,
            }
        );
        assert_eq!(
            service.summarize(SummaryScope::Matching, &spec).expect("matching"),
            SummaryStats {
                record_count: 3,
                total_enrollments: 81,
                distinct_states: 1,
                distinct_districts: 3,
            }
        );
        assert_eq!(
            service
                .summarize(SummaryScope::CurrentPage, &spec)
                .expect("current page"),
            SummaryStats {
                record_count: 2,
                total_enrollments: 75,
                distinct_states: 1,
                distinct_districts: 2,
            }
        );
        assert_eq!(
            service.states().expect("states"),
            vec!["Assam", "Bihar", "Goa", "Kerala", "kerala"]
        );
    }

    let relaxed = QueryService::new(
        Arc::new(FullCollectionSource::new(
            sample_records(),
            TableQueryEngine::default(),
        )),
        NormalizationPolicy::CaseInsensitiveTrimmed,
    );
    let stats = relaxed
        .summarize(SummaryScope::All, &QuerySpec::default())
        .expect("relaxed summary");
    assert_eq!(stats.distinct_states, 4, "Kerala and kerala collapse");
    assert_eq!(stats.distinct_districts, 6, "Patna and patna collapse");

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn query_service_charts_cover_every_record() {
    let service = QueryService::new(
        Arc::new(FullCollectionSource::new(
            sample_records(),
            TableQueryEngine::default(),
        )),
        NormalizationPolicy::Exact,
    );

    let top = service.state_distribution(2).expect("distribution");
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].state, "Bihar");
    assert_eq!(top[0].total_enrollments, 81);

    let timeline = service.timeline().expect("timeline");
    let months: Vec<&str> = timeline.iter().map(|point| point.month.as_str()).collect();
    assert_eq!(months, vec!["2024-01-01", "2024-02-01", "2024-03-01"]);
    assert_eq!(timeline.iter().map(|point| point.total).sum::<u64>(), 127);

    let points = service.choropleth().expect("choropleth");
    let bihar = points
        .iter()
        .find(|point| point.location == "Bihar")
        .expect("Bihar should be on the map");
    assert_eq!(bihar.value, 81);
    assert_eq!(bihar.label, "Bihar: 81 enrollments");
}

/// Records every call so tests can see whether the backend was reached.
struct RecordingRepo {
    payload: PagePayload,
    calls: Mutex<usize>,
}

impl RecordingRepo {
    fn new(payload: PagePayload) -> Self {
        Self {
            payload,
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().expect("lock should not be poisoned")
    }
}

impl EnrollmentRepository for RecordingRepo {
    fn init(&self) -> Result<(), RepoError> {
        Ok(())
    }

    fn insert_records(
        &self,
        _meta: NewImportMeta,
        _records: &[EnrollmentRecord],
    ) -> Result<ImportId, RepoError> {
        Err(RepoError::Message("read-only".to_string()))
    }

    fn query_page(&self, _spec: &QuerySpec) -> Result<PagePayload, RepoError> {
        *self.calls.lock().expect("lock should not be poisoned") += 1;
        Ok(self.payload.clone())
    }

    fn load_all(&self) -> Result<Vec<EnrollmentRecord>, RepoError> {
        Ok(self.payload.rows.clone())
    }

    fn list_states(&self) -> Result<Vec<String>, RepoError> {
        Ok(Vec::new())
    }

    fn list_imports(&self) -> Result<Vec<ImportMeta>, RepoError> {
        Ok(Vec::new())
    }

    fn purge_import(&self, _id: ImportId) -> Result<(), RepoError> {
        Ok(())
    }
}

#[test]
fn paged_source_validates_before_reaching_backend() {
    let repo = Arc::new(RecordingRepo::new(PagePayload {
        rows: Vec::new(),
        total: 0,
        page: 1,
        limit: DEFAULT_PAGE_SIZE,
    }));
    let source = PagedRemoteSource::new(repo.clone(), TableQueryEngine::default());

    let err = source
        .fetch(&QuerySpec {
            page_size: 0,
            ..QuerySpec::default()
        })
        .expect_err("page_size 0 should fail");
    assert!(matches!(
        err,
        SourceError::Query(QueryError::InvalidPageSize(0))
    ));

    let err = source
        .fetch(&QuerySpec {
            page_size: MAX_PAGE_SIZE + 1,
            ..QuerySpec::default()
        })
        .expect_err("oversized page_size should fail");
    assert!(matches!(
        err,
        SourceError::Query(QueryError::PageSizeTooLarge { .. })
    ));
    assert_eq!(repo.calls(), 0, "invalid specs never reach the backend");

    source
        .fetch(&QuerySpec::default())
        .expect("valid spec should be served");
    assert_eq!(repo.calls(), 1);
}

#[test]
fn paged_source_rejects_backend_pages_larger_than_requested() {
    let repo = Arc::new(RecordingRepo::new(PagePayload {
        rows: sample_records(),
        total: 7,
        page: 1,
        limit: 2,
    }));
    let source = PagedRemoteSource::new(repo, TableQueryEngine::default());

    let err = source
        .fetch(&QuerySpec {
            page_size: 2,
            ..QuerySpec::default()
        })
        .expect_err("oversized backend page should fail");

    assert!(matches!(
        err,
        SourceError::OversizedPage {
            rows: 7,
            page_size: 2
        }
    ));
}

#[test]
fn default_paths_use_samvidhan_app_directory() {
    let db_path = default_db_path().expect("default db path should resolve");
    let config_path = default_config_path().expect("default config path should resolve");

    assert_eq!(
        db_path.file_name().and_then(|name| name.to_str()),
        Some("enrollment.sqlite")
    );
    assert_eq!(
        config_path.file_name().and_then(|name| name.to_str()),
        Some("explorer.toml")
    );
}
