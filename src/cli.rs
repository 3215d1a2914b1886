use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ExplorerConfig;
use crate::domain::entities::dataset::{DatasetKind, ImportId};
use crate::domain::entities::enrollment::{EnrollmentRecord, RecordField};
use crate::domain::entities::query::{QueryError, QuerySpec, SortDirection};
use crate::infra::sqlite::repo::SqliteRepo;
use crate::ui::state::explorer_state::ExplorerState;
use crate::usecase::ports::repo::EnrollmentRepository;
use crate::usecase::ports::source::{FullCollectionSource, PagedRemoteSource, RecordSource};
use crate::usecase::services::import_service::ImportService;
use crate::usecase::services::query_service::{QueryService, SummaryScope};

#[derive(Debug, Parser)]
#[command(name = "samvidhan-explorer")]
#[command(about = "Explore state-wise Aadhaar enrollment data")]
pub struct Cli {
    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Import a CSV or XLSX export into the local store.
    Import {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = KindCli::Enrollment)]
        kind: KindCli,
        /// Worksheet to read from an XLSX file; the first sheet by default.
        #[arg(long)]
        sheet: Option<String>,
    },
    /// List past imports.
    Imports,
    /// Remove one import and its rows.
    Purge { id: i64 },
    /// Show one page of the enrollment table.
    Query {
        #[command(flatten)]
        view: ViewArgs,
        #[command(flatten)]
        paging: PageArgs,
    },
    /// Roll-up statistics for the summary cards.
    Summary {
        #[command(flatten)]
        view: ViewArgs,
        /// Paging only matters for `--scope current-page`.
        #[command(flatten)]
        paging: PageArgs,
        #[arg(long, value_enum, default_value_t = ScopeCli::All)]
        scope: ScopeCli,
    },
    /// Distinct state names.
    States,
    /// States ranked by total enrollments.
    Distribution {
        #[arg(long, default_value_t = 6)]
        top: usize,
    },
    /// Monthly enrollment totals.
    Timeline,
    /// Per-state values for a choropleth map.
    Choropleth,
}

#[derive(Debug, Clone, clap::Args)]
pub struct ViewArgs {
    #[arg(long, default_value = "")]
    pub search: String,
    #[arg(long, default_value = "")]
    pub state: String,
    /// Let the store filter and page instead of loading every row.
    #[arg(long, value_enum, default_value_t = SourceCli::Full)]
    pub source: SourceCli,
}

#[derive(Debug, Clone, clap::Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: i64,
    #[arg(long)]
    pub page_size: Option<i64>,
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long, value_enum, default_value_t = OrderCli::Asc)]
    pub order: OrderCli,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindCli {
    Enrollment,
    Demographic,
    Biometric,
}

impl From<KindCli> for DatasetKind {
    fn from(value: KindCli) -> Self {
        match value {
            KindCli::Enrollment => DatasetKind::Enrollment,
            KindCli::Demographic => DatasetKind::Demographic,
            KindCli::Biometric => DatasetKind::Biometric,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderCli {
    Asc,
    Desc,
}

impl From<OrderCli> for SortDirection {
    fn from(value: OrderCli) -> Self {
        match value {
            OrderCli::Asc => SortDirection::Asc,
            OrderCli::Desc => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeCli {
    All,
    Matching,
    CurrentPage,
}

impl From<ScopeCli> for SummaryScope {
    fn from(value: ScopeCli) -> Self {
        match value {
            ScopeCli::All => SummaryScope::All,
            ScopeCli::Matching => SummaryScope::Matching,
            ScopeCli::CurrentPage => SummaryScope::CurrentPage,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceCli {
    Full,
    Paged,
}

impl Cli {
    pub fn load_config(&self) -> Result<ExplorerConfig> {
        match &self.config {
            Some(path) => ExplorerConfig::load(path),
            None => ExplorerConfig::load_default(),
        }
    }
}

pub fn parse_sort_field(name: &str) -> Result<RecordField> {
    RecordField::parse(name)
        .ok_or_else(|| QueryError::UnknownSortField(name.to_string()))
        .with_context(|| {
            let known: Vec<&str> = RecordField::ALL.iter().map(|field| field.name()).collect();
            format!("invalid --sort value, expected one of {}", known.join(", "))
        })
}

/// Builds the view state and the query it asks for. The state carries the
/// search, filter and page size; sort and page come straight from the flags.
pub fn view_query(
    config: &ExplorerConfig,
    view: &ViewArgs,
    paging: &PageArgs,
) -> Result<(ExplorerState, QuerySpec)> {
    let mut state = ExplorerState::new(
        paging.page_size.unwrap_or(config.default_page_size),
        config.search_debounce(),
    );
    state.set_search_term(&view.search);
    state.set_state_filter(&view.state);
    let spec = QuerySpec {
        sort_field: paging.sort.as_deref().map(parse_sort_field).transpose()?,
        sort_direction: paging.order.into(),
        page: paging.page,
        ..state.spec().clone()
    };
    Ok((state, spec))
}

pub fn run(cli: Cli, config: ExplorerConfig) -> Result<()> {
    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => config.resolve_db_path()?,
    };
    let repo: Arc<dyn EnrollmentRepository> =
        Arc::new(SqliteRepo::new(db_path.clone(), config.normalization));
    repo.init()
        .with_context(|| format!("failed to initialise store at {}", db_path.display()))?;

    match cli.command {
        Command::Import { path, kind, sheet } => {
            let service = ImportService::new(repo);
            let result = if is_xlsx(&path) {
                service.import_xlsx(&path, kind.into(), sheet.as_deref())?
            } else {
                service.import_csv(&path, kind.into())?
            };
            emit(cli.json, &result, || {
                format!(
                    "imported {} rows as import #{}",
                    result.row_count, result.import_id.0
                )
            })
        }
        Command::Imports => {
            let imports = ImportService::new(repo).list_imports()?;
            emit(cli.json, &imports, || {
                imports
                    .iter()
                    .map(|meta| {
                        format!(
                            "#{}\t{}\t{}\t{} rows\t{}",
                            meta.id.0,
                            meta.kind.as_str(),
                            meta.source_path,
                            meta.row_count,
                            meta.imported_at
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Purge { id } => {
            ImportService::new(repo).purge_import(ImportId(id))?;
            emit(cli.json, &id, || format!("purged import #{id}"))
        }
        Command::Query { view, paging } => {
            let service = query_service(&config, repo, view.source)?;
            let (mut state, spec) = view_query(&config, &view, &paging)?;

            let result = service.query_page(&spec)?;
            state.apply_result(&result);
            state.go_to_page(spec.page);
            emit(cli.json, &result, || {
                let mut lines = vec![table_header()];
                lines.extend(result.rows.iter().map(table_row));
                lines.push(state.status_line(result.rows.len()));
                lines.join("\n")
            })
        }
        Command::Summary {
            view,
            paging,
            scope,
        } => {
            let service = query_service(&config, repo, view.source)?;
            let (_, spec) = view_query(&config, &view, &paging)?;
            let stats = service.summarize(scope.into(), &spec)?;
            emit(cli.json, &stats, || {
                format!(
                    "records\t{}\nenrollments\t{}\nstates\t{}\ndistricts\t{}",
                    stats.record_count,
                    stats.total_enrollments,
                    stats.distinct_states,
                    stats.distinct_districts
                )
            })
        }
        Command::States => {
            let states = query_service(&config, repo, SourceCli::Paged)?.states()?;
            emit(cli.json, &states, || states.join("\n"))
        }
        Command::Distribution { top } => {
            let ranked = query_service(&config, repo, SourceCli::Full)?.state_distribution(top)?;
            emit(cli.json, &ranked, || {
                ranked
                    .iter()
                    .map(|entry| format!("{}\t{}", entry.state, entry.total_enrollments))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Timeline => {
            let timeline = query_service(&config, repo, SourceCli::Full)?.timeline()?;
            emit(cli.json, &timeline, || {
                timeline
                    .iter()
                    .map(|point| format!("{}\t{}", point.month, point.total))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
        Command::Choropleth => {
            let points = query_service(&config, repo, SourceCli::Full)?.choropleth()?;
            emit(cli.json, &points, || {
                points
                    .iter()
                    .map(|point| format!("{}\t{}\t{}", point.location, point.value, point.label))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

fn query_service(
    config: &ExplorerConfig,
    repo: Arc<dyn EnrollmentRepository>,
    source: SourceCli,
) -> Result<QueryService> {
    let source: Arc<dyn RecordSource> = match source {
        SourceCli::Full => {
            let records = repo.load_all().context("failed to load enrollment rows")?;
            let source = FullCollectionSource::new(records, config.engine());
            if source.is_empty() {
                warn!("store holds no enrollment rows; run `import` first");
            } else {
                debug!(records = source.len(), "loaded full collection");
            }
            Arc::new(source)
        }
        SourceCli::Paged => Arc::new(PagedRemoteSource::new(repo, config.engine())),
    };
    Ok(QueryService::new(source, config.normalization))
}

fn is_xlsx(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "xlsx" | "xlsm" | "xls" | "ods"))
}

fn table_header() -> String {
    RecordField::ALL
        .iter()
        .map(|field| field.name())
        .collect::<Vec<_>>()
        .join("\t")
}

fn table_row(record: &EnrollmentRecord) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        record.date,
        record.state,
        record.district,
        record.pincode.as_deref().unwrap_or("-"),
        record.age_0_5,
        record.age_5_17,
        record.age_18_greater
    )
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(value).context("failed to render json")?;
        println!("{rendered}");
    } else {
        println!("{}", text());
    }
    Ok(())
}
