use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::engine::query_engine::TableQueryEngine;
use crate::domain::entities::summary::NormalizationPolicy;
use crate::logging::LogFormat;
use crate::{default_config_path, default_db_path};
use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SEARCH_DEBOUNCE_MS};

pub const DB_PATH_ENV: &str = "SAMVIDHAN_DB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExplorerConfig {
    pub db_path: Option<PathBuf>,
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub normalization: NormalizationPolicy,
    pub search_debounce_ms: u64,
    pub log_format: LogFormat,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
            normalization: NormalizationPolicy::Exact,
            search_debounce_ms: SEARCH_DEBOUNCE_MS,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ExplorerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("failed to parse explorer config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config: {}", path.display()))
    }

    pub fn load_default() -> Result<Self> {
        Self::load(&default_config_path()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_page_size <= 0 {
            anyhow::bail!("max_page_size must be greater than zero")
        }
        if self.default_page_size <= 0 || self.default_page_size > self.max_page_size {
            anyhow::bail!(
                "default_page_size must be between 1 and {} (got {})",
                self.max_page_size,
                self.default_page_size
            )
        }
        Ok(())
    }

    /// `SAMVIDHAN_DB` wins, then the configured path, then the per-user default.
    pub fn resolve_db_path(&self) -> Result<PathBuf> {
        self.resolve_db_path_with(std::env::var_os(DB_PATH_ENV))
    }

    pub fn resolve_db_path_with(&self, env_override: Option<OsString>) -> Result<PathBuf> {
        if let Some(path) = env_override.filter(|path| !path.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => default_db_path(),
        }
    }

    pub fn engine(&self) -> TableQueryEngine {
        TableQueryEngine::new(self.normalization, self.max_page_size)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
