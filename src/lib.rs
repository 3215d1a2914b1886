use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::ProjectDirs;

pub mod cli;
pub mod config;
pub mod domain;
pub mod infra;
pub mod logging;
pub mod ui;
pub mod usecase;

pub const DEFAULT_PAGE_SIZE: i64 = 25;
pub const MAX_PAGE_SIZE: i64 = 1000;
pub const SEARCH_DEBOUNCE_MS: u64 = 300;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("in", "samvidhan", "explorer")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_local_dir().join("enrollment.sqlite"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("explorer.toml"))
}

#[cfg(test)]
mod tests;
