use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tabledoc_core::TableConfig;
use tracing::debug;

use crate::args::Options;

pub(crate) fn default_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tabledoc")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

fn load_file(path: &Path) -> Result<TableConfig> {
    TableConfig::load(path).with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Settings for a new document: an explicit `--config` file, else the user's
/// config file when present, else defaults; then `--rows`/`--cols` on top.
pub(crate) fn resolve(options: &Options) -> Result<TableConfig> {
    let mut config = match &options.config {
        Some(path) => load_file(path)?,
        None => match default_config_path().filter(|path| path.is_file()) {
            Some(path) => {
                debug!(path = %path.display(), "using user config");
                load_file(&path)?
            }
            None => TableConfig::default(),
        },
    };

    if let Some(rows) = options.rows {
        config.rows = rows;
    }
    if let Some(cols) = options.cols {
        config.cols = cols;
    }
    config.validate().context("Invalid document settings")?;
    Ok(config)
}
