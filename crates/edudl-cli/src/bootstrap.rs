//! Configuration assembly for the binary.

use std::time::Duration;

use anyhow::{Context, Result};

use edudl_core::paths::{DownloadsDirSource, resolve_downloads_dir};
use edudl_core::ports::DownloadManagerConfig;

use crate::parser::Cli;

/// Build and validate the manager configuration from parsed arguments.
///
/// The downloads directory comes from `--dir` (or `EDUDL_DOWNLOADS_DIR`),
/// falling back to the platform downloads folder.
pub fn build_config(cli: &Cli) -> Result<DownloadManagerConfig> {
    let resolution = resolve_downloads_dir(cli.dir.as_deref())
        .context("Failed to resolve the downloads directory")?;
    if resolution.source == DownloadsDirSource::Default {
        tracing::debug!(path = %resolution.path.display(), "Using default downloads directory");
    }

    let idle_timeout = (cli.idle_timeout_secs > 0).then(|| Duration::from_secs(cli.idle_timeout_secs));
    let config = DownloadManagerConfig::new(resolution.path)
        .with_max_concurrent(cli.max_concurrent)
        .with_idle_timeout(idle_timeout)
        .with_connect_timeout(Duration::from_secs(cli.connect_timeout_secs));

    config.validate().context("Invalid download settings")?;
    Ok(config)
}
