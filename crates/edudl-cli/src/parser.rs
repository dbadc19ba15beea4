//! Command-line parser.
//!
//! This module defines the root CLI structure and the download target syntax.

use std::convert::Infallible;
use std::str::FromStr;

use clap::Parser;

/// Download course materials concurrently into a local directory.
#[derive(Debug, Parser)]
#[command(name = "edudl")]
#[command(about = "Download course materials with a bounded number of parallel transfers")]
#[command(version)]
pub struct Cli {
    /// Files to download, as `URL` or `NAME=URL`
    #[arg(required = true, value_name = "TARGET")]
    pub targets: Vec<DownloadTarget>,

    /// Directory to save files into (defaults to the OS downloads folder)
    #[arg(short = 'd', long = "dir", env = "EDUDL_DOWNLOADS_DIR")]
    pub dir: Option<String>,

    /// Maximum number of simultaneous transfers
    #[arg(
        short = 'j',
        long = "max-concurrent",
        env = "EDUDL_MAX_CONCURRENT",
        default_value_t = edudl_core::ports::DEFAULT_MAX_CONCURRENT
    )]
    pub max_concurrent: u32,

    /// Fail a transfer after this many seconds without data (0 disables)
    #[arg(long = "idle-timeout", value_name = "SECS", default_value_t = 60)]
    pub idle_timeout_secs: u64,

    /// TCP/TLS connect timeout in seconds
    #[arg(long = "connect-timeout", value_name = "SECS", default_value_t = 30)]
    pub connect_timeout_secs: u64,

    /// Print every state snapshot as a JSON line instead of progress bars
    #[arg(long)]
    pub json: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// One requested download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    /// Source URL.
    pub url: String,
    /// Destination file name.
    pub filename: String,
}

impl FromStr for DownloadTarget {
    type Err = Infallible;

    /// `NAME=URL` is recognised when no `://` precedes the first `=`, so
    /// query strings in bare URLs are left alone.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((name, url)) = s.split_once('=') {
            if !name.contains("://") && !name.is_empty() {
                return Ok(Self {
                    url: url.to_string(),
                    filename: name.to_string(),
                });
            }
        }

        Ok(Self {
            url: s.to_string(),
            filename: filename_from_url(s),
        })
    }
}

/// Last non-empty path segment of a URL, without query or fragment.
fn filename_from_url(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    path.split_once('/')
        .and_then(|(_, path)| path.rsplit('/').find(|segment| !segment.is_empty()))
        .unwrap_or("download")
        .to_string()
}
