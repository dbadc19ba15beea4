//! Terminal rendering of download snapshots.

use std::collections::HashMap;
use std::io::{self, Write};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use edudl_core::download::{Download, DownloadId, DownloadStatus, DownloadsSnapshot};

const BAR_TEMPLATE: &str =
    "{spinner:.green} {prefix:<24!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {prefix:<24!} {bytes} {msg}";

/// Renders snapshots as progress bars or JSON lines.
pub struct Monitor {
    mode: Mode,
    last_seq: u64,
}

enum Mode {
    Json,
    Bars {
        multi: MultiProgress,
        bars: HashMap<DownloadId, ProgressBar>,
    },
}

impl Monitor {
    /// One progress bar per download.
    pub fn bars() -> Self {
        Self {
            mode: Mode::Bars {
                multi: MultiProgress::new(),
                bars: HashMap::new(),
            },
            last_seq: 0,
        }
    }

    /// One JSON document per snapshot on stdout.
    pub const fn json() -> Self {
        Self {
            mode: Mode::Json,
            last_seq: 0,
        }
    }

    /// Render a snapshot. Snapshots not newer than the last rendered one are skipped.
    pub fn render(&mut self, snapshot: &DownloadsSnapshot) -> io::Result<()> {
        if snapshot.seq <= self.last_seq {
            return Ok(());
        }
        self.last_seq = snapshot.seq;

        match &mut self.mode {
            Mode::Json => {
                let line = serde_json::to_string(snapshot).map_err(io::Error::other)?;
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{line}")?;
                stdout.flush()
            }
            Mode::Bars { multi, bars } => {
                for download in &snapshot.downloads {
                    let bar = bars
                        .entry(download.id)
                        .or_insert_with(|| new_bar(multi, download));
                    update_bar(bar, download);
                }
                Ok(())
            }
        }
    }
}

fn new_bar(multi: &MultiProgress, download: &Download) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(0));
    bar.set_prefix(download.filename.clone());
    bar
}

fn update_bar(bar: &ProgressBar, download: &Download) {
    if bar.is_finished() {
        return;
    }

    let template = if download.total_size > 0 {
        BAR_TEMPLATE
    } else {
        SPINNER_TEMPLATE
    };
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style.progress_chars("█▓░"));
    }
    bar.set_length(download.total_size);
    bar.set_position(download.downloaded_size);

    match download.status {
        DownloadStatus::Pending => bar.set_message("queued"),
        DownloadStatus::Downloading => bar.set_message(format!("{:.0}%", download.progress)),
        DownloadStatus::Completed => bar.finish_with_message("done"),
        DownloadStatus::Cancelled => bar.abandon_with_message("cancelled"),
        DownloadStatus::Failed => bar.abandon_with_message(format!(
            "failed: {}",
            download.error.as_deref().unwrap_or("unknown error")
        )),
    }
}
