//! CLI entry point - the composition root.
//!
//! This is the ONLY place where the transport, observer and manager are
//! wired together and where logging is initialised.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use edudl_cli::{Cli, Monitor, build_config};
use edudl_core::download::{DownloadStatus, DownloadsSnapshot};
use edudl_download::{
    DownloadManagerDeps, DownloadManagerPort, ReqwestTransport, WatchObserver,
    build_download_manager,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = build_config(&cli)?;
    tracing::info!(
        dir = %config.downloads_directory.display(),
        max_concurrent = config.max_concurrent,
        "Starting downloads"
    );

    let transport = ReqwestTransport::from_config(&config).context("Failed to set up HTTP")?;
    let observer = Arc::new(WatchObserver::new());
    let mut snapshots = observer.subscribe();
    let manager = build_download_manager(DownloadManagerDeps {
        transport: Arc::new(transport),
        observer: Arc::clone(&observer),
        config,
    })?;

    for target in &cli.targets {
        manager.add(&target.url, &target.filename).await;
    }

    let mut monitor = if cli.json {
        Monitor::json()
    } else {
        Monitor::bars()
    };
    let expected = cli.targets.len();
    let mut interrupted = false;

    let finished = loop {
        let snapshot = snapshots.borrow_and_update().clone();
        monitor.render(&snapshot)?;
        if is_done(&snapshot, expected, interrupted) {
            break snapshot;
        }

        tokio::select! {
            changed = snapshots.changed() => changed.context("Download manager stopped unexpectedly")?,
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                signal.context("Failed to listen for Ctrl-C")?;
                interrupted = true;
                let stopped = manager.shutdown().await;
                eprintln!("Interrupted, stopping {stopped} active download(s)...");
            }
        }
    };

    report(&finished)
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Every target has finished, or an interrupt has drained the running ones.
fn is_done(snapshot: &DownloadsSnapshot, expected: usize, interrupted: bool) -> bool {
    if snapshot.downloads.len() < expected {
        return false;
    }
    if interrupted {
        return snapshot.active_count == 0;
    }
    snapshot.all_terminal()
}

fn report(snapshot: &DownloadsSnapshot) -> Result<()> {
    let completed = snapshot.count_with_status(DownloadStatus::Completed);
    let failed = snapshot.count_with_status(DownloadStatus::Failed);
    let unfinished = snapshot.downloads.len() - completed - failed;

    for download in &snapshot.downloads {
        if download.status == DownloadStatus::Failed {
            eprintln!(
                "{}: {}",
                download.filename,
                download.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    eprintln!("{completed} completed, {failed} failed, {unfinished} not finished");

    if failed > 0 || unfinished > 0 {
        bail!("{} download(s) did not complete", failed + unfinished);
    }
    Ok(())
}
