use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use podbulk::{
    BulkDownloader, DownloadConfig, PrefixMode, ProgressHandle, ProgressMapping, ProgressSink,
    ReqwestClient, SharedProgressSink,
};

/// Download MP3s from an RSS feed
#[derive(Parser, Debug)]
#[command(name = "podbulk")]
#[command(about = "Download MP3s from an RSS feed")]
#[command(disable_version_flag = true)]
struct Args {
    /// URL of the feed to inspect
    #[arg(long)]
    url: Option<String>,

    /// Destination folder
    #[arg(short = 'f', long)]
    folder: Option<PathBuf>,

    /// Overwrite files that already exist in the destination folder
    #[arg(long)]
    overwrite: bool,

    /// Only download the N most recent episodes (0 = all)
    #[arg(short = 'l', long, default_value_t = 0)]
    last: usize,

    /// Prefix added ahead of each file name
    #[arg(long, default_value = "NONE")]
    prefix: PrefixMode,

    /// Print version and exit
    #[arg(short = 'v', long)]
    version: bool,
}

/// Progress sink driving a terminal percentage bar
struct CliSink {
    inner: ProgressHandle,
    bar: ProgressBar,
}

impl CliSink {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:40.cyan/blue}] {percent:>3}%")
                .unwrap()
                .progress_chars("=> "),
        );
        Arc::new(Self {
            inner: ProgressHandle::new(),
            bar,
        })
    }

    fn cancel(&self) {
        self.inner.cancel();
    }
}

impl ProgressSink for CliSink {
    fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    fn report_progress(&self, percent: f64) {
        self.inner.report_progress(percent);
        self.bar.set_position(self.inner.progress().round() as u64);
    }

    fn install_mapping(&self, mapping: ProgressMapping) {
        self.inner.install_mapping(mapping);
    }

    fn clear_mapping(&self) {
        self.inner.clear_mapping();
    }

    fn reset(&self) {
        self.inner.reset();
        self.bar.set_position(0);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.version {
        println!("podbulk {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let (Some(url), Some(folder)) = (args.url, args.folder) else {
        bail!("Both --url and --folder are required (see --help)");
    };

    let mut config = DownloadConfig::new(url);
    config.folder = Some(folder.clone());
    config.last_n = args.last;
    config.overwrite = args.overwrite;
    config.prefix = args.prefix;

    let downloader = BulkDownloader::new(ReqwestClient::new(), config);

    let sink = CliSink::new();
    {
        let sink = sink.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Cancellation requested, stopping at the next checkpoint");
                sink.cancel();
            }
        });
    }

    let shared: SharedProgressSink = sink.clone();
    let result = downloader.download_all(&shared, false).await;
    sink.bar.finish_and_clear();
    let summary = result?;

    println!(
        "{} {} downloaded, {} skipped, {} failed",
        "Done:".bold().green(),
        summary.successful.to_string().green(),
        summary.skipped.to_string().yellow(),
        if summary.failed() > 0 {
            summary.failed().to_string().red().bold()
        } else {
            summary.failed().to_string().green()
        }
    );
    println!("Output: {}", folder.display().to_string().cyan());

    Ok(())
}
