//! `dbx-upload`: upload a local file or directory to Dropbox.
//!
//! Usage:
//!   dbx-upload [--no-recursive] [--overwrite] [--chunk-size BYTES] <LOCAL_PATH> <DROPBOX_PATH>

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, fmt};

use dbx_transfer::credentials::{ChainProvider, DEFAULT_TOKEN_ENV, EnvToken, PromptToken};
use dbx_transfer::error::Result;
use dbx_transfer::progress::TransferProgress;
use dbx_transfer::store::DropboxStore;
use dbx_transfer::{Settings, TransferManager, UploadOptions};

#[derive(Parser, Debug)]
#[command(name = "dbx-upload")]
#[command(about = "Upload a local file or directory to Dropbox")]
#[command(version)]
struct Args {
    /// Local file or directory to upload
    local_path: PathBuf,

    /// Destination path in Dropbox (may start with `alias:`)
    dropbox_path: String,

    /// Only upload the top-level files of a directory
    #[arg(long)]
    no_recursive: bool,

    /// Replace existing files or directories in Dropbox
    #[arg(long)]
    overwrite: bool,

    /// Bytes per upload request (at most 150 MiB)
    #[arg(long, value_name = "BYTES")]
    chunk_size: Option<u64>,

    /// Settings file (defaults to the user config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Environment variable holding the access token
    #[arg(long, value_name = "VAR")]
    token_env: Option<String>,

    /// Log every request
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "dbx_transfer=debug"
    } else {
        "dbx_transfer=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    bar
}

async fn run(args: &Args) -> Result<String> {
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };

    let mut transfer = settings.transfer;
    if let Some(chunk_size) = args.chunk_size {
        transfer.chunk_size = chunk_size;
    }

    let remote = settings.aliases.resolve(&args.dropbox_path)?;

    let token_env = args
        .token_env
        .clone()
        .or(settings.token_env.clone())
        .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string());
    let credentials = ChainProvider::new()
        .with(EnvToken::new(token_env))
        .with(PromptToken::default());

    let store = match &settings.proxy {
        Some(proxy) => DropboxStore::connect_with_proxy(&credentials, proxy)?,
        None => DropboxStore::connect(&credentials)?,
    };
    let mut manager = TransferManager::with_config(store, transfer)?;

    let bar = progress_bar();
    let bar_for_cb = bar.clone();
    manager.watch_progress(Box::new(move |progress: &TransferProgress| {
        bar_for_cb.set_length(progress.total.max(1));
        bar_for_cb.set_position(progress.done.min(progress.total));
        bar_for_cb.set_message(progress.path.clone());
    }));

    let options = UploadOptions {
        recursive: !args.no_recursive,
        overwrite: args.overwrite,
        chunk_size: None,
    };
    let result = manager.upload(&args.local_path, &remote, &options).await;
    bar.finish_and_clear();
    result?;

    Ok(remote)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args).await {
        Ok(remote) => {
            println!(
                "{} successfully uploaded to {}",
                args.local_path.display(),
                remote
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
