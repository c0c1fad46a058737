//! pcf CLI - content-addressed (S)FTP pastebin client
//!
//! Uploads each argument (or standard input) and prints one URL per file.

use clap::Parser;
use pcf::config::{CliArgs, FileConfig, UploadConfig};
use pcf::core::{DryRunTransport, Transport, UploadSource, Uploader};
use pcf::error::Result;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging; RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => FileConfig::default_path()?,
    };
    debug!(path = %config_path.display(), "loading config");

    let file_config = FileConfig::load(&config_path)?;
    let config = UploadConfig::from_cli(&args, &file_config)?;
    let sources = UploadSource::from_args(&args.files);

    if config.dry_run {
        execute(Uploader::with_transport(config, DryRunTransport)?, &sources)
    } else {
        execute(Uploader::new(config)?, &sources)
    }
}

fn execute<T: Transport>(uploader: Uploader<T>, sources: &[UploadSource]) -> Result<()> {
    debug!(
        mode = %uploader.config().mode,
        url = %uploader.config().url,
        files = sources.len(),
        "starting uploads"
    );

    let stdout = std::io::stdout();
    let report = uploader.upload_all(sources, &mut stdout.lock())?;
    report.log_summary();
    report.into_result()?;

    Ok(())
}
