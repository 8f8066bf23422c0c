//! Uploader CLI
//!
//! Uploads image files to the bucket behind the upload backend and deletes them again.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use uploader::api::{HttpUploadApi, UploadApi};
use uploader::config::{UploaderConfig, DEFAULT_API_URL};
use uploader::entry::{EntryId, LocalFile};
use uploader::Uploader;

/// Uploader CLI, upload images through presigned URLs
#[derive(Parser, Debug)]
#[command(name = "uploader", version, about)]
struct Cli {
    /// Upload backend URL.
    #[arg(long, env = "UPLOADER_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload files as one batch.
    Upload {
        /// Files to upload.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Remove every uploaded file again once all uploads finished.
        #[arg(long)]
        cleanup: bool,
    },
    /// Delete a stored object by key.
    Delete {
        /// Storage key returned by an upload.
        key: String,
    },
    /// Show the limits the backend enforces.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = UploaderConfig::new(&cli.api_url);
    let api = Arc::new(HttpUploadApi::new(&config.api_url)?);

    match cli.command {
        Command::Upload { paths, cleanup } => upload(api, config, &paths, cleanup).await,
        Command::Delete { key } => {
            let response = api.delete(&key).await?;
            println!("{}", response.message);
            Ok(())
        }
        Command::Config => {
            let limits = api.upload_config().await?;
            println!("max files:          {}", limits.max_files);
            println!("max file size:      {}MB", limits.max_file_size_mb);
            println!("presign expiry:     {}s", limits.presign_expiry_secs);
            Ok(())
        }
    }
}

async fn upload(
    api: Arc<HttpUploadApi>,
    config: UploaderConfig,
    paths: &[PathBuf],
    cleanup: bool,
) -> anyhow::Result<()> {
    let config = match api.upload_config().await {
        Ok(server) => config.with_server_limits(&server),
        Err(e) => {
            warn!("Could not fetch upload limits, using defaults: {e}");
            config
        }
    };

    let mut batch = Vec::with_capacity(paths.len());
    for path in paths {
        batch.push(LocalFile::from_path(path).await?);
    }

    let mut uploader = Uploader::new(api, config.limits);
    let ids = uploader.drop_files(batch);
    run_to_completion(&mut uploader).await;

    if ids.is_empty() {
        anyhow::bail!("No file was accepted");
    }

    let mut failed = 0;
    for entry in uploader.entries() {
        match entry.storage_key() {
            Some(key) if !entry.has_error() => println!("{} -> {key}", entry.file().name()),
            _ => {
                failed += 1;
                println!("{} -> failed", entry.file().name());
            }
        }
    }

    if cleanup {
        for id in &ids {
            if let Err(e) = uploader.remove(*id) {
                warn!("Skipping removal: {e}");
            }
        }
        run_to_completion(&mut uploader).await;

        let left = uploader
            .entries()
            .iter()
            .filter(|entry| entry.storage_key().is_some())
            .count();
        if left > 0 {
            anyhow::bail!("{left} file(s) could not be removed from storage");
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} file(s) failed");
    }
    Ok(())
}

/// Drives the uploader to completion, printing progress and notices as they arrive
async fn run_to_completion(uploader: &mut Uploader<HttpUploadApi>) {
    let mut reported: HashMap<EntryId, u8> = HashMap::new();

    loop {
        let more = uploader.step().await;

        for entry in uploader.entries() {
            let last = reported.entry(entry.id()).or_default();
            if entry.is_uploading() && entry.progress() > *last {
                *last = entry.progress();
                eprintln!("{}: {}%", entry.file().name(), entry.progress());
            }
        }
        for notice in uploader.take_notices() {
            eprintln!("{notice}");
        }

        if !more {
            break;
        }
    }
}
