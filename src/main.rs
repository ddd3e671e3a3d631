//! # Space Bundle Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento della configurazione (file JSON + override da CLI)
//! - Avvio del server HTTP oppure elaborazione di un singolo archivio
//!
//! ## Esempio di utilizzo:
//! ```bash
//! bundle-optimizer serve --port 5000 --workers 8
//! bundle-optimizer optimize bundle.zip --compression low --output small.zip --verbose
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use space_bundle_optimizer::{
    progress::ProgressManager,
    server,
    state::{JobStage, TaskId},
    Config, MediaOptimizer,
};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = "bundle-optimizer")]
#[command(about = "Re-encode the images and audio of a zip bundle")]
struct Args {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP service
    Serve {
        /// Bind host
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,

        /// Root directory for task working directories
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Number of tasks processed at the same time
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Optimize one archive locally
    Optimize {
        /// Zip archive to optimize
        archive: PathBuf,

        /// Compression level (high, medium, low)
        #[arg(short = 'l', long, default_value = "medium")]
        compression: String,

        /// Where to write the optimized archive
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path).await?,
        None => Config::default(),
    };

    match args.command {
        Command::Serve {
            host,
            port,
            work_dir,
            workers,
        } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(work_dir) = work_dir {
                config.work_dir = work_dir;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }

            let optimizer = MediaOptimizer::new(config).await?;
            server::serve(optimizer).await
        }
        Command::Optimize {
            archive,
            compression,
            output,
        } => optimize_archive(config, &archive, &compression, &output).await,
    }
}

/// Run one archive through the dispatcher and copy the result to `output`
async fn optimize_archive(config: Config, archive: &Path, compression: &str, output: &Path) -> Result<()> {
    if !archive.is_file() {
        return Err(anyhow::anyhow!("Archive does not exist: {}", archive.display()));
    }

    let optimizer = MediaOptimizer::new(config).await?;
    let payload = tokio::fs::read(archive).await?;
    let filename = archive.file_name().map(|name| name.to_string_lossy().to_string());

    let id = optimizer.submit(filename.as_deref(), &payload, compression).await?;
    info!("Optimizing {} (task {})", archive.display(), id);

    let result = async {
        wait_for_task(&optimizer, &id).await?;
        let source = optimizer.output(&id)?;
        tokio::fs::copy(&source, output).await?;
        info!("✅ Optimized archive written to {}", output.display());
        Ok::<(), anyhow::Error>(())
    }
    .await;

    optimizer.discard(&id).await;
    result
}

async fn wait_for_task(optimizer: &MediaOptimizer, id: &TaskId) -> Result<()> {
    let bar = ProgressManager::new();

    loop {
        let snapshot = optimizer.progress(id)?;
        bar.update(snapshot.progress, &snapshot.current_file);

        match snapshot.stage {
            JobStage::Completed => {
                bar.finish(&snapshot.current_file);
                return Ok(());
            }
            JobStage::Failed => {
                bar.abandon(&snapshot.current_file);
                return Err(anyhow::anyhow!("Optimization failed, see the log for details"));
            }
            _ => tokio::time::sleep(POLL_INTERVAL).await,
        }
    }
}
