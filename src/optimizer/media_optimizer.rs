//! # Media Optimizer Main Orchestrator
//!
//! Task Dispatcher: accetta un upload, registra il task e avvia il Job Runner
//! in background. La chiamata ritorna prima che l'elaborazione cominci.
//!
//! ## Responsabilità:
//! - Validazione dell'upload (nome `.zip`, payload non vuoto, firma zip)
//! - Working directory privata per task con l'upload salvato come `upload.zip`
//! - Limite di ammissione: al massimo `workers` runner contemporanei,
//!   gli altri restano in `Queued`
//! - Lettura dello stato (`progress`) e dell'output (`output`)
//! - Evizione dei task terminati dopo il TTL (`cleanup_expired`, sweeper)
//!
//! ## Esempio:
//! ```rust,ignore
//! let optimizer = MediaOptimizer::new(config).await?;
//! let id = optimizer.submit(Some("bundle.zip"), &bytes, "low").await?;
//! let snapshot = optimizer.progress(&id)?;
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::{
    codec::{DefaultCodec, MediaCodec},
    config::{CompressionLevel, Config},
    error::OptimizeError,
    optimizer::{
        job_runner::JobRunner,
        path_resolver::{PathResolver, TaskPaths},
        task_optimizer::TaskOptimizer,
    },
    state::{JobSnapshot, JobStore, TaskId},
};

/// Local file header and end-of-central-directory (empty archive) signatures
const ZIP_SIGNATURES: [&[u8]; 2] = [b"PK\x03\x04", b"PK\x05\x06"];

struct Inner {
    config: Config,
    store: JobStore,
    codec: Arc<dyn MediaCodec>,
    admission: Arc<Semaphore>,
}

/// Task dispatcher, cheap to clone
#[derive(Clone)]
pub struct MediaOptimizer {
    inner: Arc<Inner>,
}

impl MediaOptimizer {
    /// Dispatcher with the WebP and ffmpeg adapters
    pub async fn new(config: Config) -> Result<Self> {
        let codec = DefaultCodec::new(&config);
        if let Err(e) = codec.audio().check_dependencies().await {
            warn!("{}; audio assets will be left unchanged", e);
        }
        Self::with_codec(config, Arc::new(codec)).await
    }

    /// Dispatcher with a custom codec implementation
    pub async fn with_codec(config: Config, codec: Arc<dyn MediaCodec>) -> Result<Self> {
        config.validate()?;
        tokio::fs::create_dir_all(&config.work_dir).await?;

        info!("🔧 Concurrency configuration:");
        info!("  • Running tasks: {} at a time (others wait queued)", config.workers);
        info!("  • Assets within a task: sequential");
        info!("  • Audio transcode timeout: {}s", config.audio_timeout_secs);
        match config.retention() {
            Some(ttl) => info!("  • Finished tasks kept for {}s", ttl.as_secs()),
            None => info!("  • Finished tasks kept until restart"),
        }
        debug!("Working directory root: {}", config.work_dir.display());

        let admission = Arc::new(Semaphore::new(config.workers));
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                store: JobStore::new(),
                codec,
                admission,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn store(&self) -> &JobStore {
        &self.inner.store
    }

    /// Reject uploads that are not a non-empty zip archive
    pub fn validate_upload(filename: Option<&str>, payload: &[u8]) -> Result<(), OptimizeError> {
        let filename = filename
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| OptimizeError::InvalidInput("no file uploaded".to_string()))?;

        if !filename.to_ascii_lowercase().ends_with(".zip") {
            return Err(OptimizeError::InvalidInput(format!("{} is not a .zip archive", filename)));
        }

        if payload.is_empty() {
            return Err(OptimizeError::InvalidInput(format!("{} is empty", filename)));
        }

        if !ZIP_SIGNATURES.iter().any(|signature| payload.starts_with(signature)) {
            return Err(OptimizeError::InvalidInput(format!("{} is not a zip archive", filename)));
        }

        Ok(())
    }

    /// Register a task for `payload` and start it in the background
    ///
    /// The returned identifier is immediately valid for [`Self::progress`].
    pub async fn submit(
        &self,
        filename: Option<&str>,
        payload: &[u8],
        compression: &str,
    ) -> Result<TaskId, OptimizeError> {
        Self::validate_upload(filename, payload)?;
        let level = CompressionLevel::from_param(compression);

        let work_dir = PathResolver::staging_dir(&self.inner.config.work_dir);
        let paths = TaskPaths::new(&work_dir);
        tokio::fs::create_dir_all(&work_dir).await?;
        if let Err(e) = tokio::fs::write(&paths.upload, payload).await {
            Self::remove_work_dir(&work_dir).await;
            return Err(e.into());
        }

        let writer = self.inner.store.create(&work_dir);
        let id = writer.id();
        info!(
            "📥 Task {} accepted ({} bytes, compression: {})",
            id,
            payload.len(),
            level.as_str()
        );

        let optimizer = TaskOptimizer::new(self.inner.codec.clone(), level.settings());
        let runner = JobRunner::new(writer, paths, self.inner.config.scan_layout(), optimizer);
        let admission = self.inner.admission.clone();

        tokio::spawn(async move {
            // the runner's writer marks the task failed if it is dropped here
            let _permit = match admission.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Task {} could not be admitted: {}", id, e);
                    return;
                }
            };
            runner.run().await;
        });

        Ok(id)
    }

    /// Current state of a task
    pub fn progress(&self, id: &TaskId) -> Result<JobSnapshot, OptimizeError> {
        self.inner
            .store
            .snapshot(id)
            .ok_or_else(|| OptimizeError::TaskNotFound(id.to_string()))
    }

    /// Location of the finished archive
    pub fn output(&self, id: &TaskId) -> Result<PathBuf, OptimizeError> {
        let snapshot = self.progress(id)?;
        match snapshot.output_path {
            Some(path) if snapshot.is_ready() && path.is_file() => Ok(path),
            _ => Err(OptimizeError::NotReady(id.to_string())),
        }
    }

    /// Drop a finished task and its files; `false` if unknown or still running
    pub async fn discard(&self, id: &TaskId) -> bool {
        match self.inner.store.remove(id) {
            Some(work_dir) => {
                Self::remove_work_dir(&work_dir).await;
                debug!("Task {} discarded", id);
                true
            }
            None => false,
        }
    }

    /// Evict terminal tasks older than the retention TTL
    pub async fn cleanup_expired(&self) -> usize {
        let Some(ttl) = self.inner.config.retention() else {
            return 0;
        };

        let evicted = self.inner.store.evict_expired(ttl);
        for (id, work_dir) in &evicted {
            debug!("Evicting task {}", id);
            Self::remove_work_dir(work_dir).await;
        }

        if !evicted.is_empty() {
            info!("🧹 Evicted {} expired tasks", evicted.len());
        }
        evicted.len()
    }

    /// Periodic eviction; `None` when retention is disabled
    pub fn spawn_sweeper(&self) -> Option<JoinHandle<()>> {
        self.inner.config.retention()?;
        let period = std::time::Duration::from_secs(self.inner.config.sweep_interval_secs);
        let optimizer = self.clone();

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                optimizer.cleanup_expired().await;
            }
        }))
    }

    async fn remove_work_dir(work_dir: &Path) {
        if let Err(e) = tokio::fs::remove_dir_all(work_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", work_dir.display(), e);
            }
        }
    }
}
