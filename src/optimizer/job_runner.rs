//! # Job Runner Module
//!
//! Macchina a stati che porta un task dall'archivio caricato all'archivio
//! ottimizzato.
//!
//! ## Flusso di esecuzione:
//! 1. **Scanning**: estrazione dell'upload e scansione dell'albero
//! 2. **Transforming**: ricodifica sequenziale degli asset (immagini, poi audio)
//! 3. **Packaging**: nuovo archivio dall'albero estratto
//! 4. **Completed** / **Failed**: stato terminale nel Job Record
//!
//! ## Error handling:
//! - Errore di un singolo asset → asset lasciato invariato, il run prosegue
//! - Errore di estrazione o di packaging → `Failed` ("Error", 100, nessun output)
//!
//! Tutto l'I/O bloccante gira sul blocking pool di tokio: i lettori del
//! Job Record non vengono mai bloccati dal runner.

use std::time::Instant;
use tracing::{error, info, warn};

use crate::{
    archive::ArchiveCodec,
    error::{OptimizeError, Result},
    file_manager::{FileManager, ScanLayout},
    optimizer::{path_resolver::TaskPaths, progress_tracker::ProgressTracker, task_optimizer::TaskOptimizer},
    state::{JobStage, JobWriter, LABEL_DONE, LABEL_EMPTY},
};

/// Executes one task; owns the only writer of its record
pub struct JobRunner {
    writer: JobWriter,
    paths: TaskPaths,
    layout: ScanLayout,
    optimizer: TaskOptimizer,
}

impl JobRunner {
    pub fn new(writer: JobWriter, paths: TaskPaths, layout: ScanLayout, optimizer: TaskOptimizer) -> Self {
        Self {
            writer,
            paths,
            layout,
            optimizer,
        }
    }

    /// Drive the task to a terminal state
    pub async fn run(self) {
        let id = self.writer.id();
        let start_time = Instant::now();

        let result = self.execute().await;
        self.remove_intermediate_files().await;

        match result {
            Ok(()) => {
                self.writer.complete(self.paths.output.clone(), LABEL_DONE);
                info!("🎉 Task {} completed in {:.1}s", id, start_time.elapsed().as_secs_f64());
            }
            Err(e) => {
                error!("Task {} failed: {}", id, e);
                self.writer.fail();
            }
        }
    }

    async fn execute(&self) -> Result<()> {
        let id = self.writer.id();

        self.writer.set_stage(JobStage::Scanning);
        let upload = self.paths.upload.clone();
        let extract_dir = self.paths.extract_dir.clone();
        let entries = blocking(move || ArchiveCodec::extract(&upload, &extract_dir)).await?;

        let extract_dir = self.paths.extract_dir.clone();
        let layout = self.layout.clone();
        let scan = blocking(move || Ok(FileManager::scan(&extract_dir, &layout))).await?;
        info!(
            "🔍 Task {}: {} entries, {} images, {} audio files",
            id,
            entries,
            scan.images.len(),
            scan.audio.len()
        );

        self.writer.set_stage(JobStage::Transforming);
        if scan.is_empty() {
            info!("Task {}: no media files found", id);
            self.writer.update(100, LABEL_EMPTY);
        } else {
            let assets = scan.into_assets();
            let mut tracker = ProgressTracker::new(&self.writer, assets.len());
            for asset in &assets {
                let result = self.optimizer.process_asset(asset).await;
                tracker.handle_asset_completion(asset, &result);
            }
            info!("📊 Task {}: {}", id, tracker.stats().format_summary());
        }

        self.writer.set_stage(JobStage::Packaging);
        let extract_dir = self.paths.extract_dir.clone();
        let output = self.paths.output.clone();
        let files = blocking(move || ArchiveCodec::pack(&extract_dir, &output)).await?;
        info!("📦 Task {}: packed {} files into {}", id, files, self.paths.output.display());

        Ok(())
    }

    /// Only the output archive outlives the run
    async fn remove_intermediate_files(&self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.paths.extract_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", self.paths.extract_dir.display(), e);
            }
        }
        if let Err(e) = tokio::fs::remove_file(&self.paths.upload).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", self.paths.upload.display(), e);
            }
        }
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| OptimizeError::Internal(format!("blocking task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MediaCodec;
    use crate::config::CompressionLevel;
    use crate::error::AdapterError;
    use crate::state::{JobStore, LABEL_ERROR};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Writes the parameters it was called with; fails for files named `broken.*`
    struct RecordingCodec;

    impl RecordingCodec {
        fn check(path: &Path) -> std::result::Result<(), AdapterError> {
            if path.file_stem().map(|s| s == "broken").unwrap_or(false) {
                return Err(AdapterError::Encode("cannot decode".to_string()));
            }
            Ok(())
        }
    }

    impl MediaCodec for RecordingCodec {
        fn reencode_image(&self, path: &Path, quality: u8) -> std::result::Result<(), AdapterError> {
            Self::check(path)?;
            fs::write(path, format!("image q={}", quality))?;
            Ok(())
        }

        fn reencode_audio(&self, path: &Path, bitrate: &str) -> std::result::Result<(), AdapterError> {
            Self::check(path)?;
            fs::write(path, format!("audio b={}", bitrate))?;
            Ok(())
        }
    }

    fn write_tree(root: &Path, files: &[(&str, &str)]) {
        for (rel, contents) in files {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, contents).unwrap();
        }
    }

    fn runner_for(store: &JobStore, work_dir: &Path) -> (JobRunner, TaskPaths) {
        let paths = TaskPaths::new(work_dir);
        let writer = store.create(work_dir);
        let optimizer = TaskOptimizer::new(Arc::new(RecordingCodec), CompressionLevel::Low.settings());
        (JobRunner::new(writer, paths.clone(), ScanLayout::default(), optimizer), paths)
    }

    fn prepare_upload(work: &Path, files: &[(&str, &str)]) {
        let source = work.join("source");
        fs::create_dir_all(&source).unwrap();
        write_tree(&source, files);
        ArchiveCodec::pack(&source, &work.join("upload.zip")).unwrap();
        fs::remove_dir_all(&source).unwrap();
    }

    #[tokio::test]
    async fn test_run_reencodes_assets_and_packages() {
        let dir = TempDir::new().unwrap();
        prepare_upload(
            dir.path(),
            &[
                ("images/a.webp", "a"),
                ("images/broken.webp", "keep me"),
                ("media/track.webm", "t"),
                ("manifest.json", "{}"),
            ],
        );

        let store = JobStore::new();
        let (runner, paths) = runner_for(&store, dir.path());
        let id = runner.writer.id();
        runner.run().await;

        let snapshot = store.snapshot(&id).unwrap();
        assert_eq!(snapshot.stage, JobStage::Completed);
        assert_eq!(snapshot.current_file, LABEL_DONE);
        assert_eq!(snapshot.output_path, Some(paths.output.clone()));

        let out = dir.path().join("out");
        ArchiveCodec::extract(&paths.output, &out).unwrap();
        assert_eq!(fs::read_to_string(out.join("images/a.webp")).unwrap(), "image q=60");
        assert_eq!(fs::read_to_string(out.join("images/broken.webp")).unwrap(), "keep me");
        assert_eq!(fs::read_to_string(out.join("media/track.webm")).unwrap(), "audio b=64k");
        assert_eq!(fs::read_to_string(out.join("manifest.json")).unwrap(), "{}");

        assert!(!paths.extract_dir.exists());
        assert!(!paths.upload.exists());
    }

    #[tokio::test]
    async fn test_empty_archive_reports_no_files_then_packages() {
        let dir = TempDir::new().unwrap();
        prepare_upload(dir.path(), &[("readme.txt", "hello")]);

        let store = JobStore::new();
        let (runner, paths) = runner_for(&store, dir.path());
        let id = runner.writer.id();

        // state published before the terminal transition
        runner.execute().await.unwrap();
        let snapshot = store.snapshot(&id).unwrap();
        assert_eq!(snapshot.stage, JobStage::Packaging);
        assert_eq!(snapshot.progress, 100);
        assert_eq!(snapshot.current_file, LABEL_EMPTY);
        assert!(paths.output.is_file());
        runner.writer.fail();
    }

    #[tokio::test]
    async fn test_empty_archive_completes_as_done() {
        let dir = TempDir::new().unwrap();
        prepare_upload(dir.path(), &[("readme.txt", "hello")]);

        let store = JobStore::new();
        let (runner, paths) = runner_for(&store, dir.path());
        let id = runner.writer.id();
        runner.run().await;

        let snapshot = store.snapshot(&id).unwrap();
        assert_eq!(snapshot.stage, JobStage::Completed);
        assert_eq!(snapshot.progress, 100);
        assert_eq!(snapshot.current_file, LABEL_DONE);
        assert_eq!(snapshot.output_path, Some(paths.output.clone()));
        assert!(paths.output.is_file());
    }

    #[tokio::test]
    async fn test_packaging_failure_fails_task() {
        let dir = TempDir::new().unwrap();
        prepare_upload(dir.path(), &[("images/a.webp", "a")]);

        let store = JobStore::new();
        let (runner, paths) = runner_for(&store, dir.path());
        let id = runner.writer.id();
        // the archive cannot be created over a directory
        fs::create_dir_all(&paths.output).unwrap();
        runner.run().await;

        let snapshot = store.snapshot(&id).unwrap();
        assert_eq!(snapshot.stage, JobStage::Failed);
        assert_eq!(snapshot.progress, 100);
        assert_eq!(snapshot.current_file, LABEL_ERROR);
        assert!(snapshot.output_path.is_none());
        assert!(!paths.extract_dir.exists());
    }

    #[tokio::test]
    async fn test_corrupt_upload_fails_task() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("upload.zip"), b"PK\x03\x04 truncated").unwrap();

        let store = JobStore::new();
        let (runner, paths) = runner_for(&store, dir.path());
        let id = runner.writer.id();
        runner.run().await;

        let snapshot = store.snapshot(&id).unwrap();
        assert_eq!(snapshot.stage, JobStage::Failed);
        assert_eq!(snapshot.progress, 100);
        assert_eq!(snapshot.current_file, LABEL_ERROR);
        assert!(snapshot.output_path.is_none());
        assert!(!paths.output.exists());
    }
}
