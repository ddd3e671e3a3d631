//! # State Management Module
//!
//! Questo modulo contiene il Job Record Store: un record per task con
//! progresso, ultimo file elaborato, archivio di output e stato terminale.
//!
//! ## Responsabilità:
//! - Genera identificatori opachi e univoci (`TaskId`, UUID v4)
//! - Conserva un `JobRecord` per task in una mappa concorrente (`DashMap`)
//! - Garantisce un solo scrittore per task tramite `JobWriter` (non clonabile)
//! - Fornisce snapshot coerenti (`JobSnapshot`) a un numero qualsiasi di lettori
//! - Evizione dei task terminati più vecchi del TTL configurato
//!
//! ## Modello di concorrenza:
//! - La mappa è shardata: record diversi non si contendono lo stesso lock
//! - Ogni record ha il proprio `RwLock`; lo scrittore lo tiene solo per
//!   il tempo di un aggiornamento, i lettori copiano uno snapshot
//! - Il progresso è monotono: `update` applica `max(precedente, nuovo)`
//! - Gli stati `Completed` / `Failed` sono assorbenti: ogni scrittura
//!   successiva viene ignorata
//! - Un `JobWriter` rilasciato prima dello stato terminale marca il task
//!   come `Failed`
//!
//! ## Ciclo di vita:
//! ```text
//! create() → Queued → Scanning → Transforming → Packaging → Completed
//!                          └──────────┴──────────────┴─────→ Failed
//! ```

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Terminal label of a successful run
pub const LABEL_DONE: &str = "Done";
/// Terminal label of a failed run
pub const LABEL_ERROR: &str = "Error";
/// Label of a run whose archive holds no media
pub const LABEL_EMPTY: &str = "No files to optimize";

/// Opaque task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Stage of a task's run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Queued,
    Scanning,
    Transforming,
    Packaging,
    Completed,
    Failed,
}

impl JobStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug)]
struct JobRecord {
    progress: u8,
    current_file: String,
    output_path: Option<PathBuf>,
    stage: JobStage,
    work_dir: PathBuf,
    finished_at: Option<Instant>,
}

impl JobRecord {
    fn new(work_dir: PathBuf) -> Self {
        Self {
            progress: 0,
            current_file: String::new(),
            output_path: None,
            stage: JobStage::Queued,
            work_dir,
            finished_at: None,
        }
    }

    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            progress: self.progress,
            current_file: self.current_file.clone(),
            output_path: self.output_path.clone(),
            stage: self.stage,
        }
    }

    fn finish(&mut self, stage: JobStage, label: &str) {
        self.progress = 100;
        self.current_file = label.to_string();
        self.stage = stage;
        self.finished_at = Some(Instant::now());
    }
}

/// Point-in-time copy of a job record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub progress: u8,
    pub current_file: String,
    pub output_path: Option<PathBuf>,
    pub stage: JobStage,
}

impl JobSnapshot {
    /// Output archive is available for download
    pub fn is_ready(&self) -> bool {
        self.stage == JobStage::Completed && self.output_path.is_some()
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}

/// Exclusive write handle for one task's record
///
/// Only [`JobStore::create`] hands these out and they cannot be cloned, so a
/// task has at most one writer.
#[derive(Debug)]
pub struct JobWriter {
    id: TaskId,
    record: Arc<RwLock<JobRecord>>,
}

impl JobWriter {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn work_dir(&self) -> PathBuf {
        self.record.read().work_dir.clone()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.record.read().snapshot()
    }

    pub fn set_stage(&self, stage: JobStage) {
        let mut record = self.record.write();
        if record.stage.is_terminal() {
            return;
        }
        debug!("Task {} stage {:?} -> {:?}", self.id, record.stage, stage);
        record.stage = stage;
    }

    /// Record progress and the label of the asset last touched
    pub fn update(&self, progress: u8, current_file: &str) {
        let mut record = self.record.write();
        if record.stage.is_terminal() {
            return;
        }
        record.progress = record.progress.max(progress.min(100));
        record.current_file = current_file.to_string();
    }

    /// Terminal success: publishes the output archive
    pub fn complete(&self, output_path: PathBuf, label: &str) {
        let mut record = self.record.write();
        if record.stage.is_terminal() {
            return;
        }
        if record.output_path.is_none() {
            record.output_path = Some(output_path);
        }
        record.finish(JobStage::Completed, label);
    }

    /// Terminal failure: output stays unset
    pub fn fail(&self) {
        let mut record = self.record.write();
        if record.stage.is_terminal() {
            return;
        }
        record.finish(JobStage::Failed, LABEL_ERROR);
    }
}

impl Drop for JobWriter {
    fn drop(&mut self) {
        let mut record = self.record.write();
        if !record.stage.is_terminal() {
            warn!("Task {} abandoned in stage {:?}, marking as failed", self.id, record.stage);
            record.finish(JobStage::Failed, LABEL_ERROR);
        }
    }
}

/// Concurrent table of job records
#[derive(Debug, Default)]
pub struct JobStore {
    records: DashMap<TaskId, Arc<RwLock<JobRecord>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new task with `progress = 0` and return its writer
    pub fn create(&self, work_dir: &Path) -> JobWriter {
        loop {
            let id = TaskId::new();
            if let dashmap::mapref::entry::Entry::Vacant(slot) = self.records.entry(id) {
                let record = Arc::new(RwLock::new(JobRecord::new(work_dir.to_path_buf())));
                slot.insert(record.clone());
                return JobWriter { id, record };
            }
        }
    }

    /// Current state of a task, `None` for unknown identifiers
    pub fn snapshot(&self, id: &TaskId) -> Option<JobSnapshot> {
        let record = self.records.get(id).map(|entry| entry.value().clone())?;
        let snapshot = record.read().snapshot();
        Some(snapshot)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop a terminal task, returning its working directory
    pub fn remove(&self, id: &TaskId) -> Option<PathBuf> {
        self.records
            .remove_if(id, |_, record| record.read().stage.is_terminal())
            .map(|(_, record)| record.read().work_dir.clone())
    }

    /// Remove terminal tasks finished more than `ttl` ago
    ///
    /// Returns the working directories of the evicted tasks; deleting them is
    /// left to the caller.
    pub fn evict_expired(&self, ttl: Duration) -> Vec<(TaskId, PathBuf)> {
        let expired: Vec<TaskId> = self
            .records
            .iter()
            .filter(|entry| Self::is_expired(entry.value(), ttl))
            .map(|entry| *entry.key())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| {
                self.records
                    .remove_if(&id, |_, record| Self::is_expired(record, ttl))
                    .map(|(id, record)| (id, record.read().work_dir.clone()))
            })
            .collect()
    }

    fn is_expired(record: &Arc<RwLock<JobRecord>>, ttl: Duration) -> bool {
        record
            .read()
            .finished_at
            .map(|finished| finished.elapsed() >= ttl)
            .unwrap_or(false)
    }
}
