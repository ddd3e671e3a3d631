//! # Optimizer Module
//!
//! Pipeline asincrona dei task, separata in sottomoduli:
//! - `media_optimizer`: Task Dispatcher (submit, ammissione, evizione)
//! - `job_runner`: Macchina a stati di un task
//! - `task_optimizer`: Worker per singoli asset
//! - `progress_tracker`: Aggiornamento del Job Record durante la trasformazione
//! - `path_resolver`: Layout della working directory e nomi delle entry

pub mod job_runner;
pub mod media_optimizer;
pub mod path_resolver;
pub mod progress_tracker;
pub mod task_optimizer;

pub use job_runner::JobRunner;
pub use media_optimizer::MediaOptimizer;
pub use path_resolver::{PathResolver, TaskPaths};
pub use progress_tracker::ProgressTracker;
pub use task_optimizer::TaskOptimizer;
