//! # Progress Tracking Module
//!
//! Pubblica nel Job Record l'avanzamento della fase di trasformazione e
//! raccoglie le statistiche del run.
//!
//! Dopo ogni asset (ricodificato o saltato):
//! - `current_file` = nome dell'asset
//! - `progress` = `floor(elaborati * 100 / totale)`

use std::path::Path;
use tracing::{debug, warn};

use crate::{
    error::AdapterError,
    file_manager::{Asset, FileManager},
    optimizer::task_optimizer::AssetOutcome,
    progress::OptimizationStats,
    state::JobWriter,
};

/// Tracker dell'avanzamento di un singolo task
pub struct ProgressTracker<'a> {
    writer: &'a JobWriter,
    total: usize,
    processed: usize,
    stats: OptimizationStats,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(writer: &'a JobWriter, total: usize) -> Self {
        Self {
            writer,
            total,
            processed: 0,
            stats: OptimizationStats::new(),
        }
    }

    /// Integer percentage of `processed` over `total`, rounded down
    pub fn percent(processed: usize, total: usize) -> u8 {
        if total == 0 {
            return 100;
        }
        (processed.min(total) * 100 / total) as u8
    }

    /// Gestisce completamento asset: statistiche, log e Job Record
    pub fn handle_asset_completion(&mut self, asset: &Asset, result: &Result<AssetOutcome, AdapterError>) {
        self.processed += 1;

        match result {
            Ok(outcome) => {
                self.stats.add_optimized(outcome.original_size, outcome.optimized_size);
                debug!(
                    "[{}/{}] {}: {} -> {} ({:.1}% reduction)",
                    self.processed,
                    self.total,
                    asset.path.display(),
                    FileManager::format_size(outcome.original_size),
                    FileManager::format_size(outcome.optimized_size),
                    FileManager::calculate_reduction(outcome.original_size, outcome.optimized_size)
                );
            }
            Err(e) => {
                self.stats.add_failed(Self::size_or_zero(&asset.path));
                warn!(
                    "[{}/{}] Skipping {} (left unchanged): {}",
                    self.processed,
                    self.total,
                    asset.path.display(),
                    e
                );
            }
        }

        self.writer
            .update(Self::percent(self.processed, self.total), &asset.display_name());
    }

    pub fn stats(&self) -> &OptimizationStats {
        &self.stats
    }

    fn size_or_zero(path: &Path) -> u64 {
        FileManager::file_size(path).unwrap_or(0)
    }
}
