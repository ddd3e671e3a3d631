//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce le statistiche di ottimizzazione e la progress bar
//! del comando `optimize`.
//!
//! ## Componenti principali:
//! - `OptimizationStats`: Statistiche cumulative di un run (log finale)
//! - `ProgressManager`: Progress bar `indicatif` alimentata dal polling del
//!   Job Record Store
//!
//! ## Statistiche tracciate:
//! - **files_processed**: Totale asset elaborati
//! - **files_optimized**: Asset ricodificati con successo
//! - **files_failed**: Asset lasciati invariati per errore dell'adapter
//! - **total_bytes_saved**: Byte totali risparmiati
//! - **total_original_size**: Dimensione totale degli asset originali
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================>---------------] 61% intro.webm
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::file_manager::FileManager;

/// Terminal progress bar driven by polled job snapshots
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a percentage bar (0-100)
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Show the latest polled state
    pub fn update(&self, progress: u8, message: &str) {
        self.bar.set_position(u64::from(progress));
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Stop the bar where it is, leaving the message visible
    pub fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics tracker for one run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OptimizationStats {
    pub files_processed: usize,
    pub files_optimized: usize,
    pub files_failed: usize,
    pub total_bytes_saved: u64,
    pub total_original_size: u64,
}

impl OptimizationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_optimized(&mut self, original_size: u64, new_size: u64) {
        self.files_processed += 1;
        self.files_optimized += 1;
        self.total_original_size += original_size;
        self.total_bytes_saved += original_size.saturating_sub(new_size);
    }

    pub fn add_failed(&mut self, original_size: u64) {
        self.files_processed += 1;
        self.files_failed += 1;
        self.total_original_size += original_size;
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        if self.total_original_size > 0 {
            (self.total_bytes_saved as f64 / self.total_original_size as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Optimized: {} | Failed: {} | Total saved: {} ({:.2}%)",
            self.files_processed,
            self.files_optimized,
            self.files_failed,
            FileManager::format_size(self.total_bytes_saved),
            self.overall_reduction_percent()
        )
    }
}
