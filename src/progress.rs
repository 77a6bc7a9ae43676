//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di run.
//!
//! ## Componenti principali:
//! - `ProgressManager`: Gestisce la progress bar con `indicatif`
//! - `RunStats`: Traccia i contatori cumulativi del run
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 150/150 (100%) [OK] photo.avif
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::file_manager::FileManager;

/// Manages progress reporting for a batch run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics tracker for a batch run
#[derive(Debug, Default, Clone, Copy)]
pub struct RunStats {
    pub succeeded: usize,
    pub failed: usize,
    pub bytes_saved: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processed(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn format_summary(&self) -> String {
        if self.bytes_saved > 0 {
            format!(
                "Processed: {} files | Succeeded: {} | Failed: {} | Saved: {}",
                self.processed(),
                self.succeeded,
                self.failed,
                FileManager::format_size(self.bytes_saved)
            )
        } else {
            format!(
                "Processed: {} files | Succeeded: {} | Failed: {}",
                self.processed(),
                self.succeeded,
                self.failed
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_without_savings() {
        let stats = RunStats {
            succeeded: 2,
            failed: 1,
            bytes_saved: 0,
        };
        assert_eq!(
            stats.format_summary(),
            "Processed: 3 files | Succeeded: 2 | Failed: 1"
        );
    }

    #[test]
    fn test_summary_with_savings() {
        let stats = RunStats {
            succeeded: 4,
            failed: 0,
            bytes_saved: 4096,
        };
        let summary = stats.format_summary();
        assert!(summary.contains("Saved: 4.00 KB"));
    }
}
