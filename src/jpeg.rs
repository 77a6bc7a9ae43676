//! # JPEG Lossless Optimization Module
//!
//! Questo modulo implementa la ri-ottimizzazione lossless di un singolo
//! JPEG tramite jpegtran: una sola invocazione con overwrite in-place
//! (stesso path come input e output). Nessun controllo qualità: jpegtran
//! ricomprime l'entropia senza toccare i coefficienti.
//!
//! Il modulo registra le dimensioni prima/dopo così il run può riportare i
//! byte risparmiati.

use crate::error::ConvertError;
use crate::file_manager::FileManager;
use crate::platform::PlatformCommands;
use crate::runner;
use crate::utils::to_string_vec;
use anyhow::Result;
use std::path::Path;
use tracing::debug;

/// Optimizes JPEG files in place via jpegtran
pub struct JpegOptimizer;

impl JpegOptimizer {
    /// Losslessly re-optimize one JPEG, overwriting it in place.
    ///
    /// Returns the number of bytes saved (0 when the file did not shrink).
    pub async fn optimize(path: &Path, affinity: &[usize]) -> Result<u64> {
        let size_before = tokio::fs::metadata(path).await?.len();

        let path_str = path.to_string_lossy();
        let args = to_string_vec(["-optimize", "-copy", "all", "-outfile", &path_str, &path_str]);
        runner::run("jpegtran", &args, Some(affinity)).await?;

        let size_after = tokio::fs::metadata(path).await?.len();
        let saved = size_before.saturating_sub(size_after);
        debug!(
            "Optimized {} ({} -> {} bytes, {:.1}% reduction)",
            path.display(),
            size_before,
            size_after,
            FileManager::calculate_reduction(size_before, size_after)
        );

        Ok(saved)
    }

    /// Check that jpegtran is present.
    pub async fn check_dependencies() -> Result<()> {
        let platform = PlatformCommands::instance();
        if !platform.is_command_available("jpegtran").await {
            return Err(ConvertError::MissingDependency(
                "jpegtran is required for JPEG optimization".to_string(),
            )
            .into());
        }
        Ok(())
    }
}
