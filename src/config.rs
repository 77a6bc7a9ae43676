//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Parametri di configurazione:
//! - `quality`: Livello di quantizzazione aomenc (1-63, default: 16, più basso = migliore qualità)
//! - `preset`: Preset di velocità cpu-used (0-9, default: 3, 0 = più lento)
//! - `bit_depth`: Profondità di bit dell'encode (8, 10, 12, default: 10)
//! - `delete_source`: Elimina il file sorgente dopo una conversione riuscita (default: true)
//! - `noise_level`: Livello ISO per la grain table sintetica (default: 320, 0 = disabilitato)
//! - `workers`: Numero di worker paralleli (default: 4)
//!
//! ## Validazione:
//! La validazione avviene una sola volta allo startup; dopo di che la config
//! è condivisa read-only tra tutti i worker (nessuna sincronizzazione).
//!
//! ## Esempio:
//! ```rust
//! # use imgpress::Config;
//! # fn demo() -> anyhow::Result<()> {
//! let config = Config {
//!     quality: 20,
//!     preset: 4,
//!     ..Default::default()
//! };
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

use crate::error::ConvertError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Supported encode bit depths and their yuv4mpegpipe pixel formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Eight,
    Ten,
    Twelve,
}

impl BitDepth {
    /// Parse a raw bit-depth value. Anything outside {8, 10, 12} is rejected.
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            8 => Some(Self::Eight),
            10 => Some(Self::Ten),
            12 => Some(Self::Twelve),
            _ => None,
        }
    }

    /// Pixel format passed to ffmpeg's `-pix_fmt` for this depth.
    pub fn pixel_format(self) -> &'static str {
        match self {
            Self::Eight => "yuv444p",
            Self::Ten => "yuv444p10le",
            Self::Twelve => "yuv444p12le",
        }
    }

}

/// Configuration for AVIF conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// aomenc cq-level (1 near lossless - 63 very lossy)
    pub quality: u8,
    /// aomenc cpu-used preset (0 slowest - 9 fastest)
    pub preset: u8,
    /// Encode bit depth (8, 10, 12)
    pub bit_depth: u8,
    /// Delete the source file after a successful conversion
    pub delete_source: bool,
    /// ISO noise level for the synthetic grain table (0 = disabled)
    pub noise_level: u32,
    /// Number of parallel workers
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quality: 16,
            preset: 3,
            bit_depth: 10,
            delete_source: true,
            noise_level: 320,
            workers: 4,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.quality < 1 || self.quality > 63 {
            return Err(ConvertError::Validation(format!(
                "Invalid quality level \"{}\" (must be 1-63)",
                self.quality
            ))
            .into());
        }

        if self.preset > 9 {
            return Err(ConvertError::Validation(format!(
                "Invalid preset level \"{}\" (must be 0-9)",
                self.preset
            ))
            .into());
        }

        if BitDepth::from_raw(self.bit_depth).is_none() {
            return Err(ConvertError::Validation(format!(
                "Invalid bit depth \"{}\" (must be 8, 10 or 12)",
                self.bit_depth
            ))
            .into());
        }

        if self.workers == 0 {
            return Err(ConvertError::Validation(
                "Number of workers must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Disable grain synthesis when the generator tool is absent.
    ///
    /// Returns `true` when the noise level was actually downgraded, so the
    /// caller can warn once; a run that never asked for grain stays silent.
    pub fn disable_grain_if_unavailable(&mut self, tool_available: bool) -> bool {
        if tool_available || self.noise_level == 0 {
            return false;
        }
        self.noise_level = 0;
        true
    }

    /// Typed bit depth. Only meaningful after `validate()` has passed.
    pub fn typed_bit_depth(&self) -> Result<BitDepth> {
        BitDepth::from_raw(self.bit_depth).ok_or_else(|| {
            ConvertError::Validation(format!(
                "Invalid bit depth \"{}\" (must be 8, 10 or 12)",
                self.bit_depth
            ))
            .into()
        })
    }

    /// Load configuration from file
    pub async fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.quality = 0;
        assert!(config.validate().is_err());

        // Values above the range must be rejected, not just below it.
        config.quality = 90;
        assert!(config.validate().is_err());

        config.quality = 16;
        config.preset = 10;
        assert!(config.validate().is_err());

        config.preset = 3;
        config.bit_depth = 9;
        assert!(config.validate().is_err());

        config.bit_depth = 12;
        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_errors_are_typed() {
        let config = Config {
            quality: 90,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Validation(_))
        ));
    }

    #[test]
    fn test_grain_disabled_when_tool_missing() {
        let mut config = Config::default();
        assert!(config.disable_grain_if_unavailable(false));
        assert_eq!(config.noise_level, 0);
    }

    #[test]
    fn test_grain_untouched_when_tool_present_or_already_off() {
        let mut config = Config::default();
        assert!(!config.disable_grain_if_unavailable(true));
        assert_eq!(config.noise_level, 320);

        config.noise_level = 0;
        assert!(!config.disable_grain_if_unavailable(false));
        assert_eq!(config.noise_level, 0);
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.quality, 16);
        assert_eq!(config.preset, 3);
        assert_eq!(config.bit_depth, 10);
        assert!(config.delete_source);
        assert_eq!(config.noise_level, 320);
        assert_eq!(config.workers, 4);
    }

    #[test]
    fn test_bit_depth_pixel_format() {
        assert_eq!(BitDepth::Eight.pixel_format(), "yuv444p");
        assert_eq!(BitDepth::Ten.pixel_format(), "yuv444p10le");
        assert_eq!(BitDepth::Twelve.pixel_format(), "yuv444p12le");
    }

    #[test]
    fn test_bit_depth_rejects_invalid() {
        assert!(BitDepth::from_raw(8).is_some());
        assert!(BitDepth::from_raw(10).is_some());
        assert!(BitDepth::from_raw(12).is_some());
        assert!(BitDepth::from_raw(0).is_none());
        assert!(BitDepth::from_raw(9).is_none());
        assert!(BitDepth::from_raw(16).is_none());
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            quality: 24,
            preset: 6,
            bit_depth: 8,
            delete_source: false,
            noise_level: 0,
            workers: 8,
        };

        // Save config
        original_config.save_to_file(&config_path).await.unwrap();

        // Load config
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.quality, 24);
        assert_eq!(loaded_config.preset, 6);
        assert_eq!(loaded_config.bit_depth, 8);
        assert!(!loaded_config.delete_source);
        assert_eq!(loaded_config.noise_level, 0);
        assert_eq!(loaded_config.workers, 8);
    }

    #[tokio::test]
    async fn test_config_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nope.json");
        let config = Config::from_file(&config_path).await.unwrap();
        assert_eq!(config.quality, Config::default().quality);
    }
}
