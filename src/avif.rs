//! # AVIF Conversion Module
//!
//! Questo modulo implementa la pipeline di conversione di una singola
//! immagine in AVIF, interamente orchestrata su tool esterni.
//!
//! ## Pipeline per job (l'ordine è fisso, un errore abortisce il job):
//! 1. Se noise_level > 0: probe della risoluzione con ffprobe e generazione
//!    della grain table sintetica con photonnoise (black/reference 25/25)
//! 2. Decode con ffmpeg in uno stream yuv4mpegpipe al pixel format della
//!    bit depth richiesta, pipe diretta dentro aomenc (all-intra, single
//!    pass, single thread) con il set fisso di flag di tuning qualitativo
//! 3. Mux del bitstream IVF nel container finale con MP4Box (brand avif+miaf,
//!    immagine primaria)
//! 4. Rimozione degli intermedi (.ivf, .tbl)
//!
//! Gli intermedi sono colocati con il sorgente (stesso path, estensione
//! sostituita). La cancellazione del sorgente è responsabilità del chiamante,
//! solo dopo successo completo.
//!
//! ## Dipendenze richieste:
//! - `ffmpeg` / `ffprobe`: decode e probe
//! - `aomenc`: encoder AV1 still-image
//! - `MP4Box`: muxing del container
//! - `photonnoise`: generazione grain table (opzionale, rilevata allo startup)

use crate::config::{BitDepth, Config};
use crate::error::ConvertError;
use crate::file_manager::FileManager;
use crate::platform::PlatformCommands;
use crate::runner;
use crate::utils::to_string_vec;
use anyhow::Result;
use std::path::Path;
use tracing::{debug, warn};

/// Fixed quality tuning applied to every encode.
const AOM_TUNING: &[&str] = &[
    "--enable-dual-filter=0",
    "--deltaq-mode=3",
    "--enable-chroma-deltaq=1",
    "--tune=image_perceptual_quality",
    "--tune-content=default",
    "--dist-metric=qm-psnr",
    "--aq-mode=1",
    "--enable-qm=1",
    "--sharpness=1",
    "--quant-b-adapt=1",
    "--disable-trellis-quant=0",
];

/// Grain table black/reference levels passed to photonnoise.
const GRAIN_BLACK_LEVEL: u32 = 25;
const GRAIN_REFERENCE_LEVEL: u32 = 25;

/// Converts single images to AVIF via external tools
pub struct AvifEncoder {
    config: Config,
    bit_depth: BitDepth,
}

impl AvifEncoder {
    pub fn new(config: Config) -> Result<Self> {
        let bit_depth = config.typed_bit_depth()?;
        Ok(Self { config, bit_depth })
    }

    /// Convert one image, leaving no intermediates behind.
    pub async fn convert(&self, input: &Path, output: &Path, affinity: &[usize]) -> Result<()> {
        let temp_ivf = FileManager::with_extension(input, "ivf");
        let temp_tbl = FileManager::with_extension(input, "tbl");

        let result = self
            .convert_inner(input, output, &temp_ivf, &temp_tbl, affinity)
            .await;

        // Intermediates are removed on success and failure alike.
        Self::remove_if_exists(&temp_ivf).await;
        if self.config.noise_level > 0 {
            Self::remove_if_exists(&temp_tbl).await;
        }

        result
    }

    async fn convert_inner(
        &self,
        input: &Path,
        output: &Path,
        temp_ivf: &Path,
        temp_tbl: &Path,
        affinity: &[usize],
    ) -> Result<()> {
        let grain_table = if self.config.noise_level > 0 {
            self.generate_grain_table(input, temp_tbl, affinity).await?;
            Some(temp_tbl)
        } else {
            None
        };

        self.encode(input, temp_ivf, grain_table, affinity).await?;
        self.mux(temp_ivf, output, affinity).await?;

        Ok(())
    }

    /// Probe the source resolution with ffprobe.
    async fn probe_resolution(&self, input: &Path, affinity: &[usize]) -> Result<(u32, u32)> {
        let args = to_string_vec([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-print_format",
            "json",
            &input.to_string_lossy(),
        ]);

        let stdout = runner::run("ffprobe", &args, Some(affinity)).await?;
        parse_resolution(&stdout)
            .map_err(|e| anyhow::anyhow!("Could not probe resolution of {}: {}", input.display(), e))
    }

    /// Generate the synthetic film-grain table for this source.
    async fn generate_grain_table(
        &self,
        input: &Path,
        table: &Path,
        affinity: &[usize],
    ) -> Result<()> {
        let (width, height) = self.probe_resolution(input, affinity).await?;
        debug!(
            "Generating grain table for {} ({}x{}, ISO {})",
            input.display(),
            width,
            height,
            self.config.noise_level
        );

        let args = grain_args(width, height, self.config.noise_level, table);
        runner::run("photonnoise", &args, Some(affinity)).await?;
        Ok(())
    }

    /// Decode with ffmpeg and pipe straight into aomenc.
    async fn encode(
        &self,
        input: &Path,
        ivf: &Path,
        grain_table: Option<&Path>,
        affinity: &[usize],
    ) -> Result<()> {
        let decoder_args = self.decoder_args(input);
        let encoder_args = self.encoder_args(ivf, grain_table);
        runner::run_piped("ffmpeg", &decoder_args, "aomenc", &encoder_args, Some(affinity))
            .await?;
        Ok(())
    }

    /// Wrap the raw IVF bitstream into the final AVIF container.
    async fn mux(&self, ivf: &Path, output: &Path, affinity: &[usize]) -> Result<()> {
        let args = mux_args(ivf, output);
        runner::run("MP4Box", &args, Some(affinity)).await?;
        Ok(())
    }

    fn decoder_args(&self, input: &Path) -> Vec<String> {
        to_string_vec([
            "-loglevel",
            "panic",
            "-i",
            &input.to_string_lossy(),
            "-strict",
            "-2",
            "-pix_fmt",
            self.bit_depth.pixel_format(),
            "-f",
            "yuv4mpegpipe",
            "-",
        ])
    }

    fn encoder_args(&self, ivf: &Path, grain_table: Option<&Path>) -> Vec<String> {
        let mut args = to_string_vec([
            "-",
            "-o",
            &ivf.to_string_lossy(),
            "--allintra",
            "--passes=1",
            "--threads=1",
            &format!("--cpu-used={}", self.config.preset),
            "--end-usage=q",
            &format!("--cq-level={}", self.config.quality),
        ]);

        if let Some(table) = grain_table {
            args.push("--enable-dnl-denoising=0".to_string());
            args.push(format!("--film-grain-table={}", table.to_string_lossy()));
        }

        args.extend(AOM_TUNING.iter().map(|flag| flag.to_string()));
        args
    }

    async fn remove_if_exists(path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!("Removed intermediate {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove intermediate {}: {}", path.display(), e),
        }
    }

    /// Check that the mandatory external tools are present.
    pub async fn check_dependencies() -> Result<()> {
        let platform = PlatformCommands::instance();
        let tools = ["ffmpeg", "ffprobe", "aomenc", "MP4Box"];

        for tool in &tools {
            if !platform.is_command_available(tool).await {
                return Err(ConvertError::MissingDependency(format!(
                    "{} is required for AVIF conversion",
                    tool
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Whether the optional grain-table generator is installed.
    pub async fn grain_tool_available() -> bool {
        PlatformCommands::instance()
            .is_command_available("photonnoise")
            .await
    }
}

fn grain_args(width: u32, height: u32, iso: u32, table: &Path) -> Vec<String> {
    to_string_vec([
        "-w",
        &width.to_string(),
        "-l",
        &height.to_string(),
        "-i",
        &iso.to_string(),
        "-b",
        &GRAIN_BLACK_LEVEL.to_string(),
        "-r",
        &GRAIN_REFERENCE_LEVEL.to_string(),
        "-o",
        &table.to_string_lossy(),
    ])
}

fn mux_args(ivf: &Path, output: &Path) -> Vec<String> {
    to_string_vec([
        "-add-image",
        &format!("{}:primary", ivf.to_string_lossy()),
        "-ab",
        "avif",
        "-ab",
        "miaf",
        "-new",
        &output.to_string_lossy(),
    ])
}

/// Extract width/height from ffprobe's JSON stream listing.
fn parse_resolution(json: &str) -> Result<(u32, u32)> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let stream = value["streams"]
        .as_array()
        .and_then(|streams| streams.first())
        .ok_or_else(|| anyhow::anyhow!("no video stream in probe output"))?;

    let width = stream["width"]
        .as_u64()
        .ok_or_else(|| anyhow::anyhow!("missing width in probe output"))?;
    let height = stream["height"]
        .as_u64()
        .ok_or_else(|| anyhow::anyhow!("missing height in probe output"))?;

    Ok((width as u32, height as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(config: Config) -> AvifEncoder {
        AvifEncoder::new(config).unwrap()
    }

    #[test]
    fn test_decoder_args_follow_bit_depth() {
        let enc = encoder(Config {
            bit_depth: 8,
            ..Default::default()
        });
        let args = enc.decoder_args(Path::new("in.png"));
        assert!(args.contains(&"yuv444p".to_string()));
        assert!(args.contains(&"yuv4mpegpipe".to_string()));

        let enc = encoder(Config {
            bit_depth: 12,
            ..Default::default()
        });
        let args = enc.decoder_args(Path::new("in.png"));
        assert!(args.contains(&"yuv444p12le".to_string()));
    }

    #[test]
    fn test_encoder_args_carry_quality_preset_and_tuning() {
        let enc = encoder(Config {
            quality: 20,
            preset: 5,
            ..Default::default()
        });
        let args = enc.encoder_args(Path::new("in.ivf"), None);

        assert!(args.contains(&"--cq-level=20".to_string()));
        assert!(args.contains(&"--cpu-used=5".to_string()));
        assert!(args.contains(&"--allintra".to_string()));
        for flag in AOM_TUNING {
            assert!(args.contains(&flag.to_string()), "missing {flag}");
        }
        assert!(!args.iter().any(|a| a.starts_with("--film-grain-table")));
    }

    #[test]
    fn test_encoder_args_attach_grain_table_and_disable_denoising() {
        let enc = encoder(Config::default());
        let args = enc.encoder_args(Path::new("in.ivf"), Some(Path::new("in.tbl")));

        assert!(args.contains(&"--enable-dnl-denoising=0".to_string()));
        assert!(args.contains(&"--film-grain-table=in.tbl".to_string()));
    }

    #[test]
    fn test_grain_args_fixed_levels() {
        let args = grain_args(1920, 1080, 320, Path::new("x.tbl"));
        assert_eq!(
            args,
            vec!["-w", "1920", "-l", "1080", "-i", "320", "-b", "25", "-r", "25", "-o", "x.tbl"]
        );
    }

    #[test]
    fn test_mux_args_brands_and_primary_item() {
        let args = mux_args(Path::new("img.ivf"), Path::new("img.avif"));
        assert_eq!(
            args,
            vec!["-add-image", "img.ivf:primary", "-ab", "avif", "-ab", "miaf", "-new", "img.avif"]
        );
    }

    #[test]
    fn test_parse_resolution() {
        let json = r#"{"programs": [], "streams": [{"width": 3840, "height": 2160}]}"#;
        assert_eq!(parse_resolution(json).unwrap(), (3840, 2160));
    }

    #[test]
    fn test_parse_resolution_rejects_empty_probe() {
        assert!(parse_resolution(r#"{"streams": []}"#).is_err());
        assert!(parse_resolution(r#"{"streams": [{"width": 100}]}"#).is_err());
    }
}
