//! # img2avif - Batch AVIF Encoder
//!
//! Punto di ingresso del tool di conversione AVIF.
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (input, quality, preset, bit depth, noise, ...)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Valida la configurazione e le dipendenze esterne
//! 4. Rileva una sola volta la disponibilità di photonnoise: se assente il
//!    grain synthesis viene disabilitato per l'intero run
//! 5. File singolo: converte direttamente; directory: popola la job queue e
//!    lancia il worker pool
//!
//! ## Exit code:
//! 0 = tutti i job riusciti, 1 = errore di argomenti/startup,
//! 2 = almeno un job fallito.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use imgpress::file_manager::CONVERTIBLE_EXTENSIONS;
use imgpress::{
    AvifEncoder, Config, ConvertError, FileManager, JobQueue, ProgressManager, RunStats,
    WorkerPool,
};

#[derive(Parser)]
#[command(name = "img2avif")]
#[command(about = "Encode images to the AVIF format with optional synthetic film grain")]
struct Args {
    /// Input file or directory
    #[arg(short = 'i')]
    input: PathBuf,

    /// Output file (only works with single file inputs, must end in .avif)
    #[arg(short = 'o')]
    output: Option<PathBuf>,

    /// Quality to encode at (1 near lossless - 63 very lossy) (Default: 16)
    #[arg(short = 'q')]
    quality: Option<u8>,

    /// Preset to encode at (0 slowest - 9 fastest) (Default: 3)
    #[arg(short = 'p')]
    preset: Option<u8>,

    /// Bit depth to encode at (8, 10, 12) (Default: 10)
    #[arg(short = 'b')]
    bit_depth: Option<u8>,

    /// Delete source file after converting (0 or 1) (Default: 1)
    #[arg(short = 'd')]
    delete_source: Option<u8>,

    /// Noise level for the grain table, 0 disables grain synthesis (Default: 320)
    #[arg(short = 'n')]
    noise_level: Option<u32>,

    /// Number of parallel workers (Default: 4)
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// JSON config file providing defaults for the options above
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    /// Merge CLI arguments over the config-file (or built-in) defaults.
    async fn build_config(&self) -> Result<Config> {
        let base = match &self.config {
            Some(path) => Config::from_file(path).await?,
            None => Config::default(),
        };

        if let Some(flag) = self.delete_source {
            if flag > 1 {
                return Err(anyhow::anyhow!(
                    "Invalid delete flag \"{}\" (must be 0 or 1)",
                    flag
                ));
            }
        }

        let config = Config {
            quality: self.quality.unwrap_or(base.quality),
            preset: self.preset.unwrap_or(base.preset),
            bit_depth: self.bit_depth.unwrap_or(base.bit_depth),
            delete_source: self
                .delete_source
                .map(|flag| flag == 1)
                .unwrap_or(base.delete_source),
            noise_level: self.noise_level.unwrap_or(base.noise_level),
            workers: self.workers.unwrap_or(base.workers),
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = args.build_config().await?;

    AvifEncoder::check_dependencies().await?;

    // One-shot detection: a missing grain generator downgrades the feature
    // for the whole run instead of failing every job.
    let grain_available = config.noise_level == 0 || AvifEncoder::grain_tool_available().await;
    if config.disable_grain_if_unavailable(grain_available) {
        warn!("\"photon_noise_table\" devtool not detected, disabling grain synthesis.");
    }

    if args.input.is_file() {
        convert_single(&args, config).await?;
        Ok(())
    } else if args.input.is_dir() {
        if args.output.is_some() {
            return Err(anyhow::anyhow!(
                "Output file only works with single file inputs"
            ));
        }
        let stats = convert_batch(&args.input, config).await?;
        if stats.failed > 0 {
            std::process::exit(2);
        }
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "Invalid input: {} is neither a file nor a directory",
            args.input.display()
        ))
    }
}

/// Convert one file in the calling task, pinned to CPU 0.
async fn convert_single(args: &Args, config: Config) -> Result<()> {
    if !FileManager::has_extension_in(&args.input, CONVERTIBLE_EXTENSIONS) {
        return Err(ConvertError::UnsupportedFormat(args.input.display().to_string()).into());
    }

    let output = match &args.output {
        Some(path) => {
            if !FileManager::has_extension_in(path, &["avif"]) {
                return Err(anyhow::anyhow!("Output must be avif"));
            }
            path.clone()
        }
        None => FileManager::with_extension(&args.input, "avif"),
    };

    let delete_source = config.delete_source;
    let encoder = AvifEncoder::new(config)?;
    let start = std::time::Instant::now();

    encoder.convert(&args.input, &output, &[0]).await?;
    if delete_source {
        tokio::fs::remove_file(&args.input).await?;
    }

    info!(
        "Finished \"{}\" in {:.2} second(s)",
        FileManager::display_name(&args.input),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Convert every supported image under a directory with the worker pool.
async fn convert_batch(dir: &PathBuf, config: Config) -> Result<RunStats> {
    let files = FileManager::find_convertible_images(dir)?;
    info!("{} file(s) found", files.len());

    if files.is_empty() {
        return Ok(RunStats::new());
    }

    let queue = Arc::new(JobQueue::new());
    for file in &files {
        queue.enqueue(file.clone());
    }

    let progress = ProgressManager::new(files.len() as u64);
    let delete_source = config.delete_source;
    let workers = config.workers;
    let encoder = Arc::new(AvifEncoder::new(config)?);

    let stats = WorkerPool::new(workers)
        .run(queue, progress.clone(), move |worker, job| {
            let encoder = encoder.clone();
            async move {
                let output = FileManager::with_extension(&job, "avif");
                encoder.convert(&job, &output, &[worker]).await?;
                if delete_source {
                    tokio::fs::remove_file(&job).await?;
                }
                Ok(0)
            }
        })
        .await;

    progress.finish(&stats.format_summary());
    Ok(stats)
}
