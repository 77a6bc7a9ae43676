//! # jpegopt - Lossless JPEG Optimizer
//!
//! Punto di ingresso del tool di ri-ottimizzazione lossless.
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (directory di input, worker count)
//! 2. Valida che l'input sia una directory e che jpegtran sia installato
//! 3. Popola la job queue e lancia il worker pool (default: metà delle CPU)
//! 4. Ogni job è una singola invocazione jpegtran con overwrite in-place
//!
//! ## Exit code:
//! 0 = tutti i job riusciti, 1 = errore di argomenti/startup,
//! 2 = almeno un job fallito.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use imgpress::{FileManager, JobQueue, JpegOptimizer, ProgressManager, WorkerPool};

#[derive(Parser)]
#[command(name = "jpegopt")]
#[command(about = "Losslessly re-optimize JPEG files in place")]
struct Args {
    /// Input directory
    #[arg(short = 'i')]
    input: PathBuf,

    /// Number of parallel workers (Default: half the logical CPUs)
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Half the logical CPUs, at least one.
fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(1)
        .max(1)
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

    if !args.input.is_dir() {
        return Err(anyhow::anyhow!(
            "Input must be a directory: {}",
            args.input.display()
        ));
    }

    JpegOptimizer::check_dependencies().await?;

    let workers = args.workers.unwrap_or_else(default_workers);
    if workers == 0 {
        return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
    }

    let files = FileManager::find_jpeg_files(&args.input)?;
    info!("{} file(s) found", files.len());

    if files.is_empty() {
        return Ok(());
    }

    let queue = Arc::new(JobQueue::new());
    for file in &files {
        queue.enqueue(file.clone());
    }

    let progress = ProgressManager::new(files.len() as u64);
    let stats = WorkerPool::new(workers)
        .run(queue, progress.clone(), |worker, job| async move {
            JpegOptimizer::optimize(&job, &[worker]).await
        })
        .await;

    progress.finish(&stats.format_summary());

    if stats.failed > 0 {
        std::process::exit(2);
    }
    Ok(())
}
