//! # Worker Pool Module
//!
//! Pool a dimensione fissa di worker che consumano la `JobQueue`.
//!
//! ## Contratto:
//! - K worker concorrenti, etichettati con tag di affinità 0..K-1
//! - Ogni worker: dequeue -> processa -> logga esito -> mark_done -> ripeti
//! - Failure isolation: l'errore di un job viene catturato e loggato nel
//!   worker, mai propagato al pool o agli altri worker
//! - Il pool termina naturalmente quando ogni worker osserva la coda vuota
//!
//! Il successo logga il tempo trascorso e il nome file; il fallimento logga
//! la catena di errore completa (tool, exit code, stderr catturato).

use crate::file_manager::FileManager;
use crate::pool::queue::JobQueue;
use crate::progress::{ProgressManager, RunStats};
use anyhow::Result;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Fixed-size pool of concurrent conversion workers.
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Worker count is fixed at startup and passed in explicitly.
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }

    /// Run `job_fn` over every queued job and return the aggregate stats.
    ///
    /// `job_fn` receives the worker's affinity tag and the job path, and
    /// returns the number of bytes saved by that job (0 when the tool does
    /// not report savings).
    pub async fn run<F, Fut>(
        &self,
        queue: Arc<JobQueue>,
        progress: ProgressManager,
        job_fn: F,
    ) -> RunStats
    where
        F: Fn(usize, PathBuf) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<u64>> + Send + 'static,
    {
        let succeeded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));
        let bytes_saved = Arc::new(AtomicU64::new(0));

        let mut handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let queue = queue.clone();
            let progress = progress.clone();
            let job_fn = job_fn.clone();
            let succeeded = succeeded.clone();
            let failed = failed.clone();
            let bytes_saved = bytes_saved.clone();

            handles.push(tokio::spawn(async move {
                while let Some(job) = queue.dequeue() {
                    let start = Instant::now();
                    let name = FileManager::display_name(&job);

                    // Per-job failure boundary: an error here is this job's
                    // outcome, never the pool's.
                    match job_fn(worker_id, job.clone()).await {
                        Ok(saved) => {
                            succeeded.fetch_add(1, Ordering::Relaxed);
                            bytes_saved.fetch_add(saved, Ordering::Relaxed);
                            info!(
                                "Finished \"{}\" in {:.2} second(s)",
                                name,
                                start.elapsed().as_secs_f64()
                            );
                            progress.update(&format!("[OK] {}", name));
                        }
                        Err(e) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            error!("Failed to process \"{}\": {:#}", job.display(), e);
                            progress.update(&format!("[ERROR] {}", name));
                        }
                    }

                    queue.mark_done();
                }
            }));
        }

        queue.wait_until_drained().await;
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Worker task panicked: {}", e);
            }
        }

        RunStats {
            succeeded: succeeded.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
            bytes_saved: bytes_saved.load(Ordering::Relaxed),
        }
    }
}
