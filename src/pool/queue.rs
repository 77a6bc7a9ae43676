//! # Job Queue Module
//!
//! Coda FIFO thread-safe dei file in attesa di conversione.
//!
//! ## Contratto:
//! - `enqueue`: aggiunge un job, non blocca mai
//! - `dequeue`: estrae un job pendente, `None` se la coda è vuota
//! - `mark_done`: chiamata esattamente una volta per job (successo o errore)
//! - `wait_until_drained`: blocca finché ogni job accodato è stato marcato
//!
//! Il design prevede una singola fase di enqueue seguita dalla fase di
//! drain: nessun job viene ri-accodato durante il processing. Un worker che
//! riceve `None` da `dequeue` può quindi terminare il suo loop senza
//! ricontrollare. L'attesa del drain usa `tokio::sync::Notify`, niente
//! polling sul main task.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Thread-safe FIFO of pending conversion jobs.
pub struct JobQueue {
    pending: Mutex<VecDeque<PathBuf>>,
    /// Jobs enqueued but not yet marked done (pending + in-flight).
    outstanding: AtomicUsize,
    drained: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            outstanding: AtomicUsize::new(0),
            drained: Notify::new(),
        }
    }

    /// Add one job. Never blocks.
    pub fn enqueue(&self, job: PathBuf) {
        self.outstanding.fetch_add(1, Ordering::AcqRel);
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(job);
    }

    /// Remove and return one pending job, or `None` if the queue is empty.
    pub fn dequeue(&self) -> Option<PathBuf> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
    }

    /// Mark one dequeued job as complete (success or failure alike).
    pub fn mark_done(&self) {
        let before = self.outstanding.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(before > 0, "mark_done called more times than enqueue");
        if before == 1 {
            self.drained.notify_waiters();
        }
    }

    /// Number of jobs not yet marked done (pending + in-flight).
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Wait until every enqueued job has been marked done.
    pub async fn wait_until_drained(&self) {
        loop {
            let notified = self.drained.notified();
            if self.outstanding.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
