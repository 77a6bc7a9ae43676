//! # Worker Pool Module
//!
//! Il cuore concorrente dei due tool, separato in sottomoduli:
//! - `queue`: coda FIFO thread-safe con wait-until-drained
//! - `worker`: pool a dimensione fissa con failure isolation per job

pub mod queue;
pub mod worker;

pub use queue::JobQueue;
pub use worker::WorkerPool;
