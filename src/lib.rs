//! # Imgpress Library
//!
//! Batch conversione di immagini verso AVIF e ri-ottimizzazione lossless di
//! JPEG, interamente orchestrate su tool esterni.
//!
//! ## Architettura dei moduli:
//! - `config`: Parametri di conversione e validazione
//! - `error`: Tipi di errore custom per le diverse operazioni
//! - `file_manager`: Discovery dei file e utilità sui path
//! - `platform`: Nomi dei tool per piattaforma e rilevamento disponibilità
//! - `runner`: Esecuzione subprocess con cattura output e pinning CPU
//! - `pool`: Job queue e worker pool a dimensione fissa
//! - `avif`: Pipeline di conversione AVIF per singolo file
//! - `jpeg`: Ottimizzazione lossless JPEG per singolo file
//! - `progress`: Progress bar e statistiche di run
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use imgpress::{AvifEncoder, Config};
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Config::default();
//! config.validate()?;
//! let encoder = AvifEncoder::new(config)?;
//! encoder.convert("in.png".as_ref(), "out.avif".as_ref(), &[0]).await?;
//! # Ok(())
//! # }
//! ```

pub mod avif;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod jpeg;
pub mod platform;
pub mod pool;
pub mod progress;
pub mod runner;
pub mod utils;

pub use avif::AvifEncoder;
pub use config::{BitDepth, Config};
pub use error::ConvertError;
pub use file_manager::FileManager;
pub use jpeg::JpegOptimizer;
pub use pool::{JobQueue, WorkerPool};
pub use progress::{ProgressManager, RunStats};
