//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, etc.)
//! - `Validation`: Parametri CLI fuori range o input path invalido
//! - `Subprocess`: Un tool esterno è uscito con codice non-zero
//! - `MissingDependency`: Tool esterno mancante (ffmpeg, aomenc, MP4Box, ...)
//! - `UnsupportedFormat`: Estensione file non supportata
//!
//! Gli errori scoped al singolo job (`Subprocess`, `Io`) vengono catturati
//! dal worker pool e loggati senza fermare gli altri worker; gli errori di
//! startup (`Validation`, `MissingDependency`) terminano il processo prima
//! che parta qualsiasi job.

/// Custom error types for batch image conversion
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{tool} exited with code {code}\n{stderr}")]
    Subprocess {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}
