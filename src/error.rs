//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` per gli errori visibili al chiamante e quelli fatali per un task
//! - Definisce `AdapterError` per i fallimenti recuperabili su un singolo asset
//! - Integra con `thiserror` per automatic error conversion
//! - Mappa ogni errore sullo status HTTP corrispondente
//!
//! ## Categorie di errori (`OptimizeError`):
//! - `InvalidInput`: Upload mancante o di tipo errato (400)
//! - `CorruptArchive`: Archivio non estraibile o non impacchettabile (task → `Failed`)
//! - `TaskNotFound` / `NotReady`: Identificatore sconosciuto o output non pronto (404)
//! - `Io`, `MissingDependency`, `Internal`: Errori di sistema (500)
//!
//! ## Categorie di errori (`AdapterError`):
//! - `Image` / `Encode`: Decodifica o ricodifica immagine fallita
//! - `FFmpeg` / `Timeout`: Transcodifica audio fallita o troppo lenta
//! - `Panic`: Panic di una libreria di terze parti durante la codifica
//!
//! Gli `AdapterError` non escono mai dal Job Runner: l'asset viene lasciato
//! invariato, l'errore viene loggato e il task prosegue.
//!
//! ## Esempio:
//! ```rust,ignore
//! if payload.is_empty() {
//!     return Err(OptimizeError::InvalidInput("empty upload".to_string()));
//! }
//! ```

/// Errors surfaced to callers or ending a task in `Failed`
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file: {0}")]
    InvalidInput(String),

    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("File not ready or not found: {0}")]
    NotReady(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OptimizeError {
    /// HTTP status code for this error
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::TaskNotFound(_) | Self::NotReady(_) => 404,
            Self::Io(_) | Self::CorruptArchive(_) | Self::MissingDependency(_) | Self::Internal(_) => 500,
        }
    }
}

/// Recoverable failure while re-encoding a single asset
#[derive(thiserror::Error, Debug)]
pub enum AdapterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("WebP encoding error: {0}")]
    Encode(String),

    #[error("FFmpeg error: {0}")]
    FFmpeg(String),

    #[error("Transcoding timed out after {0}s")]
    Timeout(u64),

    #[error("Codec panicked: {0}")]
    Panic(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T, E = OptimizeError> = std::result::Result<T, E>;
