//! # Space Bundle Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs, il server HTTP e i test
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione, validazione e livelli di compressione
//! - `error`: Errori di task (`OptimizeError`) e di singolo asset (`AdapterError`)
//! - `state`: Job Record Store (progresso, etichetta, output, stato)
//! - `file_manager`: Scansione degli asset e operazioni sui file
//! - `archive`: Estrazione e impacchettamento zip
//! - `codec`: Interfaccia uniforme degli adapter di ricodifica
//! - `image_processor`: Ricodifica WebP lossy
//! - `audio_processor`: Transcodifica audio con FFmpeg
//! - `optimizer`: Task Dispatcher e Job Runner
//! - `server`: Endpoint HTTP
//! - `progress`: Statistiche e progress bar
//!
//! ## Utilizzo:
//! ```rust,ignore
//! use space_bundle_optimizer::{Config, MediaOptimizer};
//!
//! let optimizer = MediaOptimizer::new(Config::default()).await?;
//! let task_id = optimizer.submit(Some("bundle.zip"), &bytes, "medium").await?;
//! println!("{}%", optimizer.progress(&task_id)?.progress);
//! ```

pub mod archive;
pub mod audio_processor;
pub mod codec;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod optimizer;
pub mod platform;
pub mod progress;
pub mod server;
pub mod state;
pub mod utils;

pub use codec::{DefaultCodec, MediaCodec};
pub use config::{CompressionLevel, CompressionSettings, Config};
pub use error::{AdapterError, OptimizeError};
pub use optimizer::MediaOptimizer;
pub use state::{JobSnapshot, JobStage, JobStore, TaskId};
