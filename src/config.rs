//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri del servizio
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Definisce la tabella fissa dei livelli di compressione (`CompressionLevel`)
//!
//! ## Parametri di configurazione:
//! - `host` / `port`: Indirizzo HTTP (default: 127.0.0.1:5000)
//! - `work_dir`: Directory radice per le working directory dei task
//! - `max_upload_bytes`: Dimensione massima upload (default: 100 MB)
//! - `workers`: Task in esecuzione contemporanea (default: 4)
//! - `ffmpeg_path`: Binario ffmpeg (default: risolto dalla piattaforma)
//! - `audio_codec`: Encoder audio ffmpeg (default: "libvorbis")
//! - `audio_timeout_secs`: Limite per singola transcodifica (default: 600)
//! - `retention_secs`: TTL dei task terminati (default: 3600, 0 = infinito)
//! - `sweep_interval_secs`: Periodo della pulizia (default: 60)
//! - `images_dir` / `image_extension`: Convenzione immagini ("images", "webp")
//! - `media_dir` / `audio_extension`: Convenzione audio ("media", "webm")
//!
//! ## Livelli di compressione:
//! | livello | qualità immagine | bitrate audio |
//! |---------|------------------|---------------|
//! | high    | 90               | 128k          |
//! | medium  | 80               | 96k           |
//! | low     | 60               | 64k           |
//!
//! Valori sconosciuti vengono normalizzati a `medium`.
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     workers: 8,
//!     retention_secs: 600,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::file_manager::ScanLayout;

/// Configuration for the bundle optimizer service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP bind host
    pub host: String,
    /// HTTP bind port
    pub port: u16,
    /// Root directory for per-task working directories
    pub work_dir: PathBuf,
    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
    /// Number of tasks allowed to run at the same time
    pub workers: usize,
    /// Explicit ffmpeg binary (None = platform resolution)
    pub ffmpeg_path: Option<PathBuf>,
    /// ffmpeg audio encoder
    pub audio_codec: String,
    /// Upper bound for a single audio transcode
    pub audio_timeout_secs: u64,
    /// How long terminal tasks are kept (0 = forever)
    pub retention_secs: u64,
    /// Period of the retention sweep
    pub sweep_interval_secs: u64,
    /// Subtree scanned for images
    pub images_dir: String,
    /// Image file extension
    pub image_extension: String,
    /// Subtree scanned for audio
    pub media_dir: String,
    /// Audio file extension
    pub audio_extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            work_dir: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("bundle-optimizer"),
            max_upload_bytes: 100 * 1024 * 1024,
            workers: 4,
            ffmpeg_path: None,
            audio_codec: "libvorbis".to_string(),
            audio_timeout_secs: 600,
            retention_secs: 3600,
            sweep_interval_secs: 60,
            images_dir: "images".to_string(),
            image_extension: "webp".to_string(),
            media_dir: "media".to_string(),
            audio_extension: "webm".to_string(),
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("Maximum upload size must be greater than 0"));
        }

        if self.audio_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Audio timeout must be greater than 0"));
        }

        if self.retention_secs > 0 && self.sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!("Sweep interval must be greater than 0 when retention is enabled"));
        }

        if self.audio_codec.trim().is_empty() {
            return Err(anyhow::anyhow!("Audio codec must not be empty"));
        }

        for (name, dir) in [("images_dir", &self.images_dir), ("media_dir", &self.media_dir)] {
            if dir.is_empty() || Path::new(dir).is_absolute() {
                return Err(anyhow::anyhow!("{} must be a non-empty relative path", name));
            }
        }

        for (name, ext) in [("image_extension", &self.image_extension), ("audio_extension", &self.audio_extension)] {
            if ext.is_empty() || ext.starts_with('.') {
                return Err(anyhow::anyhow!("{} must be a bare extension like \"webp\"", name));
            }
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Scanner convention derived from this configuration
    pub fn scan_layout(&self) -> ScanLayout {
        ScanLayout {
            images_dir: self.images_dir.clone(),
            image_extension: self.image_extension.clone(),
            media_dir: self.media_dir.clone(),
            audio_extension: self.audio_extension.clone(),
        }
    }

    pub fn audio_timeout(&self) -> Duration {
        Duration::from_secs(self.audio_timeout_secs)
    }

    /// Retention TTL, `None` when eviction is disabled
    pub fn retention(&self) -> Option<Duration> {
        (self.retention_secs > 0).then(|| Duration::from_secs(self.retention_secs))
    }
}

/// User-selected compression level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    High,
    #[default]
    Medium,
    Low,
}

/// Codec parameters for one compression level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionSettings {
    pub image_quality: u8,
    pub audio_bitrate: String,
}

impl CompressionLevel {
    /// Parse a form value, falling back to `Medium` for anything unrecognized
    pub fn from_param(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            other => {
                debug!("Unknown compression level {:?}, using medium", other);
                Self::Medium
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn settings(&self) -> CompressionSettings {
        let (image_quality, audio_bitrate) = match self {
            Self::High => (90, "128k"),
            Self::Medium => (80, "96k"),
            Self::Low => (60, "64k"),
        };

        CompressionSettings {
            image_quality,
            audio_bitrate: audio_bitrate.to_string(),
        }
    }
}
