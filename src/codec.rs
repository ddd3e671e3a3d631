//! # Codec Adapters
//!
//! Interfaccia uniforme e sincrona sopra le due operazioni di ricodifica:
//! un file, un parametro, il file viene modificato in place oppure lasciato
//! invariato con un `AdapterError`.
//!
//! Il Job Runner invoca gli adapter sul blocking pool di tokio, quindi
//! un'implementazione può bloccare liberamente (I/O, processi esterni).

use std::path::Path;

use crate::audio_processor::AudioProcessor;
use crate::config::Config;
use crate::error::AdapterError;
use crate::image_processor::ImageProcessor;

/// Per-asset re-encode operations
pub trait MediaCodec: Send + Sync {
    /// Re-encode the image at `path` in place with lossy `quality` (1-100)
    fn reencode_image(&self, path: &Path, quality: u8) -> Result<(), AdapterError>;

    /// Transcode the audio file at `path` in place at `bitrate` (e.g. "96k")
    fn reencode_audio(&self, path: &Path, bitrate: &str) -> Result<(), AdapterError>;
}

/// WebP encoder for images, ffmpeg for audio
#[derive(Debug, Clone)]
pub struct DefaultCodec {
    audio: AudioProcessor,
}

impl DefaultCodec {
    pub fn new(config: &Config) -> Self {
        Self {
            audio: AudioProcessor::new(config),
        }
    }

    pub fn audio(&self) -> &AudioProcessor {
        &self.audio
    }
}

impl MediaCodec for DefaultCodec {
    fn reencode_image(&self, path: &Path, quality: u8) -> Result<(), AdapterError> {
        ImageProcessor::reencode(path, quality)
    }

    fn reencode_audio(&self, path: &Path, bitrate: &str) -> Result<(), AdapterError> {
        self.audio.reencode(path, bitrate)
    }
}
