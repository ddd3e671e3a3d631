//! # Image Processing Module
//!
//! Questo modulo ricodifica le immagini del bundle in WebP lossy.
//!
//! ## Pipeline:
//! 1. **Decodifica**: `image` con rilevamento del formato dal contenuto
//! 2. **Normalizzazione**: conversione a RGB8 / RGBA8 (richiesto da libwebp)
//! 3. **Codifica**: `webp::Encoder` con la qualità del livello scelto
//! 4. **Scrittura atomica**: file temporaneo fratello + rename sull'originale
//!
//! ## Error Handling:
//! - Input corrotto → `AdapterError::Image`, il file originale resta intatto
//! - Errore dell'encoder → `AdapterError::Encode`
//! - Nessun panic propagato: il chiamante esegue l'adapter sul blocking pool
//!
//! Ricodificare un'immagine già ottimizzata con la stessa qualità è sicuro:
//! produce di nuovo un WebP valido (non necessariamente identico).

use image::io::Reader as ImageReader;
use image::DynamicImage;
use std::path::Path;
use tracing::debug;
use webp::Encoder;

use crate::error::AdapterError;
use crate::file_manager::FileManager;

/// Lossy WebP re-encoder
pub struct ImageProcessor;

impl ImageProcessor {
    /// Decode the image at `path` and overwrite it as lossy WebP at `quality`
    pub fn reencode(path: &Path, quality: u8) -> Result<(), AdapterError> {
        let encoded = Self::encode(path, quality)?;
        FileManager::write_atomically(path, &encoded)?;
        debug!("Re-encoded {} at quality {} ({})", path.display(), quality, FileManager::format_size(encoded.len() as u64));
        Ok(())
    }

    /// Encode the image at `path` without touching the file
    pub fn encode(path: &Path, quality: u8) -> Result<Vec<u8>, AdapterError> {
        let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        let image = Self::normalize(image);

        let encoder = Encoder::from_image(&image).map_err(|e| AdapterError::Encode(e.to_string()))?;
        let memory = encoder.encode(f32::from(quality.min(100)));
        Ok(memory.to_vec())
    }

    fn normalize(image: DynamicImage) -> DynamicImage {
        match image {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
            other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
            other => DynamicImage::ImageRgb8(other.to_rgb8()),
        }
    }
}
