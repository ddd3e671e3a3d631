//! # Task Optimizer Module
//!
//! Worker per la ricodifica di un singolo asset.
//! Esegue l'adapter sul blocking pool e converte i panic delle librerie
//! di terze parti in `AdapterError::Panic`.

use std::sync::Arc;

use crate::{
    codec::MediaCodec,
    config::CompressionSettings,
    error::AdapterError,
    file_manager::{Asset, AssetKind, FileManager},
};

/// Sizes of an asset before and after re-encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetOutcome {
    pub original_size: u64,
    pub optimized_size: u64,
}

/// Worker per elaborazione singoli asset
#[derive(Clone)]
pub struct TaskOptimizer {
    codec: Arc<dyn MediaCodec>,
    settings: CompressionSettings,
}

impl TaskOptimizer {
    pub fn new(codec: Arc<dyn MediaCodec>, settings: CompressionSettings) -> Self {
        Self { codec, settings }
    }

    /// Re-encode one asset in place
    pub async fn process_asset(&self, asset: &Asset) -> Result<AssetOutcome, AdapterError> {
        let codec = self.codec.clone();
        let settings = self.settings.clone();
        let asset = asset.clone();

        tokio::task::spawn_blocking(move || -> Result<AssetOutcome, AdapterError> {
            let original_size = FileManager::file_size(&asset.path)?;
            match asset.kind {
                AssetKind::Image => codec.reencode_image(&asset.path, settings.image_quality)?,
                AssetKind::Audio => codec.reencode_audio(&asset.path, &settings.audio_bitrate)?,
            }
            let optimized_size = FileManager::file_size(&asset.path)?;

            Ok(AssetOutcome {
                original_size,
                optimized_size,
            })
        })
        .await
        .map_err(|e| AdapterError::Panic(e.to_string()))?
    }
}
