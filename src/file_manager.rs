//! # File Management Module
//!
//! Questo modulo gestisce la discovery degli asset e le operazioni sui file.
//!
//! ## Responsabilità:
//! - Scansione ricorsiva dell'albero estratto (`scan`)
//! - Classificazione in liste ordinate: immagini e audio
//! - Sostituzione atomica di un file con la sua versione ricodificata
//! - Utilità per dimensioni e percentuali di riduzione
//!
//! ## Convenzione di scansione:
//! - **Immagini**: file `*.webp` ovunque sotto `images/`
//! - **Audio**: file `*.webm` ovunque sotto `media/`
//! - Sottodirectory mancanti producono liste vuote, non errori
//! - Ordine lessicografico per directory (deterministico)
//!
//! ## Esempio:
//! ```rust,ignore
//! let scan = FileManager::scan(&extract_dir, &config.scan_layout());
//! for asset in scan.into_assets() {
//!     // immagini prima, poi audio
//! }
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Where assets live inside an extracted archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLayout {
    pub images_dir: String,
    pub image_extension: String,
    pub media_dir: String,
    pub audio_extension: String,
}

impl Default for ScanLayout {
    fn default() -> Self {
        Self {
            images_dir: "images".to_string(),
            image_extension: "webp".to_string(),
            media_dir: "media".to_string(),
            audio_extension: "webm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Audio,
}

/// One file scheduled for re-encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: PathBuf,
    pub kind: AssetKind,
}

impl Asset {
    /// Name shown to pollers while this asset is processed
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

/// Ordered work lists produced by a scan
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub images: Vec<PathBuf>,
    pub audio: Vec<PathBuf>,
}

impl ScanResult {
    pub fn total(&self) -> usize {
        self.images.len() + self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Combined processing order: every image, then every audio file
    pub fn into_assets(self) -> Vec<Asset> {
        let images = self.images.into_iter().map(|path| Asset { path, kind: AssetKind::Image });
        let audio = self.audio.into_iter().map(|path| Asset { path, kind: AssetKind::Audio });
        images.chain(audio).collect()
    }
}

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Classify the media under `root` into image and audio work lists
    pub fn scan(root: &Path, layout: &ScanLayout) -> ScanResult {
        ScanResult {
            images: Self::find_files(&root.join(&layout.images_dir), &layout.image_extension),
            audio: Self::find_files(&root.join(&layout.media_dir), &layout.audio_extension),
        }
    }

    /// Find files with the given extension anywhere under `dir`
    pub fn find_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
        if !dir.is_dir() {
            return Vec::new();
        }

        WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| Self::has_extension(e.path(), extension))
            .map(|e| e.into_path())
            .collect()
    }

    /// Case-insensitive extension check
    pub fn has_extension(path: &Path, extension: &str) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false)
    }

    pub fn file_size(path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    /// Replace `path` with `contents` through a temporary sibling and a rename
    pub fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("no parent directory: {}", path.display())))?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(contents)?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Atomically move `replacement` over `original`
    pub fn replace_file(original: &Path, replacement: NamedTempFile) -> io::Result<()> {
        replacement.persist(original).map_err(|e| e.error)?;
        Ok(())
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
