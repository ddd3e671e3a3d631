//! # Archive Codec Module
//!
//! Decompressione dell'archivio caricato e ricompressione dell'albero
//! ottimizzato.
//!
//! ## Responsabilità:
//! - `extract`: estrae un archivio zip in una directory (path sicuri, niente `..`)
//! - `pack`: crea l'archivio di output preservando i path relativi
//!
//! ## Determinismo di `pack`:
//! - Attraversamento in ordine lessicografico
//! - Timestamp fisso (1980-01-01) e permessi fissi per ogni entry
//! - Compressione Deflate
//!
//! A parità di contenuto e ordine, due chiamate producono byte identici.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::{OptimizeError, Result};
use crate::optimizer::path_resolver::PathResolver;

/// Zip container codec
pub struct ArchiveCodec;

impl ArchiveCodec {
    /// Extract `archive` into `dest`, creating it if needed
    pub fn extract(archive: &Path, dest: &Path) -> Result<usize> {
        let file = File::open(archive)?;
        let mut zip = ZipArchive::new(BufReader::new(file))
            .map_err(|e| OptimizeError::CorruptArchive(format!("cannot read {}: {}", archive.display(), e)))?;

        fs::create_dir_all(dest)?;
        let entries = zip.len();
        zip.extract(dest)
            .map_err(|e| OptimizeError::CorruptArchive(format!("cannot extract {}: {}", archive.display(), e)))?;

        debug!("Extracted {} entries from {} into {}", entries, archive.display(), dest.display());
        Ok(entries)
    }

    /// Pack every file and directory under `src` into a new archive at `dest`
    ///
    /// `dest` must not live inside `src`.
    pub fn pack(src: &Path, dest: &Path) -> Result<usize> {
        let mut writer = ZipWriter::new(BufWriter::new(File::create(dest)?));
        let mut files = 0;

        for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(src)
                .map_err(|e| OptimizeError::Internal(e.to_string()))?;
            let Some(name) = PathResolver::archive_entry_name(relative) else {
                continue;
            };

            if entry.file_type().is_dir() {
                writer.add_directory(name, Self::entry_options(0o755)).map_err(Self::pack_error)?;
            } else if entry.file_type().is_file() {
                writer.start_file(name, Self::entry_options(0o644)).map_err(Self::pack_error)?;
                io::copy(&mut File::open(entry.path())?, &mut writer)?;
                files += 1;
            }
        }

        let mut inner = writer.finish().map_err(Self::pack_error)?;
        io::Write::flush(&mut inner)?;

        debug!("Packed {} files from {} into {}", files, src.display(), dest.display());
        Ok(files)
    }

    fn entry_options(permissions: u32) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(permissions)
    }

    fn pack_error(e: zip::result::ZipError) -> OptimizeError {
        OptimizeError::CorruptArchive(format!("cannot pack: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn entries(archive: &Path) -> Vec<String> {
        let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
        (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_pack_then_extract_preserves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        write(&src, "images/a.webp", b"image-a");
        write(&src, "media/sub/b.webm", b"audio-b");
        write(&src, "manifest.json", b"{}");
        fs::create_dir_all(src.join("empty")).unwrap();

        let archive = dir.path().join("out.zip");
        assert_eq!(ArchiveCodec::pack(&src, &archive).unwrap(), 3);

        let names = entries(&archive);
        assert!(names.contains(&"images/a.webp".to_string()));
        assert!(names.contains(&"media/sub/b.webm".to_string()));
        assert!(names.contains(&"manifest.json".to_string()));

        let dest = dir.path().join("dest");
        ArchiveCodec::extract(&archive, &dest).unwrap();
        assert_eq!(fs::read(dest.join("media/sub/b.webm")).unwrap(), b"audio-b");
        assert!(dest.join("empty").is_dir());

        let mut zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut file = zip.by_name("images/a.webp").unwrap();
        assert_eq!(file.compression(), CompressionMethod::Deflated);
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        assert_eq!(contents, b"image-a");
    }

    #[test]
    fn test_pack_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        write(&src, "images/z.webp", b"zzz");
        write(&src, "images/a.webp", b"aaa");

        let first = dir.path().join("first.zip");
        let second = dir.path().join("second.zip");
        ArchiveCodec::pack(&src, &first).unwrap();
        ArchiveCodec::pack(&src, &second).unwrap();

        assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bad.zip");
        fs::write(&archive, b"this is not a zip file").unwrap();

        let err = ArchiveCodec::extract(&archive, &dir.path().join("dest")).unwrap_err();
        assert!(matches!(err, OptimizeError::CorruptArchive(_)));
    }

    #[test]
    fn test_extract_rejects_truncated_archive() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("full.zip");
        {
            let mut writer = ZipWriter::new(File::create(&archive).unwrap());
            writer.start_file("images/a.webp", SimpleFileOptions::default()).unwrap();
            writer.write_all(&[7u8; 4096]).unwrap();
            writer.finish().unwrap();
        }
        let bytes = fs::read(&archive).unwrap();
        let truncated = dir.path().join("truncated.zip");
        fs::write(&truncated, &bytes[..bytes.len() / 2]).unwrap();

        let err = ArchiveCodec::extract(&truncated, &dir.path().join("dest")).unwrap_err();
        assert!(matches!(err, OptimizeError::CorruptArchive(_)));
    }
}
