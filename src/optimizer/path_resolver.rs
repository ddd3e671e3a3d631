//! # Path Resolution Module
//!
//! Centralizza tutta la logica di calcolo dei path di un task:
//! layout della working directory e nomi delle entry nell'archivio.

use std::path::{Component, Path, PathBuf};

use crate::state::TaskId;

/// Name of the stored upload inside a working directory
pub const UPLOAD_FILE: &str = "upload.zip";
/// Subdirectory holding the extracted tree
pub const EXTRACT_DIR: &str = "extracted";
/// Name of the finished archive, also used as download filename
pub const OUTPUT_FILE: &str = "optimized_export.zip";

/// Layout of one task's private working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPaths {
    pub work_dir: PathBuf,
    pub upload: PathBuf,
    pub extract_dir: PathBuf,
    pub output: PathBuf,
}

impl TaskPaths {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            upload: work_dir.join(UPLOAD_FILE),
            extract_dir: work_dir.join(EXTRACT_DIR),
            output: work_dir.join(OUTPUT_FILE),
        }
    }
}

/// Utility per calcolare i path in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Fresh working directory for a not yet registered task
    ///
    /// A random component keeps directories distinct even before the task id
    /// exists.
    pub fn staging_dir(work_root: &Path) -> PathBuf {
        work_root.join(format!("task-{}", TaskId::new()))
    }

    /// Zip entry name for a path relative to the packed root
    ///
    /// Always uses `/` separators; returns `None` for paths that escape the
    /// root or are empty.
    pub fn archive_entry_name(relative: &Path) -> Option<String> {
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
                Component::CurDir => {}
                _ => return None,
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("/"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_paths_layout() {
        let paths = TaskPaths::new(Path::new("/work/task-1"));
        assert_eq!(paths.upload, Path::new("/work/task-1/upload.zip"));
        assert_eq!(paths.extract_dir, Path::new("/work/task-1/extracted"));
        assert_eq!(paths.output, Path::new("/work/task-1/optimized_export.zip"));
    }

    #[test]
    fn test_staging_dirs_are_distinct() {
        let root = Path::new("/work");
        let a = PathResolver::staging_dir(root);
        let b = PathResolver::staging_dir(root);
        assert_ne!(a, b);
        assert!(a.starts_with(root));
    }

    #[test]
    fn test_archive_entry_name() {
        assert_eq!(
            PathResolver::archive_entry_name(Path::new("images/sub/a.webp")),
            Some("images/sub/a.webp".to_string())
        );
        assert_eq!(PathResolver::archive_entry_name(Path::new("./media/x.webm")), Some("media/x.webm".to_string()));
        assert_eq!(PathResolver::archive_entry_name(Path::new("../escape")), None);
        assert_eq!(PathResolver::archive_entry_name(Path::new("")), None);
    }
}
