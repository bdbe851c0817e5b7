//! The note store the calendar reads events from.
//!
//! Paths are vault-relative, use `/` as separator and never start with one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RealCalResult;

/// Reference to a file in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
}

impl FileRef {
    pub fn new(path: impl Into<String>) -> Self {
        FileRef { path: path.into() }
    }

    /// File name without directories.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without directories and without the extension.
    pub fn basename(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[idx + 1..]),
            _ => None,
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.extension() == Some("md")
    }
}

/// A change notification delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Created(FileRef),
    Modified(FileRef),
    Deleted(FileRef),
    Renamed { file: FileRef, old_path: String },
}

impl FileChange {
    pub fn file(&self) -> &FileRef {
        match self {
            FileChange::Created(file)
            | FileChange::Modified(file)
            | FileChange::Deleted(file)
            | FileChange::Renamed { file, .. } => file,
        }
    }
}

/// Document storage the calendar is layered over.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Every markdown file in the store.
    async fn list_markdown_files(&self) -> RealCalResult<Vec<FileRef>>;

    /// Read a file's content. Missing files fail with `NotFound`.
    async fn read(&self, file: &FileRef) -> RealCalResult<String>;

    /// Resolve a path to a file, if one exists there.
    async fn get_by_path(&self, path: &str) -> Option<FileRef>;

    /// Whether anything (file or folder) exists at `path`.
    async fn exists(&self, path: &str) -> bool;

    async fn create(&self, path: &str, content: &str) -> RealCalResult<FileRef>;

    async fn create_folder(&self, path: &str) -> RealCalResult<()>;

    /// Move a file to the trash, or delete it outright when `permanent`.
    async fn move_to_trash(&self, file: &FileRef, permanent: bool) -> RealCalResult<()>;
}

/// Normalize a user-supplied vault path: forward slashes, no empty segments,
/// no leading or trailing separator.
pub fn normalize_path(path: &str) -> String {
    path.trim()
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `path` lies inside `folder`. An empty folder contains everything.
pub fn is_under(path: &str, folder: &str) -> bool {
    if folder.is_empty() {
        return true;
    }
    path.strip_prefix(folder)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Join a folder and a file name into a vault path.
pub fn join_path(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}
