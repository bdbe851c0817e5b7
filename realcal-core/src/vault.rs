//! A vault of markdown notes on the local filesystem.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::constants::TRASH_DIR;
use crate::error::{RealCalError, RealCalResult};
use crate::store::{FileRef, FileStore};

/// [`FileStore`] over a directory tree. Hidden files and folders (names
/// starting with `.`) are not part of the vault.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsVault { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a vault path.
    pub fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Map an absolute filesystem path back to a vault file reference.
    pub fn file_ref_for(&self, full_path: &Path) -> Option<FileRef> {
        let relative = full_path.strip_prefix(&self.root).ok()?;
        vault_path(relative).map(FileRef::new)
    }
}

/// Convert a relative filesystem path to a `/` separated vault path,
/// rejecting hidden segments and anything that escapes the root.
fn vault_path(relative: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_str()?;
                if name.starts_with('.') {
                    return None;
                }
                segments.push(name);
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

#[async_trait]
impl FileStore for FsVault {
    async fn list_markdown_files(&self) -> RealCalResult<Vec<FileRef>> {
        let root = self.root.clone();

        tokio::task::spawn_blocking(move || {
            if !root.is_dir() {
                return Err(RealCalError::NotFound(root.display().to_string()));
            }

            let mut files: Vec<FileRef> = WalkDir::new(&root)
                .into_iter()
                .filter_entry(|entry| !is_hidden(entry))
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .filter_map(|entry| {
                    let relative = entry.path().strip_prefix(&root).ok()?;
                    vault_path(relative).map(FileRef::new)
                })
                .filter(FileRef::is_markdown)
                .collect();

            files.sort_by(|a, b| a.path.cmp(&b.path));
            Ok(files)
        })
        .await
        .map_err(|e| RealCalError::Store(format!("File listing task failed: {e}")))?
    }

    async fn read(&self, file: &FileRef) -> RealCalResult<String> {
        match tokio::fs::read_to_string(self.full_path(&file.path)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RealCalError::NotFound(file.path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_path(&self, path: &str) -> Option<FileRef> {
        let path = vault_path(Path::new(path))?;
        let metadata = tokio::fs::metadata(self.full_path(&path)).await.ok()?;
        metadata.is_file().then(|| FileRef::new(path))
    }

    async fn exists(&self, path: &str) -> bool {
        tokio::fs::try_exists(self.full_path(path))
            .await
            .unwrap_or(false)
    }

    async fn create(&self, path: &str, content: &str) -> RealCalResult<FileRef> {
        let path = vault_path(Path::new(path))
            .ok_or_else(|| RealCalError::Store(format!("Invalid vault path '{path}'")))?;
        let full_path = self.full_path(&path);

        if self.exists(&path).await {
            return Err(RealCalError::Store(format!("File already exists: {path}")));
        }
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, content).await?;
        Ok(FileRef::new(path))
    }

    async fn create_folder(&self, path: &str) -> RealCalResult<()> {
        tokio::fs::create_dir_all(self.full_path(path)).await?;
        Ok(())
    }

    async fn move_to_trash(&self, file: &FileRef, permanent: bool) -> RealCalResult<()> {
        let full_path = self.full_path(&file.path);

        if !tokio::fs::try_exists(&full_path).await.unwrap_or(false) {
            return Err(RealCalError::NotFound(file.path.clone()));
        }

        if permanent {
            tokio::fs::remove_file(&full_path).await?;
            return Ok(());
        }

        let trash_dir = self.root.join(TRASH_DIR);
        tokio::fs::create_dir_all(&trash_dir).await?;

        let mut target = trash_dir.join(file.name());
        let mut n = 1;
        while tokio::fs::try_exists(&target).await.unwrap_or(false) {
            let extension = file.extension().map(|e| format!(".{e}")).unwrap_or_default();
            target = trash_dir.join(format!("{} {}{}", file.basename(), n, extension));
            n += 1;
        }

        tokio::fs::rename(&full_path, &target).await?;
        Ok(())
    }
}
