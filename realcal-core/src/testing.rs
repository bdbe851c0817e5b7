//! In-memory stores for tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{RealCalError, RealCalResult};
use crate::snapshot::{DataStore, Snapshot};
use crate::store::{FileRef, FileStore};

#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, String>>,
    folders: Mutex<HashSet<String>>,
    unreadable: Mutex<HashSet<String>>,
    fail_listing: Mutex<bool>,
    pub list_calls: AtomicUsize,
    pub reads: AtomicUsize,
    pub trashed: Mutex<Vec<(String, bool)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let store = Self::new();
        for (path, content) in files {
            store.put(path, content);
        }
        store
    }

    pub fn put(&self, path: &str, content: &str) {
        self.files.lock().insert(path.to_string(), content.to_string());
    }

    pub fn remove(&self, path: &str) {
        self.files.lock().remove(path);
    }

    pub fn rename(&self, from: &str, to: &str) {
        let mut files = self.files.lock();
        if let Some(content) = files.remove(from) {
            files.insert(to.to_string(), content);
        }
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    pub fn has_folder(&self, path: &str) -> bool {
        self.folders.lock().contains(path)
    }

    /// Make reads of `path` fail with an IO error.
    pub fn make_unreadable(&self, path: &str) {
        self.unreadable.lock().insert(path.to_string());
    }

    pub fn fail_listing(&self, fail: bool) {
        *self.fail_listing.lock() = fail;
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn list_markdown_files(&self) -> RealCalResult<Vec<FileRef>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        // give concurrent callers a chance to interleave
        tokio::task::yield_now().await;

        if *self.fail_listing.lock() {
            return Err(RealCalError::Store("listing failed".into()));
        }
        Ok(self
            .files
            .lock()
            .keys()
            .map(FileRef::new)
            .filter(FileRef::is_markdown)
            .collect())
    }

    async fn read(&self, file: &FileRef) -> RealCalResult<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self.unreadable.lock().contains(&file.path) {
            return Err(RealCalError::Io(std::io::Error::other("read failed")));
        }
        self.files
            .lock()
            .get(&file.path)
            .cloned()
            .ok_or_else(|| RealCalError::NotFound(file.path.clone()))
    }

    async fn get_by_path(&self, path: &str) -> Option<FileRef> {
        self.files.lock().contains_key(path).then(|| FileRef::new(path))
    }

    async fn exists(&self, path: &str) -> bool {
        self.files.lock().contains_key(path) || self.folders.lock().contains(path)
    }

    async fn create(&self, path: &str, content: &str) -> RealCalResult<FileRef> {
        let mut files = self.files.lock();
        if files.contains_key(path) {
            return Err(RealCalError::Store(format!("File already exists: {path}")));
        }
        files.insert(path.to_string(), content.to_string());
        Ok(FileRef::new(path))
    }

    async fn create_folder(&self, path: &str) -> RealCalResult<()> {
        self.folders.lock().insert(path.to_string());
        Ok(())
    }

    async fn move_to_trash(&self, file: &FileRef, permanent: bool) -> RealCalResult<()> {
        if self.files.lock().remove(&file.path).is_none() {
            return Err(RealCalError::NotFound(file.path.clone()));
        }
        self.trashed.lock().push((file.path.clone(), permanent));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryDataStore {
    snapshot: Mutex<Option<Snapshot>>,
    fail_load: Mutex<bool>,
    pub loads: AtomicUsize,
    pub saves: AtomicUsize,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        *store.snapshot.lock() = Some(snapshot);
        store
    }

    pub fn saved(&self) -> Option<Snapshot> {
        self.snapshot.lock().clone()
    }

    pub fn fail_load(&self, fail: bool) {
        *self.fail_load.lock() = fail;
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn load(&self) -> RealCalResult<Option<Snapshot>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if *self.fail_load.lock() {
            return Err(RealCalError::Serialization("corrupt snapshot".into()));
        }
        Ok(self.snapshot.lock().clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> RealCalResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.snapshot.lock() = Some(snapshot.clone());
        Ok(())
    }
}
