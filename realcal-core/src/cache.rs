//! In-memory index of every event in the vault.
//!
//! The cache is keyed by note path and kept in step with the store in two
//! ways: full rescans that rebuild it from scratch, and per-file updates
//! driven by change notifications. Every mutation is persisted as a snapshot
//! so the next session can start from it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::constants::RESCAN_BATCH_SIZE;
use crate::error::RealCalResult;
use crate::event::Event;
use crate::extract::read_event;
use crate::metadata::MetadataCodec;
use crate::settings::Settings;
use crate::snapshot::{DataStore, Snapshot};
use crate::store::{FileRef, FileStore};

/// How [`EventCache::load_or_rescan`] populated the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Adopted events from the persisted snapshot. They may be stale.
    Restored { events: usize },
    /// Built from a full rescan of the store.
    Rescanned { events: usize },
}

pub struct EventCache {
    store: Arc<dyn FileStore>,
    codec: Arc<dyn MetadataCodec>,
    data: Arc<dyn DataStore>,
    settings: RwLock<Settings>,
    events: RwLock<HashMap<String, Event>>,
    batch_size: usize,
}

impl EventCache {
    pub fn new(
        store: Arc<dyn FileStore>,
        codec: Arc<dyn MetadataCodec>,
        data: Arc<dyn DataStore>,
        settings: Settings,
    ) -> Self {
        EventCache {
            store,
            codec,
            data,
            settings: RwLock::new(settings),
            events: RwLock::new(HashMap::new()),
            batch_size: RESCAN_BATCH_SIZE,
        }
    }

    /// Override the number of files read concurrently during a rescan.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn FileStore> {
        &self.store
    }

    pub fn codec(&self) -> &Arc<dyn MetadataCodec> {
        &self.codec
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    /// Replace the settings and persist them together with the events.
    pub async fn set_settings(&self, settings: Settings) -> RealCalResult<()> {
        *self.settings.write() = settings;
        self.persist().await
    }

    /// All cached events, ordered by date, start time and path.
    pub fn events(&self) -> Vec<Event> {
        let mut events: Vec<Event> = self.events.read().values().cloned().collect();
        events.sort_by(|a, b| {
            (&a.date, &a.start_time, &a.file.path).cmp(&(&b.date, &b.start_time, &b.file.path))
        });
        events
    }

    pub fn get(&self, path: &str) -> Option<Event> {
        self.events.read().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Drop every cached event without touching the snapshot.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Populate the cache from the persisted snapshot, falling back to a full
    /// rescan when there is nothing usable to restore.
    ///
    /// Restored entries are re-resolved against the store; entries whose note
    /// is gone or now lies outside the event folder are dropped.
    pub async fn load_or_rescan(&self) -> RealCalResult<LoadOutcome> {
        match self.data.load().await {
            Ok(Some(snapshot)) => {
                let restored = self.restore(snapshot.events).await;
                if !restored.is_empty() {
                    let count = restored.len();
                    *self.events.write() = restored;
                    info!(events = count, "restored events from snapshot");
                    return Ok(LoadOutcome::Restored { events: count });
                }
                debug!("snapshot held no usable events, rescanning");
            }
            Ok(None) => debug!("no snapshot found, rescanning"),
            Err(e) => warn!(error = %e, "could not read snapshot, rescanning"),
        }

        let count = self.rescan().await?;
        Ok(LoadOutcome::Rescanned { events: count })
    }

    async fn restore(&self, cached: Vec<Event>) -> HashMap<String, Event> {
        let settings = self.settings();
        let mut restored = HashMap::with_capacity(cached.len());

        for event in cached {
            let Some(file) = self.store.get_by_path(&event.file.path).await else {
                continue;
            };
            if !settings.is_in_event_folder(&file.path) {
                continue;
            }
            restored.insert(file.path.clone(), Event { file, ..event });
        }

        restored
    }

    /// Rebuild the cache from every note under the event folder.
    ///
    /// Notes are read in batches; reads within a batch run concurrently and
    /// the next batch starts only once the previous one is folded in. Notes
    /// that can't be read or aren't events are left out. If the store can't
    /// list its files the cache is left untouched.
    pub async fn rescan(&self) -> RealCalResult<usize> {
        let settings = self.settings();
        let files: Vec<FileRef> = self
            .store
            .list_markdown_files()
            .await?
            .into_iter()
            .filter(|f| settings.is_in_event_folder(&f.path))
            .collect();

        let mut found = HashMap::new();
        for batch in files.chunks(self.batch_size) {
            let results = join_all(
                batch
                    .iter()
                    .map(|file| read_event(self.store.as_ref(), self.codec.as_ref(), file)),
            )
            .await;

            for (file, result) in batch.iter().zip(results) {
                match result {
                    Ok(Some(event)) => {
                        found.insert(event.file.path.clone(), event);
                    }
                    Ok(None) => {}
                    Err(e) => debug!(path = %file.path, error = %e, "skipping unreadable note"),
                }
            }
        }

        let count = found.len();
        *self.events.write() = found;
        info!(files = files.len(), events = count, "rescanned vault");

        if let Err(e) = self.persist().await {
            warn!(error = %e, "could not save snapshot after rescan");
        }
        Ok(count)
    }

    /// Re-read one note after it was created or modified.
    ///
    /// Returns whether the cache changed. A note that stopped being an event
    /// is removed; a read failure leaves the cache as it was.
    pub async fn apply_file_update(&self, file: &FileRef) -> bool {
        if !file.is_markdown() || !self.settings.read().is_in_event_folder(&file.path) {
            return false;
        }

        let extracted = match read_event(self.store.as_ref(), self.codec.as_ref(), file).await {
            Ok(extracted) => extracted,
            Err(e) => {
                debug!(path = %file.path, error = %e, "could not re-read note");
                return false;
            }
        };

        let changed = {
            let mut events = self.events.write();
            match extracted {
                Some(event) => {
                    let previous = events.insert(file.path.clone(), event.clone());
                    previous.as_ref() != Some(&event)
                }
                None => events.remove(&file.path).is_some(),
            }
        };

        if changed {
            self.persist_or_warn().await;
        }
        changed
    }

    /// Forget the event for a deleted note. Returns whether one was cached.
    pub async fn apply_file_removal(&self, file: &FileRef) -> bool {
        let removed = self.events.write().remove(&file.path).is_some();
        if removed {
            self.persist_or_warn().await;
        }
        removed
    }

    /// Whether the set of notes under the event folder differs from the set
    /// of cached paths.
    ///
    /// Only paths are compared, so a note edited in place is not detected.
    pub async fn check_stale(&self) -> bool {
        let settings = self.settings();
        let files = match self.store.list_markdown_files().await {
            Ok(files) => files,
            Err(e) => {
                debug!(error = %e, "could not list files for staleness check");
                return false;
            }
        };

        let current: HashSet<String> = files
            .into_iter()
            .filter(|f| settings.is_in_event_folder(&f.path))
            .map(|f| f.path)
            .collect();

        let events = self.events.read();
        current.len() != events.len() || current.iter().any(|path| !events.contains_key(path))
    }

    /// Save settings and events as the snapshot.
    pub async fn persist(&self) -> RealCalResult<()> {
        let mut events: Vec<Event> = self.events.read().values().cloned().collect();
        events.sort_by(|a, b| a.file.path.cmp(&b.file.path));

        let snapshot = Snapshot {
            settings: self.settings(),
            events,
        };
        self.data.save(&snapshot).await
    }

    async fn persist_or_warn(&self) {
        if let Err(e) = self.persist().await {
            warn!(error = %e, "could not save snapshot");
        }
    }
}
