//! The calendar as a host sees it.
//!
//! [`RealCalendar`] owns the cache and its coordinators for one vault
//! session. The host forwards file change notifications, asks for events
//! and subscribes to refreshes; everything else happens here.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::EventCache;
use crate::debounce::DebouncedRescan;
use crate::error::{RealCalError, RealCalResult};
use crate::event::Event;
use crate::init::Initializer;
use crate::metadata::MetadataCodec;
use crate::new_event::{CreatedEvent, NewEvent, create_event};
use crate::settings::Settings;
use crate::signal::RefreshSignal;
use crate::snapshot::DataStore;
use crate::store::{FileChange, FileRef, FileStore};
use crate::view::{CalendarCursor, CalendarView, EmbedOptions};

pub struct RealCalendar {
    cache: Arc<EventCache>,
    init: Initializer,
    debounce: DebouncedRescan,
    refresh: RefreshSignal,
    started: AtomicBool,
}

impl RealCalendar {
    pub fn new(
        store: Arc<dyn FileStore>,
        codec: Arc<dyn MetadataCodec>,
        data: Arc<dyn DataStore>,
        settings: Settings,
    ) -> Self {
        let cache = Arc::new(EventCache::new(store, codec, data, settings.normalized()));
        let refresh = RefreshSignal::new();

        RealCalendar {
            init: Initializer::new(cache.clone(), refresh.clone()),
            debounce: DebouncedRescan::new(cache.clone(), refresh.clone()),
            cache,
            refresh,
            started: AtomicBool::new(false),
        }
    }

    /// Create a calendar with the settings stored in `data`, falling back to
    /// defaults when there are none or they can't be read.
    pub async fn open(
        store: Arc<dyn FileStore>,
        codec: Arc<dyn MetadataCodec>,
        data: Arc<dyn DataStore>,
    ) -> Self {
        let settings = match data.load().await {
            Ok(Some(snapshot)) => snapshot.settings,
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!(error = %e, "could not read settings, using defaults");
                Settings::default()
            }
        };
        Self::new(store, codec, data, settings)
    }

    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce = DebouncedRescan::new(self.cache.clone(), self.refresh.clone())
            .with_window(window);
        self
    }

    pub fn with_stale_check_delay(mut self, delay: Duration) -> Self {
        self.init = self.init.with_stale_check_delay(delay);
        self
    }

    pub fn cache(&self) -> &Arc<EventCache> {
        &self.cache
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.refresh.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.init.is_ready()
    }

    /// Begin loading in the background. Only the first call does anything.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.init.start_background())
    }

    pub async fn ensure_initialized(&self) -> RealCalResult<()> {
        self.init.ensure_initialized().await
    }

    /// Load the cache and, if it came from the snapshot, check it against
    /// the vault right away rather than after the usual delay.
    ///
    /// For hosts that exit before the delayed check would run. A failed
    /// rescan is logged and the restored events are kept.
    pub async fn ensure_current(&self) -> RealCalResult<()> {
        self.ensure_initialized().await?;
        if let Err(e) = self.init.revalidate_now().await {
            warn!(error = %e, "could not rescan stale cache");
        }
        Ok(())
    }

    /// All known events, loading them first if needed.
    pub async fn events(&self) -> RealCalResult<Vec<Event>> {
        self.ensure_initialized().await?;
        Ok(self.cache.events())
    }

    /// Lay out the events for a view.
    pub async fn view(
        &self,
        cursor: &CalendarCursor,
        options: &EmbedOptions,
        today: NaiveDate,
    ) -> RealCalResult<CalendarView> {
        let events = self.events().await?;
        Ok(cursor.build(&events, options, today))
    }

    /// Apply one change notification from the host.
    ///
    /// Notifications that arrive before the cache is loaded are dropped; the
    /// load itself picks up whatever they described.
    pub async fn handle_change(&self, change: FileChange) {
        if !self.init.is_ready() {
            debug!(path = %change.file().path, "ignoring change before cache is ready");
            return;
        }

        let changed = match &change {
            FileChange::Created(file) | FileChange::Modified(file) => {
                self.cache.apply_file_update(file).await
            }
            FileChange::Deleted(file) => self.cache.apply_file_removal(file).await,
            // folder moves arrive as a single rename, so every one rescans
            FileChange::Renamed { .. } => {
                self.debounce.trigger();
                false
            }
        };

        if changed {
            self.refresh.notify();
        }
    }

    /// Apply notifications in arrival order until the sender goes away.
    pub async fn run_notifications(&self, mut changes: mpsc::UnboundedReceiver<FileChange>) {
        while let Some(change) = changes.recv().await {
            self.handle_change(change).await;
        }
        debug!("change notifications closed");
    }

    /// Rebuild the cache from the vault right away.
    pub async fn rescan_now(&self) -> RealCalResult<usize> {
        self.ensure_initialized().await?;
        let count = self.cache.rescan().await?;
        self.refresh.notify();
        Ok(count)
    }

    /// Write a new event note. The cache learns about it from the create
    /// notification that follows.
    pub async fn create_event(&self, event: &NewEvent) -> RealCalResult<CreatedEvent> {
        let settings = self.cache.settings();
        create_event(
            self.cache.store().as_ref(),
            self.cache.codec().as_ref(),
            &settings,
            event,
        )
        .await
    }

    /// Move an event's note to the trash. The cache learns about it from the
    /// delete notification that follows.
    pub async fn trash_event(&self, path: &str, permanent: bool) -> RealCalResult<FileRef> {
        let store = self.cache.store();
        let file = store
            .get_by_path(path)
            .await
            .ok_or_else(|| RealCalError::NotFound(path.to_string()))?;

        store.move_to_trash(&file, permanent).await?;
        info!(path = %file.path, permanent, "moved event to trash");
        Ok(file)
    }

    pub fn settings(&self) -> Settings {
        self.cache.settings()
    }

    /// Store new settings. Changing the event folder rescans the vault.
    pub async fn update_settings(&self, settings: Settings) -> RealCalResult<()> {
        self.ensure_initialized().await?;

        let settings = settings.normalized();
        let folder_changed = self.cache.settings().event_folder != settings.event_folder;
        self.cache.set_settings(settings).await?;

        if folder_changed {
            info!("event folder changed, rescanning");
            self.cache.rescan().await?;
        }
        self.refresh.notify();
        Ok(())
    }

    /// Stop pending work and forget the loaded events.
    pub fn teardown(&self) {
        self.debounce.cancel();
        self.init.reset();
        self.cache.clear();
        self.started.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::RESCAN_DEBOUNCE;
    use crate::metadata::YamlCodec;
    use crate::testing::{MemoryDataStore, MemoryStore};

    const NOTE: &str = "---\ntags: event\ndate: 2025-10-24\n---\n";

    fn calendar(store: Arc<MemoryStore>, data: Arc<MemoryDataStore>) -> RealCalendar {
        RealCalendar::new(store, Arc::new(YamlCodec), data, Settings::default())
    }

    #[tokio::test]
    async fn changes_before_ready_are_ignored() {
        let store = Arc::new(MemoryStore::new());
        let cal = calendar(store.clone(), Arc::new(MemoryDataStore::new()));

        store.put("a.md", NOTE);
        cal.handle_change(FileChange::Created(FileRef::new("a.md"))).await;
        assert!(cal.cache().is_empty());
        assert_eq!(store.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn changes_after_ready_update_the_cache() {
        let store = Arc::new(MemoryStore::new());
        let cal = calendar(store.clone(), Arc::new(MemoryDataStore::new()));
        cal.ensure_initialized().await.unwrap();
        let mut rx = cal.subscribe();
        rx.borrow_and_update();

        store.put("a.md", NOTE);
        cal.handle_change(FileChange::Created(FileRef::new("a.md"))).await;
        assert_eq!(cal.cache().len(), 1);
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        store.remove("a.md");
        cal.handle_change(FileChange::Deleted(FileRef::new("a.md"))).await;
        assert!(cal.cache().is_empty());
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        // nothing cached for this one, so no refresh
        cal.handle_change(FileChange::Deleted(FileRef::new("b.md"))).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn renames_are_debounced_into_one_rescan() {
        let store = Arc::new(MemoryStore::with_files(&[("a.md", NOTE), ("b.md", NOTE)]));
        let cal = calendar(store.clone(), Arc::new(MemoryDataStore::new()));
        cal.ensure_initialized().await.unwrap();
        assert_eq!(store.list_count(), 1);

        for (from, to) in [("a.md", "c.md"), ("b.md", "d.md")] {
            store.rename(from, to);
            cal.handle_change(FileChange::Renamed {
                file: FileRef::new(to),
                old_path: from.into(),
            })
            .await;
        }

        tokio::time::sleep(RESCAN_DEBOUNCE + Duration::from_secs(1)).await;
        assert_eq!(store.list_count(), 2);

        let paths: Vec<String> = cal.cache().events().into_iter().map(|e| e.file.path).collect();
        assert_eq!(paths, vec!["c.md", "d.md"]);
    }

    #[tokio::test(start_paused = true)]
    async fn folder_rename_rescans() {
        let store = Arc::new(MemoryStore::with_files(&[("Events/a.md", NOTE)]));
        let cal = calendar(store.clone(), Arc::new(MemoryDataStore::new()));
        cal.ensure_initialized().await.unwrap();

        store.rename("Events/a.md", "Archive/a.md");
        cal.handle_change(FileChange::Renamed {
            file: FileRef::new("Archive"),
            old_path: "Events".into(),
        })
        .await;

        tokio::time::sleep(RESCAN_DEBOUNCE + Duration::from_secs(1)).await;
        assert_eq!(store.list_count(), 2);

        let paths: Vec<String> = cal.cache().events().into_iter().map(|e| e.file.path).collect();
        assert_eq!(paths, vec!["Archive/a.md"]);
    }

    #[tokio::test]
    async fn ensure_current_picks_up_notes_added_between_sessions() {
        let store = Arc::new(MemoryStore::with_files(&[("a.md", NOTE)]));
        let data = Arc::new(MemoryDataStore::new());

        let first = RealCalendar::open(store.clone(), Arc::new(YamlCodec), data.clone()).await;
        first.ensure_current().await.unwrap();
        assert_eq!(first.cache().len(), 1);
        drop(first);

        store.put("b.md", NOTE);

        let second = RealCalendar::open(store.clone(), Arc::new(YamlCodec), data.clone()).await;
        second.ensure_current().await.unwrap();
        let paths: Vec<String> = second
            .events()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.file.path)
            .collect();
        assert_eq!(paths, vec!["a.md", "b.md"]);
        assert_eq!(data.saved().unwrap().events.len(), 2);
    }

    #[tokio::test]
    async fn start_runs_once() {
        let store = Arc::new(MemoryStore::with_files(&[("a.md", NOTE)]));
        let data = Arc::new(MemoryDataStore::new());
        let cal = calendar(store, data.clone());

        let handle = cal.start().unwrap();
        assert!(cal.start().is_none());
        handle.await.unwrap();

        assert!(cal.is_ready());
        assert_eq!(data.load_count(), 1);
    }

    #[tokio::test]
    async fn create_then_notify_adds_the_event() {
        let store = Arc::new(MemoryStore::new());
        let data = Arc::new(MemoryDataStore::new());
        let mut settings = Settings::default();
        settings.set_event_folder("Events");
        let cal = RealCalendar::new(store.clone(), Arc::new(YamlCodec), data, settings);
        cal.ensure_initialized().await.unwrap();

        let created = cal
            .create_event(&NewEvent::new("Dentist", "2025-10-24").with_start_time("09:00"))
            .await
            .unwrap();
        assert_eq!(created.file.path, "Events/Dentist.md");

        cal.handle_change(FileChange::Created(created.file)).await;
        let events = cal.events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Dentist");
        assert_eq!(events[0].start_time.as_deref(), Some("09:00"));
    }

    #[tokio::test]
    async fn trash_moves_the_note() {
        let store = Arc::new(MemoryStore::with_files(&[("a.md", NOTE)]));
        let cal = calendar(store.clone(), Arc::new(MemoryDataStore::new()));

        let file = cal.trash_event("a.md", true).await.unwrap();
        assert_eq!(file.path, "a.md");
        assert_eq!(*store.trashed.lock(), vec![("a.md".to_string(), true)]);

        let err = cal.trash_event("a.md", true).await.unwrap_err();
        assert!(matches!(err, RealCalError::NotFound(_)));
    }

    #[tokio::test]
    async fn changing_event_folder_rescans() {
        let store = Arc::new(MemoryStore::with_files(&[
            ("Work/a.md", NOTE),
            ("Home/b.md", NOTE),
        ]));
        let data = Arc::new(MemoryDataStore::new());
        let cal = calendar(store.clone(), data.clone());
        cal.ensure_initialized().await.unwrap();
        assert_eq!(cal.cache().len(), 2);

        let mut settings = cal.settings();
        settings.event_folder = "Work/".into();
        cal.update_settings(settings).await.unwrap();

        assert_eq!(cal.settings().event_folder, "Work");
        assert_eq!(cal.cache().len(), 1);
        let saved = data.saved().unwrap();
        assert_eq!(saved.settings.event_folder, "Work");
        assert_eq!(saved.events.len(), 1);
    }

    #[tokio::test]
    async fn other_setting_changes_keep_events() {
        let store = Arc::new(MemoryStore::with_files(&[("a.md", NOTE)]));
        let data = Arc::new(MemoryDataStore::new());
        let cal = calendar(store.clone(), data.clone());
        cal.ensure_initialized().await.unwrap();

        let mut settings = cal.settings();
        settings.frontmatter_fields.done = false;
        cal.update_settings(settings).await.unwrap();

        assert_eq!(store.list_count(), 1);
        let saved = data.saved().unwrap();
        assert!(!saved.settings.frontmatter_fields.done);
        assert_eq!(saved.events.len(), 1);
    }

    #[tokio::test]
    async fn open_reads_stored_settings() {
        let mut settings = Settings::default();
        settings.set_event_folder("Calendar");
        let data = Arc::new(MemoryDataStore::with_snapshot(crate::snapshot::Snapshot {
            settings,
            events: Vec::new(),
        }));
        let cal = RealCalendar::open(Arc::new(MemoryStore::new()), Arc::new(YamlCodec), data).await;
        assert_eq!(cal.settings().event_folder, "Calendar");
    }

    #[tokio::test]
    async fn teardown_forgets_loaded_state() {
        let store = Arc::new(MemoryStore::with_files(&[("a.md", NOTE)]));
        let data = Arc::new(MemoryDataStore::new());
        let cal = calendar(store, data.clone());
        cal.ensure_initialized().await.unwrap();

        cal.teardown();
        assert!(!cal.is_ready());
        assert!(cal.cache().is_empty());

        cal.ensure_initialized().await.unwrap();
        assert_eq!(data.load_count(), 2);
        assert_eq!(cal.cache().len(), 1);
    }

    #[tokio::test]
    async fn notifications_are_applied_in_order() {
        let store = Arc::new(MemoryStore::new());
        let cal = Arc::new(calendar(store.clone(), Arc::new(MemoryDataStore::new())));
        cal.ensure_initialized().await.unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        store.put("a.md", NOTE);
        tx.send(FileChange::Created(FileRef::new("a.md"))).unwrap();
        tx.send(FileChange::Modified(FileRef::new("a.md"))).unwrap();
        drop(tx);

        cal.run_notifications(rx).await;
        assert_eq!(cal.cache().len(), 1);
    }
}
