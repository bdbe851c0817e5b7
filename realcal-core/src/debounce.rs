//! Coalescing bursts of renames into one full rescan.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::EventCache;
use crate::constants::RESCAN_DEBOUNCE;
use crate::signal::RefreshSignal;

/// Trailing-edge debounced rescan.
///
/// Each [`trigger`](Self::trigger) replaces the pending timer with a fresh
/// one, so the rescan runs once the window has passed without new triggers.
/// A rescan that already started is not interrupted by later triggers.
pub struct DebouncedRescan {
    cache: Arc<EventCache>,
    refresh: RefreshSignal,
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DebouncedRescan {
    pub fn new(cache: Arc<EventCache>, refresh: RefreshSignal) -> Self {
        DebouncedRescan {
            cache,
            refresh,
            window: RESCAN_DEBOUNCE,
            pending: Mutex::new(None),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn trigger(&self) {
        let cache = self.cache.clone();
        let refresh = self.refresh.clone();
        let window = self.window;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            tokio::spawn(async move {
                info!("debounce window elapsed, rescanning");
                match cache.rescan().await {
                    Ok(_) => refresh.notify(),
                    Err(e) => warn!(error = %e, "debounced rescan failed"),
                }
            });
        });

        if let Some(previous) = self.pending.lock().replace(timer) {
            debug!("resetting pending rescan timer");
            previous.abort();
        }
    }

    /// Drop the pending timer, if any.
    pub fn cancel(&self) {
        if let Some(timer) = self.pending.lock().take() {
            timer.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for DebouncedRescan {
    fn drop(&mut self) {
        self.cancel();
    }
}
