//! Tells views that the event set may have changed.

use tokio::sync::watch;

/// A generation counter bumped whenever views should redraw.
///
/// Subscribers only ever see the latest generation, so a burst of changes
/// collapses into one redraw.
#[derive(Debug, Clone)]
pub struct RefreshSignal {
    tx: watch::Sender<u64>,
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshSignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        RefreshSignal { tx }
    }

    pub fn notify(&self) {
        self.tx.send_modify(|generation| *generation += 1);
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    pub fn generation(&self) -> u64 {
        *self.tx.borrow()
    }
}
