//! Loading the event cache exactly once per session.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{EventCache, LoadOutcome};
use crate::constants::STALE_CHECK_DELAY;
use crate::error::{RealCalError, RealCalResult};
use crate::signal::RefreshSignal;

type InFlight = Shared<BoxFuture<'static, Result<(), String>>>;

enum InitState {
    Uninitialized,
    Loading { id: u64, in_flight: InFlight },
    Ready,
}

/// Single-flight coordinator for the initial cache load.
///
/// Callers that arrive while a load is running attach to it instead of
/// starting another. A failed load returns to `Uninitialized` so the next
/// caller retries from scratch.
#[derive(Clone)]
pub struct Initializer {
    cache: Arc<EventCache>,
    refresh: RefreshSignal,
    stale_check_delay: Duration,
    state: Arc<Mutex<InitState>>,
    next_load: Arc<AtomicU64>,
    revalidation: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Initializer {
    pub fn new(cache: Arc<EventCache>, refresh: RefreshSignal) -> Self {
        Initializer {
            cache,
            refresh,
            stale_check_delay: STALE_CHECK_DELAY,
            state: Arc::new(Mutex::new(InitState::Uninitialized)),
            next_load: Arc::new(AtomicU64::new(0)),
            revalidation: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_stale_check_delay(mut self, delay: Duration) -> Self {
        self.stale_check_delay = delay;
        self
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.lock(), InitState::Ready)
    }

    /// Wait until the cache is loaded, starting the load if nobody has.
    pub async fn ensure_initialized(&self) -> RealCalResult<()> {
        let in_flight = {
            let mut state = self.state.lock();
            match &*state {
                InitState::Ready => return Ok(()),
                InitState::Loading { in_flight, .. } => in_flight.clone(),
                InitState::Uninitialized => {
                    let id = self.next_load.fetch_add(1, Ordering::SeqCst);
                    let in_flight = self.load(id).boxed().shared();
                    *state = InitState::Loading {
                        id,
                        in_flight: in_flight.clone(),
                    };
                    in_flight
                }
            }
        };

        in_flight.await.map_err(RealCalError::Init)
    }

    /// Start loading without waiting for it. Failures are only logged; the
    /// next [`ensure_initialized`](Self::ensure_initialized) call retries.
    pub fn start_background(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(e) = this.ensure_initialized().await {
                debug!(error = %e, "background initialization failed");
            }
        })
    }

    /// Run the pending staleness check of a restored cache now instead of
    /// after the delay. Returns whether a rescan happened.
    ///
    /// Hosts that exit right after reading call this, since the delayed
    /// check would never get to run for them.
    pub async fn revalidate_now(&self) -> RealCalResult<bool> {
        let Some(pending) = self.revalidation.lock().take() else {
            return Ok(false);
        };
        if pending.is_finished() {
            return Ok(false);
        }
        pending.abort();

        rescan_if_stale(&self.cache, &self.refresh).await
    }

    /// Forget the loaded state so the next caller loads again. A load still
    /// in flight finishes without marking the cache ready.
    pub fn reset(&self) {
        if let Some(pending) = self.revalidation.lock().take() {
            pending.abort();
        }
        *self.state.lock() = InitState::Uninitialized;
    }

    fn load(&self, id: u64) -> impl Future<Output = Result<(), String>> + Send + 'static {
        let cache = self.cache.clone();
        let refresh = self.refresh.clone();
        let state = self.state.clone();
        let revalidation = self.revalidation.clone();
        let delay = self.stale_check_delay;

        async move {
            let result = cache.load_or_rescan().await;

            let mut state = state.lock();
            if !matches!(&*state, InitState::Loading { id: current, .. } if *current == id) {
                debug!("initialization was reset while loading");
                return Err("initialization was reset".to_string());
            }

            match result {
                Ok(outcome) => {
                    *state = InitState::Ready;
                    drop(state);
                    info!(?outcome, "event cache ready");
                    refresh.notify();

                    if let LoadOutcome::Restored { .. } = outcome {
                        let handle = tokio::spawn(revalidate(cache, refresh, delay));
                        *revalidation.lock() = Some(handle);
                    }
                    Ok(())
                }
                Err(e) => {
                    *state = InitState::Uninitialized;
                    warn!(error = %e, "could not load event cache");
                    Err(e.to_string())
                }
            }
        }
    }
}

/// Rescan after a delay if the restored cache no longer matches the vault.
async fn revalidate(cache: Arc<EventCache>, refresh: RefreshSignal, delay: Duration) {
    tokio::time::sleep(delay).await;

    if let Err(e) = rescan_if_stale(&cache, &refresh).await {
        warn!(error = %e, "background rescan failed");
    }
}

async fn rescan_if_stale(cache: &EventCache, refresh: &RefreshSignal) -> RealCalResult<bool> {
    if !cache.check_stale().await {
        debug!("restored cache matches the vault");
        return Ok(false);
    }

    debug!("restored cache is stale, rescanning");
    cache.rescan().await?;
    refresh.notify();
    Ok(true)
}
