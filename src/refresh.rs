// Background catalog refresh; a new refresh cancels and replaces the previous one

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::browser::SharedBrowser;
use crate::listings_api::ListingSource;

pub struct RefreshCoordinator {
    source: Arc<dyn ListingSource>,
    browser: SharedBrowser,
    generation: Arc<AtomicU64>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshCoordinator {
    pub fn new(source: Arc<dyn ListingSource>, browser: SharedBrowser) -> Self {
        RefreshCoordinator {
            source,
            browser,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Mutex::new(None),
        }
    }

    /// Start a fetch, aborting any fetch still in flight. Returns the
    /// generation number of the new fetch.
    pub async fn refresh(&self) -> u64 {
        let mut slot = self.in_flight.lock().await;
        if let Some(previous) = slot.take() {
            if !previous.is_finished() {
                tracing::info!("Superseding in-flight listings fetch");
                previous.abort();
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.browser.lock().await.mark_loading();

        let source = Arc::clone(&self.source);
        let browser = Arc::clone(&self.browser);
        let latest = Arc::clone(&self.generation);
        *slot = Some(tokio::spawn(async move {
            let result = source.fetch().await;
            let mut browser = browser.lock().await;
            // An abort can lose the race against completion; drop stale results here
            if latest.load(Ordering::SeqCst) != generation {
                tracing::debug!(generation, "Discarding result of superseded fetch");
                return;
            }
            match result {
                Ok(listings) => browser.load_catalog(listings),
                Err(e) => browser.fetch_failed(e.to_string()),
            }
        }));

        tracing::debug!(generation, "Listings fetch started");
        generation
    }

    /// Wait for the current fetch, if any, to finish.
    pub async fn wait(&self) {
        let handle = self.in_flight.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if e.is_cancelled() {
                    tracing::debug!("Awaited fetch was cancelled");
                } else {
                    tracing::error!(error = %e, "Listings fetch task panicked");
                }
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
