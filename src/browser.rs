//! Single owner of catalog, filters and the derived view.
//!
//! Every mutation recomputes the filtered view and publishes a fresh
//! [`ViewSnapshot`] to subscribers, so renderers never read half-updated state.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, watch};

use crate::catalog::CatalogStore;
use crate::error::FilterError;
use crate::evaluator;
use crate::filter_set::FilterSet;
use crate::filters::{FilterBadge, FilterCriterion, FilterKind, FilterState, FilterStatus};
use crate::models::{Listing, ListingCard, ListingDetail};

pub type SharedBrowser = Arc<Mutex<ListingBrowser>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum FetchStatus {
    Idle,
    Loading,
    Loaded { count: usize },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSnapshot {
    pub fetch: FetchStatus,
    pub filter_status: FilterStatus,
    pub active_filters: Vec<FilterBadge>,
    pub total: usize, // Catalog size before filtering
    pub listings: Vec<Listing>,
    #[serde(skip)]
    pub filters: FilterState,
}

#[derive(Debug)]
pub struct ListingBrowser {
    catalog: CatalogStore,
    filters: FilterSet,
    fetch: FetchStatus,
    view: Vec<Listing>,
    updates: watch::Sender<ViewSnapshot>,
}

impl ListingBrowser {
    pub fn new(filters: FilterSet) -> Self {
        let initial = ViewSnapshot {
            fetch: FetchStatus::Idle,
            filter_status: filters.state().status(),
            active_filters: filters.state().badges(),
            total: 0,
            listings: Vec::new(),
            filters: filters.state().clone(),
        };
        let (updates, _) = watch::channel(initial);
        ListingBrowser {
            catalog: CatalogStore::new(),
            filters,
            fetch: FetchStatus::Idle,
            view: Vec::new(),
            updates,
        }
    }

    pub fn shared(self) -> SharedBrowser {
        Arc::new(Mutex::new(self))
    }

    /// Receiver of every published snapshot. Read paths use it instead of
    /// locking the browser.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.updates.subscribe()
    }

    pub fn load_catalog(&mut self, listings: Vec<Listing>) {
        let count = listings.len();
        self.catalog.load(listings);
        self.fetch = FetchStatus::Loaded { count };
        self.recompute();
        tracing::info!(count, shown = self.view.len(), "Catalog loaded");
    }

    pub fn mark_loading(&mut self) {
        self.fetch = FetchStatus::Loading;
        self.publish();
    }

    /// Keep the stale catalog, surface the failure.
    pub fn fetch_failed(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(error = %message, stale = self.catalog.len(), "Fetch failed, keeping previous catalog");
        self.fetch = FetchStatus::Failed { message };
        self.publish();
    }

    pub fn apply_filter(&mut self, criterion: FilterCriterion) -> Result<(), FilterError> {
        self.filters.set(criterion)?;
        self.recompute();
        Ok(())
    }

    pub fn reset_filter(&mut self, kind: Option<FilterKind>) -> Result<(), FilterError> {
        self.filters.reset(kind)?;
        self.recompute();
        Ok(())
    }

    pub fn filter_state(&self) -> &FilterState {
        self.filters.state()
    }

    pub fn fetch_status(&self) -> &FetchStatus {
        &self.fetch
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn filtered(&self) -> &[Listing] {
        &self.view
    }

    pub fn cards(&self) -> Vec<ListingCard> {
        self.view.iter().map(ListingCard::from).collect()
    }

    pub fn detail(&self, id: u64) -> Option<ListingDetail> {
        self.catalog.get(id).map(ListingDetail::from)
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let state = self.filters.state();
        ViewSnapshot {
            fetch: self.fetch.clone(),
            filter_status: state.status(),
            active_filters: state.badges(),
            total: self.catalog.len(),
            listings: self.view.clone(),
            filters: state.clone(),
        }
    }

    fn recompute(&mut self) {
        self.view = evaluator::evaluate(self.catalog.as_slice(), self.filters.state());
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}
