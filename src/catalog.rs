// Authoritative list of fetched listings

use std::sync::Arc;

use crate::models::Listing;

#[derive(Debug, Default, Clone)]
pub struct CatalogStore {
    listings: Arc<Vec<Listing>>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole catalog with a fresh fetch result.
    pub fn load(&mut self, listings: Vec<Listing>) {
        tracing::debug!(count = listings.len(), "Catalog replaced");
        self.listings = Arc::new(listings);
    }

    /// Copy of the current catalog; callers never see later loads through it.
    pub fn current(&self) -> Vec<Listing> {
        self.listings.as_ref().clone()
    }

    pub fn as_slice(&self) -> &[Listing] {
        &self.listings
    }

    pub fn get(&self, id: u64) -> Option<&Listing> {
        self.listings.iter().find(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}
