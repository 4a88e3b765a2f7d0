// Car listings catalog client: fetch, filter and browse listings

use std::sync::Arc;

use axum::extract::FromRef;
use tokio::sync::watch;

pub mod browser;
pub mod catalog;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod filter_set;
pub mod filters;
pub mod listings_api;
pub mod models;
pub mod refresh;
pub mod routes;
pub mod store;

use crate::browser::{SharedBrowser, ViewSnapshot};
use crate::config::Settings;
use crate::refresh::RefreshCoordinator;

// Application state shared by every handler
#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub browser: SharedBrowser,
    pub view: watch::Receiver<ViewSnapshot>, // Latest published view, readable without the browser lock
    pub refresher: Arc<RefreshCoordinator>,
}
