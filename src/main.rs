use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use autoscout_rust::{
    AppState,
    browser::ListingBrowser,
    config::Settings,
    filter_set::FilterSet,
    listings_api::{self, HttpListingSource},
    refresh::RefreshCoordinator,
    routes,
    store::{JsonFileStore, MemoryStore, SettingsRepository},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autoscout_rust=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing listings client...");

    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };
    let shared_settings = Arc::new(settings);

    let http_client = listings_api::build_client(&shared_settings)?;
    let source = Arc::new(HttpListingSource::new(http_client, shared_settings.listings_url.clone()));
    tracing::info!(url = %source.url(), "Listings source configured.");

    let store: Box<dyn SettingsRepository> = if shared_settings.filter_store_path.is_empty() {
        tracing::info!("No filter store path configured, selections are kept in memory only.");
        Box::new(MemoryStore::new())
    } else {
        Box::new(JsonFileStore::open(&shared_settings.filter_store_path))
    };
    let browser = ListingBrowser::new(FilterSet::restore(store));
    let view = browser.subscribe();
    let browser = browser.shared();
    let refresher = Arc::new(RefreshCoordinator::new(source, Arc::clone(&browser)));

    let app_state = AppState {
        settings: shared_settings.clone(),
        browser,
        view,
        refresher: refresher.clone(),
    };

    if shared_settings.fetch_on_startup {
        refresher.refresh().await;
    }

    let app = routes::create_router(app_state);

    let addr: SocketAddr = shared_settings.server_address.parse().with_context(|| {
        format!(
            "Invalid server address format in configuration ('{}')",
            shared_settings.server_address
        )
    })?;

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
