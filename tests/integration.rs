use std::sync::Arc;

use autoscout_rust::{
    AppState,
    browser::{FetchStatus, ListingBrowser},
    config::Settings,
    error::{AppError, FetchError},
    filter_set::FilterSet,
    filters::{FilterCriterion, FilterKind, FilterStatus},
    listings_api::{ListingSource, decode_listings},
    models::Listing,
    refresh::RefreshCoordinator,
    routes::{api, pages},
    store::{JsonFileStore, MemoryStore, SettingsRepository},
};
use axum::extract::{Json, Path, State};
use futures::future::{BoxFuture, FutureExt};
use tempfile::TempDir;

const CATALOG: &str = r#"[
    {"id": 1, "make": "Opel", "model": "Astra", "price": 10000, "mileage": 120000, "fuel": "Diesel",
     "description": "Daily driver", "colour": "Red", "firstRegistration": "04-2012",
     "images": [{"url": "https://img.example/astra.jpg"}],
     "seller": {"type": "Private", "phone": "+41 44 000", "city": "Zurich"}},
    {"id": 2, "make": "Renault", "model": "Zoe", "price": 30000, "mileage": 15000, "fuel": "Electric",
     "description": "Battery owned", "colour": "Blue", "firstRegistration": "09-2020"},
    {"id": 3, "make": "Skoda", "model": "Octavia", "price": 22000, "mileage": 60000, "fuel": "Diesel",
     "description": "Estate", "firstRegistration": "unknown"}
]"#;

// Serves the fixed catalog above
struct FixtureSource;

impl ListingSource for FixtureSource {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Listing>, FetchError>> {
        async { decode_listings(CATALOG.as_bytes()) }.boxed()
    }
}

struct BrokenSource;

impl ListingSource for BrokenSource {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Listing>, FetchError>> {
        async { decode_listings(b"<html>maintenance</html>") }.boxed()
    }
}

fn setup_with(source: Arc<dyn ListingSource>, store: Box<dyn SettingsRepository>) -> AppState {
    let browser = ListingBrowser::new(FilterSet::restore(store));
    let view = browser.subscribe();
    let browser = browser.shared();
    let refresher = Arc::new(RefreshCoordinator::new(source, Arc::clone(&browser)));
    AppState {
        settings: Arc::new(Settings::default()),
        browser,
        view,
        refresher,
    }
}

async fn loaded_app() -> AppState {
    let app = setup_with(Arc::new(FixtureSource), Box::new(MemoryStore::new()));
    app.refresher.refresh().await;
    app.refresher.wait().await;
    app
}

fn card_ids(resp: &api::ListingsResponse) -> Vec<u64> {
    resp.cards.iter().map(|c| c.id).collect()
}

// === Fetch & Catalog ===

#[tokio::test]
async fn test_refresh_populates_grid() {
    let app = loaded_app().await;
    let Json(resp) = api::get_listings(State(app.clone())).await;
    assert_eq!(resp.fetch, FetchStatus::Loaded { count: 3 });
    assert_eq!(resp.total, 3);
    assert_eq!(card_ids(&resp), vec![1, 2, 3]);
    assert_eq!(resp.cards[0].title, "Opel Astra");
    assert_eq!(resp.cards[0].price_label, "€ 10000.-");
}

#[tokio::test]
async fn test_decode_failure_surfaces_failed_state() {
    let app = setup_with(Arc::new(BrokenSource), Box::new(MemoryStore::new()));
    let (status, Json(body)) = api::refresh(State(app.clone())).await;
    assert_eq!(status, axum::http::StatusCode::ACCEPTED);
    assert_eq!(body.generation, 1);
    app.refresher.wait().await;

    let Json(resp) = api::get_listings(State(app.clone())).await;
    assert!(matches!(resp.fetch, FetchStatus::Failed { .. }));
    assert!(resp.cards.is_empty());

    let html = pages::grid_page(State(app)).await.unwrap().0;
    assert!(html.contains("Fetch failed"));
}

// === Filters ===

#[tokio::test]
async fn test_price_filter_via_api() {
    let app = loaded_app().await;
    let Json(filters) = api::set_filter(
        State(app.clone()),
        Json(FilterCriterion::PriceRange { min: 15_000, max: 50_000 }),
    )
    .await
    .unwrap();
    assert_eq!(filters.status, FilterStatus::Filtered);
    let price = filters.criteria.iter().find(|c| c.kind == FilterKind::Price).unwrap();
    assert_eq!(price.label.as_deref(), Some("Price: 15,000 - 50,000"));

    let Json(resp) = api::get_listings(State(app)).await;
    assert_eq!(card_ids(&resp), vec![2, 3]);
    assert_eq!(resp.active_filters.len(), 1);
}

#[tokio::test]
async fn test_fuel_and_colour_filters_combine() {
    let app = loaded_app().await;
    api::set_filter(State(app.clone()), Json(FilterCriterion::FuelEquals { fuel: "Diesel".into() }))
        .await
        .unwrap();
    api::set_filter(State(app.clone()), Json(FilterCriterion::ColourEquals { colour: "Red".into() }))
        .await
        .unwrap();

    // Listing 3 has no colour and is kept
    let Json(resp) = api::get_listings(State(app)).await;
    assert_eq!(card_ids(&resp), vec![1, 3]);
}

#[tokio::test]
async fn test_registration_filter_keeps_unparsable_dates() {
    let app = loaded_app().await;
    let from = chrono::NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    let to = chrono::NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
    api::set_filter(
        State(app.clone()),
        Json(FilterCriterion::RegistrationDateRange { from, to }),
    )
    .await
    .unwrap();

    let Json(resp) = api::get_listings(State(app)).await;
    assert_eq!(card_ids(&resp), vec![2, 3]);
}

#[tokio::test]
async fn test_invalid_filter_is_bad_request() {
    let app = loaded_app().await;
    let err = api::set_filter(
        State(app.clone()),
        Json(FilterCriterion::MileageRange { min: 100_000, max: 0 }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = api::reset_filter(State(app), Path("doors".to_string())).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("doors")));
}

#[tokio::test]
async fn test_reset_single_and_all_filters() {
    let app = loaded_app().await;
    api::set_filter(State(app.clone()), Json(FilterCriterion::FuelEquals { fuel: "Diesel".into() }))
        .await
        .unwrap();
    api::set_filter(
        State(app.clone()),
        Json(FilterCriterion::MileageRange { min: 0, max: 70_000 }),
    )
    .await
    .unwrap();
    let Json(resp) = api::get_listings(State(app.clone())).await;
    assert_eq!(card_ids(&resp), vec![3]);

    let Json(filters) = api::reset_filter(State(app.clone()), Path("fuel".to_string()))
        .await
        .unwrap();
    assert_eq!(filters.status, FilterStatus::Filtered);
    let Json(resp) = api::get_listings(State(app.clone())).await;
    assert_eq!(card_ids(&resp), vec![2, 3]);

    let Json(filters) = api::reset_filters(State(app.clone())).await.unwrap();
    assert_eq!(filters.status, FilterStatus::Unfiltered);
    assert!(filters.criteria.iter().all(|c| c.is_default && c.label.is_none()));
    let Json(resp) = api::get_listings(State(app)).await;
    assert_eq!(card_ids(&resp), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_filters_persist_across_sessions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("filters.json");

    {
        let app = setup_with(Arc::new(FixtureSource), Box::new(JsonFileStore::open(&path)));
        api::set_filter(State(app), Json(FilterCriterion::FuelEquals { fuel: "Electric".into() }))
            .await
            .unwrap();
    }

    let app = setup_with(Arc::new(FixtureSource), Box::new(JsonFileStore::open(&path)));
    app.refresher.refresh().await;
    app.refresher.wait().await;
    let Json(resp) = api::get_listings(State(app)).await;
    assert_eq!(resp.filter_status, FilterStatus::Filtered);
    assert_eq!(card_ids(&resp), vec![2]);
}

#[tokio::test]
async fn test_filter_options_start_with_any() {
    let Json(options) = api::get_filter_options().await;
    assert_eq!(options.fuels.first(), Some(&"Any"));
    assert_eq!(options.fuels.len(), 5);
    assert_eq!(options.colours.len(), 10);
    assert_eq!(options.price.max, 250_000);
}

#[tokio::test]
async fn test_grid_form_keeps_saved_fuel_and_colour() {
    let app = loaded_app().await;
    api::set_filter(State(app.clone()), Json(FilterCriterion::FuelEquals { fuel: "Diesel".into() }))
        .await
        .unwrap();
    api::set_filter(State(app.clone()), Json(FilterCriterion::ColourEquals { colour: "red".into() }))
        .await
        .unwrap();

    let html = pages::grid_page(State(app)).await.unwrap().0;
    assert!(html.contains(r#"<option value="Diesel" selected>Diesel</option>"#));
    assert!(html.contains(r#"<option value="Red" selected>Red</option>"#));
    assert!(html.contains(r#"data-current="Diesel""#));
    assert!(html.contains(r#"<option value="Any">Any</option>"#));
}

// === Detail ===

#[tokio::test]
async fn test_detail_read_model() {
    let app = loaded_app().await;
    let Json(detail) = api::get_listing(State(app.clone()), Path(1)).await.unwrap();
    assert_eq!(detail.title, "Opel Astra");
    assert_eq!(detail.contact.as_deref(), Some("tel://+41 44 000"));
    assert!(detail.properties.contains(&"City: Zurich".to_string()));

    let Json(detail) = api::get_listing(State(app.clone()), Path(2)).await.unwrap();
    assert!(detail.contact.is_none());
    assert!(detail.images.is_empty());

    let err = api::get_listing(State(app), Path(42)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_pages_render() {
    let app = loaded_app().await;
    let grid = pages::grid_page(State(app.clone())).await.unwrap().0;
    assert!(grid.contains("Renault Zoe"));
    assert!(grid.contains("3 of 3 listings"));

    let detail = pages::detail_page(State(app.clone()), Path(1)).await.unwrap().0;
    assert!(detail.contains("Modelline: -"));
    assert!(detail.contains("img.example"));

    assert!(matches!(
        pages::detail_page(State(app), Path(7)).await,
        Err(AppError::NotFound(_))
    ));
}
