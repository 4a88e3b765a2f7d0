// Handlers for the JSON API

use axum::{
    extract::{Json as JsonExtract, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    AppState,
    browser::FetchStatus,
    error::{AppError, AppResult},
    filters::{
        self, ANY, COLOUR_OPTIONS, FUEL_OPTIONS, FilterBadge, FilterCriterion, FilterKind,
        FilterState, FilterStatus, SelectionType,
    },
    models::{ListingCard, ListingDetail},
};

// --- Response Wrappers ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingsResponse {
    pub fetch: FetchStatus,
    pub filter_status: FilterStatus,
    pub active_filters: Vec<FilterBadge>,
    pub total: usize,
    pub shown: usize,
    pub cards: Vec<ListingCard>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionView {
    pub kind: FilterKind,
    pub selection_type: SelectionType,
    pub is_default: bool,
    pub label: Option<String>,
    pub value: FilterCriterion,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersResponse {
    pub status: FilterStatus,
    pub criteria: Vec<CriterionView>,
}

#[derive(Debug, Serialize)]
pub struct RangeBounds {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub fuels: Vec<&'static str>,
    pub colours: Vec<&'static str>,
    pub price: RangeBounds,
    pub mileage: RangeBounds,
    pub registration_from: NaiveDate,
    pub registration_to: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub generation: u64,
    pub source: String,
}

fn filters_response(state: &FilterState) -> FiltersResponse {
    FiltersResponse {
        status: state.status(),
        criteria: state
            .iter()
            .map(|c| CriterionView {
                kind: c.kind(),
                selection_type: c.kind().selection_type(),
                is_default: c.is_default(),
                label: c.label(),
                value: c.clone(),
            })
            .collect(),
    }
}

fn with_any(options: &[&'static str]) -> Vec<&'static str> {
    std::iter::once(ANY).chain(options.iter().copied()).collect()
}

// --- API Handlers ---

pub async fn get_listings(State(app_state): State<AppState>) -> Json<ListingsResponse> {
    let snapshot = app_state.view.borrow().clone();
    tracing::debug!(shown = snapshot.listings.len(), total = snapshot.total, "[HANDLER] /api/listings");
    Json(ListingsResponse {
        fetch: snapshot.fetch,
        filter_status: snapshot.filter_status,
        active_filters: snapshot.active_filters,
        total: snapshot.total,
        shown: snapshot.listings.len(),
        cards: snapshot.listings.iter().map(ListingCard::from).collect(),
    })
}

pub async fn get_listing(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<ListingDetail>> {
    let browser = app_state.browser.lock().await;
    browser
        .detail(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No listing with id {}", id)))
}

// Pull-to-refresh: supersedes any fetch still running
pub async fn refresh(State(app_state): State<AppState>) -> (StatusCode, Json<RefreshResponse>) {
    let generation = app_state.refresher.refresh().await;
    tracing::info!(generation, "[HANDLER] /api/refresh - Fetch started.");
    (
        StatusCode::ACCEPTED,
        Json(RefreshResponse {
            generation,
            source: app_state.settings.listings_url.clone(),
        }),
    )
}

pub async fn get_filters(State(app_state): State<AppState>) -> Json<FiltersResponse> {
    let view = app_state.view.borrow();
    Json(filters_response(&view.filters))
}

pub async fn get_filter_options() -> Json<FilterOptions> {
    Json(FilterOptions {
        fuels: with_any(&FUEL_OPTIONS),
        colours: with_any(&COLOUR_OPTIONS),
        price: RangeBounds {
            min: filters::RANGE_MIN,
            max: filters::PRICE_RANGE_MAX,
            step: filters::RANGE_STEP,
        },
        mileage: RangeBounds {
            min: filters::RANGE_MIN,
            max: filters::MILEAGE_RANGE_MAX,
            step: filters::RANGE_STEP,
        },
        registration_from: *filters::REGISTRATION_FROM,
        registration_to: *filters::REGISTRATION_TO,
    })
}

pub async fn set_filter(
    State(app_state): State<AppState>,
    JsonExtract(criterion): JsonExtract<FilterCriterion>,
) -> AppResult<Json<FiltersResponse>> {
    tracing::info!(kind = %criterion.kind(), "[HANDLER] PUT /api/filters");
    let mut browser = app_state.browser.lock().await;
    browser.apply_filter(criterion)?;
    Ok(Json(filters_response(browser.filter_state())))
}

pub async fn reset_filters(State(app_state): State<AppState>) -> AppResult<Json<FiltersResponse>> {
    tracing::info!("[HANDLER] DELETE /api/filters");
    let mut browser = app_state.browser.lock().await;
    browser.reset_filter(None)?;
    Ok(Json(filters_response(browser.filter_state())))
}

pub async fn reset_filter(
    State(app_state): State<AppState>,
    Path(kind): Path<String>,
) -> AppResult<Json<FiltersResponse>> {
    let kind: FilterKind = kind.parse()?;
    tracing::info!(%kind, "[HANDLER] DELETE /api/filters/:kind");
    let mut browser = app_state.browser.lock().await;
    browser.reset_filter(Some(kind))?;
    Ok(Json(filters_response(browser.filter_state())))
}
