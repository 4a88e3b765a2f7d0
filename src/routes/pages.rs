use askama::Template;
use axum::{
    extract::{Path, State},
    response::Html,
};

use crate::{
    AppState,
    browser::FetchStatus,
    error::{AppError, AppResult},
    filters::{ANY, COLOUR_OPTIONS, FUEL_OPTIONS, FilterBadge, FilterCriterion, FilterKind},
    models::{ListingCard, ListingDetail},
};

#[derive(Template)]
#[template(path = "grid.html")]
pub struct GridTemplate {
    pub cards: Vec<ListingCard>,
    pub badges: Vec<FilterBadge>,
    pub notice: Option<String>,
    pub shown: usize,
    pub total: usize,
    pub fuels: Vec<SelectOption>,
    pub colours: Vec<SelectOption>,
}

// Dropdown entry; `selected` marks the saved selection
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

// A saved value outside the known options is appended so the form keeps it
fn select_options(options: &[&str], current: &str) -> Vec<SelectOption> {
    let current = current.trim();
    let mut entries: Vec<SelectOption> = std::iter::once(ANY)
        .chain(options.iter().copied())
        .map(|value| SelectOption {
            value: value.to_string(),
            selected: value.eq_ignore_ascii_case(current),
        })
        .collect();
    if !entries.iter().any(|o| o.selected) {
        entries.push(SelectOption {
            value: current.to_string(),
            selected: true,
        });
    }
    entries
}

#[derive(Template)]
#[template(path = "detail.html")]
pub struct DetailTemplate {
    pub detail: ListingDetail,
}

fn notice_for(status: &FetchStatus) -> Option<String> {
    match status {
        FetchStatus::Idle | FetchStatus::Loaded { .. } => None,
        FetchStatus::Loading => Some("Loading listings...".to_string()),
        FetchStatus::Failed { message } => Some(format!("Fetch failed: {}", message)),
    }
}

fn render<T: Template>(template: &T, name: &str) -> AppResult<Html<String>> {
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Failed to render {} template: {}", name, e);
            Err(AppError::InternalServerError(anyhow::Error::new(e)))
        }
    }
}

// Grid of the currently filtered listings
pub async fn grid_page(State(app_state): State<AppState>) -> AppResult<Html<String>> {
    let snapshot = app_state.view.borrow().clone();
    let current = |kind: FilterKind| match snapshot.filters.get(kind) {
        FilterCriterion::FuelEquals { fuel: value } | FilterCriterion::ColourEquals { colour: value } => {
            value.clone()
        }
        _ => ANY.to_string(),
    };
    let template = GridTemplate {
        cards: snapshot.listings.iter().map(ListingCard::from).collect(),
        fuels: select_options(&FUEL_OPTIONS, &current(FilterKind::Fuel)),
        colours: select_options(&COLOUR_OPTIONS, &current(FilterKind::Colour)),
        badges: snapshot.active_filters,
        notice: notice_for(&snapshot.fetch),
        shown: snapshot.listings.len(),
        total: snapshot.total,
    };
    render(&template, "grid")
}

pub async fn detail_page(
    State(app_state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Html<String>> {
    let detail = app_state
        .browser
        .lock()
        .await
        .detail(id)
        .ok_or_else(|| AppError::NotFound(format!("No listing with id {}", id)))?;
    render(&DetailTemplate { detail }, "detail")
}
