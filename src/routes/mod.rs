// Route definitions

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::AppState;

pub mod api;
pub mod pages;

pub fn create_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route("/listings", get(api::get_listings))
        .route("/listings/:id", get(api::get_listing))
        .route("/refresh", post(api::refresh))
        .route(
            "/filters",
            get(api::get_filters)
                .put(api::set_filter)
                .delete(api::reset_filters),
        )
        .route("/filters/options", get(api::get_filter_options))
        .route("/filters/:kind", axum::routing::delete(api::reset_filter));

    Router::new()
        .route("/", get(pages::grid_page))
        .route("/listings/:id", get(pages::detail_page))
        .nest("/api", api_router)
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
