use crate::{cors_layer, handlers::*, AppState};
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        // Analysis
        .route("/analyze/:symbol", get(get_analysis))
        .route("/analyze/force-run/:symbol", post(force_run_analysis))
        // Watchlist
        .route("/watchlist/add", post(add_to_watchlist))
        .route("/watchlist", get(list_watchlist))
        .route("/watchlist/remove/:id", delete(remove_from_watchlist))
        // On-demand data
        .route("/market-data/:symbol", get(get_market_data))
        .route("/sentiment/:symbol", get(get_sentiment))
        // Health and metrics
        .route("/health/cache", get(check_cache))
        .route("/metrics", get(metrics))
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins());
    create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
