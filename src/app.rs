use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/accounts", get(handlers::list_accounts))
        .route("/api/accounts/upload", post(handlers::upload_account))
        .route(
            "/api/accounts/:key",
            get(handlers::get_account).delete(handlers::delete_account),
        )
        .route("/api/accounts/:key/connect", post(handlers::connect_account))
        .route("/api/accounts/:key/validate", post(handlers::validate_account))
        .route("/api/earnings", get(handlers::get_earnings))
        .route("/api/domains", get(handlers::get_domains))
        .route("/api/ctr", get(handlers::get_ctr))
        .route("/api/summary", get(handlers::get_summary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
