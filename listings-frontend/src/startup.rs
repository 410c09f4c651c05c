use axum::{middleware::from_fn, routing::get, Router};
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    app::{health_check, index},
    auth::{login_handler, logout_handler},
    listings::{add_listing_page, create_listing_handler, list_listings_handler},
};
use crate::AppState;

pub fn build_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(crate::handlers::metrics::metrics))
        .route("/listings", get(list_listings_handler).post(login_handler))
        .route("/add", get(add_listing_page).post(create_listing_handler))
        .route("/logout", get(logout_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri().path(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
