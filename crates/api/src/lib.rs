pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use state::AppState;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.app.cors_origins);

    // Org-scoped invite management (requires org.users:add)
    let org_invite_routes = Router::new()
        .route(
            "/",
            get(routes::invite::list_pending).post(routes::invite::create),
        )
        .route("/{code}/revoke", delete(routes::invite::revoke));

    // Public invite routes (no auth)
    let public_invite_routes = Router::new().route("/{code}", get(routes::invite::get_info));

    let api = Router::new()
        .route("/search", post(routes::search::query))
        .route("/search/", post(routes::search::query))
        .nest("/org/invites", org_invite_routes)
        .nest("/invite", public_invite_routes)
        .route("/user/invite/complete", post(routes::invite::complete));

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Prometheus text exposition of every counter recorded through `handle`'s recorder.
pub fn metrics_routes(handle: PrometheusHandle) -> Router {
    Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
