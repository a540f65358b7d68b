use axum::{http::HeaderValue, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{api, app::App};

pub fn router(app: App, app_router: fn(App) -> Router) -> Router {
    let cors = cors_layer(&app.config.server.allowed_origins);

    Router::new()
        .route("/liveness", get(api::health_checks::ok))
        .route("/readiness", get(api::health_checks::readiness))
        .with_state(app.clone())
        .merge(app_router(app))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// The UI is served from a different origin than the API.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .expect("invalid CORS origin in configuration")
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
