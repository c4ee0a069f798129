pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::adapters::http::state::HttpState;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/detect/", post(routes::detect))
        .route("/api/health", get(routes::health))
        .layer(DefaultBodyLimit::max(routes::MAX_UPLOAD_BYTES))
        // CORS abierto para que el frontend en el navegador pueda llamar
        // al endpoint; restringir en producción.
        .layer(CorsLayer::permissive())
        .with_state(state)
}
