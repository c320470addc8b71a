//! Rutas HTTP
//!
//! Capa delgada sobre los servicios: extrae la identidad, valida el cuerpo
//! y envuelve la respuesta en `ApiResponse`.

pub mod allocation_routes;
pub mod request_routes;
pub mod route_routes;
pub mod student_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::cors_layer;
use crate::repositories::EntityStore;
use crate::state::AppState;

/// Router completo de la API
pub fn create_router<S: EntityStore>(state: AppState<S>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health))
        .nest("/api/routes", route_routes::create_route_router::<S>())
        .nest("/api/requests", request_routes::create_request_router::<S>())
        .nest("/api/allocations", allocation_routes::create_allocation_router::<S>())
        .nest("/api/students", student_routes::create_student_router::<S>())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "school-transport" }))
}
