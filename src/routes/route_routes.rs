use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::dto::route_dto::{CreateRouteRequest, RouteToggleResponse, SetRouteActiveRequest};
use crate::dto::ApiResponse;
use crate::middleware::{CallerIdentity, JsonBody};
use crate::models::{Role, Route, SeatAvailability, ServiceRequest};
use crate::repositories::EntityStore;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_route_router<S: EntityStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(create_route::<S>))
        .route("/:id/active", put(set_route_active::<S>))
        .route("/:id/availability", get(get_availability::<S>))
        .route("/:id/requests", get(list_pending_requests::<S>))
}

async fn create_route<S: EntityStore>(
    State(state): State<AppState<S>>,
    caller: CallerIdentity,
    JsonBody(request): JsonBody<CreateRouteRequest>,
) -> Result<Json<ApiResponse<Route>>, AppError> {
    let driver = caller.require_role(Role::Driver)?;
    let route = state.routes.create(driver.id, request).await?;
    Ok(Json(ApiResponse::success_with_message(route, "Ruta creada exitosamente")))
}

async fn set_route_active<S: EntityStore>(
    State(state): State<AppState<S>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<SetRouteActiveRequest>,
) -> Result<Json<ApiResponse<RouteToggleResponse>>, AppError> {
    let driver = caller.require_role(Role::Driver)?;
    let toggle = state.routes.set_active(id, driver.id, request.active).await?;
    Ok(Json(ApiResponse::success(RouteToggleResponse {
        route: toggle.route,
        cancelled_allocations: toggle.cancelled_allocations,
        deactivated_students: toggle.deactivated_students,
    })))
}

async fn get_availability<S: EntityStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SeatAvailability>>, AppError> {
    let availability = state.allocator.availability(id).await?;
    Ok(Json(ApiResponse::success(availability)))
}

async fn list_pending_requests<S: EntityStore>(
    State(state): State<AppState<S>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ServiceRequest>>>, AppError> {
    let driver = caller.require_role(Role::Driver)?;
    let requests = state.requests.pending_for_route(id, driver.id).await?;
    Ok(Json(ApiResponse::success(requests)))
}
