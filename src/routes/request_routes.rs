use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::request_dto::{ResolveRequestPayload, SubmitRequestPayload};
use crate::dto::ApiResponse;
use crate::middleware::{CallerIdentity, JsonBody};
use crate::models::{Role, ServiceRequest};
use crate::repositories::EntityStore;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_request_router<S: EntityStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(submit_request::<S>))
        .route("/:id/resolve", post(resolve_request::<S>))
}

async fn submit_request<S: EntityStore>(
    State(state): State<AppState<S>>,
    caller: CallerIdentity,
    JsonBody(payload): JsonBody<SubmitRequestPayload>,
) -> Result<Json<ApiResponse<ServiceRequest>>, AppError> {
    let guardian = caller.require_role(Role::Guardian)?;
    payload.validate()?;

    let request = state
        .requests
        .submit(payload.route_id, guardian.id, payload.student_id, payload.message)
        .await?;
    Ok(Json(ApiResponse::success_with_message(request, "Solicitud enviada")))
}

async fn resolve_request<S: EntityStore>(
    State(state): State<AppState<S>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<ResolveRequestPayload>,
) -> Result<Json<ApiResponse<ServiceRequest>>, AppError> {
    let driver = caller.require_role(Role::Driver)?;
    payload.validate()?;

    let request = state
        .requests
        .resolve(id, driver.id, payload.outcome, payload.response)
        .await?;
    Ok(Json(ApiResponse::success(request)))
}
