use axum::{
    extract::{Path, State},
    routing::patch,
    Json, Router,
};
use uuid::Uuid;

use crate::dto::allocation_dto::AllocationPatch;
use crate::dto::ApiResponse;
use crate::middleware::{CallerIdentity, JsonBody};
use crate::models::Allocation;
use crate::repositories::EntityStore;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_allocation_router<S: EntityStore>() -> Router<AppState<S>> {
    Router::new().route("/:id", patch(update_allocation::<S>))
}

async fn update_allocation<S: EntityStore>(
    State(state): State<AppState<S>>,
    CallerIdentity(caller): CallerIdentity,
    Path(id): Path<Uuid>,
    JsonBody(patch): JsonBody<AllocationPatch>,
) -> Result<Json<ApiResponse<Allocation>>, AppError> {
    let allocation = state.allocations.update(id, caller, patch).await?;
    Ok(Json(ApiResponse::success_with_message(allocation, "Servicio actualizado")))
}
