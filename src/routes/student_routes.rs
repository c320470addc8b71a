use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use uuid::Uuid;

use crate::dto::student_dto::RegisterStudentRequest;
use crate::dto::ApiResponse;
use crate::middleware::{CallerIdentity, JsonBody};
use crate::models::{Role, Student};
use crate::repositories::EntityStore;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_student_router<S: EntityStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(register_student::<S>))
        .route("/:id", delete(remove_student::<S>))
}

async fn register_student<S: EntityStore>(
    State(state): State<AppState<S>>,
    caller: CallerIdentity,
    JsonBody(request): JsonBody<RegisterStudentRequest>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let guardian = caller.require_role(Role::Guardian)?;
    let student = state.students.register(guardian.id, request).await?;
    Ok(Json(ApiResponse::success(student)))
}

async fn remove_student<S: EntityStore>(
    State(state): State<AppState<S>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Student>>, AppError> {
    let guardian = caller.require_role(Role::Guardian)?;
    let student = state.students.remove(id, guardian.id).await?;
    Ok(Json(ApiResponse::success_with_message(student, "Estudiante dado de baja")))
}
