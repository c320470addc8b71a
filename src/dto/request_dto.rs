use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::ResolveOutcome;

// Request de un apoderado para inscribir a un estudiante en una ruta
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitRequestPayload {
    pub route_id: Uuid,
    pub student_id: Uuid,

    #[validate(length(max = 500))]
    pub message: Option<String>,
}

// Resolución del conductor
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResolveRequestPayload {
    pub outcome: ResolveOutcome,

    #[validate(length(max = 500))]
    pub response: Option<String>,
}
