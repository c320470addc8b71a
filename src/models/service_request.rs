//! Modelo de solicitud de servicio
//!
//! Una solicitud es el pedido de un apoderado para asignar un estudiante a
//! una ruta. Nace `pending` y el conductor la resuelve exactamente una vez.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado de la solicitud - mapea al ENUM request_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// Resultado que el conductor puede elegir al resolver
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResolveOutcome {
    Accepted,
    Rejected,
}

impl From<ResolveOutcome> for RequestStatus {
    fn from(outcome: ResolveOutcome) -> Self {
        match outcome {
            ResolveOutcome::Accepted => RequestStatus::Accepted,
            ResolveOutcome::Rejected => RequestStatus::Rejected,
        }
    }
}

/// Solicitud principal - mapea a la tabla service_requests
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub route_id: Uuid,
    pub guardian_id: Uuid,
    pub student_id: Uuid,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub submitted_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub driver_response: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewServiceRequest {
    pub route_id: Uuid,
    pub guardian_id: Uuid,
    pub student_id: Uuid,
    pub message: Option<String>,
}
