//! Modelo de Student

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Estudiante (menor) asociado a exactamente un apoderado
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Student {
    pub id: Uuid,
    pub guardian_id: Uuid,
    pub full_name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub guardian_id: Uuid,
    pub full_name: String,
}
