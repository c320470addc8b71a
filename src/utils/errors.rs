//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Route {route_id} has no free seats (capacity {capacity})")]
    Capacity { route_id: Uuid, capacity: i32 },

    #[error("Duplicate request: {0}")]
    Duplicate(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl AppError {
    /// Código estable que el cliente usa para distinguir el error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Capacity { .. } => "CAPACITY_EXCEEDED",
            AppError::Duplicate(_) => "DUPLICATE_REQUEST",
            AppError::Conflict(_) => "CONFLICT",
            AppError::BadRequest(_) => "BAD_REQUEST",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Capacity { .. } | AppError::Duplicate(_) | AppError::Conflict(_) => {
                StatusCode::CONFLICT
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = Some(self.code().to_string());

        let error_response = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                ErrorResponse {
                    error: "Database Error".to_string(),
                    message: "An error occurred while accessing the database".to_string(),
                    details: None,
                    code,
                }
            }

            AppError::Store(msg) => {
                tracing::error!("Store error: {}", msg);
                ErrorResponse {
                    error: "Store Error".to_string(),
                    message: "The operation was not applied".to_string(),
                    details: None,
                    code,
                }
            }

            AppError::Validation(e) => {
                tracing::debug!("Validation error: {}", e);
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(e)),
                    code,
                }
            }

            AppError::Capacity { route_id, capacity } => {
                tracing::debug!("Capacity reached on route {}", route_id);
                ErrorResponse {
                    error: "Capacity Exceeded".to_string(),
                    message: "The route has no free seats".to_string(),
                    details: Some(json!({ "route_id": route_id, "capacity": capacity })),
                    code,
                }
            }

            AppError::Unauthorized(msg) => ErrorResponse {
                error: "Unauthorized".to_string(),
                message: msg,
                details: None,
                code,
            },

            AppError::Forbidden(msg) => ErrorResponse {
                error: "Forbidden".to_string(),
                message: msg,
                details: None,
                code,
            },

            AppError::NotFound(msg) => ErrorResponse {
                error: "Not Found".to_string(),
                message: msg,
                details: None,
                code,
            },

            AppError::Duplicate(msg) => ErrorResponse {
                error: "Duplicate Request".to_string(),
                message: msg,
                details: None,
                code,
            },

            AppError::Conflict(msg) => ErrorResponse {
                error: "Conflict".to_string(),
                message: msg,
                details: None,
                code,
            },

            AppError::BadRequest(msg) => ErrorResponse {
                error: "Bad Request".to_string(),
                message: msg,
                details: None,
                code,
            },
        };

        (status, Json(error_response)).into_response()
    }
}

// Cuerpo JSON ilegible o con tipos incorrectos
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.message = Some(message.into());
    error.add_param("field".into(), &field);

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: Uuid) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_business_error_is_distinguishable() {
        let route_id = Uuid::new_v4();
        let errors = vec![
            not_found_error("Route", route_id),
            forbidden_error("resolve request", "route belongs to another driver"),
            AppError::Capacity { route_id, capacity: 2 },
            AppError::Duplicate("pending request exists".to_string()),
            validation_error("status", "unknown status"),
            AppError::Conflict("student has open allocations".to_string()),
        ];

        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 6);
    }

    #[tokio::test]
    async fn test_unreadable_json_becomes_bad_request() {
        use axum::extract::FromRequest;

        let request = axum::http::Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{ \"capacity\": "))
            .unwrap();
        let rejection = Json::<serde_json::Value>::from_request(request, &()).await.unwrap_err();

        let error = AppError::from(rejection);
        assert!(matches!(error, AppError::BadRequest(_)));
        assert_eq!(error.code(), "BAD_REQUEST");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_capacity_maps_to_conflict_status() {
        let error = AppError::Capacity { route_id: Uuid::new_v4(), capacity: 3 };
        assert_eq!(error.status(), StatusCode::CONFLICT);
        assert_eq!(error.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_error_keeps_field_name() {
        match validation_error("agreed_price", "must not be negative") {
            AppError::Validation(errors) => {
                assert!(errors.field_errors().contains_key("agreed_price"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
