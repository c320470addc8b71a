//! Identidad del llamador desde headers
//!
//! La autenticación vive fuera de este servicio; el gateway que la realiza
//! reenvía el usuario ya verificado en `x-user-id` y `x-user-role`.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::models::{Principal, Role};
use crate::utils::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Usuario autenticado que se inyecta en los handlers
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub Principal);

impl CallerIdentity {
    pub fn require_role(self, role: Role) -> Result<Principal, AppError> {
        if self.0.role != role {
            return Err(AppError::Forbidden(format!("This operation requires the {} role", role)));
        }
        Ok(self.0)
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(format!("Header {} requerido", name)))
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = Uuid::parse_str(header(parts, USER_ID_HEADER)?)
            .map_err(|_| AppError::Unauthorized("Invalid user id".to_string()))?;
        let role = header(parts, USER_ROLE_HEADER)?
            .parse::<Role>()
            .map_err(AppError::Unauthorized)?;

        Ok(CallerIdentity(Principal { id, role }))
    }
}
