use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Allocation, Route};
use crate::utils::validation::{validate_non_negative_amount, validate_schedule};

// Request para crear una ruta
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRouteRequest {
    #[validate(length(min = 3, max = 120))]
    pub name: String,

    #[validate(range(min = 1))]
    pub capacity: i32,

    #[validate(custom = "validate_non_negative_amount")]
    pub monthly_price: Decimal,

    #[validate(custom = "validate_schedule")]
    pub schedule: Option<serde_json::Value>,
}

// Request para activar o desactivar una ruta
#[derive(Debug, Clone, Deserialize)]
pub struct SetRouteActiveRequest {
    pub active: bool,
}

// Response del cambio de estado con el detalle de la cascada
#[derive(Debug, Serialize)]
pub struct RouteToggleResponse {
    pub route: Route,
    pub cancelled_allocations: Vec<Allocation>,
    pub deactivated_students: Vec<uuid::Uuid>,
}
