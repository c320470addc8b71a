//! Modelo de Route
//!
//! Una ruta es una oferta de transporte recurrente operada por un conductor
//! con un número finito de asientos.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Route principal - mapea a la tabla routes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Route {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub name: String,
    /// Siempre >= 1, lo garantiza un CHECK en la tabla
    pub capacity: i32,
    pub active: bool,
    pub monthly_price: Decimal,
    pub schedule: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Route {
    pub fn is_owned_by(&self, driver_id: Uuid) -> bool {
        self.driver_id == driver_id
    }
}

/// Datos para insertar una ruta nueva
#[derive(Debug, Clone)]
pub struct NewRoute {
    pub driver_id: Uuid,
    pub name: String,
    pub capacity: i32,
    pub monthly_price: Decimal,
    pub schedule: serde_json::Value,
}

/// Ocupación actual de una ruta
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeatAvailability {
    pub route_id: Uuid,
    pub active: bool,
    pub capacity: i32,
    pub occupied: i64,
    pub available: i64,
}

impl SeatAvailability {
    pub fn new(route: &Route, occupied: i64) -> Self {
        Self {
            route_id: route.id,
            active: route.active,
            capacity: route.capacity,
            occupied,
            available: (i64::from(route.capacity) - occupied).max(0),
        }
    }
}
