//! Modelo de Allocation ("servicio")
//!
//! Un servicio es un asiento confirmado en una ruta. Solo se crea como efecto
//! de aceptar una solicitud y nunca se borra físicamente.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del servicio - mapea al ENUM allocation_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "allocation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    Active,
    Pending,
    Completed,
    Cancelled,
}

impl AllocationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AllocationStatus::Active => "active",
            AllocationStatus::Pending => "pending",
            AllocationStatus::Completed => "completed",
            AllocationStatus::Cancelled => "cancelled",
        }
    }

    /// `completed` y `cancelled` cierran el servicio
    pub fn is_terminal(self) -> bool {
        matches!(self, AllocationStatus::Completed | AllocationStatus::Cancelled)
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAllocationStatus(pub String);

impl FromStr for AllocationStatus {
    type Err = UnknownAllocationStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(AllocationStatus::Active),
            "pending" => Ok(AllocationStatus::Pending),
            "completed" => Ok(AllocationStatus::Completed),
            "cancelled" => Ok(AllocationStatus::Cancelled),
            _ => Err(UnknownAllocationStatus(value.to_string())),
        }
    }
}

/// Servicio principal - mapea a la tabla allocations
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Allocation {
    pub id: Uuid,
    pub route_id: Uuid,
    pub guardian_id: Uuid,
    pub student_id: Uuid,
    pub agreed_price: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: AllocationStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAllocation {
    pub route_id: Uuid,
    pub guardian_id: Uuid,
    pub student_id: Uuid,
    pub agreed_price: Decimal,
    pub start_date: NaiveDate,
}

/// Cambios ya validados que se aplican sobre un servicio existente.
/// `None` significa "no tocar"; `end_date: Some(None)` borra la fecha.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationChanges {
    pub status: Option<AllocationStatus>,
    pub agreed_price: Option<Decimal>,
    pub end_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
}

impl AllocationChanges {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.agreed_price.is_none()
            && self.end_date.is_none()
            && self.notes.is_none()
    }

    /// Aplica los cambios sobre una copia en memoria
    pub fn apply_to(&self, allocation: &mut Allocation) {
        if let Some(status) = self.status {
            allocation.status = status;
        }
        if let Some(price) = self.agreed_price {
            allocation.agreed_price = price;
        }
        if let Some(end_date) = self.end_date {
            allocation.end_date = end_date;
        }
        if let Some(notes) = &self.notes {
            allocation.notes = Some(notes.clone());
        }
    }
}
