//! Patch de un servicio existente
//!
//! El cuerpo llega con campos opcionales; se valida completo y se traduce a
//! un `AllocationChanges` tipado antes de tocar el almacenamiento.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::models::{AllocationChanges, AllocationStatus};
use crate::utils::errors::{validation_error, AppResult};
use crate::utils::validation::{double_option, validate_non_negative_amount};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AllocationPatch {
    /// Se recibe como texto para responder con error de validación ante
    /// valores desconocidos
    pub status: Option<String>,

    #[validate(custom = "validate_non_negative_amount")]
    pub agreed_price: Option<Decimal>,

    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl AllocationPatch {
    pub fn into_changes(self) -> AppResult<AllocationChanges> {
        self.validate()?;

        let status = match self.status.as_deref() {
            Some(raw) => Some(raw.parse::<AllocationStatus>().map_err(|_| {
                validation_error("status", "status must be one of active, pending, completed, cancelled")
            })?),
            None => None,
        };

        let changes = AllocationChanges {
            status,
            agreed_price: self.agreed_price,
            end_date: self.end_date,
            notes: self.notes,
        };

        if changes.is_empty() {
            return Err(validation_error("fields", "at least one mutable field is required"));
        }
        Ok(changes)
    }
}
