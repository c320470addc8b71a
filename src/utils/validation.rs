//! Utilidades de validación
//!
//! Validadores custom para `validator` y chequeos que dependen de más de un
//! campo.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Validar que un monto no sea negativo
pub fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// El horario de una ruta es un objeto JSON libre
pub fn validate_schedule(value: &serde_json::Value) -> Result<(), ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::new("schedule_object"));
    }
    Ok(())
}

/// Validar que la fecha de término no sea anterior a la de inicio
pub fn validate_date_order(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if end < start {
        let mut error = ValidationError::new("date_order");
        error.add_param("start".into(), &start.to_string());
        error.add_param("end".into(), &end.to_string());
        return Err(error);
    }
    Ok(())
}

/// Distingue un campo ausente (`None`) de un `null` explícito (`Some(None)`)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_negative_amount() {
        assert!(validate_non_negative_amount(&Decimal::new(0, 0)).is_ok());
        assert!(validate_non_negative_amount(&Decimal::new(35_000, 0)).is_ok());
        assert!(validate_non_negative_amount(&Decimal::new(-1, 2)).is_err());
    }

    #[test]
    fn test_schedule_must_be_object() {
        assert!(validate_schedule(&serde_json::json!({ "days": ["mon", "fri"] })).is_ok());
        assert!(validate_schedule(&serde_json::json!("07:00")).is_err());
    }

    #[test]
    fn test_date_order() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
        assert!(validate_date_order(start, start).is_ok());
        assert!(validate_date_order(start, end).is_err());
    }
}
