use serde::Deserialize;
use validator::Validate;

// Request para registrar un estudiante
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterStudentRequest {
    #[validate(length(min = 2, max = 120))]
    pub full_name: String,
}
