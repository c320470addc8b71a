//! DTOs de entrada y salida de la API

pub mod allocation_dto;
pub mod common_dto;
pub mod request_dto;
pub mod route_dto;
pub mod student_dto;

pub use common_dto::ApiResponse;
