//! Services module
//!
//! Este módulo contiene la lógica de negocio del núcleo: solicitudes,
//! asignación de cupos, ciclo de vida de rutas y edición de servicios.
//! Cada servicio recibe el almacenamiento inyectado en su constructor.

pub mod allocation_guard;
pub mod capacity_allocator;
pub mod request_service;
pub mod route_lifecycle;
pub mod student_service;

#[cfg(test)]
mod test_support;

pub use allocation_guard::AllocationGuard;
pub use capacity_allocator::{CapacityAllocator, SeatGrant};
pub use request_service::RequestService;
pub use route_lifecycle::{RouteLifecycle, RouteToggle};
pub use student_service::StudentService;
