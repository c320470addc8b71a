//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos del núcleo de asignación de
//! asientos. Mapean exactamente al schema PostgreSQL de `migrations/`.

pub mod allocation;
pub mod principal;
pub mod route;
pub mod service_request;
pub mod student;

pub use allocation::{Allocation, AllocationChanges, AllocationStatus, NewAllocation};
pub use principal::{Principal, Role};
pub use route::{NewRoute, Route, SeatAvailability};
pub use service_request::{NewServiceRequest, RequestStatus, ResolveOutcome, ServiceRequest};
pub use student::{NewStudent, Student};
