//! Repositorios
//!
//! Acceso a Route, Student, ServiceRequest y Allocation detrás de un trait,
//! para que los servicios reciban el almacenamiento inyectado y cada
//! operación se ejecute como una sola unidad de trabajo.
//!
//! Reglas de una unidad de trabajo:
//! - `commit` publica todos los cambios juntos.
//! - Soltarla sin `commit` descarta todo (rollback).
//! - `lock_route` toma el candado exclusivo de la ruta hasta el final; se
//!   pide antes que cualquier otra fila para mantener un orden de candados.
//! - Los `get_*` nunca bloquean filas. Sirven para ubicar la ruta de una
//!   solicitud o servicio antes de pedir su candado.
//! - `lock_student` va después del candado de la ruta, si lo hay.

pub mod memory_store;
pub mod pg_store;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Allocation, AllocationChanges, AllocationStatus, NewAllocation, NewRoute, NewServiceRequest,
    NewStudent, RequestStatus, Route, ServiceRequest, Student,
};
use crate::utils::errors::AppResult;

pub use memory_store::MemoryStore;
pub use pg_store::PgStore;

/// Fuente de unidades de trabajo
#[async_trait]
pub trait EntityStore: Send + Sync + 'static {
    type Tx: UnitOfWork;

    async fn begin(&self) -> AppResult<Self::Tx>;
}

/// Una transacción abierta sobre el almacenamiento
#[async_trait]
pub trait UnitOfWork: Send {
    // Rutas
    async fn create_route(&mut self, route: NewRoute) -> AppResult<Route>;
    async fn get_route(&mut self, route_id: Uuid) -> AppResult<Option<Route>>;
    async fn lock_route(&mut self, route_id: Uuid) -> AppResult<Option<Route>>;
    async fn set_route_active(&mut self, route_id: Uuid, active: bool) -> AppResult<Route>;

    // Estudiantes
    async fn create_student(&mut self, student: NewStudent) -> AppResult<Student>;
    async fn get_student(&mut self, student_id: Uuid) -> AppResult<Option<Student>>;
    async fn lock_student(&mut self, student_id: Uuid) -> AppResult<Option<Student>>;
    async fn set_student_active(&mut self, student_id: Uuid, active: bool) -> AppResult<Student>;

    // Servicios
    async fn count_active_allocations(&mut self, route_id: Uuid) -> AppResult<i64>;
    async fn count_active_allocations_for_student(&mut self, student_id: Uuid) -> AppResult<i64>;
    /// Servicios `active` o `pending` del estudiante
    async fn count_open_allocations_for_student(&mut self, student_id: Uuid) -> AppResult<i64>;
    async fn list_active_allocations_by_route(&mut self, route_id: Uuid) -> AppResult<Vec<Allocation>>;
    async fn create_allocation(&mut self, allocation: NewAllocation) -> AppResult<Allocation>;
    async fn get_allocation(&mut self, allocation_id: Uuid) -> AppResult<Option<Allocation>>;
    async fn set_allocation_status(
        &mut self,
        allocation_id: Uuid,
        status: AllocationStatus,
    ) -> AppResult<Allocation>;
    async fn update_allocation(
        &mut self,
        allocation_id: Uuid,
        changes: &AllocationChanges,
    ) -> AppResult<Allocation>;

    // Solicitudes
    async fn create_request(&mut self, request: NewServiceRequest) -> AppResult<ServiceRequest>;
    async fn get_request(&mut self, request_id: Uuid) -> AppResult<Option<ServiceRequest>>;
    async fn get_pending_request(
        &mut self,
        route_id: Uuid,
        guardian_id: Uuid,
        student_id: Uuid,
    ) -> AppResult<Option<ServiceRequest>>;
    async fn list_pending_requests_by_route(&mut self, route_id: Uuid) -> AppResult<Vec<ServiceRequest>>;
    async fn set_request_resolution(
        &mut self,
        request_id: Uuid,
        status: RequestStatus,
        driver_response: Option<String>,
    ) -> AppResult<ServiceRequest>;

    async fn commit(self) -> AppResult<()>;
}
