//! Repositorio en memoria
//!
//! Usado por los tests y por el modo local sin `DATABASE_URL`. Todas las
//! unidades de trabajo se serializan con un único mutex asíncrono y los
//! cambios se aplican sobre una copia que solo se publica en `commit`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{EntityStore, UnitOfWork};
use crate::models::{
    Allocation, AllocationChanges, AllocationStatus, NewAllocation, NewRoute, NewServiceRequest,
    NewStudent, RequestStatus, Route, ServiceRequest, Student,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

const UNLIMITED: usize = usize::MAX;

#[derive(Debug, Clone, Default)]
struct Tables {
    routes: HashMap<Uuid, Route>,
    students: HashMap<Uuid, Student>,
    requests: HashMap<Uuid, ServiceRequest>,
    allocations: HashMap<Uuid, Allocation>,
}

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    /// Escrituras que quedan antes de simular una falla del almacenamiento
    write_budget: Arc<AtomicUsize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            write_budget: Arc::new(AtomicUsize::new(UNLIMITED)),
        }
    }

    /// Hace fallar la escritura número `writes + 1` a partir de ahora
    pub fn fail_after_writes(&self, writes: usize) {
        self.write_budget.store(writes, Ordering::SeqCst);
    }

    pub fn clear_failures(&self) {
        self.write_budget.store(UNLIMITED, Ordering::SeqCst);
    }

    /// Copia de todos los servicios de una ruta, fuera de cualquier transacción
    pub async fn allocations_for_route(&self, route_id: Uuid) -> Vec<Allocation> {
        let tables = self.tables.lock().await;
        let mut allocations: Vec<Allocation> = tables
            .allocations
            .values()
            .filter(|a| a.route_id == route_id)
            .cloned()
            .collect();
        allocations.sort_by_key(|a| a.created_at);
        allocations
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    type Tx = MemoryUnitOfWork;

    async fn begin(&self) -> AppResult<MemoryUnitOfWork> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryUnitOfWork {
            guard,
            working,
            write_budget: Arc::clone(&self.write_budget),
        })
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    write_budget: Arc<AtomicUsize>,
}

impl MemoryUnitOfWork {
    fn charge_write(&self, operation: &str) -> AppResult<()> {
        let previous = self
            .write_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                UNLIMITED => Some(UNLIMITED),
                n => Some(n.saturating_sub(1)),
            })
            .unwrap_or_else(|left| left);

        if previous == 0 {
            return Err(AppError::Store(format!("injected failure during {}", operation)));
        }
        Ok(())
    }

    fn count_allocations<F>(&self, predicate: F) -> i64
    where
        F: Fn(&Allocation) -> bool,
    {
        self.working.allocations.values().filter(|a| predicate(a)).count() as i64
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn create_route(&mut self, route: NewRoute) -> AppResult<Route> {
        self.charge_write("create_route")?;
        let route = Route {
            id: Uuid::new_v4(),
            driver_id: route.driver_id,
            name: route.name,
            capacity: route.capacity,
            active: true,
            monthly_price: route.monthly_price,
            schedule: route.schedule,
            created_at: Utc::now(),
        };
        self.working.routes.insert(route.id, route.clone());
        Ok(route)
    }

    async fn get_route(&mut self, route_id: Uuid) -> AppResult<Option<Route>> {
        Ok(self.working.routes.get(&route_id).cloned())
    }

    async fn lock_route(&mut self, route_id: Uuid) -> AppResult<Option<Route>> {
        // El mutex del store ya es exclusivo para toda la unidad de trabajo
        Ok(self.working.routes.get(&route_id).cloned())
    }

    async fn set_route_active(&mut self, route_id: Uuid, active: bool) -> AppResult<Route> {
        self.charge_write("set_route_active")?;
        let route = self
            .working
            .routes
            .get_mut(&route_id)
            .ok_or_else(|| not_found_error("Route", route_id))?;
        route.active = active;
        Ok(route.clone())
    }

    async fn create_student(&mut self, student: NewStudent) -> AppResult<Student> {
        self.charge_write("create_student")?;
        let student = Student {
            id: Uuid::new_v4(),
            guardian_id: student.guardian_id,
            full_name: student.full_name,
            active: true,
            created_at: Utc::now(),
        };
        self.working.students.insert(student.id, student.clone());
        Ok(student)
    }

    async fn get_student(&mut self, student_id: Uuid) -> AppResult<Option<Student>> {
        Ok(self.working.students.get(&student_id).cloned())
    }

    async fn lock_student(&mut self, student_id: Uuid) -> AppResult<Option<Student>> {
        self.get_student(student_id).await
    }

    async fn set_student_active(&mut self, student_id: Uuid, active: bool) -> AppResult<Student> {
        self.charge_write("set_student_active")?;
        let student = self
            .working
            .students
            .get_mut(&student_id)
            .ok_or_else(|| not_found_error("Student", student_id))?;
        student.active = active;
        Ok(student.clone())
    }

    async fn count_active_allocations(&mut self, route_id: Uuid) -> AppResult<i64> {
        Ok(self.count_allocations(|a| {
            a.route_id == route_id && a.status == AllocationStatus::Active
        }))
    }

    async fn count_active_allocations_for_student(&mut self, student_id: Uuid) -> AppResult<i64> {
        Ok(self.count_allocations(|a| {
            a.student_id == student_id && a.status == AllocationStatus::Active
        }))
    }

    async fn count_open_allocations_for_student(&mut self, student_id: Uuid) -> AppResult<i64> {
        Ok(self.count_allocations(|a| a.student_id == student_id && !a.status.is_terminal()))
    }

    async fn list_active_allocations_by_route(&mut self, route_id: Uuid) -> AppResult<Vec<Allocation>> {
        let mut allocations: Vec<Allocation> = self
            .working
            .allocations
            .values()
            .filter(|a| a.route_id == route_id && a.status == AllocationStatus::Active)
            .cloned()
            .collect();
        allocations.sort_by_key(|a| a.created_at);
        Ok(allocations)
    }

    async fn create_allocation(&mut self, allocation: NewAllocation) -> AppResult<Allocation> {
        self.charge_write("create_allocation")?;
        let now = Utc::now();
        let allocation = Allocation {
            id: Uuid::new_v4(),
            route_id: allocation.route_id,
            guardian_id: allocation.guardian_id,
            student_id: allocation.student_id,
            agreed_price: allocation.agreed_price,
            start_date: allocation.start_date,
            end_date: None,
            status: AllocationStatus::Active,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.working.allocations.insert(allocation.id, allocation.clone());
        Ok(allocation)
    }

    async fn get_allocation(&mut self, allocation_id: Uuid) -> AppResult<Option<Allocation>> {
        Ok(self.working.allocations.get(&allocation_id).cloned())
    }

    async fn set_allocation_status(
        &mut self,
        allocation_id: Uuid,
        status: AllocationStatus,
    ) -> AppResult<Allocation> {
        self.charge_write("set_allocation_status")?;
        let allocation = self
            .working
            .allocations
            .get_mut(&allocation_id)
            .ok_or_else(|| not_found_error("Allocation", allocation_id))?;
        allocation.status = status;
        allocation.updated_at = Utc::now();
        Ok(allocation.clone())
    }

    async fn update_allocation(
        &mut self,
        allocation_id: Uuid,
        changes: &AllocationChanges,
    ) -> AppResult<Allocation> {
        self.charge_write("update_allocation")?;
        let allocation = self
            .working
            .allocations
            .get_mut(&allocation_id)
            .ok_or_else(|| not_found_error("Allocation", allocation_id))?;
        changes.apply_to(allocation);
        allocation.updated_at = Utc::now();
        Ok(allocation.clone())
    }

    async fn create_request(&mut self, request: NewServiceRequest) -> AppResult<ServiceRequest> {
        self.charge_write("create_request")?;
        let duplicate = self.working.requests.values().any(|r| {
            r.status == RequestStatus::Pending
                && r.route_id == request.route_id
                && r.guardian_id == request.guardian_id
                && r.student_id == request.student_id
        });
        if duplicate {
            return Err(AppError::Duplicate(
                "A pending request already exists for this route and student".to_string(),
            ));
        }

        let request = ServiceRequest {
            id: Uuid::new_v4(),
            route_id: request.route_id,
            guardian_id: request.guardian_id,
            student_id: request.student_id,
            message: request.message,
            status: RequestStatus::Pending,
            submitted_at: Utc::now(),
            resolved_at: None,
            driver_response: None,
        };
        self.working.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get_request(&mut self, request_id: Uuid) -> AppResult<Option<ServiceRequest>> {
        Ok(self.working.requests.get(&request_id).cloned())
    }

    async fn get_pending_request(
        &mut self,
        route_id: Uuid,
        guardian_id: Uuid,
        student_id: Uuid,
    ) -> AppResult<Option<ServiceRequest>> {
        Ok(self
            .working
            .requests
            .values()
            .find(|r| {
                r.status == RequestStatus::Pending
                    && r.route_id == route_id
                    && r.guardian_id == guardian_id
                    && r.student_id == student_id
            })
            .cloned())
    }

    async fn list_pending_requests_by_route(&mut self, route_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        let mut requests: Vec<ServiceRequest> = self
            .working
            .requests
            .values()
            .filter(|r| r.route_id == route_id && r.status == RequestStatus::Pending)
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.submitted_at);
        Ok(requests)
    }

    async fn set_request_resolution(
        &mut self,
        request_id: Uuid,
        status: RequestStatus,
        driver_response: Option<String>,
    ) -> AppResult<ServiceRequest> {
        self.charge_write("set_request_resolution")?;
        let request = self
            .working
            .requests
            .get_mut(&request_id)
            .filter(|r| r.status == RequestStatus::Pending)
            .ok_or_else(|| not_found_error("Pending request", request_id))?;
        request.status = status;
        request.driver_response = driver_response;
        request.resolved_at = Some(Utc::now());
        Ok(request.clone())
    }

    async fn commit(mut self) -> AppResult<()> {
        *self.guard = std::mem::take(&mut self.working);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn new_route(driver_id: Uuid) -> NewRoute {
        NewRoute {
            driver_id,
            name: "Ruta Norte".to_string(),
            capacity: 2,
            monthly_price: Decimal::new(45_000, 0),
            schedule: serde_json::json!({ "departure": "07:15" }),
        }
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_discards_changes() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let route = tx.create_route(new_route(Uuid::new_v4())).await.unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.get_route(route.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let route = tx.create_route(new_route(Uuid::new_v4())).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.get_route(route.id).await.unwrap(), Some(route));
    }

    #[tokio::test]
    async fn test_injected_failure_hits_the_configured_write() {
        let store = MemoryStore::new();
        store.fail_after_writes(1);

        let mut tx = store.begin().await.unwrap();
        tx.create_route(new_route(Uuid::new_v4())).await.unwrap();
        let error = tx.create_route(new_route(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(error, AppError::Store(_)));

        store.clear_failures();
        assert!(tx.create_route(new_route(Uuid::new_v4())).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_pending_request_is_a_duplicate() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let new_request = NewServiceRequest {
            route_id: Uuid::new_v4(),
            guardian_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            message: None,
        };
        tx.create_request(new_request.clone()).await.unwrap();
        let error = tx.create_request(new_request).await.unwrap_err();
        assert!(matches!(error, AppError::Duplicate(_)));
    }
}
