//! Activación de rutas y cascada de desactivación
//!
//! Desactivar una ruta cancela sus servicios activos y desactiva a los
//! estudiantes que se quedan sin ningún servicio activo. Todo ocurre en una
//! sola unidad de trabajo junto con el cambio de la bandera de la ruta.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::dto::route_dto::CreateRouteRequest;
use crate::models::{Allocation, AllocationStatus, NewRoute, Route};
use crate::repositories::{EntityStore, UnitOfWork};
use crate::utils::errors::{forbidden_error, not_found_error, AppResult};

/// Resultado de `set_active`
#[derive(Debug, Clone)]
pub struct RouteToggle {
    pub route: Route,
    pub cancelled_allocations: Vec<Allocation>,
    pub deactivated_students: Vec<Uuid>,
}

impl RouteToggle {
    fn unchanged(route: Route) -> Self {
        Self {
            route,
            cancelled_allocations: Vec::new(),
            deactivated_students: Vec::new(),
        }
    }
}

pub struct RouteLifecycle<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> RouteLifecycle<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Publicar una ruta nueva, activa desde el inicio
    pub async fn create(&self, driver_id: Uuid, request: CreateRouteRequest) -> AppResult<Route> {
        request.validate()?;

        let mut tx = self.store.begin().await?;
        let route = tx
            .create_route(NewRoute {
                driver_id,
                name: request.name.trim().to_string(),
                capacity: request.capacity,
                monthly_price: request.monthly_price,
                schedule: request.schedule.unwrap_or_else(|| serde_json::json!({})),
            })
            .await?;
        tx.commit().await?;

        info!(route_id = %route.id, capacity = route.capacity, "🚌 Ruta creada");
        Ok(route)
    }

    pub async fn set_active(&self, route_id: Uuid, owner_driver_id: Uuid, active: bool) -> AppResult<RouteToggle> {
        let mut tx = self.store.begin().await?;

        let route = tx
            .lock_route(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", route_id))?;
        if !route.is_owned_by(owner_driver_id) {
            return Err(forbidden_error("change route status", "route belongs to another driver"));
        }

        if route.active == active {
            debug!(route_id = %route.id, active, "Ruta ya estaba en el estado pedido");
            return Ok(RouteToggle::unchanged(route));
        }

        if active {
            // Reactivar no restaura servicios ni estudiantes
            let route = tx.set_route_active(route_id, true).await?;
            tx.commit().await?;
            info!(route_id = %route.id, "🟢 Ruta reactivada");
            return Ok(RouteToggle::unchanged(route));
        }

        let toggle = deactivate(&mut tx, route_id).await?;
        tx.commit().await?;

        info!(
            route_id = %toggle.route.id,
            cancelled = toggle.cancelled_allocations.len(),
            students = toggle.deactivated_students.len(),
            "🔴 Ruta desactivada"
        );
        Ok(toggle)
    }
}

async fn deactivate<T: UnitOfWork>(tx: &mut T, route_id: Uuid) -> AppResult<RouteToggle> {
    let mut cancelled_allocations = Vec::new();
    let mut affected_students = BTreeSet::new();

    for allocation in tx.list_active_allocations_by_route(route_id).await? {
        let cancelled = tx
            .set_allocation_status(allocation.id, AllocationStatus::Cancelled)
            .await?;
        affected_students.insert(cancelled.student_id);
        cancelled_allocations.push(cancelled);
    }

    // Un estudiante con otro servicio activo en otra ruta sigue activo
    let mut deactivated_students = Vec::new();
    for student_id in affected_students {
        if tx.count_active_allocations_for_student(student_id).await? > 0 {
            continue;
        }
        let student = tx.set_student_active(student_id, false).await?;
        deactivated_students.push(student.id);
    }

    let route = tx.set_route_active(route_id, false).await?;

    Ok(RouteToggle {
        route,
        cancelled_allocations,
        deactivated_students,
    })
}
