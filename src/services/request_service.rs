//! Ciclo de vida de las solicitudes
//!
//! `pending` → `accepted` | `rejected`. La aceptación y la creación del
//! servicio se confirman en la misma unidad de trabajo: si no hay cupo la
//! solicitud sigue `pending`.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{NewServiceRequest, RequestStatus, ResolveOutcome, ServiceRequest};
use crate::repositories::{EntityStore, UnitOfWork};
use crate::services::capacity_allocator::{allocate_seat, SeatGrant};
use crate::utils::errors::{forbidden_error, not_found_error, AppError, AppResult};

pub struct RequestService<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> RequestService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Crear una solicitud `pending` para el estudiante del apoderado
    pub async fn submit(
        &self,
        route_id: Uuid,
        guardian_id: Uuid,
        student_id: Uuid,
        message: Option<String>,
    ) -> AppResult<ServiceRequest> {
        let mut tx = self.store.begin().await?;

        // El candado de la ruta serializa envíos concurrentes del mismo trío
        let route = tx
            .lock_route(route_id)
            .await?
            .filter(|route| route.active)
            .ok_or_else(|| not_found_error("Active route", route_id))?;

        let student = tx
            .get_student(student_id)
            .await?
            .filter(|student| student.active)
            .ok_or_else(|| not_found_error("Student", student_id))?;
        if student.guardian_id != guardian_id {
            return Err(forbidden_error("submit request", "student belongs to another guardian"));
        }

        if let Some(existing) = tx.get_pending_request(route.id, guardian_id, student_id).await? {
            return Err(AppError::Duplicate(format!(
                "Request {} is still pending for this route and student",
                existing.id
            )));
        }

        let request = tx
            .create_request(NewServiceRequest {
                route_id: route.id,
                guardian_id,
                student_id,
                message: message.filter(|m| !m.trim().is_empty()),
            })
            .await?;
        tx.commit().await?;

        info!(request_id = %request.id, route_id = %route.id, "📨 Solicitud recibida");
        Ok(request)
    }

    /// Resolver una solicitud pendiente. Solo el dueño de la ruta puede hacerlo.
    pub async fn resolve(
        &self,
        request_id: Uuid,
        resolver_driver_id: Uuid,
        outcome: ResolveOutcome,
        response_text: Option<String>,
    ) -> AppResult<ServiceRequest> {
        let mut tx = self.store.begin().await?;

        // Primero la ruta, después la fila de la solicitud
        let route_id = tx
            .get_request(request_id)
            .await?
            .map(|request| request.route_id)
            .ok_or_else(|| not_found_error("Request", request_id))?;
        let route = tx
            .lock_route(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", route_id))?;

        if !route.is_owned_by(resolver_driver_id) {
            return Err(forbidden_error("resolve request", "route belongs to another driver"));
        }

        let request = tx
            .get_request(request_id)
            .await?
            .ok_or_else(|| not_found_error("Request", request_id))?;
        if request.status.is_terminal() {
            warn!(request_id = %request.id, status = ?request.status, "⚠️ Solicitud ya resuelta");
            return Err(not_found_error("Pending request", request_id));
        }

        if outcome == ResolveOutcome::Accepted {
            // El apoderado pudo dar de baja al estudiante mientras esperaba
            tx.lock_student(request.student_id)
                .await?
                .filter(|student| student.active)
                .ok_or_else(|| not_found_error("Active student", request.student_id))?;

            allocate_seat(
                &mut tx,
                SeatGrant {
                    route_id: route.id,
                    guardian_id: request.guardian_id,
                    student_id: request.student_id,
                    agreed_price: route.monthly_price,
                    start_date: Utc::now().date_naive(),
                },
            )
            .await?;
        }

        let resolved = tx
            .set_request_resolution(request.id, RequestStatus::from(outcome), response_text)
            .await?;
        tx.commit().await?;

        info!(request_id = %resolved.id, status = ?resolved.status, "✅ Solicitud resuelta");
        Ok(resolved)
    }

    /// Bandeja de solicitudes pendientes de una ruta
    pub async fn pending_for_route(&self, route_id: Uuid, driver_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        let mut tx = self.store.begin().await?;
        let route = tx
            .get_route(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", route_id))?;
        if !route.is_owned_by(driver_id) {
            return Err(forbidden_error("list requests", "route belongs to another driver"));
        }
        tx.list_pending_requests_by_route(route_id).await
    }
}
