//! Asignador de cupos
//!
//! Decide si una ruta admite un servicio más y lo crea. El conteo y la
//! inserción ocurren con el candado de la ruta tomado, dentro de la misma
//! unidad de trabajo; nunca se reutilizan conteos entre llamadas.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{Allocation, NewAllocation, Route, SeatAvailability};
use crate::repositories::{EntityStore, UnitOfWork};
use crate::utils::errors::{not_found_error, AppError, AppResult};

/// Datos del asiento a conceder
#[derive(Debug, Clone)]
pub struct SeatGrant {
    pub route_id: Uuid,
    pub guardian_id: Uuid,
    pub student_id: Uuid,
    pub agreed_price: Decimal,
    pub start_date: NaiveDate,
}

/// Falla con `Capacity` si la ruta ya no tiene asientos libres.
/// Requiere que el llamador ya tenga el candado de la ruta.
pub async fn ensure_free_seat<T: UnitOfWork>(tx: &mut T, route: &Route) -> AppResult<i64> {
    let occupied = tx.count_active_allocations(route.id).await?;
    if occupied >= i64::from(route.capacity) {
        debug!(route_id = %route.id, occupied, capacity = route.capacity, "🚫 Ruta sin cupo");
        return Err(AppError::Capacity {
            route_id: route.id,
            capacity: route.capacity,
        });
    }
    Ok(occupied)
}

/// Chequeo y creación dentro de una unidad de trabajo ya abierta
pub async fn allocate_seat<T: UnitOfWork>(tx: &mut T, grant: SeatGrant) -> AppResult<Allocation> {
    let route = tx
        .lock_route(grant.route_id)
        .await?
        .filter(|route| route.active)
        .ok_or_else(|| not_found_error("Active route", grant.route_id))?;

    let occupied = ensure_free_seat(tx, &route).await?;

    let allocation = tx
        .create_allocation(NewAllocation {
            route_id: grant.route_id,
            guardian_id: grant.guardian_id,
            student_id: grant.student_id,
            agreed_price: grant.agreed_price,
            start_date: grant.start_date,
        })
        .await?;

    info!(
        route_id = %route.id,
        allocation_id = %allocation.id,
        seat = occupied + 1,
        capacity = route.capacity,
        "💺 Asiento asignado"
    );
    Ok(allocation)
}

pub struct CapacityAllocator<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> CapacityAllocator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Crea un servicio `active` o falla sin escribir nada
    pub async fn try_allocate(&self, grant: SeatGrant) -> AppResult<Allocation> {
        let mut tx = self.store.begin().await?;
        let allocation = allocate_seat(&mut tx, grant).await?;
        tx.commit().await?;
        Ok(allocation)
    }

    pub async fn availability(&self, route_id: Uuid) -> AppResult<SeatAvailability> {
        let mut tx = self.store.begin().await?;
        let route = tx
            .get_route(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", route_id))?;
        let occupied = tx.count_active_allocations(route_id).await?;
        Ok(SeatAvailability::new(&route, occupied))
    }
}
