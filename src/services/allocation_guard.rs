//! Ediciones posteriores de un servicio
//!
//! Autoriza al apoderado del servicio o al conductor de su ruta y aplica el
//! patch ya validado. Las reglas de transición y la revalidación de cupo
//! dependen de `AllocationPolicy`.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{AllocationPolicy, TransitionPolicy};
use crate::dto::allocation_dto::AllocationPatch;
use crate::models::{Allocation, AllocationChanges, AllocationStatus, Principal, Role, Route};
use crate::repositories::{EntityStore, UnitOfWork};
use crate::services::capacity_allocator::ensure_free_seat;
use crate::utils::errors::{forbidden_error, not_found_error, validation_error, AppResult};
use crate::utils::validation::validate_date_order;

pub struct AllocationGuard<S: EntityStore> {
    store: Arc<S>,
    policy: AllocationPolicy,
}

impl<S: EntityStore> AllocationGuard<S> {
    pub fn new(store: Arc<S>, policy: AllocationPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn update(&self, allocation_id: Uuid, caller: Principal, patch: AllocationPatch) -> AppResult<Allocation> {
        let changes = patch.into_changes()?;

        let mut tx = self.store.begin().await?;

        // Candado de la ruta antes que la fila del servicio
        let route_id = tx
            .get_allocation(allocation_id)
            .await?
            .map(|allocation| allocation.route_id)
            .ok_or_else(|| not_found_error("Allocation", allocation_id))?;
        let route = tx
            .lock_route(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", route_id))?;
        let current = tx
            .get_allocation(allocation_id)
            .await?
            .ok_or_else(|| not_found_error("Allocation", allocation_id))?;

        authorize(&caller, &current, &route)?;
        self.check_transition(&current, &changes)?;

        if let Some(Some(end_date)) = changes.end_date {
            validate_date_order(current.start_date, end_date)
                .map_err(|_| validation_error("end_date", "end date cannot precede the start date"))?;
        }

        if changes.status == Some(AllocationStatus::Active) && current.status != AllocationStatus::Active {
            if self.policy.recheck_capacity_on_reactivation {
                ensure_free_seat(&mut tx, &route).await?;
            } else {
                warn!(
                    allocation_id = %current.id,
                    route_id = %route.id,
                    from = %current.status,
                    "⚠️ Servicio reactivado sin revalidar cupo"
                );
            }
        }

        let updated = tx.update_allocation(allocation_id, &changes).await?;
        tx.commit().await?;

        info!(
            allocation_id = %updated.id,
            caller = %caller.id,
            role = %caller.role,
            status = %updated.status,
            "✏️ Servicio actualizado"
        );
        Ok(updated)
    }

    fn check_transition(&self, current: &Allocation, changes: &AllocationChanges) -> AppResult<()> {
        let Some(next) = changes.status else {
            return Ok(());
        };
        match self.policy.transitions {
            TransitionPolicy::Permissive => Ok(()),
            TransitionPolicy::Strict if current.status.is_terminal() && next != current.status => Err(
                validation_error("status", "completed or cancelled allocations cannot change status"),
            ),
            TransitionPolicy::Strict => Ok(()),
        }
    }
}

fn authorize(caller: &Principal, allocation: &Allocation, route: &Route) -> AppResult<()> {
    let allowed = match caller.role {
        Role::Guardian => allocation.guardian_id == caller.id,
        Role::Driver => route.is_owned_by(caller.id),
    };
    if !allowed {
        return Err(forbidden_error("update allocation", "caller is not a party to this allocation"));
    }
    Ok(())
}
