//! Repositorio PostgreSQL
//!
//! Cada unidad de trabajo es una transacción de sqlx. El candado por ruta es
//! `SELECT ... FOR UPDATE` sobre la fila de la ruta. Los `get_*` son lecturas
//! simples: ninguna fila se bloquea antes que la ruta.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{EntityStore, UnitOfWork};
use crate::models::{
    Allocation, AllocationChanges, AllocationStatus, NewAllocation, NewRoute, NewServiceRequest,
    NewStudent, RequestStatus, Route, ServiceRequest, Student,
};
use crate::utils::errors::{not_found_error, AppError, AppResult};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> AppResult<PgUnitOfWork> {
        let tx = self.pool.begin().await?;
        Ok(PgUnitOfWork { tx })
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn create_route(&mut self, route: NewRoute) -> AppResult<Route> {
        let route = sqlx::query_as::<_, Route>(
            r#"
            INSERT INTO routes (id, driver_id, name, capacity, active, monthly_price, schedule, created_at)
            VALUES ($1, $2, $3, $4, TRUE, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(route.driver_id)
        .bind(route.name)
        .bind(route.capacity)
        .bind(route.monthly_price)
        .bind(route.schedule)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(route)
    }

    async fn get_route(&mut self, route_id: Uuid) -> AppResult<Option<Route>> {
        let route = sqlx::query_as::<_, Route>("SELECT * FROM routes WHERE id = $1")
            .bind(route_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(route)
    }

    async fn lock_route(&mut self, route_id: Uuid) -> AppResult<Option<Route>> {
        let route = sqlx::query_as::<_, Route>("SELECT * FROM routes WHERE id = $1 FOR UPDATE")
            .bind(route_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(route)
    }

    async fn set_route_active(&mut self, route_id: Uuid, active: bool) -> AppResult<Route> {
        sqlx::query_as::<_, Route>("UPDATE routes SET active = $2 WHERE id = $1 RETURNING *")
            .bind(route_id)
            .bind(active)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| not_found_error("Route", route_id))
    }

    async fn create_student(&mut self, student: NewStudent) -> AppResult<Student> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (id, guardian_id, full_name, active, created_at)
            VALUES ($1, $2, $3, TRUE, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student.guardian_id)
        .bind(student.full_name)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(student)
    }

    async fn get_student(&mut self, student_id: Uuid) -> AppResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(student_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(student)
    }

    async fn lock_student(&mut self, student_id: Uuid) -> AppResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1 FOR UPDATE")
            .bind(student_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(student)
    }

    async fn set_student_active(&mut self, student_id: Uuid, active: bool) -> AppResult<Student> {
        sqlx::query_as::<_, Student>("UPDATE students SET active = $2 WHERE id = $1 RETURNING *")
            .bind(student_id)
            .bind(active)
            .fetch_optional(&mut *self.tx)
            .await?
            .ok_or_else(|| not_found_error("Student", student_id))
    }

    async fn count_active_allocations(&mut self, route_id: Uuid) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM allocations WHERE route_id = $1 AND status = 'active'",
        )
        .bind(route_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn count_active_allocations_for_student(&mut self, student_id: Uuid) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM allocations WHERE student_id = $1 AND status = 'active'",
        )
        .bind(student_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn count_open_allocations_for_student(&mut self, student_id: Uuid) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM allocations WHERE student_id = $1 AND status IN ('active', 'pending')",
        )
        .bind(student_id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(count)
    }

    async fn list_active_allocations_by_route(&mut self, route_id: Uuid) -> AppResult<Vec<Allocation>> {
        let allocations = sqlx::query_as::<_, Allocation>(
            r#"
            SELECT * FROM allocations
            WHERE route_id = $1 AND status = 'active'
            ORDER BY created_at
            FOR UPDATE
            "#,
        )
        .bind(route_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(allocations)
    }

    async fn create_allocation(&mut self, allocation: NewAllocation) -> AppResult<Allocation> {
        let now = Utc::now();
        let allocation = sqlx::query_as::<_, Allocation>(
            r#"
            INSERT INTO allocations (
                id, route_id, guardian_id, student_id, agreed_price,
                start_date, end_date, status, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NULL, 'active', NULL, $7, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(allocation.route_id)
        .bind(allocation.guardian_id)
        .bind(allocation.student_id)
        .bind(allocation.agreed_price)
        .bind(allocation.start_date)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(allocation)
    }

    async fn get_allocation(&mut self, allocation_id: Uuid) -> AppResult<Option<Allocation>> {
        let allocation = sqlx::query_as::<_, Allocation>("SELECT * FROM allocations WHERE id = $1")
            .bind(allocation_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(allocation)
    }

    async fn set_allocation_status(
        &mut self,
        allocation_id: Uuid,
        status: AllocationStatus,
    ) -> AppResult<Allocation> {
        sqlx::query_as::<_, Allocation>(
            "UPDATE allocations SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(allocation_id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| not_found_error("Allocation", allocation_id))
    }

    async fn update_allocation(
        &mut self,
        allocation_id: Uuid,
        changes: &AllocationChanges,
    ) -> AppResult<Allocation> {
        // Sentencia fija: cada columna se conserva con COALESCE cuando no cambia
        sqlx::query_as::<_, Allocation>(
            r#"
            UPDATE allocations
            SET status = COALESCE($2, status),
                agreed_price = COALESCE($3, agreed_price),
                end_date = CASE WHEN $4 THEN $5 ELSE end_date END,
                notes = COALESCE($6, notes),
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(allocation_id)
        .bind(changes.status)
        .bind(changes.agreed_price)
        .bind(changes.end_date.is_some())
        .bind(changes.end_date.flatten())
        .bind(changes.notes.as_deref())
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| not_found_error("Allocation", allocation_id))
    }

    async fn create_request(&mut self, request: NewServiceRequest) -> AppResult<ServiceRequest> {
        let result = sqlx::query_as::<_, ServiceRequest>(
            r#"
            INSERT INTO service_requests (
                id, route_id, guardian_id, student_id, message, status, submitted_at
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.route_id)
        .bind(request.guardian_id)
        .bind(request.student_id)
        .bind(request.message)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await;

        match result {
            Ok(request) => Ok(request),
            // El índice único parcial sobre solicitudes pendientes
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AppError::Duplicate(
                "A pending request already exists for this route and student".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_request(&mut self, request_id: Uuid) -> AppResult<Option<ServiceRequest>> {
        let request = sqlx::query_as::<_, ServiceRequest>("SELECT * FROM service_requests WHERE id = $1")
            .bind(request_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(request)
    }

    async fn get_pending_request(
        &mut self,
        route_id: Uuid,
        guardian_id: Uuid,
        student_id: Uuid,
    ) -> AppResult<Option<ServiceRequest>> {
        let request = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT * FROM service_requests
            WHERE route_id = $1 AND guardian_id = $2 AND student_id = $3 AND status = 'pending'
            "#,
        )
        .bind(route_id)
        .bind(guardian_id)
        .bind(student_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(request)
    }

    async fn list_pending_requests_by_route(&mut self, route_id: Uuid) -> AppResult<Vec<ServiceRequest>> {
        let requests = sqlx::query_as::<_, ServiceRequest>(
            r#"
            SELECT * FROM service_requests
            WHERE route_id = $1 AND status = 'pending'
            ORDER BY submitted_at
            "#,
        )
        .bind(route_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(requests)
    }

    async fn set_request_resolution(
        &mut self,
        request_id: Uuid,
        status: RequestStatus,
        driver_response: Option<String>,
    ) -> AppResult<ServiceRequest> {
        sqlx::query_as::<_, ServiceRequest>(
            r#"
            UPDATE service_requests
            SET status = $2, driver_response = $3, resolved_at = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(request_id)
        .bind(status)
        .bind(driver_response)
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| not_found_error("Pending request", request_id))
    }

    async fn commit(self) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
