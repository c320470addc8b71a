//! Tests contra PostgreSQL
//!
//! Usan `TEST_DATABASE_URL` (o `DATABASE_URL`). Sin ninguna de las dos se
//! omiten. Cada test crea sus propias rutas y estudiantes, así que pueden
//! compartir la misma base.

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use school_transport::config::database::DatabaseConfig;
use school_transport::config::AllocationPolicy;
use school_transport::database::DatabaseConnection;
use school_transport::dto::allocation_dto::AllocationPatch;
use school_transport::models::{
    AllocationStatus, NewRoute, NewServiceRequest, NewStudent, Principal, RequestStatus, ResolveOutcome, Route,
    Student,
};
use school_transport::repositories::{EntityStore, PgStore, UnitOfWork};
use school_transport::services::{
    AllocationGuard, CapacityAllocator, RequestService, RouteLifecycle, SeatGrant, StudentService,
};
use school_transport::utils::errors::AppError;
use uuid::Uuid;

async fn pg_store() -> Option<Arc<PgStore>> {
    dotenvy::dotenv().ok();
    let url = match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("⏭️  TEST_DATABASE_URL no definida, se omite el test de PostgreSQL");
            return None;
        }
    };
    let connection = DatabaseConnection::connect(&DatabaseConfig::new(url)).await.unwrap();
    Some(Arc::new(PgStore::new(connection.pool().clone())))
}

async fn seed_route(store: &PgStore, driver_id: Uuid, capacity: i32) -> Route {
    let mut tx = store.begin().await.unwrap();
    let route = tx
        .create_route(NewRoute {
            driver_id,
            name: "Ruta Colegio Los Robles".to_string(),
            capacity,
            monthly_price: Decimal::new(45_000, 0),
            schedule: serde_json::json!({ "departure": "07:05" }),
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    route
}

async fn seed_students(store: &PgStore, guardian_id: Uuid, count: usize) -> Vec<Student> {
    let mut tx = store.begin().await.unwrap();
    let mut students = Vec::with_capacity(count);
    for n in 0..count {
        let student = tx
            .create_student(NewStudent {
                guardian_id,
                full_name: format!("Estudiante {}", n + 1),
            })
            .await
            .unwrap();
        students.push(student);
    }
    tx.commit().await.unwrap();
    students
}

fn grant(route: &Route, guardian_id: Uuid, student_id: Uuid) -> SeatGrant {
    SeatGrant {
        route_id: route.id,
        guardian_id,
        student_id,
        agreed_price: route.monthly_price,
        start_date: Utc::now().date_naive(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pg_concurrent_allocations_never_exceed_capacity() {
    let Some(store) = pg_store().await else { return };
    let route = seed_route(&store, Uuid::new_v4(), 3).await;
    let guardian_id = Uuid::new_v4();
    let students = seed_students(&store, guardian_id, 10).await;
    let allocator = Arc::new(CapacityAllocator::new(Arc::clone(&store)));

    let handles = students.iter().map(|student| {
        let allocator = Arc::clone(&allocator);
        let grant = grant(&route, guardian_id, student.id);
        tokio::spawn(async move { allocator.try_allocate(grant).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let granted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::Capacity { .. })))
        .count();
    assert_eq!(granted, 3, "{:?}", results);
    assert_eq!(rejected, 7, "{:?}", results);

    let availability = allocator.availability(route.id).await.unwrap();
    assert_eq!(availability.occupied, 3);
    assert_eq!(availability.available, 0);
}

#[tokio::test]
async fn test_pg_duplicate_pending_request_is_rejected() {
    let Some(store) = pg_store().await else { return };
    let route = seed_route(&store, Uuid::new_v4(), 2).await;
    let guardian_id = Uuid::new_v4();
    let student = seed_students(&store, guardian_id, 1).await.remove(0);
    let service = RequestService::new(Arc::clone(&store));

    service.submit(route.id, guardian_id, student.id, None).await.unwrap();
    let error = service.submit(route.id, guardian_id, student.id, None).await.unwrap_err();
    assert!(matches!(error, AppError::Duplicate(_)));

    // Sin pasar por el servicio, el índice único parcial responde igual
    let mut tx = store.begin().await.unwrap();
    let error = tx
        .create_request(NewServiceRequest {
            route_id: route.id,
            guardian_id,
            student_id: student.id,
            message: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::Duplicate(_)));
}

#[tokio::test]
async fn test_pg_resolution_only_applies_to_pending_requests() {
    let Some(store) = pg_store().await else { return };
    let driver_id = Uuid::new_v4();
    let route = seed_route(&store, driver_id, 2).await;
    let guardian_id = Uuid::new_v4();
    let student = seed_students(&store, guardian_id, 1).await.remove(0);
    let service = RequestService::new(Arc::clone(&store));

    let request = service.submit(route.id, guardian_id, student.id, None).await.unwrap();
    let resolved = service
        .resolve(request.id, driver_id, ResolveOutcome::Accepted, Some("Bienvenido".to_string()))
        .await
        .unwrap();
    assert_eq!(resolved.status, RequestStatus::Accepted);
    assert!(resolved.resolved_at.is_some());

    let error = service
        .resolve(request.id, driver_id, ResolveOutcome::Rejected, None)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::NotFound(_)));

    let mut tx = store.begin().await.unwrap();
    let error = tx
        .set_request_resolution(request.id, RequestStatus::Rejected, None)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::NotFound(_)));
    drop(tx);

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.count_active_allocations(route.id).await.unwrap(), 1);
    let stored = tx.get_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Accepted);
    assert_eq!(stored.driver_response.as_deref(), Some("Bienvenido"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pg_cascade_racing_allocation_edits_completes() {
    let Some(store) = pg_store().await else { return };
    let lifecycle = Arc::new(RouteLifecycle::new(Arc::clone(&store)));
    let guard = Arc::new(AllocationGuard::new(Arc::clone(&store), AllocationPolicy::default()));
    let allocator = CapacityAllocator::new(Arc::clone(&store));

    for round in 0..10 {
        let route = seed_route(&store, Uuid::new_v4(), 4).await;
        let guardian_id = Uuid::new_v4();
        let mut allocation_ids = Vec::new();
        for student in seed_students(&store, guardian_id, 4).await {
            let allocation = allocator.try_allocate(grant(&route, guardian_id, student.id)).await.unwrap();
            allocation_ids.push(allocation.id);
        }

        let notes = format!("ronda {}", round);
        let edits: Vec<_> = allocation_ids
            .iter()
            .map(|&allocation_id| {
                let guard = Arc::clone(&guard);
                let patch = AllocationPatch {
                    notes: Some(notes.clone()),
                    ..Default::default()
                };
                tokio::spawn(async move { guard.update(allocation_id, Principal::guardian(guardian_id), patch).await })
            })
            .collect();
        let cascade = {
            let lifecycle = Arc::clone(&lifecycle);
            let (route_id, driver_id) = (route.id, route.driver_id);
            tokio::spawn(async move { lifecycle.set_active(route_id, driver_id, false).await })
        };

        for edit in join_all(edits).await {
            let edited = edit.unwrap().unwrap();
            assert_eq!(edited.notes.as_deref(), Some(notes.as_str()));
        }
        let toggle = cascade.await.unwrap().unwrap();
        assert!(!toggle.route.active);
        assert_eq!(toggle.cancelled_allocations.len(), 4);

        let mut tx = store.begin().await.unwrap();
        for &allocation_id in &allocation_ids {
            let allocation = tx.get_allocation(allocation_id).await.unwrap().unwrap();
            assert_eq!(allocation.status, AllocationStatus::Cancelled);
            assert_eq!(allocation.notes.as_deref(), Some(notes.as_str()));
        }
    }
}

#[tokio::test]
async fn test_pg_patch_sets_and_clears_end_date() {
    let Some(store) = pg_store().await else { return };
    let route = seed_route(&store, Uuid::new_v4(), 2).await;
    let guardian_id = Uuid::new_v4();
    let student = seed_students(&store, guardian_id, 1).await.remove(0);
    let allocation = CapacityAllocator::new(Arc::clone(&store))
        .try_allocate(grant(&route, guardian_id, student.id))
        .await
        .unwrap();
    let guard = AllocationGuard::new(Arc::clone(&store), AllocationPolicy::default());
    let driver = Principal::driver(route.driver_id);
    let end_date = allocation.start_date + Duration::days(90);

    let updated = guard
        .update(
            allocation.id,
            driver,
            AllocationPatch {
                status: Some("completed".to_string()),
                agreed_price: Some(Decimal::new(39_990, 0)),
                end_date: Some(Some(end_date)),
                notes: Some("Termina el semestre".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, AllocationStatus::Completed);
    assert_eq!(updated.agreed_price, Decimal::new(39_990, 0));
    assert_eq!(updated.end_date, Some(end_date));

    let cleared = guard
        .update(
            allocation.id,
            driver,
            AllocationPatch {
                end_date: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.end_date, None);
    assert_eq!(cleared.status, AllocationStatus::Completed);
    assert_eq!(cleared.agreed_price, Decimal::new(39_990, 0));
    assert_eq!(cleared.notes.as_deref(), Some("Termina el semestre"));
}

#[tokio::test]
async fn test_pg_removed_student_cannot_be_accepted() {
    let Some(store) = pg_store().await else { return };
    let driver_id = Uuid::new_v4();
    let route = seed_route(&store, driver_id, 2).await;
    let guardian_id = Uuid::new_v4();
    let student = seed_students(&store, guardian_id, 1).await.remove(0);
    let service = RequestService::new(Arc::clone(&store));

    let request = service.submit(route.id, guardian_id, student.id, None).await.unwrap();
    StudentService::new(Arc::clone(&store))
        .remove(student.id, guardian_id)
        .await
        .unwrap();

    let error = service
        .resolve(request.id, driver_id, ResolveOutcome::Accepted, None)
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::NotFound(_)));

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.count_active_allocations(route.id).await.unwrap(), 0);
    let stored = tx.get_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Pending);
}
