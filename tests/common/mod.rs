#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use school_transport::models::{NewRoute, NewStudent, Route, Student};
use school_transport::repositories::{EntityStore, MemoryStore, UnitOfWork};
use school_transport::services::SeatGrant;
use uuid::Uuid;

pub fn new_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub async fn seed_route(store: &MemoryStore, driver_id: Uuid, capacity: i32) -> Route {
    let mut tx = store.begin().await.unwrap();
    let route = tx
        .create_route(NewRoute {
            driver_id,
            name: "Ruta Colegio San Andrés".to_string(),
            capacity,
            monthly_price: Decimal::new(42_500, 0),
            schedule: serde_json::json!({ "departure": "07:10", "return": "16:30" }),
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    route
}

pub async fn seed_students(store: &MemoryStore, guardian_id: Uuid, count: usize) -> Vec<Student> {
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

pub async fn load_student(store: &MemoryStore, student_id: Uuid) -> Student {
    let mut tx = store.begin().await.unwrap();
    tx.get_student(student_id).await.unwrap().unwrap()
}

pub async fn active_count(store: &MemoryStore, route_id: Uuid) -> i64 {
    let mut tx = store.begin().await.unwrap();
    tx.count_active_allocations(route_id).await.unwrap()
}

pub fn grant(route: &Route, guardian_id: Uuid, student_id: Uuid) -> SeatGrant {
    SeatGrant {
        route_id: route.id,
        guardian_id,
        student_id,
        agreed_price: route.monthly_price,
        start_date: Utc::now().date_naive(),
    }
}
