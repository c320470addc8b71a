//! Datos de prueba sobre el almacenamiento en memoria

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{NewRoute, NewStudent, Route, Student};
use crate::repositories::{EntityStore, MemoryStore, UnitOfWork};

pub async fn seed_route(store: &MemoryStore, driver_id: Uuid, capacity: i32) -> Route {
    let mut tx = store.begin().await.unwrap();
    let route = tx
        .create_route(NewRoute {
            driver_id,
            name: format!("Ruta {}", capacity),
            capacity,
            monthly_price: Decimal::new(38_000, 0),
            schedule: serde_json::json!({ "departure": "07:00", "days": ["mon", "tue", "wed", "thu", "fri"] }),
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    route
}

pub async fn seed_student(store: &MemoryStore, guardian_id: Uuid) -> Student {
    let mut tx = store.begin().await.unwrap();
    let student = tx
        .create_student(NewStudent {
            guardian_id,
            full_name: "Martina Soto".to_string(),
        })
        .await
        .unwrap();
    tx.commit().await.unwrap();
    student
}

pub async fn load_student(store: &MemoryStore, student_id: Uuid) -> Student {
    let mut tx = store.begin().await.unwrap();
    tx.get_student(student_id).await.unwrap().unwrap()
}
