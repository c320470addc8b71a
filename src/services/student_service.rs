//! Alta y baja lógica de estudiantes

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::dto::student_dto::RegisterStudentRequest;
use crate::models::{NewStudent, Student};
use crate::repositories::{EntityStore, UnitOfWork};
use crate::utils::errors::{forbidden_error, not_found_error, AppError, AppResult};

pub struct StudentService<S: EntityStore> {
    store: Arc<S>,
}

impl<S: EntityStore> StudentService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn register(&self, guardian_id: Uuid, request: RegisterStudentRequest) -> AppResult<Student> {
        request.validate()?;

        let mut tx = self.store.begin().await?;
        let student = tx
            .create_student(NewStudent {
                guardian_id,
                full_name: request.full_name.trim().to_string(),
            })
            .await?;
        tx.commit().await?;

        info!(student_id = %student.id, "🎒 Estudiante registrado");
        Ok(student)
    }

    /// Baja lógica: solo si no quedan servicios `active` o `pending`
    pub async fn remove(&self, student_id: Uuid, guardian_id: Uuid) -> AppResult<Student> {
        let mut tx = self.store.begin().await?;

        let student = tx
            .lock_student(student_id)
            .await?
            .ok_or_else(|| not_found_error("Student", student_id))?;
        if student.guardian_id != guardian_id {
            return Err(forbidden_error("remove student", "student belongs to another guardian"));
        }
        if !student.active {
            return Ok(student);
        }

        let open = tx.count_open_allocations_for_student(student_id).await?;
        if open > 0 {
            return Err(AppError::Conflict(format!(
                "Student {} still has {} open allocation(s)",
                student_id, open
            )));
        }

        let student = tx.set_student_active(student_id, false).await?;
        tx.commit().await?;

        info!(student_id = %student.id, "🗑️ Estudiante dado de baja");
        Ok(student)
    }
}
