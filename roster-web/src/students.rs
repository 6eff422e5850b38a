//! Student record handlers
//!
//! Reads need any authenticated principal, writes need an admin.

use crate::{
    auth::{AdminUser, CurrentUser},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roster_core::{NewStudent, StoreError, Student, StudentUpdate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

/// Student operation errors
#[derive(Debug, thiserror::Error)]
pub enum StudentError {
    #[error("Student {0} not found")]
    NotFound(i64),
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for StudentError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            StudentError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            StudentError::Store(StoreError::Duplicate { .. }) => {
                (StatusCode::CONFLICT, "conflict", self.to_string())
            }
            StudentError::Store(StoreError::Unavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "Record store is unavailable".to_string(),
            ),
            StudentError::Store(StoreError::Corrupt(_)) => {
                error!("Corrupt student record: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Confirmation returned by a successful delete
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Create a student record
pub async fn create_student(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<NewStudent>,
) -> Result<(StatusCode, Json<Student>), StudentError> {
    let student = state.students.create(request).await?;

    info!(
        student_id = student.id,
        principal_id = admin.id,
        "Student created"
    );
    Ok((StatusCode::CREATED, Json(student)))
}

/// List all student records
pub async fn list_students(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> Result<Json<Vec<Student>>, StudentError> {
    Ok(Json(state.students.list().await?))
}

/// Fetch one student record
pub async fn get_student(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Student>, StudentError> {
    state
        .students
        .get(id)
        .await?
        .map(Json)
        .ok_or(StudentError::NotFound(id))
}

/// Update the fields present in the request body
pub async fn update_student(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(update): Json<StudentUpdate>,
) -> Result<Json<Student>, StudentError> {
    let student = state
        .students
        .update(id, update)
        .await?
        .ok_or(StudentError::NotFound(id))?;

    info!(student_id = id, principal_id = admin.id, "Student updated");
    Ok(Json(student))
}

/// Delete a student record
pub async fn delete_student(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, StudentError> {
    if !state.students.delete(id).await? {
        return Err(StudentError::NotFound(id));
    }

    info!(student_id = id, principal_id = admin.id, "Student deleted");
    Ok(Json(DeleteResponse {
        message: format!("Student {} deleted successfully", id),
    }))
}
