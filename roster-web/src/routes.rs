//! Route definitions for the roster web server

use crate::{auth, handlers, students, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Service banner and health check
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
}

/// Registration, login and identity lookup
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::handlers::register_user))
        .route("/login", post(auth::handlers::login_user))
        .route("/me", get(auth::handlers::get_current_user))
}

/// Student record CRUD
pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/{id}",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
}

/// Create all routes combined
pub fn all_routes() -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .nest("/auth", auth_routes())
        .nest("/students", student_routes())
}
