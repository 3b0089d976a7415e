//! API route assembly.

use axum::{
    Router,
    routing::{get, put},
};

use crate::handlers::{courses, health, progress};
use crate::state::AppState;

/// Create the full API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        // Catalog
        .route("/api/courses", get(courses::list_courses_handler))
        .route("/api/courses/{course_id}", get(courses::get_course_handler))
        // Progress
        .route(
            "/api/progress/{user_id}",
            get(progress::list_user_progress_handler),
        )
        .route(
            "/api/progress/{user_id}/courses/{course_id}",
            get(progress::get_course_progress_handler),
        )
        .route(
            "/api/progress/{user_id}/lectures/{lecture_id}",
            put(progress::upsert_progress_handler),
        )
        .with_state(state)
}
