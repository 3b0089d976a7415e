use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use lectern_model::{ApiResponse, Course, CourseDetail, CourseId};

use crate::state::AppState;

/// All courses, in display order
pub async fn list_courses_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Course>>>, (StatusCode, String)> {
    let courses = state
        .catalog
        .list_courses()
        .await
        .map_err(|e| e.into_response_parts())?;

    Ok(Json(ApiResponse::success(courses)))
}

/// One course with its ordered section/lecture tree
pub async fn get_course_handler(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Json<ApiResponse<CourseDetail>>, (StatusCode, String)> {
    let detail = state
        .catalog
        .get_course_detail(CourseId(course_id))
        .await
        .map_err(|e| e.into_response_parts())?;

    match detail {
        Some(detail) => Ok(Json(ApiResponse::success(detail))),
        None => Err((
            StatusCode::NOT_FOUND,
            format!("course {} not found", course_id),
        )),
    }
}
