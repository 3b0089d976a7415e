use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use lectern_model::{
    ApiResponse, CourseId, CourseProgress, CourseProgressResponse, LectureId, LectureProgress,
    UpsertProgressRequest, UserId,
};

use crate::state::AppState;

/// Update one lecture's progress.
///
/// Position reports arrive debounced from playing clients, typically every
/// few seconds; completion reports arrive once per finished lecture. The
/// owning course's aggregate is recomputed in the same transaction.
///
/// # Response
///
/// - `200 OK` with the persisted row
/// - `400 Bad Request` on a negative position
/// - `404 Not Found` for an unknown lecture
pub async fn upsert_progress_handler(
    State(state): State<AppState>,
    Path((user_id, lecture_id)): Path<(i64, String)>,
    Json(request): Json<UpsertProgressRequest>,
) -> Result<Json<ApiResponse<LectureProgress>>, (StatusCode, String)> {
    if request.last_position < 0 {
        return Err((StatusCode::BAD_REQUEST, "Invalid position".to_string()));
    }

    let progress = state
        .progress
        .upsert_lecture_progress(UserId(user_id), &LectureId(lecture_id), &request)
        .await
        .map_err(|e| e.into_response_parts())?;

    Ok(Json(ApiResponse::success(progress)))
}

/// A user's progress within one course: the aggregate plus every
/// per-lecture row in catalog order
pub async fn get_course_progress_handler(
    State(state): State<AppState>,
    Path((user_id, course_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<CourseProgressResponse>>, (StatusCode, String)> {
    let response = state
        .progress
        .get_course_progress(UserId(user_id), CourseId(course_id))
        .await
        .map_err(|e| e.into_response_parts())?;

    Ok(Json(ApiResponse::success(response)))
}

/// All of a user's course aggregates, most recently accessed first
pub async fn list_user_progress_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<CourseProgress>>>, (StatusCode, String)> {
    let aggregates = state
        .progress
        .list_user_course_progress(UserId(user_id))
        .await
        .map_err(|e| e.into_response_parts())?;

    Ok(Json(ApiResponse::success(aggregates)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ServerError};
    use crate::repo::{CatalogRepository, ProgressRepository};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use lectern_model::{Course, CourseDetail};
    use std::sync::Arc;

    /// Canned repository: knows a single lecture "1-1" in course 1.
    struct StubRepo;

    #[async_trait]
    impl CatalogRepository for StubRepo {
        async fn list_courses(&self) -> Result<Vec<Course>> {
            Ok(vec![Course {
                id: CourseId(1),
                title: "Demo".into(),
                sort_order: 1,
            }])
        }

        async fn get_course_detail(&self, course: CourseId) -> Result<Option<CourseDetail>> {
            if course != CourseId(1) {
                return Ok(None);
            }
            Ok(Some(CourseDetail {
                id: CourseId(1),
                title: "Demo".into(),
                sections: Vec::new(),
            }))
        }
    }

    #[async_trait]
    impl ProgressRepository for StubRepo {
        async fn health_check(&self) -> Result<DateTime<Utc>> {
            Ok(Utc::now())
        }

        async fn upsert_lecture_progress(
            &self,
            user: UserId,
            lecture: &LectureId,
            request: &UpsertProgressRequest,
        ) -> Result<LectureProgress> {
            if lecture.as_str() != "1-1" {
                return Err(ServerError::NotFound(format!("lecture {}", lecture)));
            }
            Ok(LectureProgress {
                user_id: user,
                lecture_id: lecture.clone(),
                last_position: request.last_position,
                completed: request.completed,
                completed_at: request.completed.then(Utc::now),
                updated_at: Utc::now(),
            })
        }

        async fn get_course_progress(
            &self,
            _user: UserId,
            _course: CourseId,
        ) -> Result<CourseProgressResponse> {
            Ok(CourseProgressResponse {
                course_progress: None,
                lecture_progress: Vec::new(),
            })
        }

        async fn list_user_course_progress(&self, _user: UserId) -> Result<Vec<CourseProgress>> {
            Ok(Vec::new())
        }
    }

    fn state() -> AppState {
        let repo = Arc::new(StubRepo);
        AppState::with_repositories(Arc::clone(&repo) as Arc<_>, repo)
    }

    #[tokio::test]
    async fn test_upsert_rejects_negative_position() {
        let result = upsert_progress_handler(
            State(state()),
            Path((1, "1-1".to_string())),
            Json(UpsertProgressRequest {
                last_position: -10,
                completed: false,
            }),
        )
        .await;

        let (status, _) = result.err().expect("negative position must be rejected");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upsert_unknown_lecture_is_404() {
        let result = upsert_progress_handler(
            State(state()),
            Path((1, "missing".to_string())),
            Json(UpsertProgressRequest {
                last_position: 30,
                completed: false,
            }),
        )
        .await;

        let (status, _) = result.err().expect("unknown lecture must be rejected");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upsert_returns_the_persisted_row() {
        let result = upsert_progress_handler(
            State(state()),
            Path((1, "1-1".to_string())),
            Json(UpsertProgressRequest {
                last_position: 42,
                completed: false,
            }),
        )
        .await
        .expect("valid upsert succeeds");

        let row = result.0.data.expect("payload present");
        assert_eq!(row.last_position, 42);
        assert!(!row.completed);
        assert!(row.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_unknown_course_detail_is_404() {
        let result =
            crate::handlers::courses::get_course_handler(State(state()), Path(99)).await;

        let (status, _) = result.err().expect("unknown course must be rejected");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
