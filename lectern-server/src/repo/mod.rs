//! Repository ports the handlers depend on.

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lectern_model::{
    Course, CourseDetail, CourseId, CourseProgress, CourseProgressResponse, LectureId,
    LectureProgress, UpsertProgressRequest, UserId,
};

use crate::error::Result;

pub use postgres::PostgresRepository;

/// Read access to the course catalog
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_courses(&self) -> Result<Vec<Course>>;

    /// Course summary plus its ordered section/lecture tree, or `None` for
    /// an unknown id.
    async fn get_course_detail(&self, course: CourseId) -> Result<Option<CourseDetail>>;
}

/// Per-user progress persistence
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Liveness probe; returns the database's clock on success.
    async fn health_check(&self) -> Result<DateTime<Utc>>;

    /// Upsert one lecture's progress and recompute the owning course's
    /// aggregate in the same transaction.
    ///
    /// `completed: true` stamps `completed_at` exactly once and leaves
    /// `last_position` untouched on update; `completed: false` updates the
    /// position and never clears an existing completion.
    async fn upsert_lecture_progress(
        &self,
        user: UserId,
        lecture: &LectureId,
        request: &UpsertProgressRequest,
    ) -> Result<LectureProgress>;

    /// The course aggregate plus every per-lecture row, in catalog order.
    async fn get_course_progress(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<CourseProgressResponse>;

    /// All course aggregates for the user, most recently accessed first.
    async fn list_user_course_progress(&self, user: UserId) -> Result<Vec<CourseProgress>>;
}
