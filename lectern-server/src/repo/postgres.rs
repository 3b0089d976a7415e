//! PostgreSQL implementation of the repository ports.
//!
//! Uses the runtime query API with `FromRow` mappings so the crate builds
//! without a live database. The progress upsert and the course aggregate
//! recompute share one transaction; readers never observe a lecture row
//! without its matching aggregate.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lectern_model::{
    Course, CourseDetail, CourseId, CourseProgress, CourseProgressResponse, Lecture, LectureId,
    LectureProgress, MediaRef, Section, SectionId, UpsertProgressRequest, UserId, progress_pct,
};
use sqlx::PgPool;
use tracing::info;

use crate::error::{Result, ServerError};
use crate::repo::{CatalogRepository, ProgressRepository};

#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: i64,
    title: String,
    sort_order: i32,
}

#[derive(sqlx::FromRow)]
struct SectionRow {
    id: String,
    title: String,
    sort_order: i32,
}

#[derive(sqlx::FromRow)]
struct LectureRow {
    id: String,
    section_id: String,
    title: String,
    description: Option<String>,
    media_ref: String,
    duration_secs: Option<i32>,
    sort_order: i32,
}

impl From<LectureRow> for Lecture {
    fn from(row: LectureRow) -> Self {
        Lecture {
            id: LectureId(row.id),
            title: row.title,
            description: row.description,
            media_ref: MediaRef(row.media_ref),
            duration_secs: row.duration_secs.map(|d| d.max(0) as u32),
            sort_order: row.sort_order.max(0) as u32,
        }
    }
}

#[async_trait]
impl CatalogRepository for PostgresRepository {
    async fn list_courses(&self) -> Result<Vec<Course>> {
        let rows = sqlx::query_as::<_, CourseRow>(
            "SELECT id, title, sort_order FROM courses ORDER BY sort_order ASC, id ASC",
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Course {
                id: CourseId(row.id),
                title: row.title,
                sort_order: row.sort_order.max(0) as u32,
            })
            .collect())
    }

    async fn get_course_detail(&self, course: CourseId) -> Result<Option<CourseDetail>> {
        let Some(course_row) = sqlx::query_as::<_, CourseRow>(
            "SELECT id, title, sort_order FROM courses WHERE id = $1",
        )
        .bind(course.value())
        .fetch_optional(self.pool())
        .await?
        else {
            return Ok(None);
        };

        let section_rows = sqlx::query_as::<_, SectionRow>(
            "SELECT id, title, sort_order FROM sections \
             WHERE course_id = $1 ORDER BY sort_order ASC",
        )
        .bind(course.value())
        .fetch_all(self.pool())
        .await?;

        let lecture_rows = sqlx::query_as::<_, LectureRow>(
            "SELECT l.id, l.section_id, l.title, l.description, l.media_ref, \
                    l.duration_secs, l.sort_order \
             FROM lectures l \
             JOIN sections s ON l.section_id = s.id \
             WHERE s.course_id = $1 \
             ORDER BY s.sort_order ASC, l.sort_order ASC",
        )
        .bind(course.value())
        .fetch_all(self.pool())
        .await?;

        let mut by_section: HashMap<String, Vec<Lecture>> = HashMap::new();
        for row in lecture_rows {
            by_section
                .entry(row.section_id.clone())
                .or_default()
                .push(row.into());
        }

        let sections = section_rows
            .into_iter()
            .map(|row| Section {
                lectures: by_section.remove(&row.id).unwrap_or_default(),
                id: SectionId(row.id),
                title: row.title,
                sort_order: row.sort_order.max(0) as u32,
            })
            .collect();

        Ok(Some(CourseDetail {
            id: CourseId(course_row.id),
            title: course_row.title,
            sections,
        }))
    }
}

#[async_trait]
impl ProgressRepository for PostgresRepository {
    async fn health_check(&self) -> Result<DateTime<Utc>> {
        let now: DateTime<Utc> = sqlx::query_scalar("SELECT NOW()")
            .fetch_one(self.pool())
            .await?;
        Ok(now)
    }

    async fn upsert_lecture_progress(
        &self,
        user: UserId,
        lecture: &LectureId,
        request: &UpsertProgressRequest,
    ) -> Result<LectureProgress> {
        let mut tx = self.pool().begin().await?;

        // Resolve the owning course up front; an unknown lecture is the
        // caller's error, not a silent insert
        let course_id: Option<i64> = sqlx::query_scalar(
            "SELECT s.course_id FROM lectures l \
             JOIN sections s ON l.section_id = s.id \
             WHERE l.id = $1",
        )
        .bind(lecture.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(course_id) = course_id else {
            return Err(ServerError::NotFound(format!("lecture {}", lecture)));
        };

        // Completion is sticky: a position-only update never clears the
        // flag, and completed_at is stamped exactly once
        let progress = sqlx::query_as::<_, LectureProgress>(
            "INSERT INTO user_lecture_progress \
                 (user_id, lecture_id, last_position, completed, completed_at, updated_at) \
             VALUES ($1, $2, $3, $4, CASE WHEN $4 THEN NOW() END, NOW()) \
             ON CONFLICT (user_id, lecture_id) DO UPDATE SET \
                 last_position = CASE WHEN EXCLUDED.completed \
                                      THEN user_lecture_progress.last_position \
                                      ELSE EXCLUDED.last_position END, \
                 completed     = user_lecture_progress.completed OR EXCLUDED.completed, \
                 completed_at  = CASE WHEN EXCLUDED.completed \
                                       AND NOT user_lecture_progress.completed \
                                      THEN NOW() \
                                      ELSE user_lecture_progress.completed_at END, \
                 updated_at    = NOW() \
             RETURNING user_id, lecture_id, last_position, completed, completed_at, updated_at",
        )
        .bind(user.value())
        .bind(lecture.as_str())
        .bind(request.last_position.max(0))
        .bind(request.completed)
        .fetch_one(&mut *tx)
        .await?;

        // Recompute the course aggregate from the updated rows
        let (total, completed): (i64, i64) = sqlx::query_as(
            "SELECT \
                 (SELECT COUNT(*) FROM lectures l \
                  JOIN sections s ON l.section_id = s.id \
                  WHERE s.course_id = $2), \
                 (SELECT COUNT(*) FROM user_lecture_progress ulp \
                  JOIN lectures l ON ulp.lecture_id = l.id \
                  JOIN sections s ON l.section_id = s.id \
                  WHERE ulp.user_id = $1 AND s.course_id = $2 AND ulp.completed)",
        )
        .bind(user.value())
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await?;

        let pct = progress_pct(completed.max(0) as u32, total.max(0) as u32);

        sqlx::query(
            "INSERT INTO user_course_progress \
                 (user_id, course_id, completed_lectures, total_lectures, progress_pct, \
                  last_accessed_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) \
             ON CONFLICT (user_id, course_id) DO UPDATE SET \
                 completed_lectures = EXCLUDED.completed_lectures, \
                 total_lectures     = EXCLUDED.total_lectures, \
                 progress_pct       = EXCLUDED.progress_pct, \
                 last_accessed_at   = NOW(), \
                 updated_at         = NOW()",
        )
        .bind(user.value())
        .bind(course_id)
        .bind(completed as i32)
        .bind(total as i32)
        .bind(pct)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if request.completed {
            info!(
                "User {} completed lecture {} ({}/{} in course {})",
                user, lecture, completed, total, course_id
            );
        }

        Ok(progress)
    }

    async fn get_course_progress(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<CourseProgressResponse> {
        let course_progress = sqlx::query_as::<_, CourseProgress>(
            "SELECT user_id, course_id, completed_lectures, total_lectures, progress_pct, \
                    last_accessed_at, updated_at \
             FROM user_course_progress \
             WHERE user_id = $1 AND course_id = $2",
        )
        .bind(user.value())
        .bind(course.value())
        .fetch_optional(self.pool())
        .await?;

        let lecture_progress = sqlx::query_as::<_, LectureProgress>(
            "SELECT ulp.user_id, ulp.lecture_id, ulp.last_position, ulp.completed, \
                    ulp.completed_at, ulp.updated_at \
             FROM user_lecture_progress ulp \
             JOIN lectures l ON ulp.lecture_id = l.id \
             JOIN sections s ON l.section_id = s.id \
             WHERE ulp.user_id = $1 AND s.course_id = $2 \
             ORDER BY s.sort_order ASC, l.sort_order ASC",
        )
        .bind(user.value())
        .bind(course.value())
        .fetch_all(self.pool())
        .await?;

        Ok(CourseProgressResponse {
            course_progress,
            lecture_progress,
        })
    }

    async fn list_user_course_progress(&self, user: UserId) -> Result<Vec<CourseProgress>> {
        let rows = sqlx::query_as::<_, CourseProgress>(
            "SELECT ucp.user_id, ucp.course_id, ucp.completed_lectures, ucp.total_lectures, \
                    ucp.progress_pct, ucp.last_accessed_at, ucp.updated_at \
             FROM user_course_progress ucp \
             WHERE ucp.user_id = $1 \
             ORDER BY ucp.last_accessed_at DESC NULLS LAST",
        )
        .bind(user.value())
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
