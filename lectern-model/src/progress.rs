//! Remotely persisted progress records.
//!
//! A [`LectureProgress`] row exists per (user, lecture) once the user has
//! watched any of it; the per-course [`CourseProgress`] aggregate is derived
//! from those rows and recomputed transactionally by the server whenever one
//! of them changes.

use chrono::{DateTime, Utc};

use crate::ids::{CourseId, LectureId, UserId};

/// Per-lecture progress as persisted by the backend
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LectureProgress {
    pub user_id: UserId,
    pub lecture_id: LectureId,
    /// Last observed playback position in whole seconds
    pub last_position: i32,
    pub completed: bool,
    /// Set once on the first transition to completed; never cleared
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl LectureProgress {
    /// A fresh, never-watched row (useful as an upsert baseline)
    pub fn new(user_id: UserId, lecture_id: LectureId) -> Self {
        Self {
            user_id,
            lecture_id,
            last_position: 0,
            completed: false,
            completed_at: None,
            updated_at: Utc::now(),
        }
    }
}

/// Per-course aggregate derived from lecture progress rows
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CourseProgress {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub completed_lectures: i32,
    pub total_lectures: i32,
    /// `completed / total * 100`, rounded to two decimals; 0 when empty
    pub progress_pct: f64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Body of the progress upsert request.
///
/// `completed: false` is a position-only update and leaves any existing
/// completion untouched; `completed: true` marks the lecture completed and
/// stamps `completed_at` exactly once.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpsertProgressRequest {
    pub last_position: i32,
    pub completed: bool,
}

/// Combined payload for a user's progress within one course
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CourseProgressResponse {
    pub course_progress: Option<CourseProgress>,
    pub lecture_progress: Vec<LectureProgress>,
}

/// Course completion percentage, rounded to two decimals.
///
/// An empty course is 0% rather than a division by zero.
pub fn progress_pct(completed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = completed as f64 * 100.0 / total as f64;
    (pct * 100.0).round() / 100.0
}
