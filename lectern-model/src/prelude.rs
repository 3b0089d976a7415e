//! Convenience re-exports for downstream crates.

pub use crate::api::ApiResponse;
pub use crate::course::{Course, CourseDetail, Lecture, LectureStatus, MediaRef, Section};
pub use crate::ids::{CourseId, DEMO_COURSE, DEMO_USER, LectureId, SectionId, UserId};
pub use crate::progress::{
    CourseProgress, CourseProgressResponse, LectureProgress, UpsertProgressRequest, progress_pct,
};
pub use crate::resume::{MIN_RESUME_POSITION_SECS, RESUME_TTL_MS, ResumeRecord};
