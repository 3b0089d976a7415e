//! Shared data models for the Lectern lesson platform.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//! typed identifiers, the lecture catalog types, locally cached resume
//! records, remotely persisted progress records, and the API response
//! envelope shared between the server and its clients.

pub mod api;
pub mod course;
pub mod ids;
pub mod progress;
pub mod resume;

pub mod prelude;

pub use api::ApiResponse;
pub use course::{Course, CourseDetail, Lecture, LectureStatus, MediaRef, Section};
pub use ids::{CourseId, DEMO_COURSE, DEMO_USER, LectureId, SectionId, UserId};
pub use progress::{
    CourseProgress, CourseProgressResponse, LectureProgress, UpsertProgressRequest, progress_pct,
};
pub use resume::{MIN_RESUME_POSITION_SECS, RESUME_TTL_MS, ResumeRecord};
