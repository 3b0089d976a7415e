//! Locally cached "resume watching" record.
//!
//! A single global slot pointing at the last unfinished lecture. Records
//! expire after 30 days and positions under 5 seconds are treated as noise
//! (an accidental click is not worth resuming).

use crate::ids::LectureId;

/// Records older than this are treated as absent and purged on read.
pub const RESUME_TTL_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Positions below this are never persisted.
pub const MIN_RESUME_POSITION_SECS: u32 = 5;

/// Pointer to the last unfinished lecture and position
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResumeRecord {
    pub lecture_id: LectureId,
    pub lecture_name: String,
    /// Whole seconds into the lecture
    pub position_secs: u32,
    /// Epoch milliseconds at save time
    pub saved_at_ms: i64,
}

impl ResumeRecord {
    pub fn new(
        lecture_id: LectureId,
        lecture_name: impl Into<String>,
        position_secs: u32,
        saved_at_ms: i64,
    ) -> Self {
        Self {
            lecture_id,
            lecture_name: lecture_name.into(),
            position_secs,
            saved_at_ms,
        }
    }

    /// Whether the record has outlived the 30-day resume window
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.saved_at_ms) > RESUME_TTL_MS
    }

    /// Whether the record represents enough watched time to keep
    pub fn is_persistable(&self) -> bool {
        self.position_secs >= MIN_RESUME_POSITION_SECS
    }
}
