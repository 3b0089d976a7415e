//! Lecture catalog types.
//!
//! A course is an ordered list of sections, each an ordered list of
//! lectures. These types are immutable once loaded; the playback side keeps
//! its own mutable view state keyed by lecture id.

use crate::ids::{CourseId, LectureId, SectionId};

/// Opaque reference to a lecture's media, in whatever form the playback
/// engine understands (a hosted video id, a manifest URL, a file path).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MediaRef(pub String);

impl MediaRef {
    pub fn new(media: impl Into<String>) -> Self {
        MediaRef(media.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single playable lecture
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lecture {
    pub id: LectureId,
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    pub media_ref: MediaRef,
    /// Duration in seconds, when the authoring side knows it
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_secs: Option<u32>,
    pub sort_order: u32,
}

/// An ordered group of lectures within a course
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    pub sort_order: u32,
    pub lectures: Vec<Lecture>,
}

/// Course summary row
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub sort_order: u32,
}

/// Full course payload: summary plus the ordered section/lecture tree
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CourseDetail {
    pub id: CourseId,
    pub title: String,
    pub sections: Vec<Section>,
}

impl CourseDetail {
    /// Total number of lectures across all sections
    pub fn lecture_count(&self) -> usize {
        self.sections.iter().map(|s| s.lectures.len()).sum()
    }
}

/// Per-lecture view status in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LectureStatus {
    Pending,
    Playing,
    Completed,
}

impl LectureStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, LectureStatus::Completed)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, LectureStatus::Playing)
    }
}
