//! Mutable playback-side state.
//!
//! [`PlaybackSession`] is the transient per-page state the coordinator
//! mutates in response to engine events; [`CourseState`] is the explicit
//! per-lecture status map the catalog view renders from. Nothing in the
//! crate ever infers state back from a rendered surface.

use std::collections::HashMap;

use lectern_model::{LectureId, LectureStatus, progress_pct};

use crate::catalog::LectureCatalog;

/// Transient state for the lecture currently in the player
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub current_lecture: Option<LectureId>,
    pub current_lecture_name: String,
    /// Seconds, as last reported by the engine. Monotonic non-decreasing
    /// except across seeks and lecture changes.
    pub last_observed_position: f64,
    pub duration: f64,
    pub is_playing: bool,
    pub is_seeking: bool,
    pub playback_rate: f64,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            current_lecture: None,
            current_lecture_name: String::new(),
            last_observed_position: 0.0,
            duration: 0.0,
            is_playing: false,
            is_seeking: false,
            playback_rate: 1.0,
        }
    }
}

impl PlaybackSession {
    /// Point the session at a new lecture, clearing per-lecture fields.
    /// The playback rate survives lecture changes.
    pub fn switch_to(&mut self, id: LectureId, name: impl Into<String>) {
        self.current_lecture = Some(id);
        self.current_lecture_name = name.into();
        self.last_observed_position = 0.0;
        self.duration = 0.0;
        self.is_playing = false;
        self.is_seeking = false;
    }
}

/// Aggregate numbers for one progress display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSummary {
    pub completed: u32,
    pub total: u32,
    pub pct: f64,
}

/// Per-section progress for the sidebar
#[derive(Debug, Clone, PartialEq)]
pub struct SectionProgress {
    pub section_id: lectern_model::SectionId,
    pub title: String,
    pub summary: ProgressSummary,
}

/// Explicit per-lecture status map for the catalog view.
///
/// Invariant: at most one lecture is `Playing` at a time. Completion is
/// sticky; re-playing a completed lecture leaves it `Completed`.
#[derive(Debug, Clone)]
pub struct CourseState {
    statuses: HashMap<LectureId, LectureStatus>,
}

impl CourseState {
    pub fn new(catalog: &LectureCatalog) -> Self {
        let statuses = catalog
            .lectures_in_order()
            .iter()
            .map(|l| (l.id.clone(), LectureStatus::Pending))
            .collect();
        Self { statuses }
    }

    pub fn status(&self, id: &LectureId) -> Option<LectureStatus> {
        self.statuses.get(id).copied()
    }

    /// The lecture currently marked `Playing`, if any
    pub fn playing(&self) -> Option<&LectureId> {
        self.statuses
            .iter()
            .find(|(_, s)| s.is_playing())
            .map(|(id, _)| id)
    }

    /// Demote the current `Playing` lecture back to `Pending`.
    pub fn demote_playing(&mut self) {
        for status in self.statuses.values_mut() {
            if status.is_playing() {
                *status = LectureStatus::Pending;
            }
        }
    }

    /// Promote `id` to `Playing`. The previous `Playing` lecture (if
    /// different) drops back to `Pending`; a `Completed` target stays
    /// `Completed`.
    pub fn set_playing(&mut self, id: &LectureId) {
        self.demote_playing();
        if let Some(status) = self.statuses.get_mut(id)
            && !status.is_completed()
        {
            *status = LectureStatus::Playing;
        }
    }

    pub fn set_completed(&mut self, id: &LectureId) {
        if let Some(status) = self.statuses.get_mut(id) {
            *status = LectureStatus::Completed;
        }
    }

    /// Merge a remotely-recorded completion into the view. Lectures the
    /// session already marked `Playing` or `Completed` are left alone so a
    /// stale fetch cannot clobber in-progress state. Returns whether the
    /// status changed.
    pub fn apply_remote_completed(&mut self, id: &LectureId) -> bool {
        match self.statuses.get_mut(id) {
            Some(status @ LectureStatus::Pending) => {
                *status = LectureStatus::Completed;
                true
            }
            _ => false,
        }
    }

    /// First lecture in catalog order still marked `Pending`
    pub fn first_pending<'a>(&self, catalog: &'a LectureCatalog) -> Option<&'a LectureId> {
        catalog
            .lectures_in_order()
            .iter()
            .map(|l| &l.id)
            .find(|id| matches!(self.status(id), Some(LectureStatus::Pending)))
    }

    /// Course-wide completed/total/percent
    pub fn course_summary(&self) -> ProgressSummary {
        let total = self.statuses.len() as u32;
        let completed = self
            .statuses
            .values()
            .filter(|s| s.is_completed())
            .count() as u32;
        ProgressSummary {
            completed,
            total,
            pct: progress_pct(completed, total),
        }
    }

    /// Per-section completed/total/percent, in catalog order
    pub fn section_summaries(&self, catalog: &LectureCatalog) -> Vec<SectionProgress> {
        catalog
            .sections()
            .iter()
            .map(|entry| {
                let total = entry.lecture_ids.len() as u32;
                let completed = entry
                    .lecture_ids
                    .iter()
                    .filter(|id| matches!(self.status(id), Some(LectureStatus::Completed)))
                    .count() as u32;
                SectionProgress {
                    section_id: entry.id.clone(),
                    title: entry.title.clone(),
                    summary: ProgressSummary {
                        completed,
                        total,
                        pct: progress_pct(completed, total),
                    },
                }
            })
            .collect()
    }
}
