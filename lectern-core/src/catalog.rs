//! In-memory lecture catalog.
//!
//! Built once from a [`CourseDetail`] and never mutated afterwards. The
//! catalog owns the canonical playback order (sections by sort order, then
//! lectures by sort order) and answers the lookups the coordinator needs:
//! membership, media resolution, and "what comes after this lecture".

use std::collections::HashMap;

use lectern_model::{CourseDetail, CourseId, Lecture, LectureId, MediaRef, SectionId};

/// Section membership as the catalog sees it, used for per-section
/// progress displays.
#[derive(Debug, Clone)]
pub struct SectionEntry {
    pub id: SectionId,
    pub title: String,
    pub lecture_ids: Vec<LectureId>,
}

/// Static ordered view of one course's lectures
#[derive(Debug, Clone)]
pub struct LectureCatalog {
    course_id: CourseId,
    course_title: String,
    ordered: Vec<Lecture>,
    index: HashMap<LectureId, usize>,
    sections: Vec<SectionEntry>,
}

impl LectureCatalog {
    /// Flatten a course payload into playback order.
    pub fn from_course(detail: CourseDetail) -> Self {
        let course_id = detail.id;
        let course_title = detail.title;

        let mut sections_src = detail.sections;
        sections_src.sort_by_key(|s| s.sort_order);

        let mut ordered = Vec::new();
        let mut sections = Vec::with_capacity(sections_src.len());
        for mut section in sections_src {
            section.lectures.sort_by_key(|l| l.sort_order);
            sections.push(SectionEntry {
                id: section.id,
                title: section.title,
                lecture_ids: section.lectures.iter().map(|l| l.id.clone()).collect(),
            });
            ordered.extend(section.lectures);
        }

        let index = ordered
            .iter()
            .enumerate()
            .map(|(i, l)| (l.id.clone(), i))
            .collect();

        Self {
            course_id,
            course_title,
            ordered,
            index,
            sections,
        }
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    pub fn course_title(&self) -> &str {
        &self.course_title
    }

    /// All lectures in playback order
    pub fn lectures_in_order(&self) -> &[Lecture] {
        &self.ordered
    }

    pub fn sections(&self) -> &[SectionEntry] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn contains(&self, id: &LectureId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &LectureId) -> Option<&Lecture> {
        self.index.get(id).map(|&i| &self.ordered[i])
    }

    pub fn media_ref_for(&self, id: &LectureId) -> Option<&MediaRef> {
        self.get(id).map(|l| &l.media_ref)
    }

    pub fn title_for(&self, id: &LectureId) -> Option<&str> {
        self.get(id).map(|l| l.title.as_str())
    }

    /// The lecture directly after `id` in catalog order, regardless of its
    /// watch status. `None` when `id` is last or unknown.
    pub fn next_after(&self, id: &LectureId) -> Option<&Lecture> {
        let i = *self.index.get(id)?;
        self.ordered.get(i + 1)
    }
}
