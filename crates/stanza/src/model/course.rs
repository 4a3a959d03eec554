use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{IndexDocument, Lesson, Section, Slug};

/// A published curriculum: the top-level grouping of sections.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub slug: Slug,
    /// The location of the course directory relative to the catalog root.
    pub path: PathBuf,
    /// The identifier of the course on the hosting platform.
    pub source_course: String,
    pub title: String,
    pub description: Option<String>,
    /// The parsed course README, when the course has one.
    pub index: Option<IndexDocument>,
    /// Sections in display order.
    pub sections: Vec<Section>,
}

impl Course {
    /// Iterate over every lesson of the course in display order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> + '_ {
        self.sections.iter().flat_map(|section| section.lessons.iter())
    }

    pub fn find_lesson(&self, source_lesson: &str) -> Option<&Lesson> {
        self.lessons()
            .find(|lesson| lesson.front_matter.source_lesson == source_lesson)
    }

    pub fn find_section(&self, slug: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.slug.name == slug)
    }
}
