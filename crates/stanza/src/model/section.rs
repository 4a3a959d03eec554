use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{IndexDocument, Lesson, Slug};

/// A directory grouping related lessons, described by its own `README.md`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub slug: Slug,
    /// The location of the section directory relative to the catalog root.
    pub path: PathBuf,
    /// The README heading, or a title derived from the slug.
    pub title: String,
    pub description: Option<String>,
    /// The parsed section README, when the section has one.
    pub index: Option<IndexDocument>,
    /// Lessons in display order.
    pub lessons: Vec<Lesson>,
}

impl Section {
    /// The number of interactive challenges the section README accounts for.
    pub fn challenge_count(&self) -> u32 {
        self.index
            .as_ref()
            .map(IndexDocument::challenge_count)
            .unwrap_or_default()
    }
}
