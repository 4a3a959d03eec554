use std::{collections::HashMap, path::Path};

use super::{Check, CheckContext, Report, Severity};
use crate::{
    error::Result,
    model::{Catalog, Slug},
};

/// Siblings are ordered by their numeric prefixes, which must be present and distinct.
pub struct OrderingCheck;

impl OrderingCheck {
    const NAME: &'static str = "ordering";

    fn check_siblings<'a>(
        siblings: impl IntoIterator<Item = (&'a Slug, &'a Path)>,
        report: &mut Report,
    ) {
        let siblings: Vec<_> = siblings.into_iter().collect();
        let any_ordered = siblings.iter().any(|(slug, _)| slug.order.is_some());
        let mut seen: HashMap<u32, &Path> = HashMap::new();

        for (slug, path) in siblings {
            match slug.order {
                Some(order) => {
                    if let Some(previous) = seen.insert(order, path) {
                        report.push(
                            Severity::Warning,
                            Self::NAME,
                            path,
                            None,
                            format!(
                                "numeric prefix {order} is also used by {}",
                                previous.display()
                            ),
                        );
                    }
                }
                None if any_ordered => report.push(
                    Severity::Warning,
                    Self::NAME,
                    path,
                    None,
                    "has no numeric prefix while its siblings do",
                ),
                None => (),
            }
        }
    }
}

impl Check for OrderingCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, _ctx: &CheckContext<'_>, catalog: &Catalog, report: &mut Report) -> Result<()> {
        for course in &catalog.courses {
            Self::check_siblings(
                course
                    .sections
                    .iter()
                    .map(|section| (&section.slug, section.path.as_path())),
                report,
            );

            for section in &course.sections {
                Self::check_siblings(
                    section
                        .lessons
                        .iter()
                        .map(|lesson| (&lesson.slug, lesson.path.as_path())),
                    report,
                );
            }
        }

        Ok(())
    }
}
