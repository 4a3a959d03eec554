use super::{Check, CheckContext, Report, Severity};
use crate::{error::Result, model::Catalog};

/// Lessons close with a blockquote linking back to the hosted course page.
pub struct AttributionCheck;

impl AttributionCheck {
    const NAME: &'static str = "attribution";
}

impl Check for AttributionCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, _ctx: &CheckContext<'_>, catalog: &Catalog, report: &mut Report) -> Result<()> {
        for lesson in catalog.courses.iter().flat_map(|course| course.lessons()) {
            if lesson.attribution.is_none() {
                report.push(
                    Severity::Warning,
                    Self::NAME,
                    &lesson.path,
                    None,
                    "lesson does not end with an attribution blockquote",
                );
            }
        }

        Ok(())
    }
}
