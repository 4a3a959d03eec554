use super::{Check, CheckContext, Report, Severity};
use crate::{
    error::Result,
    model::{Catalog, SkipReason},
};

/// Every lesson needs a well formed front matter block naming the course it belongs to.
pub struct FrontMatterCheck;

impl FrontMatterCheck {
    const NAME: &'static str = "front-matter";
}

impl Check for FrontMatterCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, _ctx: &CheckContext<'_>, catalog: &Catalog, report: &mut Report) -> Result<()> {
        for skipped in &catalog.skipped {
            if skipped.reason == SkipReason::FrontMatter {
                report.push(
                    Severity::Error,
                    Self::NAME,
                    &skipped.path,
                    Some(1),
                    format!("lesson was skipped: {}", skipped.message),
                );
            }
        }

        for course in &catalog.courses {
            for lesson in course.lessons() {
                if lesson.front_matter.source_course != course.source_course {
                    report.push(
                        Severity::Error,
                        Self::NAME,
                        &lesson.path,
                        None,
                        format!(
                            "source_course `{}` does not match course `{}`",
                            lesson.front_matter.source_course, course.source_course
                        ),
                    );
                }
            }
        }

        Ok(())
    }
}
