use std::path::Path;

use super::{Check, CheckContext, Report, Severity};
use crate::{
    error::Result,
    model::{Catalog, SkipReason},
};

/// Course and section READMEs must list everything their directory holds.
pub struct SectionIndexCheck;

impl SectionIndexCheck {
    const NAME: &'static str = "section-index";
}

fn file_name(path: &Path) -> &Path {
    path.file_name().map(Path::new).unwrap_or(path)
}

impl Check for SectionIndexCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, ctx: &CheckContext<'_>, catalog: &Catalog, report: &mut Report) -> Result<()> {
        let readme = &ctx.config.content.readme;

        for course in &catalog.courses {
            match &course.index {
                Some(index) => {
                    for section in &course.sections {
                        if !index.references(file_name(&section.path)) {
                            report.push(
                                Severity::Warning,
                                Self::NAME,
                                course.path.join(readme),
                                None,
                                format!("section `{}` is not listed", section.path.display()),
                            );
                        }
                    }
                }
                None => report.push(
                    Severity::Warning,
                    Self::NAME,
                    &course.path,
                    None,
                    format!("course has no {readme}"),
                ),
            }

            for section in &course.sections {
                let Some(index) = &section.index else {
                    report.push(
                        Severity::Warning,
                        Self::NAME,
                        &section.path,
                        None,
                        format!("section has no {readme}"),
                    );
                    continue;
                };

                for lesson in &section.lessons {
                    if !index.references(file_name(&lesson.path)) {
                        report.push(
                            Severity::Warning,
                            Self::NAME,
                            section.path.join(readme),
                            None,
                            format!("lesson `{}` is not listed", lesson.path.display()),
                        );
                    }
                }
            }
        }

        for skipped in &catalog.skipped {
            if matches!(
                skipped.reason,
                SkipReason::OutsideSection | SkipReason::NestedInSection
            ) {
                report.push(
                    Severity::Warning,
                    Self::NAME,
                    &skipped.path,
                    None,
                    skipped.message.clone(),
                );
            }
        }

        Ok(())
    }
}
