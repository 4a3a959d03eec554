use std::path::PathBuf;

use super::{Check, CheckContext, Report, Severity};
use crate::{
    error::Result,
    model::{Catalog, IndexDocument},
};

/// A challenge total stated in a README heading must match the challenges it lists.
pub struct ChallengeCheck;

impl ChallengeCheck {
    const NAME: &'static str = "challenges";

    fn check_index(index: &IndexDocument, path: PathBuf, report: &mut Report) {
        let Some(declared) = index.declared_challenges else {
            return;
        };

        let counted = index.challenge_count();

        if counted != declared {
            report.push(
                Severity::Warning,
                Self::NAME,
                path,
                None,
                format!("declares {declared} challenges but lists {counted}"),
            );
        }
    }
}

impl Check for ChallengeCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, ctx: &CheckContext<'_>, catalog: &Catalog, report: &mut Report) -> Result<()> {
        let readme = &ctx.config.content.readme;

        for course in &catalog.courses {
            if let Some(index) = &course.index {
                Self::check_index(index, course.path.join(readme), report);
            }

            for section in &course.sections {
                if let Some(index) = &section.index {
                    Self::check_index(index, section.path.join(readme), report);
                }
            }
        }

        Ok(())
    }
}
