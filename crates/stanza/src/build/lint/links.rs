use std::path::Path;

use super::{Check, CheckContext, Report, Severity};
use crate::{
    error::Result,
    model::{Catalog, LinkRef},
};

/// Every relative link must point at a file that exists.
pub struct LinkCheck;

impl LinkCheck {
    const NAME: &'static str = "links";

    fn check_links<'a>(
        catalog: &Catalog,
        document: &Path,
        links: impl IntoIterator<Item = &'a LinkRef>,
        report: &mut Report,
    ) {
        let base = document.parent().unwrap_or_else(|| Path::new(""));

        for link in links {
            let Some(target) = link.local_target() else {
                continue;
            };

            if !catalog.resolve(base.join(&target)).exists() {
                report.push(
                    Severity::Error,
                    Self::NAME,
                    document,
                    Some(link.line),
                    format!("link `{}` does not resolve to a file", link.target),
                );
            }
        }
    }
}

impl Check for LinkCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, ctx: &CheckContext<'_>, catalog: &Catalog, report: &mut Report) -> Result<()> {
        let readme = &ctx.config.content.readme;

        for course in &catalog.courses {
            if let Some(index) = &course.index {
                Self::check_links(catalog, &course.path.join(readme), &index.links, report);
            }

            for section in &course.sections {
                if let Some(index) = &section.index {
                    Self::check_links(catalog, &section.path.join(readme), &index.links, report);
                }

                for lesson in &section.lessons {
                    Self::check_links(catalog, &lesson.path, &lesson.links, report);
                }
            }
        }

        Ok(())
    }
}
