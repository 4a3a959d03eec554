use super::{Check, CheckContext, Report, Severity};
use crate::{error::Result, model::Catalog};

/// Every fenced code block needs a language tag, optionally from an allowed list.
pub struct CodeFenceCheck;

impl CodeFenceCheck {
    const NAME: &'static str = "code-fences";
}

impl Check for CodeFenceCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, ctx: &CheckContext<'_>, catalog: &Catalog, report: &mut Report) -> Result<()> {
        let allowed = &ctx.config.lint.languages;

        for lesson in catalog.courses.iter().flat_map(|course| course.lessons()) {
            for block in lesson.code_blocks.iter().filter(|block| block.fenced) {
                match &block.lang {
                    None => report.push(
                        Severity::Error,
                        Self::NAME,
                        &lesson.path,
                        Some(block.line),
                        "code fence has no language tag",
                    ),
                    Some(lang) if !allowed.is_empty() && !allowed.contains(lang) => report.push(
                        Severity::Error,
                        Self::NAME,
                        &lesson.path,
                        Some(block.line),
                        format!("code fence language `{lang}` is not in the allowed list"),
                    ),
                    Some(_) => (),
                }
            }
        }

        Ok(())
    }
}
