//! Content checks run over a loaded catalog.

mod attribution;
mod challenges;
mod code_fences;
mod front_matter;
mod links;
mod ordering;
mod section_index;

pub use attribution::*;
pub use challenges::*;
pub use code_fences::*;
pub use front_matter::*;
pub use links::*;
pub use ordering::*;
pub use section_index::*;

use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use crate::{config::Config, error::Result, model::Catalog};

/// A check inspects the loaded catalog and reports problems it finds.
pub trait Check {
    fn name(&self) -> &str;

    fn run(&self, ctx: &CheckContext<'_>, catalog: &Catalog, report: &mut Report) -> Result<()>;
}

#[non_exhaustive]
pub struct CheckContext<'a> {
    /// Absolute path to the content root (where stanza.toml lives).
    pub root: &'a Path,
    /// Configuration for the content from the stanza.toml file.
    pub config: &'a Config,
}

impl<'a> CheckContext<'a> {
    pub fn new(root: &'a Path, config: &'a Config) -> Self {
        Self { root, config }
    }
}

/// The checks that ship with the crate, in the order they run.
pub fn default_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(FrontMatterCheck),
        Box::new(LinkCheck),
        Box::new(CodeFenceCheck),
        Box::new(SectionIndexCheck),
        Box::new(AttributionCheck),
        Box::new(OrderingCheck),
        Box::new(ChallengeCheck),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(formatter, "warning"),
            Severity::Error => write!(formatter, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// The name of the check that produced the diagnostic.
    pub check: String,
    /// The file concerned, relative to the catalog root.
    pub path: PathBuf,
    pub line: Option<usize>,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}[{}]: {}", self.severity, self.check, self.path.display())?;

        if let Some(line) = self.line {
            write!(formatter, ":{line}")?;
        }

        write!(formatter, ": {}", self.message)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn push(
        &mut self,
        severity: Severity,
        check: &str,
        path: impl Into<PathBuf>,
        line: Option<usize>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(Diagnostic {
            severity,
            check: String::from(check),
            path: path.into(),
            line,
            message: message.into(),
        });
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Whether the content should be rejected, optionally counting warnings as failures.
    pub fn fails(&self, deny_warnings: bool) -> bool {
        self.has_errors() || (deny_warnings && self.warning_count() > 0)
    }

    /// Diagnostics produced by the named check.
    pub fn by_check<'a>(&'a self, check: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics
            .iter()
            .filter(move |diagnostic| diagnostic.check == check)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity == severity)
            .count()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::{fs, path::Path};
    use tempfile::TempDir;

    use super::{Check, CheckContext, Report};
    use crate::{config::Config, model::Catalog};

    /// Write `files` below a temporary root.
    pub fn content(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().expect("temp dir");

        for (path, contents) in files {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().expect("path has a parent")).expect("create dirs");
            fs::write(path, contents).expect("write file");
        }

        dir
    }

    pub fn lesson(course: &str, lesson: &str, body: &str) -> String {
        format!("---\nsource_course: {course}\nsource_lesson: {lesson}\n---\n{body}")
    }

    /// Load the catalog at `root` and run a single check over it.
    pub fn run_check(check: &dyn Check, root: &Path, config: &Config) -> Report {
        let catalog = Catalog::load(root, config).expect("catalog should load");
        let ctx = CheckContext::new(root, config);
        let mut report = Report::default();

        check
            .run(&ctx, &catalog, &mut report)
            .expect("check should run");

        report
    }
}
