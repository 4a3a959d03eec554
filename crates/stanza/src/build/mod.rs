use std::path::PathBuf;
use tracing::{debug, info};

use crate::{config::Config, error::Result, model::Catalog};

use self::{
    lint::{default_checks, Check, CheckContext, Report},
    render::{renderers_from_config, RenderContext, Renderer},
};

pub mod lint;
pub mod render;

/// Loads a catalog, checks it and hands it to every configured renderer.
pub struct ContentBuilder {
    root: PathBuf,
    config: Config,
    checks: Vec<Box<dyn Check>>,
    renderers: Vec<Box<dyn Renderer>>,
    destination: Option<PathBuf>,
}

impl ContentBuilder {
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = Config::load_or_default(&root)?;

        ContentBuilder::load_with_config(root, config)
    }

    pub fn load_with_config(root: impl Into<PathBuf>, config: Config) -> Result<Self> {
        let checks = default_checks()
            .into_iter()
            .filter(|check| config.lint.is_enabled(check.name()))
            .collect();
        let renderers = renderers_from_config(&config)?;

        Ok(Self {
            root: root.into(),
            config,
            checks,
            renderers,
            destination: None,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn with_check(&mut self, check: impl Check + 'static) -> &mut Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn with_renderer(&mut self, renderer: impl Renderer + 'static) -> &mut Self {
        self.renderers.push(Box::new(renderer));
        self
    }

    /// Write renderer output below `destination` instead of the configured build directory.
    pub fn with_destination(&mut self, destination: impl Into<PathBuf>) -> &mut Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn load_catalog(&self) -> Result<Catalog> {
        Catalog::load(self.config.source_dir(&self.root), &self.config)
    }

    /// Load the catalog and run every enabled check over it.
    pub fn lint(&self) -> Result<(Catalog, Report)> {
        let catalog = self.load_catalog()?;
        let ctx = CheckContext::new(&self.root, &self.config);
        let mut report = Report::default();

        for check in &self.checks {
            debug!(check = check.name(), "Running check");
            check.run(&ctx, &catalog, &mut report)?;
        }

        info!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            "Checked {} lessons",
            catalog.lesson_count()
        );

        Ok((catalog, report))
    }

    /// Lint the content and, when it passes, run every renderer.
    pub fn build(&self) -> Result<Report> {
        let (catalog, report) = self.lint()?;

        if report.fails(self.config.lint.deny_warnings) {
            anyhow::bail!(
                "Content failed checks with {} errors and {} warnings",
                report.error_count(),
                report.warning_count()
            );
        }

        self.render(&catalog, &report)?;

        Ok(report)
    }

    /// Run every renderer over an already checked catalog.
    pub fn render(&self, catalog: &Catalog, report: &Report) -> Result<()> {
        let build_dir = match &self.destination {
            Some(destination) => destination.clone(),
            None => self.root.join(&self.config.build.build_dir),
        };

        for renderer in &self.renderers {
            let destination = build_dir.join(renderer.name());
            info!(renderer = renderer.name(), destination = %destination.display(), "Rendering");

            let ctx = RenderContext::new(
                self.root.clone(),
                destination,
                self.config.clone(),
                catalog.clone(),
                report.clone(),
            );

            renderer.render(ctx)?;
        }

        Ok(())
    }
}
