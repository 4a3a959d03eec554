use stanza::{
    build::{
        lint::Report,
        render::{RenderContext, Renderer},
    },
    config::Config,
    error::Result,
    model::Catalog,
};
use std::{cell::RefCell, path::PathBuf, rc::Rc};

#[derive(Clone, Default)]
pub struct TestRenderer(
    Rc<RefCell<Option<Catalog>>>,
    Rc<RefCell<Option<Config>>>,
    Rc<RefCell<Option<Report>>>,
);

impl TestRenderer {
    #[allow(dead_code)] // Avoid a false positive on the dead code analysis.
    pub fn catalog(&self) -> Catalog {
        self.0.borrow_mut().take().expect("result was not set")
    }

    #[allow(dead_code)] // Avoid a false positive on the dead code analysis.
    pub fn config(&self) -> Config {
        self.1.borrow_mut().take().expect("result was not set")
    }

    #[allow(dead_code)] // Avoid a false positive on the dead code analysis.
    pub fn report(&self) -> Report {
        self.2.borrow_mut().take().expect("result was not set")
    }
}

impl Renderer for TestRenderer {
    fn name(&self) -> &str {
        "test_renderer"
    }

    fn render(&self, ctx: RenderContext) -> Result<()> {
        *self.0.borrow_mut() = Some(ctx.catalog.clone());
        *self.1.borrow_mut() = Some(ctx.config.clone());
        *self.2.borrow_mut() = Some(ctx.report.clone());

        Ok(())
    }
}

/// The clean fixture catalog.
#[allow(dead_code)] // Avoid a false positive on the dead code analysis.
pub fn test_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// A fixture catalog where every check has something to report.
#[allow(dead_code)] // Avoid a false positive on the dead code analysis.
pub fn issues_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data-issues")
}
