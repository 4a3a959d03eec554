use anyhow::Context;
use serde::Serialize;
use std::{fs, io::BufWriter};

use super::{RenderContext, Renderer};
use crate::{
    build::lint::Report,
    error::Result,
    model::{Catalog, Lesson},
};

/// The file written into the renderer destination.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Writes the loaded catalog and its lint report as a JSON manifest.
#[derive(Debug, Default)]
pub struct JsonRenderer {
    include_bodies: bool,
}

#[derive(Serialize)]
struct Manifest<'a> {
    catalog: &'a Catalog,
    report: &'a Report,
}

impl JsonRenderer {
    pub const NAME: &'static str = "json";

    pub fn new(include_bodies: bool) -> Self {
        Self { include_bodies }
    }
}

impl Renderer for JsonRenderer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn render(&self, ctx: RenderContext) -> Result<()> {
        fs::create_dir_all(&ctx.destination).with_context(|| {
            format!("Failed to create directory {}", ctx.destination.display())
        })?;

        let mut catalog = ctx.catalog;

        if !self.include_bodies {
            catalog
                .courses
                .iter_mut()
                .flat_map(|course| course.sections.iter_mut())
                .flat_map(|section| section.lessons.iter_mut())
                .for_each(|lesson: &mut Lesson| lesson.body.clear());
        }

        let path = ctx.destination.join(MANIFEST_FILE);
        let file = fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let manifest = Manifest {
            catalog: &catalog,
            report: &ctx.report,
        };

        serde_json::to_writer_pretty(BufWriter::new(file), &manifest)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }
}
