mod command;
mod json;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{build::lint::Report, config::Config, error::Result, model::Catalog};

pub use command::*;
pub use json::*;

pub trait Renderer {
    fn name(&self) -> &str;

    fn render(&self, ctx: RenderContext) -> Result<()>;
}

#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderContext {
    /// The root directory of the stanza.toml file.
    pub root: PathBuf,
    /// The directory where the renderer **must** put its output.
    /// This directory is not guaranteed to be empty nor to exist.
    pub destination: PathBuf,
    /// The configuration of the content.
    pub config: Config,
    /// The loaded content tree.
    pub catalog: Catalog,
    /// The diagnostics produced while checking the content.
    pub report: Report,
}

impl RenderContext {
    pub fn new(
        root: PathBuf,
        destination: PathBuf,
        config: Config,
        catalog: Catalog,
        report: Report,
    ) -> Self {
        Self {
            root,
            destination,
            config,
            catalog,
            report,
        }
    }
}

/// Create the renderers named by the `[output.<name>]` tables, defaulting to the JSON manifest.
pub fn renderers_from_config(config: &Config) -> Result<Vec<Box<dyn Renderer>>> {
    let outputs = config.outputs()?;

    if outputs.is_empty() {
        return Ok(vec![Box::new(JsonRenderer::default())]);
    }

    let mut renderers: Vec<Box<dyn Renderer>> = Vec::new();

    for (name, output) in outputs {
        match output.command {
            Some(command) => renderers.push(Box::new(CommandRenderer::new(name, command))),
            None if name == JsonRenderer::NAME => renderers.push(Box::new(JsonRenderer::new(
                output.include_bodies,
            ))),
            None => anyhow::bail!("Output `{name}` has no command and is not a built-in renderer"),
        }
    }

    Ok(renderers)
}
