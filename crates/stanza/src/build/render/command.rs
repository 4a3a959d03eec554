use anyhow::Context;
use shlex::Shlex;
use std::{
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};
use tracing::{debug, warn};

use super::{RenderContext, Renderer};
use crate::error::Result;

/// Hands the render context to an external program as JSON on stdin.
pub struct CommandRenderer {
    name: String,
    command: String,
}

impl CommandRenderer {
    pub fn new(name: String, command: String) -> Self {
        Self { name, command }
    }

    fn build_command(&self, root: &Path) -> Result<Command> {
        let mut parts = Shlex::new(&self.command);
        let Some(bin) = parts.next() else {
            anyhow::bail!("Command for renderer {} is empty", self.name);
        };

        // NOTE: Bare program names are looked up in PATH, anything else is relative to the root.
        let bin = PathBuf::from(bin);
        let bin = if bin.components().count() == 1 {
            bin
        } else {
            root.join(bin)
        };

        let mut command = Command::new(bin);
        command.args(parts).current_dir(root);

        Ok(command)
    }
}

impl Renderer for CommandRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, ctx: RenderContext) -> Result<()> {
        debug!(renderer = %self.name, command = %self.command, "Running renderer command");

        let mut process = self
            .build_command(&ctx.root)?
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to start renderer {}", self.name))?;

        if let Some(mut stdin) = process.stdin.take() {
            let written = serde_json::to_writer(&mut stdin, &ctx)
                .map_err(anyhow::Error::from)
                .and_then(|_| stdin.flush().map_err(anyhow::Error::from));

            if let Err(error) = written {
                // The renderer may exit without reading its input; its status decides the outcome.
                warn!(renderer = %self.name, %error, "Renderer did not accept the render context");
            }
        }

        let status = process
            .wait()
            .with_context(|| format!("Failed to wait for renderer {}", self.name))?;

        if !status.success() {
            anyhow::bail!("Renderer {} failed ({}).", self.name, status);
        }

        Ok(())
    }
}
