use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use stanza::{
    build::{lint::Report, ContentBuilder},
    config::Config,
    error::Result,
    model::Catalog,
};
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Load, check and export the Stanza course catalog.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Increase log output (-v for debug, -vv for trace).
    #[clap(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the loaded course tree
    Tree {
        /// Content root holding stanza.toml
        #[clap(default_value = ".")]
        dir: PathBuf,

        /// Print the catalog as JSON
        #[clap(long)]
        json: bool,
    },

    /// Check the content and print diagnostics
    Lint {
        /// Content root holding stanza.toml
        #[clap(default_value = ".")]
        dir: PathBuf,

        /// Fail when any warning is reported
        #[clap(long)]
        deny_warnings: bool,
    },

    /// Check the content, then run every configured renderer
    Build {
        /// Content root holding stanza.toml
        #[clap(default_value = ".")]
        dir: PathBuf,

        /// Write output here instead of the configured build directory
        #[clap(long)]
        dest_dir: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Tree { dir, json } => tree(&dir, json),
        Commands::Lint { dir, deny_warnings } => lint(&dir, deny_warnings),
        Commands::Build { dir, dest_dir } => build(&dir, dest_dir),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("Error: {error:?}");
            ExitCode::FAILURE
        }
    }
}

fn tree(dir: &Path, json: bool) -> Result<bool> {
    debug!(root = %dir.display(), "Loading content tree");
    let builder = ContentBuilder::load(dir)?;
    let catalog = builder.load_catalog()?;

    if json {
        let output =
            serde_json::to_string_pretty(&catalog).context("Failed to serialize the catalog")?;
        println!("{output}");
    } else {
        print_tree(&catalog);
    }

    Ok(true)
}

fn print_tree(catalog: &Catalog) {
    if let Some(title) = &catalog.title {
        println!("{title}");
    }

    if let Some(description) = &catalog.description {
        println!("{description}");
    }

    for course in &catalog.courses {
        println!("{} [{}]", course.title, course.source_course);

        for section in &course.sections {
            println!("  {}", section.title);

            for lesson in &section.lessons {
                println!(
                    "    {} ({})",
                    lesson.display_title(),
                    lesson.front_matter.source_lesson
                );
            }
        }
    }

    for skipped in &catalog.skipped {
        println!("skipped {}: {}", skipped.path.display(), skipped.message);
    }
}

fn lint(dir: &Path, deny_warnings: bool) -> Result<bool> {
    debug!(root = %dir.display(), deny_warnings, "Checking content");
    let mut config = Config::load_or_default(dir)?;
    config.lint.deny_warnings |= deny_warnings;

    let builder = ContentBuilder::load_with_config(dir, config)?;
    let (_, report) = builder.lint()?;

    print_report(&report);

    Ok(!report.fails(builder.config().lint.deny_warnings))
}

fn build(dir: &Path, dest_dir: Option<PathBuf>) -> Result<bool> {
    debug!(root = %dir.display(), "Building content");
    let mut builder = ContentBuilder::load(dir)?;

    if let Some(dest_dir) = dest_dir {
        builder.with_destination(dest_dir);
    }

    let (catalog, report) = builder.lint()?;
    print_report(&report);

    if report.fails(builder.config().lint.deny_warnings) {
        return Ok(false);
    }

    builder.render(&catalog, &report)?;

    Ok(true)
}

fn print_report(report: &Report) {
    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }

    println!(
        "{} errors, {} warnings",
        report.error_count(),
        report.warning_count()
    );
}
