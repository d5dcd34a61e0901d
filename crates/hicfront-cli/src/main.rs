//! hicfront - front-end asset build
//!
//! Usage:
//!   hicfront                 Stage vendor files and run every pipeline
//!   hicfront build           Clean, stage vendor files, run every pipeline
//!   hicfront watch           Build, then rebuild on change with live reload
//!   hicfront css|js|html|images
//!   hicfront --list          Show all tasks

use anyhow::{Context, Result};
use clap::Parser;
use hicfront_runner::{Runner, TaskContext, TaskRegistry, DEFAULT_TASK};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "hicfront")]
#[command(about = "Front-end asset build", long_about = None)]
#[command(version)]
struct Cli {
    /// Task to run
    #[arg(default_value = DEFAULT_TASK)]
    task: String,

    /// Project root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// List tasks and exit
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let runner = Runner::new(TaskRegistry::standard()).context("Invalid task registry")?;

    if cli.list {
        for task in runner.registry().tasks() {
            println!("{:<8} {}", task.name, task.description);
            println!("{:<8} {}", "", task.expr);
        }
        return Ok(());
    }

    // Fail on an unknown task before touching the project
    runner.registry().get(&cli.task)?;

    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("Project root not found: {}", cli.root.display()))?;
    let context = Arc::new(
        TaskContext::load(&root)
            .with_context(|| format!("Failed to load project at {}", root.display()))?,
    );

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    rt.block_on(async {
        tokio::select! {
            result = runner.run(&cli.task, context) => {
                result.with_context(|| format!("Task '{}' failed", cli.task))
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl+C, shutting down...");
                Ok(())
            }
        }
    })
}

fn init_logging(level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .ok();

    Ok(())
}
