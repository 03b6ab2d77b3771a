// Command-line entry point for the workflow usage audit.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use workflow_usage_audit::application::AuditUsecase;
use workflow_usage_audit::config::AuditConfig;
use workflow_usage_audit::infrastructure::concurrency::init_thread_pool;
use workflow_usage_audit::infrastructure::object_info::ObjectInfoRegistry;
use workflow_usage_audit::ports::report_renderer::TextReportRenderer;
use workflow_usage_audit::ports::{FolderPaths, CUSTOM_NODES};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Application install directory (seeds the default folder layout)
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Directory of saved workflow JSON files
    #[arg(short, long)]
    workflow_dir: Option<PathBuf>,

    /// Object-info JSON export describing installed node types
    #[arg(long)]
    object_info: Option<PathBuf>,

    /// Extra folder root as NAME=PATH (repeatable)
    #[arg(long = "folder", value_parser = parse_folder_arg)]
    folders: Vec<(String, PathBuf)>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Worker threads for scanning
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_folder_arg(raw: &str) -> Result<(String, PathBuf), String> {
    match raw.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got `{}`", raw)),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    init_thread_pool(cli.jobs)?;

    let mut config = match &cli.config {
        Some(path) => AuditConfig::load(path)?,
        None => AuditConfig::default(),
    };
    if cli.base_dir.is_some() {
        config.base_dir = cli.base_dir.clone();
    }
    if cli.workflow_dir.is_some() {
        config.workflow_dir = cli.workflow_dir.clone();
    }
    if cli.object_info.is_some() {
        config.object_info = cli.object_info.clone();
    }
    for (name, path) in &cli.folders {
        config.add_folder(name.as_str(), path.as_path());
    }

    let settings = config.resolve();

    let custom_nodes_roots = settings
        .folders
        .folder_paths(CUSTOM_NODES)
        .unwrap_or_default()
        .to_vec();
    let registry = match &settings.object_info {
        Some(path) => ObjectInfoRegistry::load(path, &settings.base_dir, &custom_nodes_roots)?,
        None => {
            tracing::warn!("no object-info registry given; node origins and declared model inputs are unknown");
            ObjectInfoRegistry::empty()
        }
    };
    tracing::info!(node_types = registry.len(), "loaded node registry");

    let usecase = AuditUsecase {
        registry: &registry,
        folders: &settings.folders,
    };
    let report = usecase
        .run(&settings.workflow_dir)
        .context("Usage audit failed")?;

    match &cli.output {
        Some(path) => {
            TextReportRenderer::export(&report, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            tracing::info!(output = %path.display(), "report written");
        }
        None => println!("{}", TextReportRenderer::render(&report)),
    }

    Ok(())
}
