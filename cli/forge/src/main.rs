//! forge: build binary wheels for mobile platforms.

mod build;
mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use forge_targets::HostError;
use tracing_subscriber::EnvFilter;

use build::BuildRequest;
use config::{ForgeConfig, Overrides, Settings};

/// Build binary wheels for mobile platforms.
#[derive(Parser, Debug)]
#[command(name = "forge", version)]
struct Cli {
    /// Log more detail
    #[arg(short, long)]
    verbose: bool,

    /// Clean the build folder prior to building. A clean is done automatically
    /// when a top-level platform is specified.
    #[arg(long)]
    clean: bool,

    /// Only compile the Python packages. Ignored if a build target is specified.
    #[arg(short, long)]
    python_only: bool,

    /// Configuration file (default: search for forge.toml upward from the current directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory containing package recipes
    #[arg(long)]
    recipes: Option<PathBuf>,

    /// Directory to build in
    #[arg(long)]
    build_dir: Option<PathBuf>,

    /// Host table file replacing the built-in host table
    #[arg(long)]
    hosts: Option<PathBuf>,

    /// Python interpreter used to pick ABI-compatible default targets
    #[arg(long)]
    python: Option<String>,

    /// Python 3 minor version to select default targets for (the interpreter is not run)
    #[arg(long)]
    python_minor: Option<u32>,

    /// Print the build plan without building anything
    #[arg(long)]
    dry_run: bool,

    /// Print the dry-run plan as JSON
    #[arg(long, requires = "dry_run")]
    json: bool,

    /// The host platform(s) to target: a top-level OS (android, iOS, tvOS,
    /// watchOS); an sdk:arch pair (e.g., iphoneos:arm64); or an
    /// sdk:version:arch triple (e.g., iphonesimulator:12.0:x86_64 or android:21:arm64-v8a).
    host: String,

    /// Name of a package in the recipes directory, or a path to a recipe
    /// directory if it contains a slash. Add ':<version>' to override the
    /// version, '::<build>' to override the build number, or
    /// ':<version>:<build>' to override both.
    build_targets: Vec<String>,
}

/// How a run failed; decides what is printed and where.
#[derive(Debug)]
enum Failure {
    /// The host string was not understood: print usage to stdout.
    InvalidHost(HostError),
    Error(anyhow::Error),
}

impl From<anyhow::Error> for Failure {
    fn from(e: anyhow::Error) -> Self {
        Failure::Error(e)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("error: reading current directory: {e}");
            process::exit(1);
        }
    };

    match run(cli, &cwd) {
        Ok(()) => {}
        Err(Failure::InvalidHost(e)) => {
            print!("{}", e.usage());
            println!();
            process::exit(1);
        }
        Err(Failure::Error(e)) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(level),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli, cwd: &Path) -> Result<(), Failure> {
    let settings = load_settings(&cli, cwd)?;

    let hosts = forge_targets::resolve(&settings.table, &cli.host, cli.clean);
    let hosts = hosts.map_err(Failure::InvalidHost)?;

    let request = BuildRequest {
        build_targets: cli.build_targets,
        python_only: cli.python_only,
        python_minor: cli.python_minor,
        dry_run: cli.dry_run,
        json: cli.json,
    };
    build::run(&settings, &hosts, &request)?;
    Ok(())
}

fn load_settings(cli: &Cli, cwd: &Path) -> anyhow::Result<Settings> {
    let found = match &cli.config {
        Some(path) => {
            let path = cwd.join(path);
            let config = ForgeConfig::load(&path)?;
            let dir = path.parent().unwrap_or(cwd).to_path_buf();
            Some((config, dir))
        }
        None => ForgeConfig::find_and_load(cwd)?,
    };

    let overrides = Overrides {
        recipes: cli.recipes.clone(),
        build_dir: cli.build_dir.clone(),
        python: cli.python.clone(),
        hosts: cli.hosts.clone(),
    };
    let config = found.as_ref().map(|(c, dir)| (c, dir.as_path()));
    Settings::resolve(config, &overrides, cwd)
}
