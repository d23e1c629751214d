//! The build flow: targets → plan or orchestrated build.

use anyhow::{Context, Result};
use forge_build::backend::RecipeBackend;
use forge_build::defaults::query_python_minor;
use forge_build::{plan, BuildTargetSpec, Orchestrator};
use forge_targets::HostResolution;
use tracing::info;

use crate::config::Settings;

/// What the user asked to build, after host resolution.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub build_targets: Vec<String>,
    pub python_only: bool,
    /// Use this Python 3 minor version instead of asking the interpreter.
    pub python_minor: Option<u32>,
    pub dry_run: bool,
    pub json: bool,
}

/// Raw target strings: the user's, or the default build order.
pub fn target_strings(settings: &Settings, request: &BuildRequest) -> Result<Vec<String>> {
    if !request.build_targets.is_empty() {
        return Ok(request.build_targets.clone());
    }
    let minor = match request.python_minor {
        Some(minor) => minor,
        None => query_python_minor(&settings.python)?,
    };
    Ok(settings.selector.select(request.python_only, minor)?)
}

pub fn run(settings: &Settings, hosts: &HostResolution, request: &BuildRequest) -> Result<()> {
    let raw = target_strings(settings, request)?;
    let targets = BuildTargetSpec::parse_all(&raw)?;

    if request.dry_run {
        let plan = plan(&targets, &hosts.platforms, hosts.clean);
        if request.json {
            println!("{}", plan.to_json().context("serializing build plan")?);
        } else {
            print!("{plan}");
        }
        return Ok(());
    }

    let backend = RecipeBackend::new(&settings.recipes_dir, &settings.build_dir);
    let mut orchestrator = Orchestrator::new(backend);
    let summary = orchestrator.run(&targets, &hosts.platforms, hosts.clean)?;
    info!(
        targets = summary.targets,
        steps = summary.steps,
        "all builds complete"
    );
    Ok(())
}
