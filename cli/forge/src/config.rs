//! `forge.toml` configuration.
//!
//! Every section is optional. Relative paths are taken from the directory
//! holding the file. Command-line flags override file values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use forge_build::{CompatTable, DefaultTargetSelector};
use forge_targets::parse::{check_host_table, load_host_table_toml};
use forge_targets::{HostTable, OsFamily};
use serde::Deserialize;
use tracing::debug;

pub const CONFIG_FILE: &str = "forge.toml";

/// The top-level structure of `forge.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ForgeConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub python: PythonConfig,
    /// Replaces the built-in numpy pins, keyed by Python minor version.
    #[serde(default)]
    pub numpy_compat: Option<BTreeMap<String, String>>,
    /// Replaces the built-in host table. Conflicts with `[paths] hosts`.
    #[serde(default, rename = "family")]
    pub families: Option<Vec<OsFamily>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    #[serde(default)]
    pub recipes: Option<PathBuf>,
    #[serde(default)]
    pub build: Option<PathBuf>,
    /// A host table file in the `[[family]]` format.
    #[serde(default)]
    pub hosts: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PythonConfig {
    #[serde(default)]
    pub executable: Option<String>,
}

impl ForgeConfig {
    /// Search upward from `start_dir` for `forge.toml`; returns the config and
    /// the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                let config = Self::load(&candidate)?;
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

/// Command-line overrides for [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub recipes: Option<PathBuf>,
    pub build_dir: Option<PathBuf>,
    pub python: Option<String>,
    pub hosts: Option<PathBuf>,
}

/// Effective configuration for one invocation. Built once, then read-only.
#[derive(Debug, Clone)]
pub struct Settings {
    pub table: HostTable,
    pub selector: DefaultTargetSelector,
    pub recipes_dir: PathBuf,
    pub build_dir: PathBuf,
    pub python: String,
}

impl Settings {
    /// Merge built-in defaults, an optional config file found at `base_dir`,
    /// and command-line overrides (which are relative to `cwd`).
    pub fn resolve(
        config: Option<(&ForgeConfig, &Path)>,
        overrides: &Overrides,
        cwd: &Path,
    ) -> Result<Self> {
        let default_config = ForgeConfig::default();
        let (config, base_dir) = config.unwrap_or((&default_config, cwd));

        let hosts_file = match (&overrides.hosts, &config.paths.hosts) {
            (Some(p), _) => Some(cwd.join(p)),
            (None, Some(p)) => Some(base_dir.join(p)),
            (None, None) => None,
        };
        let table = host_table(config, hosts_file.as_deref())?;
        let compat = compat_table(config)?;

        let pick = |flag: &Option<PathBuf>, file: &Option<PathBuf>, default: &str| {
            let (dir, rel) = match (flag, file) {
                (Some(p), _) => (cwd, p.as_path()),
                (None, Some(p)) => (base_dir, p.as_path()),
                (None, None) => (base_dir, Path::new(default)),
            };
            dir.join(rel)
        };
        let python = match (&overrides.python, &config.python.executable) {
            (Some(py), _) | (None, Some(py)) => py.clone(),
            (None, None) => "python3".to_string(),
        };

        let settings = Self {
            table,
            selector: DefaultTargetSelector::new(compat),
            recipes_dir: pick(&overrides.recipes, &config.paths.recipes, "recipes"),
            build_dir: pick(&overrides.build_dir, &config.paths.build, "build"),
            python,
        };
        debug!(
            recipes = %settings.recipes_dir.display(),
            build = %settings.build_dir.display(),
            python = %settings.python,
            "resolved settings"
        );
        Ok(settings)
    }
}

/// The host table file wins over inline `[[family]]` entries; with neither,
/// the built-in table is used.
fn host_table(config: &ForgeConfig, hosts_file: Option<&Path>) -> Result<HostTable> {
    if config.paths.hosts.is_some() && config.families.is_some() {
        bail!("{CONFIG_FILE} sets both [paths] hosts and [[family]]");
    }
    if let Some(path) = hosts_file {
        debug!(path = %path.display(), "loading host table");
        let context = || format!("loading host table {}", path.display());
        return load_host_table_toml(path).with_context(context);
    }
    let Some(families) = &config.families else {
        return Ok(HostTable::builtin());
    };
    let context = || format!("reading [[family]] in {CONFIG_FILE}");
    let table = HostTable::new(families.clone());
    check_host_table(table).with_context(context)
}

fn compat_table(config: &ForgeConfig) -> Result<CompatTable> {
    let Some(entries) = &config.numpy_compat else {
        return Ok(CompatTable::builtin());
    };
    let context = || format!("reading [numpy-compat] in {CONFIG_FILE}");
    let table = CompatTable::from_entries(entries.iter());
    table.with_context(context)
}
