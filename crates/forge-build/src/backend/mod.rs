//! Recipe-directory build backend.
//!
//! Each package is described by a `recipe.toml` (see [`recipe`]). A package
//! shares one tree, `<build-root>/<name>-<version>`, across all platforms;
//! each platform works in its own subdirectory of that tree. Cleaning wipes
//! the whole tree.

pub mod cross;
pub mod recipe;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use forge_targets::PlatformSpec;
use tracing::{debug, info};

use crate::orchestrate::{BuildBackend, PackageBuilder};
use crate::process::Cmd;
use crate::target::BuildTargetSpec;

pub use cross::CrossEnv;
pub use recipe::{Recipe, RecipeError};

/// A recipe with its version and build number settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipePackage {
    pub recipe: Recipe,
    pub version: String,
    pub build_number: u32,
}

impl RecipePackage {
    /// Apply a target's overrides on top of the recipe defaults.
    pub fn resolve(recipe: Recipe, target: &BuildTargetSpec) -> Self {
        let version = target
            .version
            .clone()
            .unwrap_or_else(|| recipe.manifest.package.version.clone());
        let build_number = target
            .build_number
            .unwrap_or(recipe.manifest.package.build_number);
        Self {
            recipe,
            version,
            build_number,
        }
    }

    /// Name of the package tree directory.
    pub fn tree_name(&self) -> String {
        format!("{}-{}", self.recipe.name(), self.version)
    }
}

impl fmt::Display for RecipePackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.recipe.name();
        let build = self.build_number;
        write!(f, "{name} {} (build {build})", self.version)
    }
}

/// Resolves targets to recipes under `recipes_dir` and builds into `build_root`.
#[derive(Debug, Clone)]
pub struct RecipeBackend {
    recipes_dir: PathBuf,
    build_root: PathBuf,
}

impl RecipeBackend {
    pub fn new(recipes_dir: impl Into<PathBuf>, build_root: impl Into<PathBuf>) -> Self {
        Self {
            recipes_dir: recipes_dir.into(),
            build_root: build_root.into(),
        }
    }
}

impl BuildBackend for RecipeBackend {
    type Package = RecipePackage;
    type Env = CrossEnv;
    type Builder = RecipeBuilder;

    fn package(&mut self, target: &BuildTargetSpec) -> Result<RecipePackage> {
        let dir = absolute(&Recipe::locate(&self.recipes_dir, &target.name))?;
        let recipe = Recipe::load(&dir)?;
        let package = RecipePackage::resolve(recipe, target);
        debug!(%target, recipe = %dir.display(), version = %package.version, "resolved recipe");
        Ok(package)
    }

    fn environment(&mut self, platform: &PlatformSpec) -> Result<CrossEnv> {
        Ok(CrossEnv::new(platform.clone(), absolute(&self.build_root)?))
    }

    fn builder(&mut self, package: &RecipePackage, env: CrossEnv) -> Result<RecipeBuilder> {
        Ok(RecipeBuilder::new(package.clone(), env))
    }
}

/// Runs one recipe's commands for one platform.
#[derive(Debug)]
pub struct RecipeBuilder {
    package: RecipePackage,
    env: CrossEnv,
    /// Shared package tree, wiped by a clean.
    tree_dir: PathBuf,
    /// This platform's working directory inside the tree.
    work_dir: PathBuf,
}

impl RecipeBuilder {
    pub fn new(package: RecipePackage, env: CrossEnv) -> Self {
        let tree_dir = env.build_root().join(package.tree_name());
        let work_dir = tree_dir.join(env.slug());
        Self {
            package,
            env,
            tree_dir,
            work_dir,
        }
    }

    fn vars(&self) -> BTreeMap<String, String> {
        let mut vars = self.env.vars();
        let path = |p: &Path| p.to_string_lossy().into_owned();
        let package = &self.package;
        vars.insert("FORGE_PACKAGE".into(), package.recipe.name().to_string());
        vars.insert("FORGE_VERSION".into(), package.version.clone());
        let build_number = package.build_number.to_string();
        vars.insert("FORGE_BUILD_NUMBER".into(), build_number);
        vars.insert("FORGE_RECIPE_DIR".into(), path(&package.recipe.dir));
        vars.insert("FORGE_TREE_DIR".into(), path(&self.tree_dir));
        vars.insert("FORGE_BUILD_DIR".into(), path(&self.work_dir));
        // Recipe entries win over the FORGE_* defaults.
        vars.extend(package.recipe.manifest.build.env.clone());
        vars
    }

    fn run_steps(&self, stage: &str, commands: &[String]) -> Result<()> {
        let vars = self.vars();
        for command in commands {
            println!("[{}] {stage}: {command}", self.env);
            Cmd::shell(command)
                .dir(&self.work_dir)
                .envs(&vars)
                .error_msg(format!("{stage} step '{command}' failed"))
                .run_interactive()?;
        }
        Ok(())
    }
}

impl PackageBuilder for RecipeBuilder {
    fn prepare(&mut self, clean: bool) -> Result<()> {
        if clean && self.tree_dir.exists() {
            info!(tree = %self.tree_dir.display(), "cleaning package tree");
            std::fs::remove_dir_all(&self.tree_dir)
                .with_context(|| format!("removing {}", self.tree_dir.display()))?;
        }
        std::fs::create_dir_all(&self.work_dir)
            .with_context(|| format!("creating {}", self.work_dir.display()))?;
        self.run_steps("prepare", &self.package.recipe.manifest.build.prepare)
    }

    fn build(&mut self) -> Result<()> {
        self.run_steps("build", &self.package.recipe.manifest.build.script)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("reading current directory")?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrate::Orchestrator;
    use std::fs;

    fn write_recipe(recipes: &Path, name: &str, body: &str) {
        let dir = recipes.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(recipe::RECIPE_FILE), body).unwrap();
    }

    const MARKER_RECIPE: &str = r#"
[package]
name = "marker"
version = "1.0"
build-number = 3

[build]
prepare = ["echo prepared > prepared.txt"]
script = ["echo \"$FORGE_PACKAGE $FORGE_VERSION $FORGE_BUILD_NUMBER $FORGE_SDK $FORGE_ARCH $GREETING\" > built.txt"]

[build.env]
GREETING = "hi"
"#;

    #[test]
    fn package_applies_overrides() {
        let root = tempfile::tempdir().unwrap();
        let recipes = root.path().join("recipes");
        write_recipe(&recipes, "marker", MARKER_RECIPE);
        let mut backend = RecipeBackend::new(&recipes, root.path().join("build"));

        let default = backend.package(&BuildTargetSpec::named("marker")).unwrap();
        assert_eq!(default.version, "1.0");
        assert_eq!(default.build_number, 3);
        assert_eq!(default.to_string(), "marker 1.0 (build 3)");

        let pinned = backend
            .package(&BuildTargetSpec::parse("marker:2.0:9").unwrap())
            .unwrap();
        assert_eq!(pinned.version, "2.0");
        assert_eq!(pinned.build_number, 9);
        assert_eq!(pinned.tree_name(), "marker-2.0");
    }

    #[test]
    fn unknown_package_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let mut backend = RecipeBackend::new(root.path(), root.path().join("build"));
        let err = backend.package(&BuildTargetSpec::named("nope")).unwrap_err();
        assert!(err.to_string().contains("no recipe at"));
    }

    #[test]
    fn builds_every_platform_with_environment() {
        let root = tempfile::tempdir().unwrap();
        let recipes = root.path().join("recipes");
        let build = root.path().join("build");
        write_recipe(&recipes, "marker", MARKER_RECIPE);

        let platforms = vec![
            PlatformSpec::new("iphoneos", "12.0", "arm64"),
            PlatformSpec::new("iphonesimulator", "12.0", "x86_64"),
        ];
        let mut orch = Orchestrator::new(RecipeBackend::new(&recipes, &build));
        orch.run(&[BuildTargetSpec::named("marker")], &platforms, true)
            .unwrap();

        let tree = build.join("marker-1.0");
        let built = tree.join("iphonesimulator-12.0-x86_64/built.txt");
        let out = fs::read_to_string(built).unwrap();
        assert_eq!(out.trim(), "marker 1.0 3 iphonesimulator x86_64 hi");
        assert!(tree.join("iphoneos-12.0-arm64/prepared.txt").is_file());
    }

    #[test]
    fn clean_wipes_tree_only_on_first_platform() {
        let root = tempfile::tempdir().unwrap();
        let recipes = root.path().join("recipes");
        let build = root.path().join("build");
        write_recipe(&recipes, "marker", MARKER_RECIPE);

        let stale = build.join("marker-1.0/stale.txt");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let platforms = vec![
            PlatformSpec::new("android", "21", "arm64-v8a"),
            PlatformSpec::new("android", "21", "x86_64"),
        ];
        let mut orch = Orchestrator::new(RecipeBackend::new(&recipes, &build));
        orch.run(&[BuildTargetSpec::named("marker")], &platforms, true)
            .unwrap();

        assert!(!stale.exists());
        // The second platform must not wipe the first platform's output.
        let tree = build.join("marker-1.0");
        assert!(tree.join("android-21-arm64-v8a/built.txt").is_file());
        assert!(tree.join("android-21-x86_64/built.txt").is_file());
    }

    #[test]
    fn no_clean_keeps_previous_artifacts() {
        let root = tempfile::tempdir().unwrap();
        let recipes = root.path().join("recipes");
        let build = root.path().join("build");
        write_recipe(&recipes, "marker", MARKER_RECIPE);

        let keep = build.join("marker-1.0/keep.txt");
        fs::create_dir_all(keep.parent().unwrap()).unwrap();
        fs::write(&keep, "old").unwrap();

        let mut orch = Orchestrator::new(RecipeBackend::new(&recipes, &build));
        orch.run(
            &[BuildTargetSpec::named("marker")],
            &[PlatformSpec::new("android", "21", "x86")],
            false,
        )
        .unwrap();
        assert!(keep.exists());
    }

    #[test]
    fn failing_script_reports_the_command() {
        let root = tempfile::tempdir().unwrap();
        let recipes = root.path().join("recipes");
        write_recipe(
            &recipes,
            "broken",
            "[package]\nname = \"broken\"\nversion = \"0.1\"\n[build]\nscript = [\"exit 7\"]\n",
        );
        let build = root.path().join("build");
        let mut orch = Orchestrator::new(RecipeBackend::new(&recipes, build));
        let err = orch
            .run(
                &[BuildTargetSpec::named("broken")],
                &[PlatformSpec::new("android", "21", "x86")],
                false,
            )
            .unwrap_err();
        let msg = format!("{:#}", anyhow::Error::from(err));
        assert!(msg.contains("build step 'exit 7' failed (exit code 7)"));
    }
}
