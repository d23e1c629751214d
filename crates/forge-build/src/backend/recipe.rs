//! `recipe.toml` loading.
//!
//! A recipe directory describes how to build one package:
//!
//! ```toml
//! [package]
//! name = "pillow"
//! version = "9.2.0"
//! build-number = 0
//!
//! [build]
//! prepare = ["./configure"]
//! script = ["make", "make install"]
//!
//! [build.env]
//! CFLAGS = "-O2"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File name of the recipe manifest inside a recipe directory.
pub const RECIPE_FILE: &str = "recipe.toml";

#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    #[error("no recipe at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid recipe {}: {detail}", path.display())]
    Invalid { path: PathBuf, detail: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageSection {
    pub name: String,
    /// Version built when the target does not pin one.
    pub version: String,
    #[serde(default)]
    pub build_number: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSection {
    /// Commands run by `prepare`, after any clean.
    #[serde(default)]
    pub prepare: Vec<String>,
    /// Commands run by `build`.
    #[serde(default)]
    pub script: Vec<String>,
    /// Extra environment for every command.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecipeManifest {
    pub package: PackageSection,
    #[serde(default)]
    pub build: BuildSection,
}

/// A loaded recipe and the directory it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub dir: PathBuf,
    pub manifest: RecipeManifest,
}

impl Recipe {
    /// Where the recipe for `name` lives: `name` itself if it contains a
    /// path separator, else `recipes_dir/name`.
    pub fn locate(recipes_dir: &Path, name: &str) -> PathBuf {
        if name.contains('/') {
            PathBuf::from(name)
        } else {
            recipes_dir.join(name)
        }
    }

    /// Load and validate `dir/recipe.toml`.
    pub fn load(dir: &Path) -> Result<Self, RecipeError> {
        let path = dir.join(RECIPE_FILE);
        if !path.is_file() {
            return Err(RecipeError::NotFound { path });
        }
        let content = std::fs::read_to_string(&path).map_err(|source| RecipeError::Io {
            path: path.clone(),
            source,
        })?;
        let parsed = toml::from_str::<RecipeManifest>(&content);
        let manifest = parsed.map_err(|source| RecipeError::Toml {
            path: path.clone(),
            source,
        })?;

        let invalid = |detail: &str| RecipeError::Invalid {
            path: path.clone(),
            detail: detail.to_string(),
        };
        if manifest.package.name.trim().is_empty() {
            return Err(invalid("package name is empty"));
        }
        if manifest.package.version.trim().is_empty() {
            return Err(invalid("package version is empty"));
        }
        if manifest.build.script.is_empty() {
            return Err(invalid("build script has no commands"));
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            manifest,
        })
    }

    pub fn name(&self) -> &str {
        &self.manifest.package.name
    }
}
