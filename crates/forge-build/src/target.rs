//! Build-target grammar.
//!
//! A build target is `name`, `name:version`, `name::build` or
//! `name:version:build`. An empty version or build token means "use the
//! package default", exactly as if it had been omitted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BuildError, Result};

/// One requested package build, independent of platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildTargetSpec {
    /// Package name, or a path to a recipe directory if it contains `/`.
    pub name: String,
    /// Version override; `None` defers to the recipe.
    pub version: Option<String>,
    /// Build number override; `None` defers to the recipe.
    pub build_number: Option<u32>,
}

impl BuildTargetSpec {
    /// A target with no overrides.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            build_number: None,
        }
    }

    /// Parse a raw target string.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut tokens = raw.splitn(3, ':');
        let name = tokens.next().unwrap_or_default();
        if name.is_empty() {
            return Err(BuildError::MalformedBuildTarget {
                raw: raw.to_string(),
                detail: "missing package name".into(),
            });
        }

        let version = tokens
            .next()
            .filter(|tok| !tok.is_empty())
            .map(str::to_string);

        let build_number = match tokens.next().filter(|b| !b.is_empty()) {
            None => None,
            Some(token) => match token.parse::<u32>() {
                Ok(n) => Some(n),
                Err(_) => {
                    return Err(BuildError::MalformedBuildTarget {
                        raw: raw.to_string(),
                        detail: format!("build number '{token}' is not a non-negative integer"),
                    });
                }
            },
        };

        Ok(Self {
            name: name.to_string(),
            version,
            build_number,
        })
    }

    /// Parse every raw target string, stopping at the first malformed one.
    pub fn parse_all<I, S>(raws: I) -> Result<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raws.into_iter()
            .map(|raw| Self::parse(raw.as_ref()))
            .collect()
    }
}

impl FromStr for BuildTargetSpec {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for BuildTargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match (&self.version, self.build_number) {
            (None, None) => Ok(()),
            (Some(v), None) => write!(f, ":{v}"),
            (None, Some(b)) => write!(f, "::{b}"),
            (Some(v), Some(b)) => write!(f, ":{v}:{b}"),
        }
    }
}
