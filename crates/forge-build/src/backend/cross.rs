//! Cross-compilation environment for one platform.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use forge_targets::PlatformSpec;

/// Build environment descriptor handed to recipe commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossEnv {
    platform: PlatformSpec,
    build_root: PathBuf,
}

impl CrossEnv {
    pub fn new(platform: PlatformSpec, build_root: impl Into<PathBuf>) -> Self {
        Self {
            platform,
            build_root: build_root.into(),
        }
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Directory name for this platform's output inside a package tree.
    pub fn slug(&self) -> String {
        let p = &self.platform;
        format!("{}-{}-{}", p.sdk, p.sdk_version, p.arch)
    }

    /// Variables describing the platform, exported to every recipe command.
    pub fn vars(&self) -> BTreeMap<String, String> {
        [
            ("FORGE_SDK", &self.platform.sdk),
            ("FORGE_SDK_VERSION", &self.platform.sdk_version),
            ("FORGE_ARCH", &self.platform.arch),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

impl fmt::Display for CrossEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.platform;
        write!(f, "{} {} {}", p.sdk, p.sdk_version, p.arch)
    }
}
