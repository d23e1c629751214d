//! Resolved platform tuple.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One concrete cross-compilation environment: SDK, SDK version and architecture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformSpec {
    /// SDK identifier (e.g., "iphoneos", "android").
    pub sdk: String,
    /// Minimum SDK version to target (e.g., "12.0", "21").
    pub sdk_version: String,
    /// Architecture (e.g., "arm64", "x86_64", "arm64-v8a").
    pub arch: String,
}

impl PlatformSpec {
    pub fn new(
        sdk: impl Into<String>,
        sdk_version: impl Into<String>,
        arch: impl Into<String>,
    ) -> Self {
        Self {
            sdk: sdk.into(),
            sdk_version: sdk_version.into(),
            arch: arch.into(),
        }
    }

    /// The fully-qualified `sdk:version:arch` form, accepted back by the resolver.
    pub fn triple(&self) -> String {
        format!("{}:{}:{}", self.sdk, self.sdk_version, self.arch)
    }
}

impl fmt::Display for PlatformSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} on {}", self.sdk, self.sdk_version, self.arch)
    }
}
