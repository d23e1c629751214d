//! Host platform table.
//!
//! Maps each top-level OS family to its base SDK version and the ordered
//! list of SDK/architecture pairs it supports. The table is built once at
//! start-up and only read afterwards.

use serde::{Deserialize, Serialize};

use crate::platform::PlatformSpec;

/// An SDK identifier paired with one architecture it can target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SdkArch {
    /// SDK identifier (e.g., "iphonesimulator").
    pub sdk: String,
    /// Architecture (e.g., "x86_64").
    pub arch: String,
}

impl SdkArch {
    pub fn new(sdk: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            sdk: sdk.into(),
            arch: arch.into(),
        }
    }
}

/// A top-level OS family (e.g., "iOS") and the environments it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OsFamily {
    /// Family name as accepted on the command line.
    pub name: String,
    /// Default minimum SDK version for every SDK in this family.
    pub base_version: String,
    /// Supported SDK/architecture pairs, in build order.
    pub sdks: Vec<SdkArch>,
}

impl OsFamily {
    fn new(name: &str, base_version: &str, sdks: &[(&str, &str)]) -> Self {
        Self {
            name: name.into(),
            base_version: base_version.into(),
            sdks: sdks
                .iter()
                .map(|(sdk, arch)| SdkArch::new(*sdk, *arch))
                .collect(),
        }
    }

    /// Whether any entry of this family uses `sdk`.
    pub fn owns_sdk(&self, sdk: &str) -> bool {
        self.sdks.iter().any(|s| s.sdk == sdk)
    }

    /// Expand the family into one platform per SDK/architecture pair.
    pub fn platforms(&self) -> Vec<PlatformSpec> {
        self.sdks
            .iter()
            .map(|s| PlatformSpec::new(&s.sdk, &self.base_version, &s.arch))
            .collect()
    }
}

/// The full set of known OS families.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostTable {
    #[serde(rename = "family", default)]
    families: Vec<OsFamily>,
}

impl HostTable {
    /// Build a table from explicit families. Order is preserved.
    pub fn new(families: Vec<OsFamily>) -> Self {
        Self { families }
    }

    /// The built-in table of mobile platforms.
    pub fn builtin() -> Self {
        Self::new(vec![
            OsFamily::new(
                "android",
                "21",
                &[
                    ("android", "arm64-v8a"),
                    ("android", "armeabi-v7a"),
                    ("android", "x86_64"),
                    ("android", "x86"),
                ],
            ),
            OsFamily::new(
                "iOS",
                "12.0",
                &[
                    ("iphoneos", "arm64"),
                    ("iphonesimulator", "arm64"),
                    ("iphonesimulator", "x86_64"),
                ],
            ),
            OsFamily::new(
                "tvOS",
                "9.0",
                &[
                    ("appletvos", "arm64"),
                    ("appletvsimulator", "arm64"),
                    ("appletvsimulator", "x86_64"),
                ],
            ),
            OsFamily::new(
                "watchOS",
                "4.0",
                &[
                    ("watchos", "arm64_32"),
                    ("watchsimulator", "arm64"),
                    ("watchsimulator", "x86_64"),
                ],
            ),
        ])
    }

    /// All families in table order.
    pub fn families(&self) -> &[OsFamily] {
        &self.families
    }

    /// Family names in table order.
    pub fn family_names(&self) -> Vec<String> {
        self.families.iter().map(|f| f.name.clone()).collect()
    }

    /// Look up a family by its exact (case-sensitive) name.
    pub fn family(&self, name: &str) -> Option<&OsFamily> {
        self.families.iter().find(|f| f.name == name)
    }

    /// Reverse index: the family that owns `sdk`.
    ///
    /// If more than one family lists the SDK, the first in table order wins.
    pub fn owner_of(&self, sdk: &str) -> Option<&OsFamily> {
        self.families.iter().find(|f| f.owns_sdk(sdk))
    }
}

impl Default for HostTable {
    fn default() -> Self {
        Self::builtin()
    }
}
