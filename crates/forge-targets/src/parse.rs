//! TOML parsing and validation for host tables.
//!
//! A custom table replaces the built-in one wholesale. It is stored as a list
//! of `[[family]]` entries:
//!
//! ```toml
//! [[family]]
//! name = "iOS"
//! base-version = "12.0"
//! sdks = [{ sdk = "iphoneos", arch = "arm64" }]
//! ```

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, TableError};
use crate::table::HostTable;

/// A validation issue found in a host table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Human-readable description.
    pub message: String,
}

/// Load and validate a host table from a TOML file.
pub fn load_host_table_toml(path: &Path) -> Result<HostTable> {
    if !path.exists() {
        return Err(TableError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_host_table_toml(&content)
}

/// Parse and validate a host table from a TOML string.
pub fn parse_host_table_toml(toml_str: &str) -> Result<HostTable> {
    let table: HostTable = toml::from_str(toml_str)?;
    check_host_table(table)
}

/// Validate a table built elsewhere (e.g., from `[[family]]` entries in a
/// larger config file), folding every issue into one [`TableError`].
pub fn check_host_table(table: HostTable) -> Result<HostTable> {
    if let Err(issues) = validate_host_table(&table) {
        let detail: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
        return Err(TableError::Validation {
            detail: detail.join("\n"),
        });
    }
    Ok(table)
}

/// Check a host table for structural correctness.
///
/// Returns `Ok(())` if valid, or `Err(issues)` listing every problem.
pub fn validate_host_table(table: &HostTable) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    if table.families().is_empty() {
        issues.push(ValidationIssue {
            message: "table has no OS families".into(),
        });
    }

    let mut seen_families: HashMap<&str, usize> = HashMap::new();
    let mut sdk_owner: HashMap<&str, &str> = HashMap::new();

    for family in table.families() {
        if family.name.is_empty() {
            issues.push(ValidationIssue {
                message: "OS family with an empty name".into(),
            });
        }
        if family.name.contains(':') {
            issues.push(ValidationIssue {
                message: format!("OS family name '{}' must not contain ':'", family.name),
            });
        }
        *seen_families.entry(family.name.as_str()).or_default() += 1;

        if family.base_version.is_empty() {
            issues.push(ValidationIssue {
                message: format!("OS family '{}' has an empty base version", family.name),
            });
        }
        if family.sdks.is_empty() {
            issues.push(ValidationIssue {
                message: format!("OS family '{}' lists no SDKs", family.name),
            });
        }

        for entry in &family.sdks {
            if entry.sdk.is_empty() || entry.arch.is_empty() {
                issues.push(ValidationIssue {
                    message: format!(
                        "OS family '{}' has an entry with an empty sdk or arch",
                        family.name
                    ),
                });
                continue;
            }
            match sdk_owner.get(entry.sdk.as_str()) {
                Some(owner) if *owner != family.name => issues.push(ValidationIssue {
                    message: format!(
                        "SDK '{}' is listed by both '{}' and '{}'",
                        entry.sdk, owner, family.name
                    ),
                }),
                Some(_) => {}
                None => {
                    sdk_owner.insert(entry.sdk.as_str(), family.name.as_str());
                }
            }
        }
    }

    let mut duplicated: Vec<&str> = seen_families
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect();
    duplicated.sort_unstable();
    for name in duplicated {
        issues.push(ValidationIssue {
            message: format!("OS family '{name}' is defined more than once"),
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
