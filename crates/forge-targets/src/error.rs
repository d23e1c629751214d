//! Error types for host resolution and host table loading.

use std::path::PathBuf;

/// Errors produced while resolving a host specification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The host string is not one of the accepted forms.
    #[error("invalid host '{host}': {detail}")]
    InvalidHost {
        /// The host string as supplied.
        host: String,
        /// What was wrong with it.
        detail: String,
        /// Top-level family names known to the table, for the usage text.
        families: Vec<String>,
    },
}

impl HostError {
    /// Human-readable description of the accepted host forms.
    pub fn usage(&self) -> String {
        let HostError::InvalidHost { families, .. } = self;
        let names = if families.is_empty() {
            "none configured".to_string()
        } else {
            families.join(", ")
        };

        format!(
            "\nInvalid host. Host should be:\n  \
             * the name of an operating system ({names}); or\n  \
             * a tuple of sdk:arch (e.g., iphoneos:arm64); or\n  \
             * a triple of sdk:version:arch (e.g., iphoneos:12.0:arm64).\n"
        )
    }
}

/// Errors that can occur while loading or validating a host table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error reading a table file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Table file not found.
    #[error("host table not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The table violates a structural invariant.
    #[error("invalid host table: {detail}")]
    Validation {
        /// Description of every validation failure, one per line.
        detail: String,
    },
}

/// Result type for host table operations.
pub type Result<T> = std::result::Result<T, TableError>;
