//! Build error types.

/// Errors that can occur while selecting, parsing, or building targets.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A build-target string does not follow `name[:version[:build]]`.
    #[error("malformed build target '{raw}': {detail}")]
    MalformedBuildTarget { raw: String, detail: String },

    /// No numeric-library override is configured for this interpreter.
    #[error("unsupported Python version 3.{minor}: no numpy compatibility entry")]
    UnsupportedPythonVersion { minor: u32 },

    /// A compatibility table key is not a Python minor version.
    #[error("invalid numpy compatibility key '{key}': expected a Python minor version")]
    InvalidCompatKey { key: String },

    /// The Python interpreter could not be queried for its version.
    #[error("could not determine the Python version of '{executable}': {detail}")]
    PythonQuery { executable: String, detail: String },

    /// The backend could not resolve a package for a target.
    #[error("failed to resolve package '{target}'")]
    PackageFailure {
        target: String,
        #[source]
        source: anyhow::Error,
    },

    /// The backend failed while preparing or building a package.
    #[error("failed to build {target} for {platform}")]
    BuildFailure {
        target: String,
        platform: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Result type alias for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;
