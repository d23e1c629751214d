//! Default build order.
//!
//! When no build targets are given, every supported package is built:
//! native libraries first (unless `--python-only`), then the Python
//! packages that depend on them.
//!
//! pandas builds against "oldest-supported-numpy", the oldest numpy release
//! known to work with a given Python version, so the default list carries a
//! numpy pin chosen for the running interpreter's ABI.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{BuildError, Result};
use crate::process::Cmd;

/// Native libraries the Python packages link against.
pub const NATIVE_TARGETS: &[&str] = &["libjpeg", "freetype"];

/// Python packages in build order. The numpy pin is inserted after `numpy`.
const PYTHON_TARGETS_HEAD: &[&str] = &["lru-dict", "pillow", "numpy"];
const PYTHON_TARGETS_TAIL: &[&str] = &["pandas", "cffi", "cryptography"];

/// Oldest numpy release compatible with each Python 3 minor version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatTable {
    entries: BTreeMap<u32, String>,
}

impl CompatTable {
    pub fn builtin() -> Self {
        let entries = [
            (8, "numpy:1.21.0"),
            (9, "numpy:1.21.0"),
            (10, "numpy:1.21.6"),
            (11, "numpy:1.23.2"),
        ]
        .into_iter()
        .map(|(minor, target)| (minor, target.to_string()))
        .collect();
        Self { entries }
    }

    /// Build a table from configuration, where keys are minor versions as strings.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (key, target) in entries {
            let key = key.as_ref();
            let Ok(minor) = key.trim().parse::<u32>() else {
                return Err(BuildError::InvalidCompatKey {
                    key: key.to_string(),
                });
            };
            map.insert(minor, target.into());
        }
        Ok(Self { entries: map })
    }

    /// The pinned target for `minor`.
    pub fn get(&self, minor: u32) -> Result<&str> {
        self.entries
            .get(&minor)
            .map(String::as_str)
            .ok_or(BuildError::UnsupportedPythonVersion { minor })
    }
}

impl Default for CompatTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Produces the default target list when the user names none.
#[derive(Debug, Clone, Default)]
pub struct DefaultTargetSelector {
    compat: CompatTable,
}

impl DefaultTargetSelector {
    pub fn new(compat: CompatTable) -> Self {
        Self { compat }
    }

    pub fn compat(&self) -> &CompatTable {
        &self.compat
    }

    /// Default raw target strings for a Python 3.`python_minor` interpreter.
    ///
    /// `python_only` drops the native libraries; the Python packages,
    /// numpy pin included, are always present.
    pub fn select(&self, python_only: bool, python_minor: u32) -> Result<Vec<String>> {
        let numpy_pin = self.compat.get(python_minor)?;

        let mut names: Vec<&str> = Vec::new();
        if !python_only {
            names.extend(NATIVE_TARGETS);
        }
        names.extend(PYTHON_TARGETS_HEAD);
        names.push(numpy_pin);
        names.extend(PYTHON_TARGETS_TAIL);
        let targets: Vec<String> = names.into_iter().map(String::from).collect();

        debug!(python_minor, python_only, ?targets, "selected default targets");
        Ok(targets)
    }
}

const VERSION_QUERY: &str = "import sys; print(sys.version_info.major, sys.version_info.minor)";

/// Ask `executable` for its Python 3 minor version.
pub fn query_python_minor(executable: &str) -> Result<u32> {
    let query_error = |detail: String| BuildError::PythonQuery {
        executable: executable.to_string(),
        detail,
    };

    let result = Cmd::new(executable)
        .args(["-c", VERSION_QUERY])
        .run()
        .map_err(|e| query_error(format!("{e:#}")))?;

    let out = result.stdout_trimmed();
    let minor = match out.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["3", minor] => minor.parse::<u32>().ok(),
        _ => None,
    };
    let detail = format!("not a Python 3 interpreter (reported '{out}')");
    minor.ok_or_else(|| query_error(detail))
}
