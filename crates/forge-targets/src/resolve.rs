//! Host-string resolution.
//!
//! Turns a user-supplied host specification into the ordered list of
//! platforms to build for, plus the clean policy for the run.

use tracing::debug;

use crate::error::HostError;
use crate::platform::PlatformSpec;
use crate::table::HostTable;

/// The outcome of resolving a host specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResolution {
    /// Platforms to build for, in build order.
    pub platforms: Vec<PlatformSpec>,
    /// Whether the first platform of each target starts from a clean tree.
    pub clean: bool,
}

/// Resolve `host` against `table`.
///
/// Accepted forms, in priority order:
/// 1. a top-level family name: every SDK/arch of the family, always clean;
/// 2. `sdk:arch`: the family owning `sdk` supplies the version;
/// 3. `sdk:version:arch`: taken verbatim.
///
/// Forms 2 and 3 honour `user_clean`.
pub fn resolve(
    table: &HostTable,
    host: &str,
    user_clean: bool,
) -> Result<HostResolution, HostError> {
    if let Some(family) = table.family(host) {
        debug!(host, family = %family.name, "resolved top-level host");
        return Ok(HostResolution {
            platforms: family.platforms(),
            clean: true,
        });
    }

    let parts: Vec<&str> = host.split(':').collect();
    let invalid = |detail: String| HostError::InvalidHost {
        host: host.to_string(),
        detail,
        families: table.family_names(),
    };

    let platform = match parts.as_slice() {
        [sdk, arch] => {
            let family = table
                .owner_of(sdk)
                .ok_or_else(|| invalid(format!("unknown SDK '{sdk}'")))?;
            PlatformSpec::new(*sdk, &family.base_version, *arch)
        }
        [sdk, version, arch] => PlatformSpec::new(*sdk, *version, *arch),
        [_] => return Err(invalid("not a known operating system".into())),
        _ => {
            return Err(invalid(format!(
                "expected 2 or 3 ':'-separated components, found {}",
                parts.len()
            )));
        }
    };

    debug!(host, platform = %platform.triple(), "resolved explicit host");
    Ok(HostResolution {
        platforms: vec![platform],
        clean: user_clean,
    })
}
