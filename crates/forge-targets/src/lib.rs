//! Host platform model and host-string resolution for mobile cross-compilation.
//!
//! A host specification names one or more cross-compilation environments:
//! - **Top-level OS family:** `iOS` expands to every SDK/architecture pair that iOS supports.
//! - **SDK pair:** `iphonesimulator:arm64` picks the family's base SDK version.
//! - **Explicit triple:** `iphoneos:13.0:arm64` is taken verbatim.

pub mod error;
pub mod parse;
pub mod platform;
pub mod resolve;
pub mod table;

pub use error::{HostError, TableError};
pub use platform::PlatformSpec;
pub use resolve::{resolve, HostResolution};
pub use table::{HostTable, OsFamily, SdkArch};
