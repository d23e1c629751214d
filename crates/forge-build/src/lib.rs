//! Build-target parsing, default target selection, and build orchestration.
//!
//! The orchestrator walks every requested package across every resolved
//! platform in a fixed order. The actual compilation is delegated to a
//! [`BuildBackend`]; [`backend::RecipeBackend`] is the recipe-directory
//! implementation used by the CLI.

pub mod backend;
pub mod defaults;
pub mod error;
pub mod orchestrate;
pub mod process;
pub mod target;

pub use defaults::{CompatTable, DefaultTargetSelector};
pub use error::{BuildError, Result};
pub use orchestrate::{
    plan, BuildBackend, OrchestrationPlan, Orchestrator, PackageBuilder, PlanStep, RunSummary,
};
pub use target::BuildTargetSpec;
