//! Build orchestration.
//!
//! Every target is built for every platform, targets outermost, in the
//! order given. Only the first platform of each target may start clean; the
//! remaining platforms build on the same tree. The first failure aborts the
//! whole run.

use std::fmt;

use forge_targets::PlatformSpec;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{BuildError, Result};
use crate::target::BuildTargetSpec;

/// Prepares and builds one package in one environment.
pub trait PackageBuilder {
    /// Get the build tree ready, wiping previous artifacts first if `clean`.
    fn prepare(&mut self, clean: bool) -> anyhow::Result<()>;
    /// Compile the package.
    fn build(&mut self) -> anyhow::Result<()>;
}

/// The toolchain collaborator the orchestrator drives.
///
/// Errors returned here are not interpreted; they abort the run and are
/// reported as the source of a [`BuildError`].
pub trait BuildBackend {
    /// A resolved package (recipe, version and build number settled).
    type Package: fmt::Display;
    /// A build environment for one platform.
    type Env: fmt::Display;
    type Builder: PackageBuilder;

    fn package(&mut self, target: &BuildTargetSpec) -> anyhow::Result<Self::Package>;
    fn environment(&mut self, platform: &PlatformSpec) -> anyhow::Result<Self::Env>;
    fn builder(&mut self, pkg: &Self::Package, env: Self::Env) -> anyhow::Result<Self::Builder>;
}

/// One (target, platform) step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub target: BuildTargetSpec,
    pub platform: PlatformSpec,
    /// Position of `platform` in the platform list.
    pub index: usize,
    /// Whether `prepare` is asked to clean.
    pub clean: bool,
}

/// The ordered steps a run will execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrchestrationPlan {
    pub steps: Vec<PlanStep>,
}

impl OrchestrationPlan {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for OrchestrationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, step) in self.steps.iter().enumerate() {
            let marker = if step.clean { " (clean)" } else { "" };
            let (target, platform) = (&step.target, &step.platform);
            writeln!(f, "{:>3}. {target} for {platform}{marker}", n + 1)?;
        }
        Ok(())
    }
}

/// Lay out the steps of a run without executing anything.
pub fn plan(
    targets: &[BuildTargetSpec],
    platforms: &[PlatformSpec],
    clean: bool,
) -> OrchestrationPlan {
    let mut steps = Vec::with_capacity(targets.len() * platforms.len());
    for target in targets {
        for (index, platform) in platforms.iter().enumerate() {
            steps.push(PlanStep {
                target: target.clone(),
                platform: platform.clone(),
                index,
                clean: clean && index == 0,
            });
        }
    }
    OrchestrationPlan { steps }
}

/// Counts from a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub targets: usize,
    pub steps: usize,
}

/// Drives a [`BuildBackend`] over targets × platforms.
pub struct Orchestrator<B> {
    backend: B,
}

impl<B: BuildBackend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Build every target for every platform, stopping at the first failure.
    pub fn run(
        &mut self,
        targets: &[BuildTargetSpec],
        platforms: &[PlatformSpec],
        clean: bool,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let banner = "=".repeat(80);

        for target in targets {
            let no_package = |source: anyhow::Error| BuildError::PackageFailure {
                target: target.to_string(),
                source,
            };
            let package = self.backend.package(target).map_err(no_package)?;

            for (index, platform) in platforms.iter().enumerate() {
                let failed = |source: anyhow::Error| BuildError::BuildFailure {
                    target: target.to_string(),
                    platform: platform.to_string(),
                    source,
                };
                let step_clean = clean && index == 0;
                let position = index + 1;
                let total = platforms.len();

                println!("{banner}");
                println!("Building {package} for {platform} [{position}/{total}]");
                println!("{banner}");
                info!(
                    %target,
                    platform = %platform.triple(),
                    index,
                    clean = step_clean,
                    "building"
                );

                let env = self.backend.environment(platform).map_err(failed)?;
                let env_label = env.to_string();
                let mut builder = self.backend.builder(&package, env).map_err(failed)?;

                builder.prepare(step_clean).map_err(failed)?;
                println!("\n[{env_label}] Build package");
                builder.build().map_err(failed)?;

                debug!(%target, platform = %platform.triple(), "step complete");
                summary.steps += 1;
            }
            summary.targets += 1;
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Package(String),
        Env(String),
        /// Target, arch, clean.
        Prepare(String, String, bool),
        /// Target, arch.
        Build(String, String),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    /// Records every call; fails `build` on the given (target, arch).
    #[derive(Default)]
    struct RecordingBackend {
        log: Log,
        fail_build_on: Option<(String, String)>,
        fail_package: Option<String>,
    }

    impl RecordingBackend {
        fn record(&self, event: Event) {
            self.log.borrow_mut().push(event);
        }
    }

    struct RecordingBuilder {
        log: Log,
        target: String,
        arch: String,
        fail_build: bool,
    }

    impl PackageBuilder for RecordingBuilder {
        fn prepare(&mut self, clean: bool) -> anyhow::Result<()> {
            let event = Event::Prepare(self.target.clone(), self.arch.clone(), clean);
            self.log.borrow_mut().push(event);
            Ok(())
        }

        fn build(&mut self) -> anyhow::Result<()> {
            let event = Event::Build(self.target.clone(), self.arch.clone());
            self.log.borrow_mut().push(event);
            if self.fail_build {
                anyhow::bail!("compiler exploded");
            }
            Ok(())
        }
    }

    impl BuildBackend for RecordingBackend {
        type Package = String;
        type Env = PlatformSpec;
        type Builder = RecordingBuilder;

        fn package(&mut self, target: &BuildTargetSpec) -> anyhow::Result<String> {
            self.record(Event::Package(target.to_string()));
            if self.fail_package.as_deref() == Some(target.name.as_str()) {
                anyhow::bail!("no recipe for {}", target.name);
            }
            Ok(target.to_string())
        }

        fn environment(&mut self, platform: &PlatformSpec) -> anyhow::Result<PlatformSpec> {
            self.record(Event::Env(platform.arch.clone()));
            Ok(platform.clone())
        }

        fn builder(&mut self, pkg: &String, env: PlatformSpec) -> anyhow::Result<RecordingBuilder> {
            let fail_build = self
                .fail_build_on
                .as_ref()
                .is_some_and(|(t, a)| t == pkg && *a == env.arch);
            Ok(RecordingBuilder {
                log: Rc::clone(&self.log),
                target: pkg.clone(),
                arch: env.arch,
                fail_build,
            })
        }
    }

    fn platforms() -> Vec<PlatformSpec> {
        vec![
            PlatformSpec::new("iphoneos", "12.0", "arm64"),
            PlatformSpec::new("iphonesimulator", "12.0", "arm64"),
            PlatformSpec::new("iphonesimulator", "12.0", "x86_64"),
        ]
    }

    fn prepares(log: &Log) -> Vec<(String, String, bool)> {
        log.borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Prepare(t, a, c) => Some((t.clone(), a.clone(), *c)),
                _ => None,
            })
            .collect()
    }

    fn step_key(step: &PlanStep) -> (String, String, bool) {
        let arch = step.platform.arch.clone();
        (step.target.to_string(), arch, step.clean)
    }

    #[test]
    fn clean_only_on_first_platform() {
        let backend = RecordingBackend::default();
        let log = Rc::clone(&backend.log);
        let mut orch = Orchestrator::new(backend);

        let summary = orch
            .run(&[BuildTargetSpec::named("pillow")], &platforms(), true)
            .unwrap();
        assert_eq!((summary.targets, summary.steps), (1, 3));

        let cleans: Vec<bool> = prepares(&log).iter().map(|p| p.2).collect();
        assert_eq!(cleans, [true, false, false]);
    }

    #[test]
    fn no_clean_when_not_requested() {
        let backend = RecordingBackend::default();
        let log = Rc::clone(&backend.log);
        let mut orch = Orchestrator::new(backend);

        orch.run(&[BuildTargetSpec::named("pillow")], &platforms(), false)
            .unwrap();
        assert!(prepares(&log).iter().all(|p| !p.2));
        assert_eq!(prepares(&log).len(), 3);
    }

    #[test]
    fn each_target_cleans_its_first_platform() {
        let backend = RecordingBackend::default();
        let log = Rc::clone(&backend.log);
        let mut orch = Orchestrator::new(backend);
        let targets = BuildTargetSpec::parse_all(["a", "b:1.0", "a"]).unwrap();

        orch.run(&targets, &platforms(), true).unwrap();
        let got = prepares(&log);
        assert_eq!(got.len(), 9);
        for (i, (_, _, clean)) in got.iter().enumerate() {
            assert_eq!(*clean, i % 3 == 0);
        }
        // Duplicates are built independently, in order.
        let order: Vec<&str> = got.iter().step_by(3).map(|p| p.0.as_str()).collect();
        assert_eq!(order, ["a", "b:1.0", "a"]);
    }

    #[test]
    fn call_sequence_per_step() {
        let backend = RecordingBackend::default();
        let log = Rc::clone(&backend.log);
        let mut orch = Orchestrator::new(backend);

        orch.run(&[BuildTargetSpec::named("x")], &platforms()[..1], true)
            .unwrap();
        let expected = vec![
            Event::Package("x".into()),
            Event::Env("arm64".into()),
            Event::Prepare("x".into(), "arm64".into(), true),
            Event::Build("x".into(), "arm64".into()),
        ];
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn build_failure_stops_everything() {
        let backend = RecordingBackend {
            fail_build_on: Some(("first".into(), "arm64".into())),
            ..Default::default()
        };
        let log = Rc::clone(&backend.log);
        let mut orch = Orchestrator::new(backend);
        let targets = BuildTargetSpec::parse_all(["first", "second"]).unwrap();
        // arm64 is the second platform.
        let platforms = vec![
            PlatformSpec::new("iphonesimulator", "12.0", "x86_64"),
            PlatformSpec::new("iphonesimulator", "12.0", "arm64"),
            PlatformSpec::new("iphoneos", "12.0", "arm64e"),
        ];

        let err = orch.run(&targets, &platforms, true).unwrap_err();
        assert!(matches!(err, BuildError::BuildFailure { .. }));
        assert_eq!(
            err.to_string(),
            "failed to build first for iphonesimulator 12.0 on arm64"
        );
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("compiler exploded"));

        let log = log.borrow();
        let builds = log.iter().filter(|e| matches!(e, Event::Build(..))).count();
        assert_eq!(builds, 2);
        assert!(!log.contains(&Event::Package("second".into())));
        assert!(!log.contains(&Event::Env("arm64e".into())));
    }

    #[test]
    fn package_failure_stops_before_any_build() {
        let backend = RecordingBackend {
            fail_package: Some("missing".into()),
            ..Default::default()
        };
        let log = Rc::clone(&backend.log);
        let mut orch = Orchestrator::new(backend);
        let targets = BuildTargetSpec::parse_all(["missing", "other"]).unwrap();

        let err = orch.run(&targets, &platforms(), true).unwrap_err();
        assert!(matches!(err, BuildError::PackageFailure { .. }));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn empty_inputs_do_nothing() {
        let mut orch = Orchestrator::new(RecordingBackend::default());
        let summary = orch.run(&[], &platforms(), true).unwrap();
        assert_eq!(summary, RunSummary::default());

        let targets = [BuildTargetSpec::named("a")];
        let summary = orch.run(&targets, &[], true).unwrap();
        assert_eq!((summary.targets, summary.steps), (1, 0));
    }

    #[test]
    fn plan_matches_run_order() {
        let targets = BuildTargetSpec::parse_all(["a", "b"]).unwrap();
        let plan = plan(&targets, &platforms(), true);

        let backend = RecordingBackend::default();
        let log = Rc::clone(&backend.log);
        Orchestrator::new(backend)
            .run(&targets, &platforms(), true)
            .unwrap();

        let planned: Vec<_> = plan.steps.iter().map(step_key).collect();
        assert_eq!(planned, prepares(&log));
        assert_eq!(plan.steps[3].index, 0);
    }

    #[test]
    fn plan_display_and_json() {
        let plan = plan(&[BuildTargetSpec::named("a")], &platforms()[..2], true);
        let text = plan.to_string();
        assert!(text.contains("  1. a for iphoneos 12.0 on arm64 (clean)"));
        assert!(text.contains("  2. a for iphonesimulator 12.0 on arm64\n"));

        let json: serde_json::Value = serde_json::from_str(&plan.to_json().unwrap()).unwrap();
        assert_eq!(json["steps"][0]["clean"], true);
        assert_eq!(json["steps"][1]["platform"]["sdk-version"], "12.0");
        assert!(json["steps"][1]["target"]["build-number"].is_null());
    }
}
