//! End-to-end suite construction over feature files on disk.

mod common;

use anyhow::{Context, Result, ensure};
use camino::Utf8PathBuf;
use common::{FeatureTree, SAMPLE_FEATURES};
use dependsload::{
    config::SuiteConfig,
    loader::FeatureLoader,
    resolver::ResolveError,
    scenario::Signature,
    suite::{SuiteError, SuitePlan, build_suite},
    tracker::{PassTracker, TestStart},
};
use rstest::rstest;

fn build(config: &SuiteConfig) -> Result<SuitePlan, SuiteError> {
    let loader = FeatureLoader::new(config.root.clone());
    build_suite(config, &loader)
}

fn sample_config() -> SuiteConfig {
    SuiteConfig::new(SAMPLE_FEATURES)
}

fn order(plan: &SuitePlan) -> Vec<String> {
    plan.signatures().map(|s| s.as_str().to_owned()).collect()
}

/// Assert every recorded dependency appears earlier in the plan.
fn assert_topological(plan: &SuitePlan) -> Result<()> {
    for (idx, scenario) in plan.scenarios().iter().enumerate() {
        for dep in scenario.dependencies() {
            let pos = plan
                .position_of(dep)
                .with_context(|| format!("{dep} missing from plan"))?;
            ensure!(pos < idx, "{dep} must precede {}", scenario.signature());
        }
    }
    Ok(())
}

#[rstest]
fn dependency_is_injected_before_dependent() -> Result<()> {
    let tree = FeatureTree::new()?
        .feature(
            "login/a.feature",
            "Feature: Login\n  @DependsLoad setup:Create Base User\n  Scenario: A\n",
        )?
        .feature("setup/users.feature", "Feature: Setup\n  Scenario: Create Base User\n")?;
    let mut config = SuiteConfig::new(tree.root());
    config.paths = vec![Utf8PathBuf::from("login")];

    let plan = build(&config)?;
    assert_eq!(order(&plan), ["setup/users:Create Base User", "login/a:A"]);
    let a = plan
        .get(&Signature::new("login/a:A"))
        .context("dependent in plan")?;
    assert_eq!(a.dependencies(), [Signature::new("setup/users:Create Base User")]);
    Ok(())
}

#[rstest]
fn rule_level_directive_applies_to_its_scenarios() -> Result<()> {
    let tree = FeatureTree::new()?
        .feature(
            "login/a.feature",
            "Feature: Login\n  @DependsLoad setup:Base\n  Rule: signed in\n    Scenario: A\n",
        )?
        .feature("setup/u.feature", "Feature: Setup\n  Scenario: Base\n")?;
    let mut config = SuiteConfig::new(tree.root());
    config.paths = vec![Utf8PathBuf::from("login")];
    let plan = build(&config)?;
    assert_eq!(order(&plan), ["setup/u:Base", "login/a:A"]);
    let a = plan.get(&Signature::new("login/a:A")).context("dependent in plan")?;
    assert_eq!(a.dependencies(), [Signature::new("setup/u:Base")]);
    Ok(())
}

#[rstest]
fn missing_directory_aborts_the_build() -> Result<()> {
    let tree = FeatureTree::new()?.feature(
        "login/b.feature",
        "Feature: Login\n  @DependsLoad nosuch:Anything\n  Scenario: B\n",
    )?;
    let err = build(&SuiteConfig::new(tree.root())).expect_err("missing directory");
    let SuiteError::Resolve(ResolveError::DirectoryNotFound { file, directory }) = err else {
        panic!("unexpected error: {err:?}");
    };
    assert!(file.ends_with("login/b.feature"), "{file}");
    assert_eq!(directory, "nosuch");
    Ok(())
}

#[rstest]
fn missing_title_aborts_the_build() -> Result<()> {
    let tree = FeatureTree::new()?
        .feature(
            "login/e.feature",
            "Feature: Login\n  @DependsLoad setup:Missing Title\n  Scenario: E\n",
        )?
        .feature("setup/users.feature", "Feature: Setup\n  Scenario: Create Base User\n")?;
    let mut config = SuiteConfig::new(tree.root());
    config.paths = vec![Utf8PathBuf::from("login")];
    let err = build(&config).expect_err("missing title");
    let msg = err.to_string();
    assert!(msg.contains("e.feature"), "{msg}");
    assert!(msg.contains("\"Missing Title\""), "{msg}");
    assert!(msg.contains("\"setup\""), "{msg}");
    Ok(())
}

#[rstest]
fn shared_dependency_appears_once_before_both_dependents() -> Result<()> {
    let tree = FeatureTree::new()?
        .feature(
            "reports/r.feature",
            concat!(
                "Feature: Reports\n",
                "  @DependsLoad setup:Create Base User\n",
                "  Scenario: C\n",
                "  @DependsLoad setup:Create Base User\n",
                "  Scenario: D\n",
            ),
        )?
        .feature("setup/users.feature", "Feature: Setup\n  Scenario: Create Base User\n")?;
    let mut config = SuiteConfig::new(tree.root());
    config.paths = vec![Utf8PathBuf::from("reports")];
    let plan = build(&config)?;
    assert_eq!(
        order(&plan),
        ["setup/users:Create Base User", "reports/r:C", "reports/r:D"]
    );
    Ok(())
}

#[rstest]
fn cyclic_directives_are_rejected() -> Result<()> {
    let tree = FeatureTree::new()?.feature(
        "loop/l.feature",
        concat!(
            "Feature: Loop\n",
            "  @DependsLoad loop:Pong\n",
            "  Scenario: Ping\n",
            "  @DependsLoad loop:Ping\n",
            "  Scenario: Pong\n",
        ),
    )?;
    let err = build(&SuiteConfig::new(tree.root())).expect_err("cycle");
    assert!(
        matches!(err, SuiteError::Resolve(ResolveError::CyclicDependency { .. })),
        "{err:?}"
    );
    assert!(err.to_string().contains("loop/l:Ping -> loop/l:Pong -> loop/l:Ping"));
    Ok(())
}

#[rstest]
fn whole_sample_tree_is_topological_without_duplicates() -> Result<()> {
    let plan = build(&sample_config())?;
    let signatures = order(&plan);
    let mut unique = signatures.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), signatures.len(), "{signatures:?}");
    assert_topological(&plan)
}

#[rstest]
fn sample_tree_order_is_exact_and_stable() -> Result<()> {
    let first = build(&sample_config())?;
    assert_eq!(
        order(&first),
        [
            "setup/users:Create Base User",
            "login/sign_in:Sign in as base user",
            "setup/users:Create Admin",
            "login/sign_in:Sign in as admin",
            "reports/daily:Daily report",
        ]
    );
    let second = build(&sample_config())?;
    assert_eq!(order(&first), order(&second));
    Ok(())
}

#[rstest]
#[case("smoke", &[
    "setup/users:Create Base User",
    "login/sign_in:Sign in as base user",
    "setup/users:Create Admin",
    "login/sign_in:Sign in as admin",
])]
#[case("nightly", &[
    "setup/users:Create Base User",
    "setup/users:Create Admin",
    "login/sign_in:Sign in as admin",
    "reports/daily:Daily report",
])]
fn group_filter_pulls_in_dependencies(
    #[case] group: &str,
    #[case] expected: &[&str],
) -> Result<()> {
    let mut config = sample_config();
    config.groups = vec![group.to_owned()];
    let plan = build(&config)?;
    assert_eq!(order(&plan), expected);
    for scenario in plan.scenarios() {
        assert_eq!(scenario.groups().iter().collect::<Vec<_>>(), [group]);
    }
    assert_topological(&plan)
}

#[rstest]
fn excluded_group_and_title_filter_narrow_candidates() -> Result<()> {
    let mut config = sample_config();
    config.exclude_groups = vec!["setup".to_owned(), "nightly".to_owned()];
    config.filter = Some("BASE USER".to_owned());
    let plan = build(&config)?;
    assert_eq!(
        order(&plan),
        [
            "setup/users:Create Base User",
            "login/sign_in:Sign in as base user",
        ]
    );
    Ok(())
}

#[rstest]
fn suite_context_reaches_every_dependency() -> Result<()> {
    let mut config = sample_config();
    config.paths = vec![Utf8PathBuf::from("reports")];
    config.actor = Some("AcceptanceTester".to_owned());
    config.modules = vec!["WebDriver".to_owned()];
    let plan = build(&config)?;
    ensure!(plan.len() == 4, "expected the report and its closure");
    for scenario in plan.scenarios() {
        assert_eq!(scenario.current_actor(), Some("AcceptanceTester"));
        assert_eq!(scenario.services().modules, ["WebDriver"]);
    }
    Ok(())
}

#[rstest]
fn tracker_skips_until_dependencies_pass() -> Result<()> {
    let mut plan = build(&sample_config())?;
    let mut tracker = PassTracker::new();
    let scenarios = plan.scenarios_mut();

    // Create Base User fails: nothing depending on it may run.
    let (base, rest) = scenarios.split_first_mut().context("non-empty plan")?;
    assert_eq!(tracker.on_test_start(base), TestStart::Run);
    for scenario in rest.iter_mut() {
        if scenario.dependencies().is_empty() {
            continue;
        }
        assert!(
            matches!(tracker.on_test_start(scenario), TestStart::Skip(_)),
            "{} should be skipped",
            scenario.signature()
        );
    }

    // Once it passes, its direct dependents become runnable.
    tracker.on_test_success(base);
    let sign_in = rest.first_mut().context("sign in scenario")?;
    assert_eq!(tracker.on_test_start(sign_in), TestStart::Run);
    assert_eq!(sign_in.skip_reason(), None);
    Ok(())
}
