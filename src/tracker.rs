//! Pass-state tracking across one run.
//!
//! The runner calls [`PassTracker::on_test_start`] before executing a
//! scenario and [`PassTracker::on_test_success`] after it passes. A scenario
//! whose recorded dependencies have not all passed is skipped with a reason
//! naming the first unmet one.
//!
//! ```
//! use dependsload::scenario::{Scenario, ScenarioSource, Signature};
//! use dependsload::tracker::{PassTracker, TestStart};
//!
//! let source = |title: &str| ScenarioSource {
//!     file: "features/setup/users.feature".into(),
//!     location: "setup/users".into(),
//!     title: title.into(),
//!     line: 1,
//!     tags: Vec::new(),
//!     row: Vec::new(),
//! };
//! let base = Scenario::new(source("Create Base User"));
//! let mut admin = Scenario::new(source("Create Admin"));
//! admin.set_dependencies(vec![base.signature().clone()]);
//!
//! let mut tracker = PassTracker::new();
//! assert!(matches!(tracker.on_test_start(&mut admin), TestStart::Skip(_)));
//! tracker.on_test_success(&base);
//! assert_eq!(tracker.on_test_start(&mut admin), TestStart::Run);
//! ```

use indexmap::IndexSet;
use tracing::{debug, info};

use crate::scenario::{Scenario, Signature};

/// Outcome of the test-start hook.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TestStart {
    /// Every recorded dependency has passed.
    Run,
    /// A dependency has not passed; the scenario must not execute.
    Skip(String),
}

/// Remembers which scenarios have passed during the current run.
#[derive(Debug, Default)]
pub struct PassTracker {
    successful: IndexSet<Signature>,
}

impl PassTracker {
    /// Create a tracker with nothing passed yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `scenario` may run, recording a skip reason on it when
    /// it may not.
    pub fn on_test_start(&self, scenario: &mut Scenario) -> TestStart {
        let first_unmet = self.unmet_dependencies(scenario).next().cloned();
        match first_unmet {
            Some(dependency) => {
                let reason = format!("This test depends on {dependency} to pass");
                info!(
                    signature = %scenario.signature(),
                    %dependency,
                    "skipping scenario with unmet dependency"
                );
                scenario.set_skip(reason.clone());
                TestStart::Skip(reason)
            }
            None => {
                scenario.clear_skip();
                TestStart::Run
            }
        }
    }

    /// Record that `scenario` passed.
    pub fn on_test_success(&mut self, scenario: &Scenario) {
        debug!(signature = %scenario.signature(), "scenario passed");
        self.successful.insert(scenario.signature().clone());
    }

    /// Recorded dependencies of `scenario` that have not passed, in order.
    pub fn unmet_dependencies<'a>(
        &'a self,
        scenario: &'a Scenario,
    ) -> impl Iterator<Item = &'a Signature> + 'a {
        scenario
            .dependencies()
            .iter()
            .filter(|dep| !self.successful.contains(*dep))
    }

    /// Whether `signature` has passed in this run.
    #[must_use]
    pub fn has_passed(&self, signature: &Signature) -> bool {
        self.successful.contains(signature)
    }

    /// Signatures that passed, in the order they passed.
    pub fn successful(&self) -> impl Iterator<Item = &Signature> {
        self.successful.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::tests::scenario;

    fn dependent_on(deps: &[&Scenario]) -> Scenario {
        let mut s = scenario("login/sign_in", "Sign in", &[]);
        s.set_dependencies(deps.iter().map(|d| d.signature().clone()).collect());
        s
    }

    #[test]
    fn scenario_without_dependencies_runs() {
        let tracker = PassTracker::new();
        let mut s = scenario("setup/users", "Create", &[]);
        assert_eq!(tracker.on_test_start(&mut s), TestStart::Run);
        assert_eq!(s.skip_reason(), None);
    }

    #[test]
    fn unmet_dependency_skips_with_its_signature() {
        let tracker = PassTracker::new();
        let base = scenario("setup/users", "Create Base User", &[]);
        let mut dependent = dependent_on(&[&base]);
        let outcome = tracker.on_test_start(&mut dependent);
        let expected = "This test depends on setup/users:Create Base User to pass";
        assert_eq!(outcome, TestStart::Skip(expected.to_owned()));
        assert_eq!(dependent.skip_reason(), Some(expected));
    }

    #[test]
    fn skip_names_first_unmet_dependency() {
        let mut tracker = PassTracker::new();
        let first = scenario("setup/a", "First", &[]);
        let second = scenario("setup/b", "Second", &[]);
        let mut dependent = dependent_on(&[&first, &second]);
        tracker.on_test_success(&first);

        let unmet: Vec<_> = tracker.unmet_dependencies(&dependent).cloned().collect();
        assert_eq!(unmet, [second.signature().clone()]);
        let outcome = tracker.on_test_start(&mut dependent);
        assert!(
            matches!(&outcome, TestStart::Skip(reason) if reason.contains("setup/b:Second")),
            "{outcome:?}"
        );
    }

    #[test]
    fn success_clears_the_skip_for_later_starts() {
        let mut tracker = PassTracker::new();
        let base = scenario("setup/users", "Create Base User", &[]);
        let mut dependent = dependent_on(&[&base]);
        assert!(matches!(
            tracker.on_test_start(&mut dependent),
            TestStart::Skip(_)
        ));

        tracker.on_test_success(&base);
        assert!(tracker.has_passed(base.signature()));
        assert_eq!(tracker.unmet_dependencies(&dependent).count(), 0);
        assert_eq!(tracker.on_test_start(&mut dependent), TestStart::Run);
        assert_eq!(dependent.skip_reason(), None);
    }

    #[test]
    fn successes_are_recorded_once_in_order() {
        let mut tracker = PassTracker::new();
        let a = scenario("d/f", "A", &[]);
        let b = scenario("d/f", "B", &[]);
        tracker.on_test_success(&b);
        tracker.on_test_success(&a);
        tracker.on_test_success(&b);
        let passed: Vec<_> = tracker.successful().map(Signature::as_str).collect();
        assert_eq!(passed, ["d/f:B", "d/f:A"]);
    }
}
