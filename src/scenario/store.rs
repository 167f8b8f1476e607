//! Identity-interned storage for scenarios discovered during one suite build.

use std::collections::HashMap;
use std::fmt;

use super::{Scenario, Signature};

/// Stable handle to a scenario held by a [`ScenarioStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScenarioId(usize);

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arena owning every scenario seen while building a suite.
///
/// A scenario reached both as a suite candidate and as a dependency is stored
/// once; the first record for a signature wins.
#[derive(Debug, Default)]
pub struct ScenarioStore {
    scenarios: Vec<Scenario>,
    by_signature: HashMap<Signature, ScenarioId>,
}

impl ScenarioStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `scenario`, returning the identity of the record now owning its
    /// signature.
    pub fn intern(&mut self, scenario: Scenario) -> ScenarioId {
        if let Some(id) = self.by_signature.get(scenario.signature()) {
            return *id;
        }
        let id = ScenarioId(self.scenarios.len());
        self.by_signature.insert(scenario.signature().clone(), id);
        self.scenarios.push(scenario);
        id
    }

    /// Borrow the scenario behind `id`.
    #[must_use]
    pub fn get(&self, id: ScenarioId) -> Option<&Scenario> {
        self.scenarios.get(id.0)
    }

    /// Mutably borrow the scenario behind `id`.
    #[must_use]
    pub fn get_mut(&mut self, id: ScenarioId) -> Option<&mut Scenario> {
        self.scenarios.get_mut(id.0)
    }

    /// Move the scenarios named by `order` out of the store, in that order.
    ///
    /// Identities not owned by this store are ignored.
    #[must_use]
    pub fn into_ordered<I>(self, order: I) -> Vec<Scenario>
    where
        I: IntoIterator<Item = ScenarioId>,
    {
        let mut slots: Vec<Option<Scenario>> = self.scenarios.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|id| slots.get_mut(id.0).and_then(Option::take))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::tests::scenario;

    #[test]
    fn interning_reuses_existing_signature() {
        let mut store = ScenarioStore::new();
        let first = store.intern(scenario("setup/users", "Create", &["a"]));
        let second = store.intern(scenario("setup/users", "Create", &["b"]));
        assert_eq!(first, second);
        let kept = store.get(first).expect("scenario");
        assert_eq!(kept.tags(), ["a"]);
    }

    #[test]
    fn into_ordered_follows_requested_order() {
        let mut store = ScenarioStore::new();
        let a = store.intern(scenario("d/f", "A", &[]));
        let b = store.intern(scenario("d/f", "B", &[]));
        let ordered = store.into_ordered([b, a, b]);
        let titles: Vec<_> = ordered.iter().map(Scenario::title).collect();
        assert_eq!(titles, ["B", "A"]);
    }
}
