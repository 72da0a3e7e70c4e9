//! Tabular stores: state values, policies and action values
//!
//! All three tables are lazily populated ordered maps. Missing entries fail
//! soft: values read as `0.0`, policies fall back to a caller-supplied
//! default action.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::policy::argmax_first;
use crate::{Action, StateKey};

/// State value table V(s)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueTable {
    values: BTreeMap<StateKey, f64>,
}

impl ValueTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `state`, 0 when unseen
    #[must_use]
    pub fn get(&self, state: &StateKey) -> f64 {
        self.values.get(state).copied().unwrap_or(0.0)
    }

    /// Whether `state` has an entry
    #[must_use]
    pub fn contains(&self, state: &StateKey) -> bool {
        self.values.contains_key(state)
    }

    /// Update value for a state, returning the previous value (0 when unseen)
    pub fn set(&mut self, state: StateKey, value: f64) -> f64 {
        self.values.insert(state, value).unwrap_or(0.0)
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    /// Number of stored states
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(StateKey, f64)> for ValueTable {
    fn from_iter<I: IntoIterator<Item = (StateKey, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Deterministic policy table π(s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyTable<A: Ord> {
    actions: BTreeMap<StateKey, A>,
}

impl<A: Action> PolicyTable<A> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }

    /// Stored action for `state`
    #[must_use]
    pub fn get(&self, state: &StateKey) -> Option<A> {
        self.actions.get(state).copied()
    }

    /// Stored action for `state`, or `default` when unseen
    #[must_use]
    pub fn action_or(&self, state: &StateKey, default: A) -> A {
        self.get(state).unwrap_or(default)
    }

    /// Set the action for a state, returning the previous one
    pub fn set(&mut self, state: StateKey, action: A) -> Option<A> {
        self.actions.insert(state, action)
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, A)> {
        self.actions.iter().map(|(k, a)| (k, *a))
    }

    /// Number of stored states
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<A: Action> Default for PolicyTable<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Action> FromIterator<(StateKey, A)> for PolicyTable<A> {
    fn from_iter<I: IntoIterator<Item = (StateKey, A)>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

/// Action value table Q(s, a)
///
/// A row is created the first time a state is written, with every valid
/// action of that state initialised to zero. Keeping full rows means the row
/// maximum is always the maximum over all valid actions, so derived values
/// and greedy policies agree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QTable<A: Ord> {
    rows: BTreeMap<StateKey, BTreeMap<A, f64>>,
}

impl<A: Action> QTable<A> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }

    /// Q-value for a state-action pair, 0 when unseen
    #[must_use]
    pub fn get(&self, state: &StateKey, action: A) -> f64 {
        self.rows
            .get(state)
            .and_then(|row| row.get(&action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Whether `state` has a row
    #[must_use]
    pub fn contains_state(&self, state: &StateKey) -> bool {
        self.rows.contains_key(state)
    }

    /// Row for `state`, if any
    #[must_use]
    pub fn row(&self, state: &StateKey) -> Option<&BTreeMap<A, f64>> {
        self.rows.get(state)
    }

    /// Set a Q-value, creating the row over `valid` first if needed
    pub fn set(&mut self, state: StateKey, action: A, valid: &[A], value: f64) {
        let row = self
            .rows
            .entry(state)
            .or_insert_with(|| valid.iter().map(|a| (*a, 0.0)).collect());
        row.insert(action, value);
    }

    /// Highest Q-value over `actions`, 0 when the state is unseen or no actions are given
    #[must_use]
    pub fn max_value(&self, state: &StateKey, actions: &[A]) -> f64 {
        self.best_action(state, actions).map_or(0.0, |(_, v)| v)
    }

    /// Greedy action over `actions` with first-max tie-break
    #[must_use]
    pub fn best_action(&self, state: &StateKey, actions: &[A]) -> Option<(A, f64)> {
        argmax_first(actions.iter().map(|a| (*a, self.get(state, *a))))
    }

    /// Derived state values `V(s) = max_a Q(s, a)` over visited states
    #[must_use]
    pub fn state_values(&self) -> ValueTable {
        self.rows
            .iter()
            .filter_map(|(state, row)| {
                row.values()
                    .copied()
                    .reduce(f64::max)
                    .map(|v| (state.clone(), v))
            })
            .collect()
    }

    /// Derived greedy policy over visited states, row order as tie-break
    #[must_use]
    pub fn greedy_policy(&self) -> PolicyTable<A> {
        self.rows
            .iter()
            .filter_map(|(state, row)| {
                argmax_first(row.iter().map(|(a, v)| (*a, *v))).map(|(a, _)| (state.clone(), a))
            })
            .collect()
    }

    /// Iterate rows in key order
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &BTreeMap<A, f64>)> {
        self.rows.iter()
    }

    /// Number of visited states
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no state has been visited
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<A: Action> Default for QTable<A> {
    fn default() -> Self {
        Self::new()
    }
}
