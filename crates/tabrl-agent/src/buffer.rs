//! Returns buffer for Monte Carlo control

use serde::Serialize;
use std::collections::BTreeMap;

use tabrl_core::{Action, StateKey};

/// Running statistics for the returns observed from one state-action pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunningMean {
    /// Returns recorded
    pub count: usize,
    /// Mean of those returns
    pub mean: f64,
}

impl RunningMean {
    /// Fold one more sample into the mean
    #[allow(clippy::cast_precision_loss)]
    pub fn push(&mut self, sample: f64) -> f64 {
        self.count += 1;
        self.mean += (sample - self.mean) / self.count as f64;
        self.mean
    }
}

/// Per-pair running means of observed returns
///
/// Only the count and the mean are kept, so memory stays proportional to the
/// number of visited pairs rather than the number of visits.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnsBuffer<A: Ord> {
    stats: BTreeMap<(StateKey, A), RunningMean>,
}

impl<A: Action> ReturnsBuffer<A> {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self {
            stats: BTreeMap::new(),
        }
    }

    /// Record a return for `(state, action)` and get the updated mean
    pub fn record(&mut self, state: StateKey, action: A, ret: f64) -> f64 {
        self.stats.entry((state, action)).or_default().push(ret)
    }

    /// Returns recorded for the pair
    #[must_use]
    pub fn count(&self, state: &StateKey, action: A) -> usize {
        self.get(state, action).map_or(0, |s| s.count)
    }

    /// Mean recorded return for the pair
    #[must_use]
    pub fn mean(&self, state: &StateKey, action: A) -> Option<f64> {
        self.get(state, action).map(|s| s.mean)
    }

    fn get(&self, state: &StateKey, action: A) -> Option<&RunningMean> {
        // BTreeMap lookups need an owned tuple key
        self.stats.get(&(state.clone(), action))
    }

    /// Number of pairs seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Drop every statistic
    pub fn clear(&mut self) {
        self.stats.clear();
    }
}

impl<A: Action> Default for ReturnsBuffer<A> {
    fn default() -> Self {
        Self::new()
    }
}
