//! Action selection: greedy, uniform and epsilon-greedy

use rand::Rng;

use crate::{Action, QTable, StateKey};

/// Maximum over `(item, value)` pairs; the earliest item wins ties
pub fn argmax_first<T>(candidates: impl IntoIterator<Item = (T, f64)>) -> Option<(T, f64)> {
    let mut best: Option<(T, f64)> = None;
    for (item, value) in candidates {
        if best.as_ref().map_or(true, |(_, best_value)| value > *best_value) {
            best = Some((item, value));
        }
    }
    best
}

/// Uniform index in `0..n` drawn as `floor(u·n)` with `u` uniform in `[0, 1)`
///
/// Every algorithm samples indices this way, so a seeded generator drives
/// all of them identically.
///
/// # Panics
///
/// Panics if `n` is zero.
pub fn sample_index<R: Rng + ?Sized>(rng: &mut R, n: usize) -> usize {
    assert!(n > 0, "cannot sample from an empty range");
    let u: f64 = rng.gen();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let index = (u * n as f64).floor() as usize;
    index.min(n - 1)
}

/// Uniformly random element of `actions`
pub fn uniform_action<A: Copy, R: Rng + ?Sized>(rng: &mut R, actions: &[A]) -> Option<A> {
    if actions.is_empty() {
        None
    } else {
        Some(actions[sample_index(rng, actions.len())])
    }
}

/// Epsilon-greedy selection over a Q-table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonGreedy {
    /// Exploration rate
    pub epsilon: f64,
}

impl EpsilonGreedy {
    /// Create a new epsilon-greedy selector
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }

    /// Set the exploration rate
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    /// Explore uniformly with probability ε, otherwise act greedily by `q`
    ///
    /// Unseen states resolve to the first valid action. Returns `None` only
    /// when `actions` is empty.
    pub fn select<A, R>(&self, rng: &mut R, q: &QTable<A>, state: &StateKey, actions: &[A]) -> Option<A>
    where
        A: Action,
        R: Rng + ?Sized,
    {
        if rng.gen::<f64>() < self.epsilon {
            return uniform_action(rng, actions);
        }
        if !q.contains_state(state) {
            return actions.first().copied();
        }
        q.best_action(state, actions).map(|(a, _)| a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn argmax_keeps_first_maximum() {
        let picked = argmax_first(vec![("a", 1.0), ("b", 3.0), ("c", 3.0), ("d", 2.0)]);
        assert_eq!(picked, Some(("b", 3.0)));
        assert_eq!(argmax_first(Vec::<(u8, f64)>::new()), None);
    }

    #[test]
    fn argmax_handles_all_negative() {
        assert_eq!(argmax_first(vec![(0, -5.0), (1, -1.0)]), Some((1, -1.0)));
    }

    #[test]
    fn sample_index_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(sample_index(&mut rng, 4) < 4);
        }
    }

    #[test]
    fn sample_index_covers_every_slot() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[sample_index(&mut rng, 3)] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn epsilon_is_clamped() {
        assert_eq!(EpsilonGreedy::new(1.7).epsilon, 1.0);
        let mut policy = EpsilonGreedy::new(0.2);
        policy.set_epsilon(-0.5);
        assert_eq!(policy.epsilon, 0.0);
    }

    #[test]
    fn uniform_action_of_nothing_is_none() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(uniform_action::<u8, _>(&mut rng, &[]), None);
    }
}
