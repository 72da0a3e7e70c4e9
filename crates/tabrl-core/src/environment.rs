//! Environment trait and transition results

use serde::{Deserialize, Serialize};

use crate::{Action, RLError, Reward, StateKey};

/// Result of a single environment transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Key of the resulting state
    pub state: StateKey,
    /// Reward signal
    pub reward: Reward,
    /// Whether the episode is done
    pub done: bool,
    /// Whether `done` was caused by a step cap rather than reaching a goal
    pub truncated: bool,
}

impl Step {
    /// Create a non-truncated transition
    #[must_use]
    pub fn new(state: StateKey, reward: f64, done: bool) -> Self {
        Self {
            state,
            reward: Reward(reward),
            done,
            truncated: false,
        }
    }
}

/// Core environment trait
///
/// `step` advances the live trajectory. `probe` answers "what would happen
/// if `action` were taken from `state`" and takes `&self`, so it can never
/// disturb a rollout in progress.
pub trait Environment {
    /// Action alphabet
    type Action: Action;

    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Full ordered action alphabet; the first entry is the default action
    fn actions(&self) -> &[Self::Action];

    /// Return to the start configuration and clear per-episode counters
    fn reset(&mut self) -> StateKey;

    /// Apply `action` to the current state
    fn step(&mut self, action: Self::Action) -> crate::Result<Step>;

    /// Compute the transition from `state` without mutating the environment
    fn probe(&self, state: &StateKey, action: Self::Action) -> crate::Result<Step>;

    /// Key of the live current state
    fn current_state(&self) -> StateKey;

    /// Every state, or nothing when the state space is not enumerable
    fn all_states(&self) -> Vec<StateKey> {
        Vec::new()
    }

    /// Actions legal from `state`
    fn valid_actions(&self, _state: &StateKey) -> Vec<Self::Action> {
        self.actions().to_vec()
    }

    /// Whether `state` is terminal (absorbing, value pinned at zero)
    fn is_terminal(&self, _state: &StateKey) -> bool {
        false
    }
}

/// Valid actions for `state`, failing when the environment offers none
pub fn checked_actions<E>(env: &E, state: &StateKey) -> crate::Result<Vec<E::Action>>
where
    E: Environment + ?Sized,
{
    let actions = env.valid_actions(state);
    if actions.is_empty() {
        return Err(RLError::EmptyActionSet(state.to_string()));
    }
    Ok(actions)
}

/// The environment's default action (first of its alphabet)
pub fn default_action<E>(env: &E) -> crate::Result<E::Action>
where
    E: Environment + ?Sized,
{
    env.actions()
        .first()
        .copied()
        .ok_or_else(|| RLError::Environment(format!("{} has an empty action alphabet", env.name())))
}
