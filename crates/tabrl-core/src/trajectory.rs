//! Trajectories and the shared episode driver

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{Environment, Reward, StateKey};

/// Single transition in a trajectory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition<A> {
    /// State the action was taken from
    pub state: StateKey,
    /// Action taken
    pub action: A,
    /// Reward received
    pub reward: Reward,
    /// Resulting state
    pub next_state: StateKey,
    /// Whether the episode ended
    pub done: bool,
    /// Whether the ending was a step cap inside the environment
    pub truncated: bool,
}

/// Complete trajectory of an episode
#[derive(Debug, Clone)]
pub struct Trajectory<A> {
    /// Sequence of transitions
    pub transitions: Vec<Transition<A>>,
    /// Total (undiscounted) reward
    pub total_reward: f64,
}

impl<A> Trajectory<A> {
    /// Create a new empty trajectory
    #[must_use]
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
            total_reward: 0.0,
        }
    }

    /// Add a transition to the trajectory
    pub fn push(&mut self, transition: Transition<A>) {
        self.total_reward += transition.reward.0;
        self.transitions.push(transition);
    }

    /// Get the length of the trajectory
    #[must_use]
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Check if trajectory is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Whether the last transition ended the episode
    #[must_use]
    pub fn finished(&self) -> bool {
        self.transitions.last().is_some_and(|t| t.done)
    }

    /// Whether the last transition was cut off by the environment's own cap
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.transitions.last().is_some_and(|t| t.truncated)
    }

    /// Discounted return from every step, computed backward as `G = r + γ·G`
    #[must_use]
    pub fn returns(&self, gamma: f64) -> Vec<f64> {
        let mut returns = vec![0.0; self.len()];
        let mut running_return = 0.0;

        for i in (0..self.len()).rev() {
            running_return = self.transitions[i].reward.0 + gamma * running_return;
            returns[i] = running_return;
        }

        returns
    }
}

impl<A> Default for Trajectory<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Decision-making half of an episode rollout
///
/// [`run_episode`] asks the controller for an action, steps the
/// environment, then hands the transition back through `observe` before the
/// next decision. Online learners update their tables in `observe`.
pub trait Controller<E: Environment> {
    /// Pick the action to take from `state`
    fn act(&mut self, env: &E, state: &StateKey) -> crate::Result<E::Action>;

    /// Learn from a transition that just happened
    fn observe(&mut self, _env: &E, _transition: &Transition<E::Action>) -> crate::Result<()> {
        Ok(())
    }
}

/// Run one trajectory from `reset()` until `done` or `max_steps` transitions
pub fn run_episode<E, C>(
    env: &mut E,
    controller: &mut C,
    max_steps: usize,
) -> crate::Result<Trajectory<E::Action>>
where
    E: Environment,
    C: Controller<E> + ?Sized,
{
    let mut trajectory = Trajectory::new();
    let mut state = env.reset();

    for _ in 0..max_steps {
        let action = controller.act(env, &state)?;
        let step = env.step(action)?;

        let transition = Transition {
            state,
            action,
            reward: step.reward,
            next_state: step.state,
            done: step.done,
            truncated: step.truncated,
        };
        controller.observe(env, &transition)?;

        state = transition.next_state.clone();
        let done = transition.done;
        trajectory.push(transition);

        if done {
            break;
        }
    }

    trace!(
        env = env.name(),
        steps = trajectory.len(),
        total_reward = trajectory.total_reward,
        "episode finished"
    );
    Ok(trajectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn transition(reward: f64, done: bool) -> Transition<u8> {
        Transition {
            state: StateKey::pair(0, 0),
            action: 0,
            reward: Reward(reward),
            next_state: StateKey::pair(0, 0),
            done,
            truncated: false,
        }
    }

    #[test]
    fn accumulates_total_reward() {
        let mut trajectory = Trajectory::new();
        trajectory.push(transition(-1.0, false));
        trajectory.push(transition(-1.0, false));
        trajectory.push(transition(0.0, true));

        assert_eq!(trajectory.len(), 3);
        assert_relative_eq!(trajectory.total_reward, -2.0);
        assert!(trajectory.finished());
        assert!(!trajectory.truncated());
    }

    #[test]
    fn returns_are_discounted_backward() {
        let mut trajectory = Trajectory::new();
        trajectory.push(transition(-0.1, false));
        trajectory.push(transition(-0.1, false));
        trajectory.push(transition(10.0, true));

        let returns = trajectory.returns(0.9);
        assert_relative_eq!(returns[2], 10.0);
        assert_relative_eq!(returns[1], -0.1 + 0.9 * 10.0);
        assert_relative_eq!(returns[0], -0.1 + 0.9 * (-0.1 + 0.9 * 10.0));
    }

    #[test]
    fn empty_trajectory_has_no_returns() {
        let trajectory: Trajectory<u8> = Trajectory::default();
        assert!(trajectory.returns(0.9).is_empty());
        assert!(!trajectory.finished());
    }
}
