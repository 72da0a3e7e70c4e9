//! TD(0) state-value learning with a derived greedy policy

use rand::rngs::StdRng;
use tracing::trace;

use tabrl_core::{
    checked_actions, run_episode, uniform_action, AgentConfig, AlgorithmKind, Controller,
    Environment, EpisodeReport, Learner, PolicyTable, RLError, Result, StateKey, TabularAgent,
    Transition, ValueTable,
};

use crate::utils::greedy_action;

/// TD(0) agent
///
/// Behaves uniformly at random and learns V online. The policy is not
/// learned directly: after every episode it is recomputed for each
/// enumerable state by one-step lookahead through `probe`.
#[derive(Debug, Clone)]
pub struct TemporalDifference<E: Environment> {
    config: AgentConfig,
    rng: StdRng,
    values: ValueTable,
    policy: PolicyTable<E::Action>,
}

impl<E: Environment> TemporalDifference<E> {
    /// Create an agent with empty tables
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: config.rng(),
            config,
            values: ValueTable::new(),
            policy: PolicyTable::new(),
        })
    }

    /// Recompute the greedy policy over every enumerable state
    pub fn refresh_policy(&mut self, env: &E) -> Result<()> {
        for state in env.all_states() {
            if env.is_terminal(&state) {
                continue;
            }
            let (action, _) = greedy_action(env, &self.values, &state, self.config.gamma)?;
            self.policy.set(state, action);
        }
        Ok(())
    }
}

impl<E: Environment> Controller<E> for TemporalDifference<E> {
    fn act(&mut self, env: &E, state: &StateKey) -> Result<E::Action> {
        let actions = checked_actions(env, state)?;
        uniform_action(&mut self.rng, &actions).ok_or_else(|| RLError::EmptyActionSet(state.to_string()))
    }

    fn observe(&mut self, _env: &E, t: &Transition<E::Action>) -> Result<()> {
        let next = if t.done { 0.0 } else { self.values.get(&t.next_state) };
        let current = self.values.get(&t.state);
        let target = t.reward.0 + self.config.gamma * next;
        self.values
            .set(t.state.clone(), current + self.config.alpha * (target - current));
        Ok(())
    }
}

impl<E: Environment> TabularAgent<E> for TemporalDifference<E> {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::TemporalDifference
    }

    fn values(&self) -> ValueTable {
        self.values.clone()
    }

    fn policy(&self) -> PolicyTable<E::Action> {
        self.policy.clone()
    }
}

impl<E: Environment> Learner<E> for TemporalDifference<E> {
    fn train_episode(&mut self, env: &mut E) -> Result<EpisodeReport> {
        let max_steps = self.config.max_steps;
        let trajectory = run_episode(env, self, max_steps)?;
        self.refresh_policy(env)?;
        trace!(states = self.values.len(), "td policy refreshed");

        Ok(EpisodeReport {
            total_reward: trajectory.total_reward,
            steps: trajectory.len(),
            done: trajectory.finished(),
            truncated: trajectory.truncated(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tabrl_core::Reward;
    use tabrl_env::{GridAction, GridWorld, MountainCar};

    fn agent() -> TemporalDifference<GridWorld> {
        TemporalDifference::new(AgentConfig {
            seed: Some(4),
            ..AgentConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn update_moves_toward_target() {
        let env = GridWorld::default();
        let mut td = agent();
        let t = Transition {
            state: StateKey::pair(3, 4),
            action: GridAction::Down,
            reward: Reward(10.0),
            next_state: StateKey::pair(4, 4),
            done: true,
            truncated: false,
        };
        td.observe(&env, &t).unwrap();
        assert_relative_eq!(td.values().get(&StateKey::pair(3, 4)), 1.0);

        td.observe(&env, &t).unwrap();
        assert_relative_eq!(td.values().get(&StateKey::pair(3, 4)), 1.9);
    }

    #[test]
    fn policy_covers_grid_after_an_episode() {
        let mut env = GridWorld::default();
        let mut td = agent();
        td.train_episode(&mut env).unwrap();
        assert_eq!(td.policy().len(), 24);
        assert!(td.q_table().is_none());
    }

    #[test]
    fn mountain_car_learns_values_only() {
        let mut env = MountainCar::default();
        let mut td: TemporalDifference<MountainCar> = TemporalDifference::new(AgentConfig {
            seed: Some(2),
            ..AgentConfig::default()
        })
        .unwrap();
        let report = td.train_episode(&mut env).unwrap();

        assert!(report.steps <= 200);
        assert!(!td.values().is_empty());
        assert!(td.policy().is_empty());
    }
}
