//! Every-visit Monte Carlo control with an ε-greedy behaviour policy

use rand::rngs::StdRng;
use tracing::trace;

use tabrl_core::{
    checked_actions, run_episode, AgentConfig, AlgorithmKind, Controller, Environment,
    EpisodeReport, EpsilonGreedy, Learner, PolicyTable, QTable, RLError, Result, StateKey,
    TabularAgent, ValueTable,
};

use crate::buffer::ReturnsBuffer;

/// Monte Carlo control agent
///
/// Q is only touched after an episode ends: every visited pair gets its
/// discounted return recorded and Q set to the mean of all returns seen for
/// that pair so far.
#[derive(Debug, Clone)]
pub struct MonteCarlo<E: Environment> {
    config: AgentConfig,
    rng: StdRng,
    exploration: EpsilonGreedy,
    q: QTable<E::Action>,
    returns: ReturnsBuffer<E::Action>,
}

impl<E: Environment> MonteCarlo<E> {
    /// Create an agent with empty tables
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: config.rng(),
            exploration: EpsilonGreedy::new(config.epsilon),
            config,
            q: QTable::new(),
            returns: ReturnsBuffer::new(),
        })
    }

    /// ε-greedy action for `state`
    pub fn choose_action(&mut self, env: &E, state: &StateKey) -> Result<E::Action> {
        let actions = checked_actions(env, state)?;
        self.exploration
            .select(&mut self.rng, &self.q, state, &actions)
            .ok_or_else(|| RLError::EmptyActionSet(state.to_string()))
    }

    /// Returns recorded for `(state, action)`
    #[must_use]
    pub fn returns_count(&self, state: &StateKey, action: E::Action) -> usize {
        self.returns.count(state, action)
    }

    /// Mean return recorded for `(state, action)`
    #[must_use]
    pub fn returns_mean(&self, state: &StateKey, action: E::Action) -> Option<f64> {
        self.returns.mean(state, action)
    }
}

impl<E: Environment> Controller<E> for MonteCarlo<E> {
    fn act(&mut self, env: &E, state: &StateKey) -> Result<E::Action> {
        self.choose_action(env, state)
    }
}

impl<E: Environment> TabularAgent<E> for MonteCarlo<E> {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::MonteCarlo
    }

    fn values(&self) -> ValueTable {
        self.q.state_values()
    }

    fn policy(&self) -> PolicyTable<E::Action> {
        self.q.greedy_policy()
    }

    fn q_table(&self) -> Option<&QTable<E::Action>> {
        Some(&self.q)
    }
}

impl<E: Environment> Learner<E> for MonteCarlo<E> {
    fn train_episode(&mut self, env: &mut E) -> Result<EpisodeReport> {
        let max_steps = self.config.max_steps;
        let trajectory = run_episode(env, self, max_steps)?;
        let returns = trajectory.returns(self.config.gamma);

        for (transition, ret) in trajectory.transitions.iter().zip(returns).rev() {
            let mean = self
                .returns
                .record(transition.state.clone(), transition.action, ret);
            let valid = env.valid_actions(&transition.state);
            self.q.set(transition.state.clone(), transition.action, &valid, mean);
        }
        trace!(pairs = self.returns.len(), "monte carlo returns recorded");

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
    use tabrl_env::{GridAction, GridWorld};

    fn agent(epsilon: f64) -> MonteCarlo<GridWorld> {
        MonteCarlo::new(AgentConfig {
            epsilon,
            seed: Some(17),
            ..AgentConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn greedy_on_unseen_state_is_first_action() {
        let env = GridWorld::default();
        let mut mc = agent(0.0);
        assert_eq!(mc.choose_action(&env, &StateKey::pair(2, 3)).unwrap(), GridAction::Up);
    }

    #[test]
    fn episode_fills_q_and_buffer() {
        let mut env = GridWorld::default();
        let mut mc = agent(1.0);
        let report = mc.train_episode(&mut env).unwrap();

        assert!(report.steps > 0 && report.steps <= 200);
        let start = StateKey::pair(0, 0);
        let q = mc.q_table().unwrap();
        let row = q.row(&start).unwrap();
        assert_eq!(row.len(), 4);

        let visits: usize = GridAction::ALL
            .iter()
            .map(|a| mc.returns_count(&start, *a))
            .sum();
        assert!(visits >= 1);
        for action in GridAction::ALL {
            if let Some(mean) = mc.returns_mean(&start, action) {
                assert_eq!(q.get(&start, action), mean);
            }
        }
    }

    #[test]
    fn values_follow_q() {
        let mut env = GridWorld::default();
        let mut mc = agent(0.3);
        for _ in 0..5 {
            mc.train_episode(&mut env).unwrap();
        }
        let values = mc.values();
        let q = mc.q_table().unwrap();
        for (state, row) in q.iter() {
            let best = row.values().copied().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(values.get(state), best);
        }
    }
}
