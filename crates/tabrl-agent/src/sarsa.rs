//! SARSA: on-policy TD control

use rand::rngs::StdRng;

use tabrl_core::{
    checked_actions, run_episode, AgentConfig, AlgorithmKind, Controller, Environment,
    EpisodeReport, EpsilonGreedy, Learner, PolicyTable, QTable, RLError, Result, StateKey,
    TabularAgent, Transition, ValueTable,
};

/// SARSA agent
///
/// The action chosen for the next state while updating is the one actually
/// taken on the following step.
#[derive(Debug, Clone)]
pub struct Sarsa<E: Environment> {
    config: AgentConfig,
    rng: StdRng,
    exploration: EpsilonGreedy,
    q: QTable<E::Action>,
    pending: Option<E::Action>,
}

impl<E: Environment> Sarsa<E> {
    /// Create an agent with empty tables
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: config.rng(),
            exploration: EpsilonGreedy::new(config.epsilon),
            config,
            q: QTable::new(),
            pending: None,
        })
    }

    /// ε-greedy action for `state`
    pub fn choose_action(&mut self, env: &E, state: &StateKey) -> Result<E::Action> {
        let actions = checked_actions(env, state)?;
        self.exploration
            .select(&mut self.rng, &self.q, state, &actions)
            .ok_or_else(|| RLError::EmptyActionSet(state.to_string()))
    }
}

impl<E: Environment> Controller<E> for Sarsa<E> {
    fn act(&mut self, env: &E, state: &StateKey) -> Result<E::Action> {
        match self.pending.take() {
            Some(action) => Ok(action),
            None => self.choose_action(env, state),
        }
    }

    fn observe(&mut self, env: &E, t: &Transition<E::Action>) -> Result<()> {
        let next_action = self.choose_action(env, &t.next_state)?;
        let next = if t.done {
            0.0
        } else {
            self.q.get(&t.next_state, next_action)
        };

        let current = self.q.get(&t.state, t.action);
        let updated = current + self.config.alpha * (t.reward.0 + self.config.gamma * next - current);
        let valid = env.valid_actions(&t.state);
        self.q.set(t.state.clone(), t.action, &valid, updated);

        self.pending = Some(next_action);
        Ok(())
    }
}

impl<E: Environment> TabularAgent<E> for Sarsa<E> {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Sarsa
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

impl<E: Environment> Learner<E> for Sarsa<E> {
    fn train_episode(&mut self, env: &mut E) -> Result<EpisodeReport> {
        self.pending = None;
        let max_steps = self.config.max_steps;
        let trajectory = run_episode(env, self, max_steps)?;

        Ok(EpisodeReport {
            total_reward: trajectory.total_reward,
            steps: trajectory.len(),
            done: trajectory.finished(),
            truncated: trajectory.truncated(),
        })
    }
}
