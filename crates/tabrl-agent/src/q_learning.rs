//! Q-Learning: off-policy TD control

use rand::rngs::StdRng;

use tabrl_core::{
    checked_actions, run_episode, AgentConfig, AlgorithmKind, Controller, Environment,
    EpisodeReport, EpsilonGreedy, Learner, PolicyTable, QTable, RLError, Result, StateKey,
    TabularAgent, Transition, ValueTable,
};

/// Q-Learning agent
#[derive(Debug, Clone)]
pub struct QLearning<E: Environment> {
    config: AgentConfig,
    rng: StdRng,
    exploration: EpsilonGreedy,
    q: QTable<E::Action>,
}

impl<E: Environment> QLearning<E> {
    /// Create an agent with empty tables
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: config.rng(),
            exploration: EpsilonGreedy::new(config.epsilon),
            config,
            q: QTable::new(),
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

impl<E: Environment> Controller<E> for QLearning<E> {
    fn act(&mut self, env: &E, state: &StateKey) -> Result<E::Action> {
        self.choose_action(env, state)
    }

    fn observe(&mut self, env: &E, t: &Transition<E::Action>) -> Result<()> {
        let next = if t.done {
            0.0
        } else {
            self.q.max_value(&t.next_state, &env.valid_actions(&t.next_state))
        };

        let current = self.q.get(&t.state, t.action);
        let updated = current + self.config.alpha * (t.reward.0 + self.config.gamma * next - current);
        let valid = env.valid_actions(&t.state);
        self.q.set(t.state.clone(), t.action, &valid, updated);
        Ok(())
    }
}

impl<E: Environment> TabularAgent<E> for QLearning<E> {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::QLearning
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

impl<E: Environment> Learner<E> for QLearning<E> {
    fn train_episode(&mut self, env: &mut E) -> Result<EpisodeReport> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use tabrl_core::Reward;
    use tabrl_env::{GridAction, GridWorld};

    fn agent() -> QLearning<GridWorld> {
        QLearning::new(AgentConfig {
            seed: Some(21),
            ..AgentConfig::default()
        })
        .unwrap()
    }

    fn transition(from: (i64, i64), action: GridAction, reward: f64, to: (i64, i64)) -> Transition<GridAction> {
        Transition {
            state: from.into(),
            action,
            reward: Reward(reward),
            next_state: to.into(),
            done: false,
            truncated: false,
        }
    }

    #[test]
    fn bootstraps_with_best_next_value() {
        let env = GridWorld::default();
        let mut ql = agent();
        ql.observe(&env, &transition((0, 1), GridAction::Left, 5.0, (0, 0))).unwrap();
        ql.observe(&env, &transition((0, 0), GridAction::Right, -0.1, (0, 1))).unwrap();

        let q = ql.q_table().unwrap();
        assert_relative_eq!(q.get(&StateKey::pair(0, 1), GridAction::Left), 0.5);
        assert_relative_eq!(
            q.get(&StateKey::pair(0, 0), GridAction::Right),
            0.1 * (-0.1 + 0.9 * 0.5)
        );
    }

    #[test]
    fn unseen_next_state_bootstraps_zero() {
        let env = GridWorld::default();
        let mut ql = agent();
        ql.observe(&env, &transition((2, 3), GridAction::Up, -0.1, (1, 3))).unwrap();
        assert_relative_eq!(
            ql.q_table().unwrap().get(&StateKey::pair(2, 3), GridAction::Up),
            -0.01
        );
    }

    #[test]
    fn learns_to_reach_the_goal() {
        let mut env = GridWorld::default();
        let mut ql = agent();
        let mut finished = 0;
        for _ in 0..300 {
            let report = ql.train_episode(&mut env).unwrap();
            assert!(report.steps <= 200);
            if report.done {
                finished += 1;
            }
        }
        assert!(finished > 0);

        let values = ql.values();
        let beside_goal = values.get(&StateKey::pair(3, 4)).max(values.get(&StateKey::pair(4, 3)));
        assert!(beside_goal > 0.0);
    }
}
