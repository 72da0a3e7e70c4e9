//! Construct agents by algorithm id

use tabrl_core::{
    AgentConfig, AlgorithmKind, Environment, Learner, Planner, PolicyTable, QTable, Result,
    Snapshot, ValueTable,
};

use crate::{MonteCarlo, PolicyIteration, QLearning, Sarsa, TemporalDifference, ValueIteration};

/// A boxed agent of either family
pub enum AgentHandle<E: Environment> {
    /// Value or Policy Iteration
    Planner(Box<dyn Planner<E>>),
    /// Monte Carlo, TD, SARSA or Q-Learning
    Learner(Box<dyn Learner<E>>),
}

impl<E: Environment> AgentHandle<E> {
    /// Which algorithm is inside
    #[must_use]
    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Self::Planner(agent) => agent.kind(),
            Self::Learner(agent) => agent.kind(),
        }
    }

    /// Current state values
    #[must_use]
    pub fn values(&self) -> ValueTable {
        match self {
            Self::Planner(agent) => agent.values(),
            Self::Learner(agent) => agent.values(),
        }
    }

    /// Current policy
    #[must_use]
    pub fn policy(&self) -> PolicyTable<E::Action> {
        match self {
            Self::Planner(agent) => agent.policy(),
            Self::Learner(agent) => agent.policy(),
        }
    }

    /// Action values, for Q-based agents
    #[must_use]
    pub fn q_table(&self) -> Option<&QTable<E::Action>> {
        match self {
            Self::Planner(agent) => agent.q_table(),
            Self::Learner(agent) => agent.q_table(),
        }
    }

    /// All readable tables
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<E::Action> {
        match self {
            Self::Planner(agent) => agent.snapshot(),
            Self::Learner(agent) => agent.snapshot(),
        }
    }
}

impl<E: Environment> std::fmt::Debug for AgentHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let family = match self {
            Self::Planner(_) => "Planner",
            Self::Learner(_) => "Learner",
        };
        f.debug_tuple(family).field(&self.kind()).finish()
    }
}

/// Create a fresh agent for `kind`
pub fn make_agent<E>(kind: AlgorithmKind, config: &AgentConfig) -> Result<AgentHandle<E>>
where
    E: Environment + 'static,
{
    let config = config.clone();
    Ok(match kind {
        AlgorithmKind::ValueIteration => AgentHandle::Planner(Box::new(ValueIteration::<E>::new(config)?)),
        AlgorithmKind::PolicyIteration => AgentHandle::Planner(Box::new(PolicyIteration::<E>::new(config)?)),
        AlgorithmKind::MonteCarlo => AgentHandle::Learner(Box::new(MonteCarlo::<E>::new(config)?)),
        AlgorithmKind::TemporalDifference => {
            AgentHandle::Learner(Box::new(TemporalDifference::<E>::new(config)?))
        }
        AlgorithmKind::Sarsa => AgentHandle::Learner(Box::new(Sarsa::<E>::new(config)?)),
        AlgorithmKind::QLearning => AgentHandle::Learner(Box::new(QLearning::<E>::new(config)?)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabrl_env::GridWorld;

    #[test]
    fn builds_every_algorithm() {
        for kind in AlgorithmKind::ALL {
            let handle = make_agent::<GridWorld>(kind, &AgentConfig::default()).unwrap();
            assert_eq!(handle.kind(), kind);
            assert_eq!(matches!(handle, AgentHandle::Planner(_)), kind.is_planner());
        }
    }

    #[test]
    fn q_tables_only_for_q_agents() {
        let td = make_agent::<GridWorld>(AlgorithmKind::TemporalDifference, &AgentConfig::default()).unwrap();
        assert!(td.q_table().is_none());
        let ql = make_agent::<GridWorld>(AlgorithmKind::QLearning, &AgentConfig::default()).unwrap();
        assert!(ql.q_table().is_some());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = AgentConfig {
            gamma: -1.0,
            ..AgentConfig::default()
        };
        assert!(make_agent::<GridWorld>(AlgorithmKind::Sarsa, &config).is_err());
    }
}
