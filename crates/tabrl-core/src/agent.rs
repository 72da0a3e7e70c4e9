//! Agent traits, configuration and training reports

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Action, Environment, PolicyTable, QTable, RLError, ValueTable};

/// Configuration shared by every tabular agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Discount factor γ
    pub gamma: f64,
    /// Step size α (TD, SARSA, Q-Learning)
    pub alpha: f64,
    /// Exploration rate ε (Monte Carlo, SARSA, Q-Learning)
    pub epsilon: f64,
    /// Step cap for one online episode
    pub max_steps: usize,
    /// Sweep/cycle budget for planners
    pub plan_iterations: usize,
    /// Seed for the agent's random source; entropy when absent
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            alpha: 0.1,
            epsilon: 0.1,
            max_steps: 200,
            plan_iterations: 50,
            seed: None,
        }
    }
}

impl AgentConfig {
    /// Reject values outside the ranges the update rules assume
    pub fn validate(&self) -> crate::Result<()> {
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(RLError::Config(format!("gamma must be in [0, 1], got {}", self.gamma)));
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(RLError::Config(format!("alpha must be in (0, 1], got {}", self.alpha)));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(RLError::Config(format!(
                "epsilon must be in [0, 1], got {}",
                self.epsilon
            )));
        }
        if self.max_steps == 0 {
            return Err(RLError::Config("max_steps must be positive".to_string()));
        }
        Ok(())
    }

    /// Fresh random source for one agent instance
    #[must_use]
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Hyperparameters an algorithm reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hyperparameter {
    /// Discount factor γ
    Gamma,
    /// Step size α
    Alpha,
    /// Exploration rate ε
    Epsilon,
    /// Number of training episodes
    Episodes,
}

impl fmt::Display for Hyperparameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gamma => "gamma",
            Self::Alpha => "alpha",
            Self::Epsilon => "epsilon",
            Self::Episodes => "episodes",
        })
    }
}

/// The six tabular algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmKind {
    /// Value Iteration
    ValueIteration,
    /// Policy Iteration
    PolicyIteration,
    /// Every-visit Monte Carlo control
    MonteCarlo,
    /// TD(0) value learning with derived policy
    #[serde(rename = "td")]
    TemporalDifference,
    /// On-policy TD control
    Sarsa,
    /// Off-policy TD control
    QLearning,
}

impl AlgorithmKind {
    /// All algorithms in presentation order
    pub const ALL: [AlgorithmKind; 6] = [
        Self::ValueIteration,
        Self::PolicyIteration,
        Self::MonteCarlo,
        Self::TemporalDifference,
        Self::Sarsa,
        Self::QLearning,
    ];

    /// Stable identifier, e.g. `"q-learning"`
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::ValueIteration => "value-iteration",
            Self::PolicyIteration => "policy-iteration",
            Self::MonteCarlo => "monte-carlo",
            Self::TemporalDifference => "td",
            Self::Sarsa => "sarsa",
            Self::QLearning => "q-learning",
        }
    }

    /// Whether the algorithm plans over a fully enumerated state space
    #[must_use]
    pub fn is_planner(&self) -> bool {
        matches!(self, Self::ValueIteration | Self::PolicyIteration)
    }

    /// Hyperparameters the algorithm reads
    #[must_use]
    pub fn params(&self) -> &'static [Hyperparameter] {
        use Hyperparameter::{Alpha, Episodes, Epsilon, Gamma};
        match self {
            Self::ValueIteration | Self::PolicyIteration => &[Gamma],
            Self::MonteCarlo => &[Gamma, Epsilon, Episodes],
            Self::TemporalDifference => &[Alpha, Gamma, Episodes],
            Self::Sarsa | Self::QLearning => &[Alpha, Gamma, Epsilon, Episodes],
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for AlgorithmKind {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| RLError::Config(format!("unknown algorithm: {s}")))
    }
}

/// Readable tables after some amount of training
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<A: Action> {
    /// State values
    pub values: ValueTable,
    /// Greedy or learned policy
    pub policy: PolicyTable<A>,
    /// Action values, for Q-based agents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q_table: Option<QTable<A>>,
}

impl<A: Action> Default for Snapshot<A> {
    fn default() -> Self {
        Self {
            values: ValueTable::new(),
            policy: PolicyTable::new(),
            q_table: None,
        }
    }
}

/// Outcome of a planner's `train`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanReport {
    /// Sweeps (value iteration) or evaluation/improvement cycles (policy iteration) run
    pub iterations: usize,
    /// Largest value change in the last sweep
    pub delta: f64,
    /// Whether the stopping criterion was met inside the budget
    pub converged: bool,
}

/// Outcome of one online training episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeReport {
    /// Undiscounted sum of rewards
    pub total_reward: f64,
    /// Environment steps taken
    pub steps: usize,
    /// Whether the episode ended in a terminal or capped state
    pub done: bool,
    /// Whether the environment's own step cap ended it
    pub truncated: bool,
}

/// Anything that owns value/policy tables over an environment
pub trait TabularAgent<E: Environment> {
    /// Which algorithm this is
    fn kind(&self) -> AlgorithmKind;

    /// Current state values
    fn values(&self) -> ValueTable;

    /// Current policy over known states
    fn policy(&self) -> PolicyTable<E::Action>;

    /// Action values, for Q-based agents
    fn q_table(&self) -> Option<&QTable<E::Action>> {
        None
    }

    /// All readable tables at once
    fn snapshot(&self) -> Snapshot<E::Action> {
        Snapshot {
            values: self.values(),
            policy: self.policy(),
            q_table: self.q_table().cloned(),
        }
    }
}

/// Agents that plan with full sweeps over an enumerable state space
pub trait Planner<E: Environment>: TabularAgent<E> {
    /// One sweep; returns the largest absolute value change
    fn sweep(&mut self, env: &E) -> crate::Result<f64>;

    /// Sweep until converged or `iterations` is exhausted
    fn train(&mut self, env: &E, iterations: usize) -> crate::Result<PlanReport>;
}

/// Agents that learn online from episodes
pub trait Learner<E: Environment>: TabularAgent<E> {
    /// Run and learn from one episode
    fn train_episode(&mut self, env: &mut E) -> crate::Result<EpisodeReport>;
}
