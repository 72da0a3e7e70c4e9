//! Value Iteration over an enumerable state space

use tracing::{debug, info, warn};

use tabrl_core::{
    AgentConfig, AlgorithmKind, Environment, PlanReport, Planner, PolicyTable, Result,
    TabularAgent, ValueTable,
};

use crate::utils::greedy_action;

/// Sweeps stop once the largest value change drops below this
pub const CONVERGENCE_THRESHOLD: f64 = 1e-3;

/// Value Iteration planner
///
/// Sweeps update V and π in place, so later states in a sweep already see
/// the new values of earlier ones. Terminal states stay at zero.
#[derive(Debug, Clone)]
pub struct ValueIteration<E: Environment> {
    config: AgentConfig,
    values: ValueTable,
    policy: PolicyTable<E::Action>,
}

impl<E: Environment> ValueIteration<E> {
    /// Create a planner with empty tables
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            values: ValueTable::new(),
            policy: PolicyTable::new(),
        })
    }

    /// Discount factor in use
    #[must_use]
    pub fn gamma(&self) -> f64 {
        self.config.gamma
    }
}

impl<E: Environment> TabularAgent<E> for ValueIteration<E> {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::ValueIteration
    }

    fn values(&self) -> ValueTable {
        self.values.clone()
    }

    fn policy(&self) -> PolicyTable<E::Action> {
        self.policy.clone()
    }
}

impl<E: Environment> Planner<E> for ValueIteration<E> {
    fn sweep(&mut self, env: &E) -> Result<f64> {
        let gamma = self.config.gamma;
        let mut delta: f64 = 0.0;

        for state in env.all_states() {
            if env.is_terminal(&state) {
                let previous = self.values.set(state, 0.0);
                delta = delta.max(previous.abs());
                continue;
            }

            let (action, value) = greedy_action(env, &self.values, &state, gamma)?;
            let previous = self.values.set(state.clone(), value);
            self.policy.set(state, action);
            delta = delta.max((value - previous).abs());
        }

        Ok(delta)
    }

    fn train(&mut self, env: &E, iterations: usize) -> Result<PlanReport> {
        if env.all_states().is_empty() {
            warn!(env = env.name(), "state space is not enumerable; value iteration is a no-op");
            return Ok(PlanReport {
                iterations: 0,
                delta: 0.0,
                converged: true,
            });
        }

        let mut report = PlanReport {
            iterations: 0,
            delta: 0.0,
            converged: false,
        };
        for sweep in 1..=iterations {
            let delta = self.sweep(env)?;
            report.iterations = sweep;
            report.delta = delta;
            debug!(sweep, delta, "value iteration sweep");

            if delta < CONVERGENCE_THRESHOLD {
                report.converged = true;
                break;
            }
        }

        if report.converged {
            info!(env = env.name(), sweeps = report.iterations, "value iteration converged");
        } else {
            warn!(
                env = env.name(),
                sweeps = report.iterations,
                delta = report.delta,
                "value iteration stopped before converging"
            );
        }
        Ok(report)
    }
}
