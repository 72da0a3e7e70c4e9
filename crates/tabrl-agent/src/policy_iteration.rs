//! Policy Iteration: alternating evaluation and greedy improvement

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use tabrl_core::{
    checked_actions, default_action, sample_index, AgentConfig, AlgorithmKind, Environment,
    PlanReport, Planner, PolicyTable, Result, TabularAgent, ValueTable,
};

use crate::utils::{greedy_action, lookahead, max_change};

/// Evaluation sweeps per improvement step
pub const EVALUATION_SWEEPS: usize = 10;

/// Policy Iteration planner
///
/// The policy starts as a uniformly random valid action per state, drawn
/// from the agent's own generator on first use.
#[derive(Debug, Clone)]
pub struct PolicyIteration<E: Environment> {
    config: AgentConfig,
    rng: StdRng,
    values: ValueTable,
    policy: PolicyTable<E::Action>,
}

impl<E: Environment> PolicyIteration<E> {
    /// Create a planner with empty tables
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: config.rng(),
            config,
            values: ValueTable::new(),
            policy: PolicyTable::new(),
        })
    }

    fn ensure_policy(&mut self, env: &E) -> Result<()> {
        if !self.policy.is_empty() {
            return Ok(());
        }
        for state in env.all_states() {
            if env.is_terminal(&state) {
                continue;
            }
            let actions = checked_actions(env, &state)?;
            let action = actions[sample_index(&mut self.rng, actions.len())];
            self.policy.set(state, action);
        }
        Ok(())
    }

    /// Evaluate the current policy with `sweeps` synchronous sweeps
    ///
    /// Each sweep reads only the previous table and replaces it whole.
    /// Returns the change made by the last sweep.
    pub fn policy_evaluation(&mut self, env: &E, sweeps: usize) -> Result<f64> {
        self.ensure_policy(env)?;
        let states = env.all_states();
        let gamma = self.config.gamma;
        let mut delta = 0.0;

        for _ in 0..sweeps {
            let mut next = ValueTable::new();
            for state in &states {
                if env.is_terminal(state) {
                    next.set(state.clone(), 0.0);
                    continue;
                }
                let action = match self.policy.get(state) {
                    Some(action) => action,
                    None => default_action(env)?,
                };
                next.set(state.clone(), lookahead(env, &self.values, state, action, gamma)?);
            }
            delta = max_change(&self.values, &next, &states);
            self.values = next;
        }

        Ok(delta)
    }

    /// Make the policy greedy with respect to the current values
    ///
    /// Returns `true` when no state changed its action.
    pub fn policy_improvement(&mut self, env: &E) -> Result<bool> {
        self.ensure_policy(env)?;
        let gamma = self.config.gamma;
        let mut stable = true;

        for state in env.all_states() {
            if env.is_terminal(&state) {
                continue;
            }
            let (best, _) = greedy_action(env, &self.values, &state, gamma)?;
            if self.policy.set(state, best) != Some(best) {
                stable = false;
            }
        }

        Ok(stable)
    }
}

impl<E: Environment> TabularAgent<E> for PolicyIteration<E> {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::PolicyIteration
    }

    fn values(&self) -> ValueTable {
        self.values.clone()
    }

    fn policy(&self) -> PolicyTable<E::Action> {
        self.policy.clone()
    }
}

impl<E: Environment> Planner<E> for PolicyIteration<E> {
    fn sweep(&mut self, env: &E) -> Result<f64> {
        self.policy_evaluation(env, 1)
    }

    fn train(&mut self, env: &E, iterations: usize) -> Result<PlanReport> {
        if env.all_states().is_empty() {
            warn!(env = env.name(), "state space is not enumerable; policy iteration is a no-op");
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
        for cycle in 1..=iterations {
            report.delta = self.policy_evaluation(env, EVALUATION_SWEEPS)?;
            report.iterations = cycle;
            let stable = self.policy_improvement(env)?;
            debug!(cycle, delta = report.delta, stable, "policy iteration cycle");

            if stable {
                report.converged = true;
                info!(env = env.name(), cycles = cycle, "policy is stable");
                break;
            }
        }

        if !report.converged {
            warn!(env = env.name(), cycles = report.iterations, "policy iteration stopped before the policy stabilised");
        }
        Ok(report)
    }
}
