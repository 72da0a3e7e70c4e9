//! Tabular reinforcement learning agents
//!
//! This crate provides the six tabular algorithms:
//! - Value Iteration and Policy Iteration (planners over enumerable MDPs)
//! - Every-visit Monte Carlo control
//! - TD(0) state-value learning
//! - SARSA and Q-Learning
//!
//! plus [`TrainingSession`], which owns an environment and an agent and
//! drives training, progress reporting and greedy replay.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod factory;
pub mod monte_carlo;
pub mod policy_iteration;
pub mod q_learning;
pub mod sarsa;
pub mod session;
pub mod td;
pub mod utils;
pub mod value_iteration;

// Re-export agents
pub use monte_carlo::MonteCarlo;
pub use policy_iteration::PolicyIteration;
pub use q_learning::QLearning;
pub use sarsa::Sarsa;
pub use td::TemporalDifference;
pub use value_iteration::ValueIteration;

// Re-export construction and sessions
pub use buffer::{ReturnsBuffer, RunningMean};
pub use factory::{make_agent, AgentHandle};
pub use session::{
    EpisodeStats, PolicyRun, Progress, SessionConfig, StepOutcome, TrainingSession,
    TrainingSummary,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        make_agent, AgentHandle, MonteCarlo, PolicyIteration, QLearning, Sarsa, SessionConfig,
        TemporalDifference, TrainingSession, ValueIteration,
    };
    pub use tabrl_core::prelude::*;
}
