//! Core traits and tabular stores for the tabrl engine
//!
//! This crate provides the foundational abstractions shared by the
//! environments and agents: canonical state keys, the [`Environment`]
//! trait with its side-effect-free `probe`, value/policy/Q tables, and the
//! episode driver used by every online learner.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod agent;
pub mod environment;
pub mod error;
pub mod policy;
pub mod reward;
pub mod state;
pub mod trajectory;
pub mod value;

// Re-export core traits and types
pub use action::{ensure_valid, Action};
pub use agent::{
    AgentConfig, AlgorithmKind, EpisodeReport, Hyperparameter, Learner, PlanReport, Planner,
    Snapshot, TabularAgent,
};
pub use environment::{checked_actions, default_action, Environment, Step};
pub use error::{RLError, Result};
pub use policy::{argmax_first, sample_index, uniform_action, EpsilonGreedy};
pub use reward::Reward;
pub use state::StateKey;
pub use trajectory::{run_episode, Controller, Trajectory, Transition};
pub use value::{PolicyTable, QTable, ValueTable};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, AgentConfig, AlgorithmKind, Environment, Learner, Planner, Result, StateKey,
        Step, TabularAgent,
    };
}
