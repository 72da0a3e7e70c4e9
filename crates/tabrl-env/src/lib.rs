//! Tabular reinforcement learning environments
//!
//! This crate provides the two shipped MDPs:
//! - [`GridWorld`], a deterministic, fully enumerable grid
//! - [`MountainCar`], a bounded-continuous task discretised into bins
//!
//! and the [`EnvKind`] catalogue describing which algorithms each supports.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod gridworld;
pub mod mountain_car;
pub mod registry;

// Re-export environments
pub use gridworld::{GridAction, GridConfig, GridWorld};
pub use mountain_car::{CarAction, MountainCar, MountainCarConfig};
pub use registry::EnvKind;

// Re-export core types
pub use tabrl_core::{Action, Environment, Reward, StateKey, Step};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{CarAction, EnvKind, GridAction, GridWorld, MountainCar};
    pub use tabrl_core::prelude::*;
}
