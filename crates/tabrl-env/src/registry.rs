//! Catalogue of shipped environments and the algorithms each supports

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use tabrl_core::{AlgorithmKind, RLError, Result};

/// Shipped environments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvKind {
    /// [`crate::GridWorld`]
    GridWorld,
    /// [`crate::MountainCar`]
    MountainCar,
}

impl EnvKind {
    /// All environments in presentation order
    pub const ALL: [EnvKind; 2] = [Self::GridWorld, Self::MountainCar];

    /// Stable identifier
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::GridWorld => "gridworld",
            Self::MountainCar => "mountaincar",
        }
    }

    /// Human-readable name
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::GridWorld => "GridWorld",
            Self::MountainCar => "MountainCar",
        }
    }

    /// Algorithms that can train on this environment
    ///
    /// Planners need a fully enumerated state space, which the mountain car
    /// does not provide.
    #[must_use]
    pub fn compatible_algorithms(&self) -> &'static [AlgorithmKind] {
        use AlgorithmKind::{
            MonteCarlo, PolicyIteration, QLearning, Sarsa, TemporalDifference, ValueIteration,
        };
        match self {
            Self::GridWorld => &[
                ValueIteration,
                PolicyIteration,
                MonteCarlo,
                TemporalDifference,
                Sarsa,
                QLearning,
            ],
            Self::MountainCar => &[MonteCarlo, TemporalDifference, Sarsa, QLearning],
        }
    }

    /// Whether `algorithm` is listed for this environment
    #[must_use]
    pub fn supports(&self, algorithm: AlgorithmKind) -> bool {
        self.compatible_algorithms().contains(&algorithm)
    }

    /// Fail with [`RLError::IncompatibleAlgorithm`] unless `algorithm` is supported
    pub fn ensure_supports(&self, algorithm: AlgorithmKind) -> Result<()> {
        if self.supports(algorithm) {
            Ok(())
        } else {
            Err(RLError::IncompatibleAlgorithm {
                algorithm: algorithm.id().to_string(),
                environment: self.id().to_string(),
            })
        }
    }
}

impl fmt::Display for EnvKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for EnvKind {
    type Err = RLError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| RLError::Environment(format!("Unknown environment: {s}")))
    }
}
