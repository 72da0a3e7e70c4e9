//! Mountain car with a binned state key

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use tabrl_core::{ensure_valid, Action, Environment, RLError, Result, StateKey, Step};

/// Engine command
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarAction {
    /// Push left
    Left,
    /// No push
    #[serde(rename = "none")]
    Coast,
    /// Push right
    Right,
}

impl CarAction {
    /// All commands in their canonical order
    pub const ALL: [CarAction; 3] = [Self::Left, Self::Coast, Self::Right];

    fn direction(self) -> f64 {
        match self {
            Self::Left => -1.0,
            Self::Coast => 0.0,
            Self::Right => 1.0,
        }
    }
}

impl Action for CarAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Coast => "none",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for CarAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physics constants and discretisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountainCarConfig {
    /// Left wall
    pub min_position: f64,
    /// Right wall
    pub max_position: f64,
    /// Velocity bound (symmetric)
    pub max_speed: f64,
    /// Position that counts as success
    pub goal_position: f64,
    /// Engine force per unit of push
    pub force: f64,
    /// Gravity coefficient along the hill
    pub gravity: f64,
    /// Position after `reset`
    pub start_position: f64,
    /// Steps before an episode is cut off
    pub max_steps: usize,
    /// Position bins per unit of distance
    pub position_bins: f64,
    /// Velocity bins per unit of speed
    pub velocity_bins: f64,
}

impl Default for MountainCarConfig {
    fn default() -> Self {
        Self {
            min_position: -1.2,
            max_position: 0.6,
            max_speed: 0.07,
            goal_position: 0.5,
            force: 0.001,
            gravity: 0.0025,
            start_position: -0.5,
            max_steps: 200,
            position_bins: 10.0,
            velocity_bins: 100.0,
        }
    }
}

impl MountainCarConfig {
    /// Check bounds and resolutions
    pub fn validate(&self) -> Result<()> {
        if self.min_position >= self.max_position {
            return Err(RLError::Config("min_position must be below max_position".to_string()));
        }
        if !(self.min_position..=self.max_position).contains(&self.start_position) {
            return Err(RLError::Config(format!(
                "start_position {} is outside the track",
                self.start_position
            )));
        }
        if self.max_speed <= 0.0 || self.position_bins <= 0.0 || self.velocity_bins <= 0.0 {
            return Err(RLError::Config(
                "max_speed and bin resolutions must be positive".to_string(),
            ));
        }
        if self.max_steps == 0 {
            return Err(RLError::Config("max_steps must be positive".to_string()));
        }
        Ok(())
    }
}

/// Under-powered car in a valley
///
/// Continuous position/velocity, discretised into `posBin,velBin` keys.
/// The state space is not enumerated, so only online learners can train on
/// it.
#[derive(Debug, Clone)]
pub struct MountainCar {
    config: MountainCarConfig,
    position: f64,
    velocity: f64,
    steps: usize,
}

impl MountainCar {
    /// Create a new mountain car
    pub fn new(config: MountainCarConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            position: config.start_position,
            velocity: 0.0,
            steps: 0,
            config,
        })
    }

    /// Live position
    #[must_use]
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Live velocity
    #[must_use]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Steps taken in the current episode
    #[must_use]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Constants in use
    #[must_use]
    pub fn config(&self) -> &MountainCarConfig {
        &self.config
    }

    /// Key of a continuous `(position, velocity)` pair
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn key_for(&self, position: f64, velocity: f64) -> StateKey {
        let pos_bin = ((position - self.config.min_position) * self.config.position_bins).floor();
        let vel_bin = ((velocity + self.config.max_speed) * self.config.velocity_bins).floor();
        StateKey::pair(pos_bin as i64, vel_bin as i64)
    }

    /// Centre of the bin a key names
    #[allow(clippy::cast_precision_loss)]
    fn decode(&self, state: &StateKey) -> Result<(f64, f64)> {
        let (pos_bin, vel_bin) = state
            .as_pair()
            .ok_or_else(|| RLError::InvalidState(format!("mountain car keys are bin pairs: {state}")))?;
        let (max_pos_bin, max_vel_bin) = self
            .key_for(self.config.max_position, self.config.max_speed)
            .as_pair()
            .unwrap_or_default();
        if !(0..=max_pos_bin).contains(&pos_bin) || !(0..=max_vel_bin).contains(&vel_bin) {
            return Err(RLError::InvalidState(format!("{state} is outside the binned track")));
        }

        let position = (self.config.min_position + (pos_bin as f64 + 0.5) / self.config.position_bins)
            .min(self.config.max_position);
        let velocity = (-self.config.max_speed + (vel_bin as f64 + 0.5) / self.config.velocity_bins)
            .min(self.config.max_speed);
        Ok((position, velocity))
    }

    /// One physics update, no bookkeeping
    fn integrate(&self, position: f64, velocity: f64, action: CarAction) -> (f64, f64) {
        let c = &self.config;
        let velocity = (velocity + action.direction() * c.force - c.gravity * (3.0 * position).cos())
            .clamp(-c.max_speed, c.max_speed);
        let position = (position + velocity).clamp(c.min_position, c.max_position);

        // Hitting the left wall stops the car
        let velocity = if position <= c.min_position && velocity < 0.0 {
            0.0
        } else {
            velocity
        };
        (position, velocity)
    }

    fn reward_at(&self, position: f64) -> (f64, bool) {
        if position >= self.config.goal_position {
            (0.0, true)
        } else {
            (-1.0, false)
        }
    }
}

impl Default for MountainCar {
    fn default() -> Self {
        let config = MountainCarConfig::default();
        Self {
            position: config.start_position,
            velocity: 0.0,
            steps: 0,
            config,
        }
    }
}

impl Environment for MountainCar {
    type Action = CarAction;

    fn name(&self) -> &str {
        "mountaincar"
    }

    fn actions(&self) -> &[CarAction] {
        &CarAction::ALL
    }

    fn reset(&mut self) -> StateKey {
        self.position = self.config.start_position;
        self.velocity = 0.0;
        self.steps = 0;
        self.current_state()
    }

    fn step(&mut self, action: CarAction) -> Result<Step> {
        ensure_valid(action, &self.valid_actions(&self.current_state()))?;
        let (position, velocity) = self.integrate(self.position, self.velocity, action);
        self.position = position;
        self.velocity = velocity;
        self.steps += 1;

        let (reward, success) = self.reward_at(position);
        let capped = self.steps >= self.config.max_steps;
        if success || capped {
            trace!(steps = self.steps, position, success, "mountain car episode over");
        }
        Ok(Step {
            truncated: capped && !success,
            ..Step::new(self.current_state(), reward, success || capped)
        })
    }

    fn probe(&self, state: &StateKey, action: CarAction) -> Result<Step> {
        let (position, velocity) = self.decode(state)?;
        ensure_valid(action, &self.valid_actions(state))?;
        let (position, velocity) = self.integrate(position, velocity, action);
        let (reward, success) = self.reward_at(position);
        Ok(Step::new(self.key_for(position, velocity), reward, success))
    }

    fn current_state(&self) -> StateKey {
        self.key_for(self.position, self.velocity)
    }
}
