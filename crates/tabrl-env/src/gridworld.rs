//! Deterministic grid world

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use tabrl_core::{ensure_valid, Action, Environment, RLError, Result, StateKey, Step};

/// Grid moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridAction {
    /// Row - 1
    Up,
    /// Row + 1
    Down,
    /// Column - 1
    Left,
    /// Column + 1
    Right,
}

impl GridAction {
    /// All moves in their canonical order
    pub const ALL: [GridAction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];
}

impl Action for GridAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for GridAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Grid world layout and rewards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Start cell `(row, col)`
    pub start: (usize, usize),
    /// Goal cell `(row, col)`
    pub goal: (usize, usize),
    /// Blocked cells
    pub obstacles: Vec<(usize, usize)>,
    /// Reward for every move that does not reach the goal
    pub step_reward: f64,
    /// Reward for arriving at the goal
    pub goal_reward: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 5,
            cols: 5,
            start: (0, 0),
            goal: (4, 4),
            obstacles: vec![(1, 1), (2, 2), (3, 1)],
            step_reward: -0.1,
            goal_reward: 10.0,
        }
    }
}

impl GridConfig {
    /// Check that the layout is usable
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(RLError::Config(format!(
                "grid must be non-empty, got {}x{}",
                self.rows, self.cols
            )));
        }
        for (label, cell) in [("start", self.start), ("goal", self.goal)] {
            if !self.in_bounds(cell) {
                return Err(RLError::Config(format!("{label} {cell:?} is outside the grid")));
            }
            if self.obstacles.contains(&cell) {
                return Err(RLError::Config(format!("{label} {cell:?} is an obstacle")));
            }
        }
        Ok(())
    }

    fn in_bounds(&self, (row, col): (usize, usize)) -> bool {
        row < self.rows && col < self.cols
    }
}

/// Rectangular grid with a start, a goal and blocked cells
///
/// Moves clamp at the edges, and moving into an obstacle leaves the agent
/// where it was. The goal is the only terminal state.
#[derive(Debug, Clone)]
pub struct GridWorld {
    config: GridConfig,
    position: (usize, usize),
}

impl GridWorld {
    /// Create a grid world from a validated layout
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        let position = config.start;
        Ok(Self { config, position })
    }

    /// Layout in use
    #[must_use]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Live `(row, col)` of the agent
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        self.position
    }

    /// Key for a cell
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn key(cell: (usize, usize)) -> StateKey {
        StateKey::pair(cell.0 as i64, cell.1 as i64)
    }

    /// Whether `cell` is blocked
    #[must_use]
    pub fn is_obstacle(&self, cell: (usize, usize)) -> bool {
        self.config.obstacles.contains(&cell)
    }

    fn cell(&self, state: &StateKey) -> Result<(usize, usize)> {
        let (row, col) = state
            .as_pair()
            .ok_or_else(|| RLError::InvalidState(format!("grid keys are row,col pairs: {state}")))?;
        let cell = (
            usize::try_from(row).map_err(|_| RLError::InvalidState(state.to_string()))?,
            usize::try_from(col).map_err(|_| RLError::InvalidState(state.to_string()))?,
        );
        if !self.config.in_bounds(cell) {
            return Err(RLError::InvalidState(format!("{state} is outside the grid")));
        }
        Ok(cell)
    }

    /// Pure transition function shared by `step` and `probe`
    fn transition(&self, (row, col): (usize, usize), action: GridAction) -> ((usize, usize), Step) {
        let target = match action {
            GridAction::Up => (row.saturating_sub(1), col),
            GridAction::Down => ((row + 1).min(self.config.rows - 1), col),
            GridAction::Left => (row, col.saturating_sub(1)),
            GridAction::Right => (row, (col + 1).min(self.config.cols - 1)),
        };
        let next = if self.is_obstacle(target) { (row, col) } else { target };

        let at_goal = next == self.config.goal;
        let reward = if at_goal {
            self.config.goal_reward
        } else {
            self.config.step_reward
        };
        (next, Step::new(Self::key(next), reward, at_goal))
    }
}

impl Default for GridWorld {
    fn default() -> Self {
        Self {
            position: GridConfig::default().start,
            config: GridConfig::default(),
        }
    }
}

impl Environment for GridWorld {
    type Action = GridAction;

    fn name(&self) -> &str {
        "gridworld"
    }

    fn actions(&self) -> &[GridAction] {
        &GridAction::ALL
    }

    fn reset(&mut self) -> StateKey {
        self.position = self.config.start;
        Self::key(self.position)
    }

    fn step(&mut self, action: GridAction) -> Result<Step> {
        ensure_valid(action, &self.valid_actions(&self.current_state()))?;
        let (next, step) = self.transition(self.position, action);
        self.position = next;
        if step.done {
            trace!(goal = %step.state, "grid world goal reached");
        }
        Ok(step)
    }

    fn probe(&self, state: &StateKey, action: GridAction) -> Result<Step> {
        let cell = self.cell(state)?;
        ensure_valid(action, &self.valid_actions(state))?;
        Ok(self.transition(cell, action).1)
    }

    fn current_state(&self) -> StateKey {
        Self::key(self.position)
    }

    fn all_states(&self) -> Vec<StateKey> {
        (0..self.config.rows)
            .flat_map(|r| (0..self.config.cols).map(move |c| Self::key((r, c))))
            .collect()
    }

    fn is_terminal(&self, state: &StateKey) -> bool {
        self.cell(state).is_ok_and(|cell| cell == self.config.goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn up_from_origin_clamps() {
        let mut env = GridWorld::default();
        env.reset();
        let step = env.step(GridAction::Up).unwrap();
        assert_eq!(step.state, StateKey::pair(0, 0));
        assert_relative_eq!(step.reward.0, -0.1);
        assert!(!step.done);
    }

    #[test]
    fn reaching_goal_pays_and_terminates() {
        let env = GridWorld::default();
        for (from, action) in [((3, 4), GridAction::Down), ((4, 3), GridAction::Right)] {
            let step = env.probe(&GridWorld::key(from), action).unwrap();
            assert_eq!(step.state, StateKey::pair(4, 4));
            assert_relative_eq!(step.reward.0, 10.0);
            assert!(step.done);
        }
    }

    #[test]
    fn obstacles_block_movement() {
        let env = GridWorld::default();
        let step = env.probe(&StateKey::pair(0, 1), GridAction::Down).unwrap();
        assert_eq!(step.state, StateKey::pair(0, 1));
        assert!(!step.done);
    }

    #[test]
    fn probe_leaves_live_state_alone() {
        let mut env = GridWorld::default();
        env.reset();
        env.step(GridAction::Right).unwrap();
        let before = env.current_state();

        env.probe(&StateKey::pair(3, 4), GridAction::Down).unwrap();

        assert_eq!(env.current_state(), before);
        assert_eq!(env.position(), (0, 1));
    }

    #[test]
    fn reset_returns_start() {
        let mut env = GridWorld::default();
        env.step(GridAction::Right).unwrap();
        assert_eq!(env.reset(), StateKey::pair(0, 0));
    }

    #[test]
    fn enumerates_every_cell() {
        let env = GridWorld::default();
        let states = env.all_states();
        assert_eq!(states.len(), 25);
        assert_eq!(states[0], StateKey::pair(0, 0));
        assert_eq!(states[24], StateKey::pair(4, 4));
    }

    #[test]
    fn only_goal_is_terminal() {
        let env = GridWorld::default();
        assert!(env.is_terminal(&StateKey::pair(4, 4)));
        assert!(!env.is_terminal(&StateKey::pair(0, 0)));
        assert!(!env.is_terminal(&StateKey::pair(9, 9)));
    }

    #[test]
    fn probe_rejects_foreign_keys() {
        let env = GridWorld::default();
        assert!(matches!(
            env.probe(&StateKey::pair(5, 0), GridAction::Up),
            Err(RLError::InvalidState(_))
        ));
        assert!(env.probe(&StateKey::new(vec![1]), GridAction::Up).is_err());
        assert!(env.probe(&StateKey::pair(-1, 0), GridAction::Up).is_err());
    }

    #[test]
    fn config_validation() {
        let on_obstacle = GridConfig { goal: (1, 1), ..GridConfig::default() };
        assert!(GridWorld::new(on_obstacle).is_err());

        let outside = GridConfig { start: (0, 7), ..GridConfig::default() };
        assert!(GridWorld::new(outside).is_err());

        let empty = GridConfig { rows: 0, ..GridConfig::default() };
        assert!(GridWorld::new(empty).is_err());
    }

    proptest! {
        #[test]
        fn moves_stay_on_open_cells(row in 0usize..5, col in 0usize..5, a in 0usize..4) {
            let env = GridWorld::default();
            let step = env.probe(&GridWorld::key((row, col)), GridAction::ALL[a]).unwrap();
            let (r, c) = step.state.as_pair().unwrap();
            prop_assert!((0..5).contains(&r) && (0..5).contains(&c));

            let next = (usize::try_from(r).unwrap(), usize::try_from(c).unwrap());
            if !env.is_obstacle((row, col)) {
                prop_assert!(!env.is_obstacle(next));
            }
            let manhattan = row.abs_diff(next.0) + col.abs_diff(next.1);
            prop_assert!(manhattan <= 1);
        }
    }
}
