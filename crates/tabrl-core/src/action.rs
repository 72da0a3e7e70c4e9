//! Discrete action alphabets

use serde::Serialize;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait for actions in a tabular environment
///
/// Each environment ships a small `Copy` enum. `Ord` gives Q-table rows a
/// stable order and `Serialize` must produce a string so rows can become
/// JSON object maps.
pub trait Action:
    Copy + Debug + Display + Eq + Ord + Hash + Serialize + Send + Sync + 'static
{
    /// Stable lowercase identifier, e.g. `"up"`
    fn name(&self) -> &'static str;
}

/// Check that `action` belongs to `valid`, reporting a contract violation otherwise
pub fn ensure_valid<A: Action>(action: A, valid: &[A]) -> crate::Result<()> {
    if valid.contains(&action) {
        Ok(())
    } else {
        Err(crate::RLError::InvalidAction(format!(
            "{} is not one of {:?}",
            action.name(),
            valid.iter().map(Action::name).collect::<Vec<_>>()
        )))
    }
}
