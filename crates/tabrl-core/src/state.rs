//! Canonical state keys
//!
//! Every table in the engine is keyed by [`StateKey`]. A key is a short
//! sequence of integer coordinates (`row,col` for the grid world,
//! `posBin,velBin` for the mountain car) and is the only identity a state
//! has once it leaves its environment.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::RLError;

/// Canonical, totally ordered identity of a discrete state
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(Vec<i64>);

impl StateKey {
    /// Create a key from its coordinates
    pub fn new(coords: impl Into<Vec<i64>>) -> Self {
        Self(coords.into())
    }

    /// Create a two-coordinate key
    #[must_use]
    pub fn pair(a: i64, b: i64) -> Self {
        Self(vec![a, b])
    }

    /// Raw coordinates
    #[must_use]
    pub fn coords(&self) -> &[i64] {
        &self.0
    }

    /// Coordinates as a pair, if the key has exactly two
    #[must_use]
    pub fn as_pair(&self) -> Option<(i64, i64)> {
        match self.0.as_slice() {
            [a, b] => Some((*a, *b)),
            _ => None,
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl FromStr for StateKey {
    type Err = RLError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(RLError::InvalidState("empty state key".to_string()));
        }
        s.split(',')
            .map(|part| {
                part.trim()
                    .parse::<i64>()
                    .map_err(|_| RLError::InvalidState(format!("malformed state key: {s}")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl From<(i64, i64)> for StateKey {
    fn from((a, b): (i64, i64)) -> Self {
        Self::pair(a, b)
    }
}

// Serialized as the comma-separated form so tables become JSON object maps.
impl Serialize for StateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
