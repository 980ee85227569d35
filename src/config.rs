//! Engine configuration: resource ceilings, extraction margin and the move convention.

use serde::{Deserialize, Serialize};

use crate::types::{Direction, DEFAULT_MARGIN, MAX_EXECUTION_STEPS, MAX_TAPE_CELLS};

/// Upper bounds enforced by [`Machine::step`](crate::Machine::step).
///
/// `None` disables a ceiling. Hitting one is reported as
/// [`MachineError::ResourceExhausted`](crate::MachineError::ResourceExhausted), never as a halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_steps: Option<u64>,
    pub max_tape_cells: Option<usize>,
}

impl Limits {
    pub fn unbounded() -> Self {
        Self {
            max_steps: None,
            max_tape_cells: None,
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: Some(MAX_EXECUTION_STEPS),
            max_tape_cells: Some(MAX_TAPE_CELLS),
        }
    }
}

/// How a [`Direction`] translates into head arithmetic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveConvention {
    /// The tape slides under a fixed head: `Left` increments the head index and
    /// `Right` decrements it.
    #[default]
    TapeShift,
    /// The head moves over a fixed tape: `Left` decrements, `Right` increments.
    HeadMove,
}

impl MoveConvention {
    pub fn offset(self, direction: Direction) -> i64 {
        match (self, direction) {
            (MoveConvention::TapeShift, Direction::Left) => 1,
            (MoveConvention::TapeShift, Direction::Right) => -1,
            (MoveConvention::HeadMove, Direction::Left) => -1,
            (MoveConvention::HeadMove, Direction::Right) => 1,
        }
    }
}

/// Runtime settings for a [`Machine`](crate::Machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: Limits,
    /// Blank cells shown on each side of an extracted result.
    pub margin: usize,
    pub convention: MoveConvention,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            margin: DEFAULT_MARGIN,
            convention: MoveConvention::default(),
        }
    }
}
