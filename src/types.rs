//! This module defines the core data structures and types shared across the engine:
//! symbols, states, move directions, transitions, step results, snapshots and the
//! error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// A single tape symbol. Valid symbols for a table lie in `0..K`.
pub type Symbol = u32;
/// A dense row index into a [`RuleTable`](crate::RuleTable).
pub type StateId = usize;

/// The blank symbol. Every cell that was never written reads as this value.
pub const BLANK_SYMBOL: Symbol = 0;
/// The raw encoding of the halting state in rule rows.
pub const HALT_STATE_CODE: i64 = -1;
/// Raw encoding of [`Direction::Left`] in rule rows.
pub const MOVE_LEFT_CODE: i64 = 0;
/// Raw encoding of [`Direction::Right`] in rule rows.
pub const MOVE_RIGHT_CODE: i64 = 1;
/// Padding of blank cells added on each side of an extracted result.
pub const DEFAULT_MARGIN: usize = 3;
/// Largest blank padding an extraction will add on each side.
pub const MAX_MARGIN: usize = 1 << 16;
/// The default ceiling on executed steps.
pub const MAX_EXECUTION_STEPS: u64 = 1_000_000;
/// The default ceiling on materialized tape cells.
pub const MAX_TAPE_CELLS: usize = 1 << 20;
/// The maximum allowed size for a table file in bytes.
pub const MAX_TABLE_SIZE: usize = 65536; // 64KB

/// The control state of a machine: either an active rule row or halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    /// Executing the row with the given index.
    Active(StateId),
    /// Terminal state. No further transitions occur.
    Halted,
}

impl State {
    /// The state every machine starts in.
    pub const INITIAL: State = State::Active(0);

    /// Decodes a raw `next` value from a rule row. Only `-1` and non-negative
    /// values are meaningful; anything else yields `None`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            HALT_STATE_CODE => Some(State::Halted),
            n if n >= 0 => usize::try_from(n).ok().map(State::Active),
            _ => None,
        }
    }

    /// Encodes the state back into its rule row form.
    pub fn code(self) -> i64 {
        match self {
            State::Active(id) => id as i64,
            State::Halted => HALT_STATE_CODE,
        }
    }

    pub fn is_halted(self) -> bool {
        self == State::Halted
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Active(id) => write!(f, "{id}"),
            State::Halted => write!(f, "halt"),
        }
    }
}

/// The direction named by a transition.
///
/// How a direction maps onto head arithmetic is decided by
/// [`MoveConvention`](crate::config::MoveConvention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Decodes the `0`/`1` move code used in rule rows.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            MOVE_LEFT_CODE => Some(Direction::Left),
            MOVE_RIGHT_CODE => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Direction::Left => MOVE_LEFT_CODE,
            Direction::Right => MOVE_RIGHT_CODE,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "L"),
            Direction::Right => write!(f, "R"),
        }
    }
}

/// One entry of a rule table: what to write, where to move and which state follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub write: Symbol,
    pub direction: Direction,
    pub next_state: State,
}

/// Whether the machine can still make progress after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Continuing,
    Halted,
}

/// The outcome of a single step, reflecting the configuration after the step.
///
/// This is a plain value so a driver can hand it to a renderer without sharing
/// the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// The 1-based number of the step that produced this result.
    pub step: u64,
    pub status: Status,
    /// Head position after the move.
    pub head: i64,
    /// State after the transition.
    pub state: State,
    /// Symbol that was under the head before the write.
    pub read: Symbol,
    pub written: Symbol,
    pub direction: Direction,
}

/// An owned copy of the machine's visible configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub step: u64,
    pub status: Status,
    pub state: State,
    pub head: i64,
    /// Index of `cells[0]`.
    pub min_index: i64,
    pub cells: Vec<Symbol>,
}

impl Snapshot {
    pub fn max_index(&self) -> i64 {
        self.min_index + self.cells.len() as i64 - 1
    }
}

/// The resource whose ceiling was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resource {
    /// The machine already executed `limit` steps.
    Steps { limit: u64 },
    /// The next write would grow the tape beyond `limit` cells.
    TapeCells { limit: usize },
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Steps { limit } => write!(f, "step limit of {limit} reached"),
            Resource::TapeCells { limit } => write!(f, "tape limit of {limit} cells reached"),
        }
    }
}

/// Represents the errors that can occur while building tables or running machines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// The rule table is structurally invalid. `symbol` names the offending column when known.
    #[error("Malformed table at row {row}{}: {reason}", .symbol.map(|s| format!(", symbol {s}")).unwrap_or_default())]
    MalformedTable {
        row: usize,
        symbol: Option<Symbol>,
        reason: String,
    },
    /// No transition exists for the given state and symbol.
    #[error("No rule defined for state {state} and symbol {symbol} (head at {head})")]
    UndefinedTransition {
        state: StateId,
        symbol: Symbol,
        head: i64,
    },
    /// A configured ceiling was reached. The machine is left untouched and may continue
    /// once the limit is raised.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(Resource),
    /// The result was requested before the machine halted.
    #[error("Machine has not halted")]
    NotHalted,
    /// Indicates an error during the parsing of a table definition.
    #[error("Table parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error related to reading table files.
    #[error("File error: {0}")]
    FileError(String),
}

impl MachineError {
    pub(crate) fn malformed(row: usize, symbol: Option<Symbol>, reason: impl Into<String>) -> Self {
        MachineError::MalformedTable {
            row,
            symbol,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let right_json = serde_json::to_string(&Direction::Right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let left: Direction = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, Direction::Left);
    }

    #[test]
    fn test_state_codes() {
        assert_eq!(State::from_code(-1), Some(State::Halted));
        assert_eq!(State::from_code(3), Some(State::Active(3)));
        assert_eq!(State::from_code(-2), None);
        assert_eq!(State::Halted.code(), -1);
        assert_eq!(State::Active(2).code(), 2);
    }

    #[test]
    fn test_direction_codes() {
        assert_eq!(Direction::from_code(0), Some(Direction::Left));
        assert_eq!(Direction::from_code(1), Some(Direction::Right));
        assert_eq!(Direction::from_code(2), None);
    }

    #[test]
    fn test_error_display() {
        let error = MachineError::malformed(2, Some(1), "next state 5 does not exist");
        assert_eq!(
            error.to_string(),
            "Malformed table at row 2, symbol 1: next state 5 does not exist"
        );

        let error = MachineError::malformed(0, None, "table has no rows");
        assert_eq!(error.to_string(), "Malformed table at row 0: table has no rows");

        let error = MachineError::ResourceExhausted(Resource::Steps { limit: 10 });
        assert!(error.to_string().contains("step limit of 10"));
    }
}
