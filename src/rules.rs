//! This module defines [`RuleTable`], the validated `(state, symbol) -> transition`
//! mapping that drives a machine.
//!
//! Tables are built from rows of `1 + 3K` integers:
//!
//! ```text
//! [stateId, write0, move0, next0, write1, move1, next1, ...]
//! ```
//!
//! where `stateId` must equal the row position, `move` is `0` (left) or `1` (right)
//! and `next` is a row index or `-1` for halt. All checks happen at construction time.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Direction, MachineError, State, StateId, Symbol, Transition};

/// An immutable, validated rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTable", into = "RawTable")]
pub struct RuleTable {
    name: String,
    symbols: usize,
    /// Dense row-major storage, `symbols` entries per row.
    transitions: Vec<Transition>,
}

/// The serialized form of a table, as found in JSON files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    #[serde(default)]
    pub name: String,
    pub symbols: usize,
    pub rows: Vec<Vec<i64>>,
}

impl RuleTable {
    /// Builds a table over an alphabet of `symbols` symbols from raw integer rows.
    ///
    /// # Errors
    ///
    /// `MachineError::MalformedTable` naming the first offending row (and symbol
    /// column where one applies).
    pub fn from_rows(
        name: impl Into<String>,
        symbols: usize,
        rows: &[Vec<i64>],
    ) -> Result<Self, MachineError> {
        if symbols == 0 {
            return Err(MachineError::malformed(0, None, "alphabet must have at least one symbol"));
        }
        if rows.is_empty() {
            return Err(MachineError::malformed(0, None, "table has no rows"));
        }

        let arity = symbols
            .checked_mul(3)
            .and_then(|cells| cells.checked_add(1))
            .ok_or_else(|| {
                MachineError::malformed(0, None, format!("alphabet of {symbols} symbols is too large"))
            })?;
        // Sized from the rows actually given, never from the declared alphabet.
        let mut transitions = Vec::with_capacity(rows.iter().map(|row| row.len() / 3).sum());

        for (index, row) in rows.iter().enumerate() {
            if row.len() != arity {
                return Err(MachineError::malformed(
                    index,
                    None,
                    format!("expected {} integers, found {}", arity, row.len()),
                ));
            }
            if row[0] != index as i64 {
                return Err(MachineError::malformed(
                    index,
                    None,
                    format!("state id {} does not match row position", row[0]),
                ));
            }

            for (symbol, triple) in row[1..].chunks_exact(3).enumerate() {
                transitions.push(decode_triple(index, symbol, triple, symbols, rows.len())?);
            }
        }

        let name = name.into();
        debug!(name = %name, states = rows.len(), symbols, "Rule table built");

        Ok(Self {
            name,
            symbols,
            transitions,
        })
    }

    /// Returns the transition for `state` reading `symbol`.
    ///
    /// Missing entries are never defaulted: an unknown state or an out-of-alphabet
    /// symbol is an `UndefinedTransition`. The returned error carries head `0`;
    /// [`Machine::step`](crate::Machine::step) fills in the real position.
    pub fn lookup(&self, state: StateId, symbol: Symbol) -> Result<Transition, MachineError> {
        let column = symbol as usize;
        if state >= self.state_count() || column >= self.symbols {
            return Err(MachineError::UndefinedTransition {
                state,
                symbol,
                head: 0,
            });
        }

        Ok(self.transitions[state * self.symbols + column])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The alphabet size `K`.
    pub fn symbol_count(&self) -> usize {
        self.symbols
    }

    /// The number of rows `R`.
    pub fn state_count(&self) -> usize {
        self.transitions.len() / self.symbols
    }

    /// The transitions of one row, indexed by symbol.
    pub fn row(&self, state: StateId) -> Option<&[Transition]> {
        let start = state.checked_mul(self.symbols)?;
        self.transitions.get(start..start + self.symbols)
    }

    /// Iterates over rows in state order.
    pub fn rows(&self) -> impl Iterator<Item = &[Transition]> + '_ {
        self.transitions.chunks_exact(self.symbols)
    }

    /// Re-encodes the table into its raw integer rows.
    pub fn to_rows(&self) -> Vec<Vec<i64>> {
        self.rows()
            .enumerate()
            .map(|(state, row)| {
                let mut raw = Vec::with_capacity(1 + 3 * self.symbols);
                raw.push(state as i64);
                for transition in row {
                    raw.push(i64::from(transition.write));
                    raw.push(transition.direction.code());
                    raw.push(transition.next_state.code());
                }
                raw
            })
            .collect()
    }
}

fn decode_triple(
    row: usize,
    symbol: usize,
    triple: &[i64],
    symbols: usize,
    states: usize,
) -> Result<Transition, MachineError> {
    let column = Some(symbol as Symbol);
    let (write, direction, next) = (triple[0], triple[1], triple[2]);

    if write < 0 || write >= symbols as i64 {
        return Err(MachineError::malformed(
            row,
            column,
            format!("write symbol {write} is outside the alphabet 0..{symbols}"),
        ));
    }

    let direction = Direction::from_code(direction).ok_or_else(|| {
        MachineError::malformed(row, column, format!("move {direction} is not 0 (left) or 1 (right)"))
    })?;

    let next_state = match State::from_code(next) {
        Some(State::Active(id)) if id < states => State::Active(id),
        Some(State::Halted) => State::Halted,
        _ => {
            return Err(MachineError::malformed(
                row,
                column,
                format!("next state {next} does not exist"),
            ))
        }
    };

    Ok(Transition {
        write: write as Symbol,
        direction,
        next_state,
    })
}

impl TryFrom<RawTable> for RuleTable {
    type Error = MachineError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        RuleTable::from_rows(raw.name, raw.symbols, &raw.rows)
    }
}

impl From<RuleTable> for RawTable {
    fn from(table: RuleTable) -> Self {
        RawTable {
            rows: table.to_rows(),
            name: table.name,
            symbols: table.symbols,
        }
    }
}
