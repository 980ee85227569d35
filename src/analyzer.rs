//! This module provides functions for analyzing rule tables for problems that are
//! structurally legal but usually mistakes: rows that can never run, tables that
//! can never halt, and input tapes the table cannot read.
//!
//! Everything reported here is a warning. A table that passed
//! [`RuleTable::from_rows`] can always be run.

use std::collections::HashSet;
use std::fmt;

use crate::rules::RuleTable;
use crate::tape::Tape;
use crate::types::{State, StateId, Symbol};

/// A non-fatal finding about a table.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisWarning {
    /// Rows that cannot be reached from state 0.
    UnreachableStates(Vec<StateId>),
    /// No transition reachable from state 0 leads to the halting state.
    HaltUnreachable,
    /// Symbols on the initial tape that lie outside the table's alphabet.
    InvalidTapeSymbols(Vec<Symbol>),
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisWarning::UnreachableStates(states) => {
                write!(f, "Unreachable states detected: {states:?}")
            }
            AnalysisWarning::HaltUnreachable => {
                write!(f, "No reachable transition halts; the machine can never stop")
            }
            AnalysisWarning::InvalidTapeSymbols(symbols) => write!(
                f,
                "Initial tape contains symbols outside the alphabet: {symbols:?}"
            ),
        }
    }
}

/// Analyzes a table and returns every warning found, in a stable order.
pub fn analyze(table: &RuleTable) -> Vec<AnalysisWarning> {
    let reachable = reachable_states(table);

    let mut warnings = Vec::new();

    let unreachable = (0..table.state_count())
        .filter(|state| !reachable.contains(state))
        .collect::<Vec<_>>();
    if !unreachable.is_empty() {
        warnings.push(AnalysisWarning::UnreachableStates(unreachable));
    }

    let halts = reachable.iter().any(|&state| {
        table.row(state).is_some_and(|row| {
            row.iter()
                .any(|transition| transition.next_state == State::Halted)
        })
    });
    if !halts {
        warnings.push(AnalysisWarning::HaltUnreachable);
    }

    warnings
}

/// Checks that every symbol on an initial tape belongs to the table's alphabet.
pub fn analyze_input(table: &RuleTable, tape: &Tape) -> Option<AnalysisWarning> {
    let alphabet = table.symbol_count();
    let mut invalid = tape
        .iter()
        .map(|(_, symbol)| symbol)
        .filter(|&symbol| symbol as usize >= alphabet)
        .collect::<Vec<_>>();

    invalid.sort_unstable();
    invalid.dedup();

    (!invalid.is_empty()).then_some(AnalysisWarning::InvalidTapeSymbols(invalid))
}

/// Collects the rows reachable from state 0 by a depth-first traversal.
fn reachable_states(table: &RuleTable) -> HashSet<StateId> {
    let mut visited = HashSet::new();
    let mut queue = vec![0];

    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        for transition in table.row(state).unwrap_or_default() {
            if let State::Active(next) = transition.next_state {
                if !visited.contains(&next) {
                    queue.push(next);
                }
            }
        }
    }

    visited
}
