//! This crate provides the core logic for a single-tape Turing machine simulator.
//! It includes the unbounded tape, validated rule tables, the stepping engine and
//! result extraction, along with a parser and loader for table files and a set of
//! built-in tables.
//!
//! The engine performs no rendering or I/O. A driver calls [`Machine::step`] (or
//! [`Machine::run_with`]) and hands the returned [`StepResult`]s and [`Snapshot`]s
//! to whatever displays them.

pub mod analyzer;
pub mod config;
pub mod encoder;
pub mod extract;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod rules;
pub mod tables;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the analysis entry points and warning type.
pub use analyzer::{analyze, analyze_input, AnalysisWarning};
/// Re-exports the engine configuration types.
pub use config::{EngineConfig, Limits, MoveConvention};
/// Re-exports the table encoder.
pub use encoder::encode;
/// Re-exports the result extractor and its output.
pub use extract::{Extraction, ResultExtractor};
/// Re-exports the `TableLoader` struct from the loader module.
pub use loader::TableLoader;
/// Re-exports the `Machine` struct from the machine module.
pub use machine::Machine;
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports the validated rule table.
pub use rules::{RawTable, RuleTable};
/// Re-exports `TableInfo`, `TableManager`, and `TABLES` from the tables module.
pub use tables::{TableInfo, TableManager, TABLES};
/// Re-exports the tape.
pub use tape::Tape;
/// Re-exports the shared value and error types.
pub use types::{
    Direction, MachineError, Resource, Snapshot, State, StateId, Status, StepResult, Symbol,
    Transition, BLANK_SYMBOL,
};
