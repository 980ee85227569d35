//! This module defines the `Machine` struct, which simulates a deterministic
//! single-tape Turing machine. It owns the tape, head position and current state,
//! and advances them one transition at a time.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::config::{EngineConfig, Limits};
use crate::extract::{Extraction, ResultExtractor};
use crate::rules::RuleTable;
use crate::tape::Tape;
use crate::types::{
    Direction, MachineError, Resource, Snapshot, State, StepResult, Status, Symbol, Transition,
};

/// A single-tape Turing machine running a shared [`RuleTable`].
///
/// The machine starts in state 0 with its head on index 0. It is mutated only
/// through [`step`](Machine::step) (and [`reset`](Machine::reset)); a failed step
/// leaves every part of the configuration untouched.
#[derive(Debug, Clone)]
pub struct Machine {
    table: Arc<RuleTable>,
    config: EngineConfig,
    initial_tape: Tape,
    tape: Tape,
    head: i64,
    state: State,
    step_count: u64,
    last: Option<StepResult>,
}

impl Machine {
    /// Creates a machine over an all-blank tape with the default configuration.
    pub fn new(table: impl Into<Arc<RuleTable>>) -> Self {
        Self::with_config(table, EngineConfig::default())
    }

    pub fn with_config(table: impl Into<Arc<RuleTable>>, config: EngineConfig) -> Self {
        Self::with_tape(table, Tape::new(), config)
    }

    /// Creates a machine whose tape starts with the given contents.
    ///
    /// The tape is not checked against the table's alphabet; a symbol the table
    /// does not cover surfaces as `UndefinedTransition` when the head reads it.
    pub fn with_tape(table: impl Into<Arc<RuleTable>>, tape: Tape, config: EngineConfig) -> Self {
        Self {
            table: table.into(),
            config,
            initial_tape: tape.clone(),
            tape,
            head: 0,
            state: State::INITIAL,
            step_count: 0,
            last: None,
        }
    }

    /// Executes a single read/write/move/transition cycle.
    ///
    /// # Returns
    ///
    /// * `Ok(StepResult)` describing the configuration after the step. Once the
    ///   machine has halted this is a no-op that returns the final result again.
    /// * `Err(MachineError::UndefinedTransition)` if the table has no entry for the
    ///   current state and symbol.
    /// * `Err(MachineError::ResourceExhausted)` if a configured limit would be exceeded.
    pub fn step(&mut self) -> Result<StepResult, MachineError> {
        let State::Active(id) = self.state else {
            return Ok(self.last.unwrap_or_else(|| self.idle_result()));
        };

        let read = self.tape.read(self.head);
        let transition = self.table.lookup(id, read).map_err(|e| match e {
            MachineError::UndefinedTransition { state, symbol, .. } => {
                warn!(state, symbol, head = self.head, "Undefined transition");
                MachineError::UndefinedTransition {
                    state,
                    symbol,
                    head: self.head,
                }
            }
            other => other,
        })?;

        self.check_limits()?;

        Ok(self.apply(read, transition))
    }

    /// Runs the machine until it halts.
    ///
    /// With unbounded limits this may never return for a non-halting table.
    pub fn run(&mut self) -> Result<StepResult, MachineError> {
        self.run_with(|_| {})
    }

    /// Runs the machine until it halts, calling `observer` after every step.
    ///
    /// This is the hook a renderer uses to follow execution.
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<StepResult, MachineError>
    where
        F: FnMut(&StepResult),
    {
        loop {
            if let (State::Halted, Some(last)) = (self.state, self.last) {
                return Ok(last);
            }

            let result = self.step()?;
            observer(&result);

            if result.status == Status::Halted {
                return Ok(result);
            }
        }
    }

    /// Returns the padded non-blank part of the tape, or `None` if the tape is blank.
    ///
    /// # Errors
    ///
    /// `MachineError::NotHalted` while the machine is still running.
    pub fn extract_result(&self) -> Result<Option<Extraction>, MachineError> {
        if !self.is_halted() {
            return Err(MachineError::NotHalted);
        }

        Ok(ResultExtractor::new(self.config.margin).extract(&self.tape))
    }

    pub fn is_halted(&self) -> bool {
        self.state.is_halted()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn head(&self) -> i64 {
        self.head
    }

    /// Returns the total number of steps executed.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// The result of the most recent successful step.
    pub fn last_step(&self) -> Option<StepResult> {
        self.last
    }

    /// Reads a tape cell; indices never written read as blank.
    pub fn read(&self, index: i64) -> Symbol {
        self.tape.read(index)
    }

    /// Bounds of the materialized tape, both inclusive.
    pub fn window(&self) -> (i64, i64) {
        self.tape.window()
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn table(&self) -> &Arc<RuleTable> {
        &self.table
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replaces the resource limits. Used to continue after `ResourceExhausted`.
    pub fn set_limits(&mut self, limits: Limits) {
        self.config.limits = limits;
    }

    /// Returns an owned copy of the visible configuration.
    pub fn snapshot(&self) -> Snapshot {
        let (min_index, _) = self.tape.window();
        Snapshot {
            step: self.step_count,
            status: self.status(),
            state: self.state,
            head: self.head,
            min_index,
            cells: self.tape.cells(),
        }
    }

    /// Resets the machine to its initial configuration.
    /// This includes resetting the state, tape, head position and step count.
    pub fn reset(&mut self) {
        self.tape = self.initial_tape.clone();
        self.head = 0;
        self.state = State::INITIAL;
        self.step_count = 0;
        self.last = None;
    }

    fn status(&self) -> Status {
        if self.is_halted() {
            Status::Halted
        } else {
            Status::Continuing
        }
    }

    fn check_limits(&self) -> Result<(), MachineError> {
        let Limits {
            max_steps,
            max_tape_cells,
        } = self.config.limits;

        if let Some(limit) = max_steps.filter(|&limit| self.step_count >= limit) {
            warn!(limit, "Step limit reached");
            return Err(MachineError::ResourceExhausted(Resource::Steps { limit }));
        }

        if let Some(limit) = max_tape_cells.filter(|&limit| self.tape.span_with(self.head) > limit) {
            warn!(limit, head = self.head, "Tape limit reached");
            return Err(MachineError::ResourceExhausted(Resource::TapeCells { limit }));
        }

        Ok(())
    }

    /// Commits a transition. Everything that can fail has been checked by now.
    fn apply(&mut self, read: Symbol, transition: Transition) -> StepResult {
        self.tape.write(self.head, transition.write);
        self.head += self.config.convention.offset(transition.direction);
        self.state = transition.next_state;
        self.step_count += 1;

        let result = StepResult {
            step: self.step_count,
            status: self.status(),
            head: self.head,
            state: self.state,
            read,
            written: transition.write,
            direction: transition.direction,
        };

        trace!(
            step = result.step,
            head = result.head,
            state = %result.state,
            written = result.written,
            direction = %result.direction,
            "Step applied"
        );
        if result.status == Status::Halted {
            debug!(steps = self.step_count, head = self.head, "Machine halted");
        }

        self.last = Some(result);
        result
    }

    fn idle_result(&self) -> StepResult {
        let symbol = self.tape.read(self.head);
        StepResult {
            step: self.step_count,
            status: self.status(),
            head: self.head,
            state: self.state,
            read: symbol,
            written: symbol,
            direction: Direction::Left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MoveConvention;
    use crate::rules::tests::four_state_table;
    use crate::types::BLANK_SYMBOL;

    fn one_step_table() -> RuleTable {
        RuleTable::from_rows("One step", 2, &[vec![0, 1, 1, -1, 1, 1, -1]]).unwrap()
    }

    fn looping_table() -> RuleTable {
        // Walks in one direction forever, writing ones.
        RuleTable::from_rows("Runaway", 2, &[vec![0, 1, 0, 0, 1, 0, 0]]).unwrap()
    }

    #[test]
    fn test_machine_creation() {
        let machine = Machine::new(four_state_table());

        assert_eq!(machine.state(), State::Active(0));
        assert_eq!(machine.head(), 0);
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.window(), (0, 0));
        assert!(!machine.is_halted());
        assert_eq!(machine.last_step(), None);
    }

    #[test]
    fn test_single_step() {
        let mut machine = Machine::new(four_state_table());

        let result = machine.step().unwrap();

        assert_eq!(
            result,
            StepResult {
                step: 1,
                status: Status::Continuing,
                head: -1,
                state: State::Active(1),
                read: 0,
                written: 1,
                direction: Direction::Right,
            }
        );
        assert_eq!(machine.read(0), 1);
        assert_eq!(machine.head(), -1);
    }

    #[test]
    fn test_four_state_regression() {
        let mut machine = Machine::new(four_state_table());

        let result = machine.run().unwrap();

        assert_eq!(result.status, Status::Halted);
        assert_eq!(machine.step_count(), 107);
        assert_eq!(machine.head(), 9);
        assert_eq!(machine.state(), State::Halted);

        let extraction = machine.extract_result().unwrap().unwrap();
        assert_eq!((extraction.lo, extraction.hi), (-3, 10));
        assert_eq!(
            extraction.symbols,
            vec![0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 1, 0, 0, 0]
        );
        assert_eq!(extraction.marked(), 13);
    }

    #[test]
    fn test_head_move_convention_mirrors_result() {
        let config = EngineConfig {
            convention: MoveConvention::HeadMove,
            ..EngineConfig::default()
        };
        let mut machine = Machine::with_config(four_state_table(), config);

        machine.run().unwrap();

        assert_eq!(machine.step_count(), 107);
        assert_eq!(machine.head(), -9);
        let extraction = machine.extract_result().unwrap().unwrap();
        assert_eq!((extraction.lo, extraction.hi), (-10, 3));
        assert_eq!(
            extraction.symbols,
            vec![0, 0, 0, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0]
        );
    }

    #[test]
    fn test_determinism() {
        let table = Arc::new(four_state_table());

        let mut first = Vec::new();
        let mut machine = Machine::new(Arc::clone(&table));
        machine.run_with(|r| first.push(*r)).unwrap();

        let mut second = Vec::new();
        let mut other = Machine::new(table);
        other.run_with(|r| second.push(*r)).unwrap();

        assert_eq!(first.len(), 107);
        assert_eq!(first, second);
        assert_eq!(machine.extract_result(), other.extract_result());
    }

    #[test]
    fn test_one_step_halt() {
        let mut machine = Machine::new(one_step_table());

        let result = machine.step().unwrap();

        assert_eq!(result.status, Status::Halted);
        assert_eq!(machine.step_count(), 1);
        assert_eq!(machine.read(0), 1);
        assert_eq!(machine.tape().iter().filter(|&(_, s)| s != BLANK_SYMBOL).count(), 1);

        let extraction = machine.extract_result().unwrap().unwrap();
        assert_eq!(extraction.symbols, vec![0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_halt_stability() {
        let mut machine = Machine::new(four_state_table());
        let last = machine.run().unwrap();
        let tape = machine.tape().clone();
        let head = machine.head();

        for _ in 0..3 {
            assert_eq!(machine.step().unwrap(), last);
        }

        assert_eq!(machine.tape(), &tape);
        assert_eq!(machine.head(), head);
        assert_eq!(machine.state(), State::Halted);
        assert_eq!(machine.step_count(), 107);
        assert_eq!(machine.run().unwrap(), last);
    }

    #[test]
    fn test_undefined_transition_is_atomic() {
        // The input holds symbol 2, which a binary table cannot read.
        let tape = Tape::from_symbols(-1, &[2, 0]);
        let mut machine = Machine::with_tape(four_state_table(), tape, EngineConfig::default());

        // Step 1 writes at 0 and moves onto index -1.
        machine.step().unwrap();
        let before = machine.snapshot();

        let error = machine.step().unwrap_err();

        assert_eq!(
            error,
            MachineError::UndefinedTransition {
                state: 1,
                symbol: 2,
                head: -1
            }
        );
        assert_eq!(machine.snapshot(), before);
        assert_eq!(machine.step_count(), 1);
    }

    #[test]
    fn test_blank_default_totality() {
        let mut machine = Machine::new(four_state_table());

        for _ in 0..50 {
            machine.step().unwrap();
            assert_eq!(machine.read(1_000), BLANK_SYMBOL);
            assert_eq!(machine.read(-1_000), BLANK_SYMBOL);
        }
    }

    #[test]
    fn test_extract_before_halt() {
        let machine = Machine::new(four_state_table());
        assert_eq!(machine.extract_result(), Err(MachineError::NotHalted));
    }

    #[test]
    fn test_extract_blank_tape() {
        // Halts immediately after writing a blank.
        let table = RuleTable::from_rows("Eraser", 2, &[vec![0, 0, 1, -1, 0, 1, -1]]).unwrap();
        let mut machine = Machine::new(table);

        machine.run().unwrap();
        assert_eq!(machine.extract_result(), Ok(None));
    }

    #[test]
    fn test_step_limit_is_recoverable() {
        let config = EngineConfig {
            limits: Limits {
                max_steps: Some(10),
                max_tape_cells: None,
            },
            ..EngineConfig::default()
        };
        let mut machine = Machine::with_config(four_state_table(), config);

        let error = machine.run().unwrap_err();
        assert_eq!(
            error,
            MachineError::ResourceExhausted(Resource::Steps { limit: 10 })
        );
        assert_eq!(machine.step_count(), 10);
        assert!(!machine.is_halted());

        machine.set_limits(Limits::unbounded());
        machine.run().unwrap();
        assert_eq!(machine.step_count(), 107);
    }

    #[test]
    fn test_tape_limit_leaves_machine_untouched() {
        let config = EngineConfig {
            limits: Limits {
                max_steps: None,
                max_tape_cells: Some(5),
            },
            ..EngineConfig::default()
        };
        let mut machine = Machine::with_config(looping_table(), config);

        let error = machine.run().unwrap_err();
        assert_eq!(
            error,
            MachineError::ResourceExhausted(Resource::TapeCells { limit: 5 })
        );

        // Cells 0..=4 were written and the head sits on 5.
        assert_eq!(machine.step_count(), 5);
        assert_eq!(machine.head(), 5);
        assert_eq!(machine.window(), (0, 4));
    }

    #[test]
    fn test_reset() {
        let tape = Tape::from_symbols(0, &[1]);
        let mut machine = Machine::with_tape(four_state_table(), tape.clone(), EngineConfig::default());

        machine.step().unwrap();
        machine.step().unwrap();
        machine.reset();

        assert_eq!(machine.state(), State::Active(0));
        assert_eq!(machine.head(), 0);
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.tape(), &tape);
        assert_eq!(machine.last_step(), None);
    }

    #[test]
    fn test_snapshot_is_owned() {
        let mut machine = Machine::new(four_state_table());
        machine.step().unwrap();

        let snapshot = machine.snapshot();
        machine.step().unwrap();

        assert_eq!(snapshot.step, 1);
        assert_eq!(snapshot.head, -1);
        assert_eq!(snapshot.min_index, 0);
        assert_eq!(snapshot.cells, vec![1]);
        assert_eq!(snapshot.max_index(), 0);
        assert_ne!(machine.snapshot(), snapshot);
    }
}
