//! The machine tape: a bi-infinite sequence of symbols backed by a window that
//! grows at either edge as cells are written.

use std::collections::VecDeque;
use std::fmt;

use crate::types::{Symbol, BLANK_SYMBOL};

/// A tape keyed by signed index.
///
/// Only the window `[min_index, max_index]` is stored; every index outside of it
/// reads as [`BLANK_SYMBOL`]. The window always contains index 0 and never shrinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: VecDeque<Symbol>,
    origin: i64,
}

impl Default for Tape {
    fn default() -> Self {
        Self::new()
    }
}

impl Tape {
    /// Creates an all-blank tape.
    pub fn new() -> Self {
        Self {
            cells: VecDeque::from([BLANK_SYMBOL]),
            origin: 0,
        }
    }

    /// Creates a tape holding `symbols` at indices `start..start + len`.
    ///
    /// Like [`Tape::write`], this materializes every cell between index 0 and the
    /// placed symbols, so `start` should stay near the origin.
    pub fn from_symbols(start: i64, symbols: &[Symbol]) -> Self {
        let mut tape = Self::new();
        for (offset, &symbol) in symbols.iter().enumerate() {
            tape.write(start + offset as i64, symbol);
        }
        tape
    }

    /// Returns the symbol at `index`, or blank if the cell was never materialized.
    pub fn read(&self, index: i64) -> Symbol {
        self.slot(index)
            .and_then(|slot| self.cells.get(slot).copied())
            .unwrap_or(BLANK_SYMBOL)
    }

    /// Stores `symbol` at `index`, growing the window with blanks if needed.
    ///
    /// The tape itself puts no bound on that growth. A [`Machine`](crate::Machine)
    /// checks [`Tape::span_with`] against its tape-cell limit before every write.
    pub fn write(&mut self, index: i64, symbol: Symbol) {
        let (min, max) = self.window();
        if index < min {
            for _ in index..min {
                self.cells.push_front(BLANK_SYMBOL);
            }
            self.origin = index;
        } else if index > max {
            for _ in max..index {
                self.cells.push_back(BLANK_SYMBOL);
            }
        }

        let slot = (index - self.origin) as usize;
        self.cells[slot] = symbol;
    }

    /// Bounds of the materialized region, both inclusive.
    pub fn window(&self) -> (i64, i64) {
        (self.origin, self.origin + self.cells.len() as i64 - 1)
    }

    /// Number of materialized cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// A tape always holds at least one cell.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The number of cells the window would hold after a write at `index`,
    /// saturating at `usize::MAX`.
    pub fn span_with(&self, index: i64) -> usize {
        let (min, max) = self.window();
        let span = i128::from(max.max(index)) - i128::from(min.min(index)) + 1;
        usize::try_from(span).unwrap_or(usize::MAX)
    }

    /// Iterates over `(index, symbol)` pairs of the materialized window.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (i64, Symbol)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(offset, &symbol)| (self.origin + offset as i64, symbol))
    }

    /// Copies the materialized window into a contiguous vector.
    pub fn cells(&self) -> Vec<Symbol> {
        self.cells.iter().copied().collect()
    }

    /// Reads the closed range `[from, to]`, blank-filling outside the window.
    pub fn read_range(&self, from: i64, to: i64) -> Vec<Symbol> {
        (from..=to).map(|index| self.read(index)).collect()
    }

    fn slot(&self, index: i64) -> Option<usize> {
        index
            .checked_sub(self.origin)
            .and_then(|offset| usize::try_from(offset).ok())
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols = self
            .cells
            .iter()
            .map(|symbol| symbol.to_string())
            .collect::<Vec<_>>();
        write!(f, "{}", symbols.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tape_is_blank() {
        let tape = Tape::new();

        assert_eq!(tape.window(), (0, 0));
        assert_eq!(tape.read(0), BLANK_SYMBOL);
        assert_eq!(tape.read(-1_000_000), BLANK_SYMBOL);
        assert_eq!(tape.read(i64::MAX), BLANK_SYMBOL);
    }

    #[test]
    fn test_write_extends_right() {
        let mut tape = Tape::new();
        tape.write(3, 1);

        assert_eq!(tape.window(), (0, 3));
        assert_eq!(tape.cells(), vec![0, 0, 0, 1]);
        assert_eq!(tape.read(3), 1);
        assert_eq!(tape.read(4), BLANK_SYMBOL);
    }

    #[test]
    fn test_write_extends_left() {
        let mut tape = Tape::new();
        tape.write(-2, 1);
        tape.write(0, 1);

        assert_eq!(tape.window(), (-2, 0));
        assert_eq!(tape.cells(), vec![1, 0, 1]);
        assert_eq!(tape.read(-2), 1);
        assert_eq!(tape.read(-1), BLANK_SYMBOL);
        assert_eq!(tape.read(-3), BLANK_SYMBOL);
    }

    #[test]
    fn test_overwrite_keeps_window() {
        let mut tape = Tape::new();
        tape.write(-1, 1);
        tape.write(1, 1);
        tape.write(-1, 0);

        assert_eq!(tape.window(), (-1, 1));
        assert_eq!(tape.read(-1), 0);
        assert_eq!(tape.len(), 3);
    }

    #[test]
    fn test_span_with() {
        let mut tape = Tape::new();
        tape.write(2, 1);

        assert_eq!(tape.span_with(1), 3);
        assert_eq!(tape.span_with(5), 6);
        assert_eq!(tape.span_with(-2), 5);
    }

    #[test]
    fn test_span_with_extreme_indices() {
        let tape = Tape::new();

        assert_eq!(tape.span_with(i64::MIN) as u128, (1u128 << 63) + 1);
        assert_eq!(tape.span_with(i64::MAX) as u128, 1u128 << 63);
    }

    #[test]
    fn test_from_symbols_and_iter() {
        let tape = Tape::from_symbols(-1, &[1, 0, 1]);

        assert_eq!(tape.window(), (-1, 1));
        assert_eq!(
            tape.iter().collect::<Vec<_>>(),
            vec![(-1, 1), (0, 0), (1, 1)]
        );
        assert_eq!(tape.read_range(-3, 2), vec![0, 0, 1, 0, 1, 0]);
        assert_eq!(tape.to_string(), "1 0 1");
    }
}
