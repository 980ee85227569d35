//! Extraction of the meaningful part of a halted machine's tape.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tape::Tape;
use crate::types::{Symbol, BLANK_SYMBOL, DEFAULT_MARGIN, MAX_MARGIN};

/// The non-blank span of a tape plus blank padding on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Lowest non-blank index.
    pub lo: i64,
    /// Highest non-blank index.
    pub hi: i64,
    /// Index of `symbols[0]`, i.e. `lo - margin`.
    pub start: i64,
    /// Cells of `[lo - margin, hi + margin]`.
    pub symbols: Vec<Symbol>,
}

impl Extraction {
    pub fn end(&self) -> i64 {
        self.start + self.symbols.len() as i64 - 1
    }

    /// Number of non-blank cells.
    pub fn marked(&self) -> usize {
        self.symbols.iter().filter(|&&s| s != BLANK_SYMBOL).count()
    }
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols = self
            .symbols
            .iter()
            .map(|symbol| symbol.to_string())
            .collect::<Vec<_>>();
        write!(f, "{}", symbols.join(" "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultExtractor {
    margin: usize,
}

impl Default for ResultExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MARGIN)
    }
}

impl ResultExtractor {
    /// Creates an extractor padding each side with `margin` blanks, capped at
    /// [`MAX_MARGIN`].
    pub fn new(margin: usize) -> Self {
        Self {
            margin: margin.min(MAX_MARGIN),
        }
    }

    pub fn margin(&self) -> usize {
        self.margin
    }

    /// Returns the padded non-blank span of `tape`, or `None` for an all-blank tape.
    ///
    /// The scan runs inward from the window edges, so it never leaves the
    /// materialized region.
    pub fn extract(&self, tape: &Tape) -> Option<Extraction> {
        let lo = tape.iter().find(|&(_, s)| s != BLANK_SYMBOL)?.0;
        let hi = tape.iter().rev().find(|&(_, s)| s != BLANK_SYMBOL)?.0;

        let margin = i64::try_from(self.margin).unwrap_or(i64::MAX);
        let start = lo.saturating_sub(margin);

        Some(Extraction {
            lo,
            hi,
            start,
            symbols: tape.read_range(start, hi.saturating_add(margin)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_tape_is_empty() {
        let mut tape = Tape::new();
        assert_eq!(ResultExtractor::default().extract(&tape), None);

        tape.write(-5, 0);
        tape.write(5, 0);
        assert_eq!(ResultExtractor::default().extract(&tape), None);
    }

    #[test]
    fn test_padded_span() {
        let mut tape = Tape::new();
        tape.write(-4, 0);
        tape.write(-1, 1);
        tape.write(2, 1);
        tape.write(6, 0);

        let extraction = ResultExtractor::new(2).extract(&tape).unwrap();

        assert_eq!(extraction.lo, -1);
        assert_eq!(extraction.hi, 2);
        assert_eq!(extraction.start, -3);
        assert_eq!(extraction.end(), 4);
        assert_eq!(extraction.symbols, vec![0, 0, 1, 0, 0, 1, 0, 0]);
        assert_eq!(extraction.marked(), 2);
        assert_eq!(extraction.to_string(), "0 0 1 0 0 1 0 0");
    }

    #[test]
    fn test_margin_may_exceed_window() {
        let tape = Tape::from_symbols(0, &[1]);

        let extraction = ResultExtractor::new(3).extract(&tape).unwrap();
        assert_eq!(extraction.symbols, vec![0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_huge_margin_is_capped() {
        let extractor = ResultExtractor::new(usize::MAX);
        assert_eq!(extractor.margin(), MAX_MARGIN);

        let extraction = extractor.extract(&Tape::from_symbols(0, &[1])).unwrap();
        assert_eq!(extraction.start, -(MAX_MARGIN as i64));
        assert_eq!(extraction.end(), MAX_MARGIN as i64);
        assert_eq!(extraction.symbols.len(), 2 * MAX_MARGIN + 1);
        assert_eq!(extraction.marked(), 1);
    }

    #[test]
    fn test_zero_margin() {
        let tape = Tape::from_symbols(3, &[1, 0, 1]);

        let extraction = ResultExtractor::new(0).extract(&tape).unwrap();
        assert_eq!((extraction.lo, extraction.hi), (3, 5));
        assert_eq!(extraction.symbols, vec![1, 0, 1]);
    }
}
