//! A row of cells with wrap bookkeeping.

use crate::cell::{Cell, CellAttributes};

/// One raw line of the buffer.
///
/// `wrapped` marks a continuation of the previous raw line produced by
/// auto-wrap rather than an explicit newline. Carriage-return and reflow
/// walk these chains to find real line boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub cells: Vec<Cell>,
    pub wrapped: bool,
}

impl Line {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn wrapped() -> Self {
        Self {
            cells: Vec::new(),
            wrapped: true,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Grow the cell vector so `col` is a valid index.
    pub fn ensure_col(&mut self, col: u16) {
        let needed = col as usize + 1;
        if self.cells.len() < needed {
            self.cells.resize(needed, Cell::default());
        }
    }

    #[must_use]
    pub fn cell(&self, col: u16) -> Option<&Cell> {
        self.cells.get(col as usize)
    }

    pub fn cell_mut(&mut self, col: u16) -> Option<&mut Cell> {
        self.cells.get_mut(col as usize)
    }

    /// Erase cells in `[from, to)`, clamped to the line, keeping the given
    /// background. Extends the line so the erased span exists.
    pub fn erase_range(&mut self, from: u16, to: u16, attrs: CellAttributes) {
        if to == 0 || from >= to {
            return;
        }
        self.ensure_col(to - 1);
        for cell in &mut self.cells[from as usize..to as usize] {
            cell.erase(attrs);
        }
    }

    /// Line content as text, with trailing empty cells trimmed.
    #[must_use]
    pub fn text(&self) -> String {
        let last = self
            .cells
            .iter()
            .rposition(|c| !c.is_empty())
            .map_or(0, |i| i + 1);
        self.cells[..last]
            .iter()
            .map(|c| if c.is_empty() { ' ' } else { c.rune })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_of(s: &str) -> Line {
        let mut line = Line::new();
        for (i, ch) in s.chars().enumerate() {
            line.ensure_col(i as u16);
            line.cells[i].set_rune(ch, CellAttributes::default());
        }
        line
    }

    #[test]
    fn text_trims_trailing_empties() {
        let mut line = line_of("hi");
        line.ensure_col(9);
        assert_eq!(line.text(), "hi");
    }

    #[test]
    fn text_keeps_interior_empties_as_spaces() {
        let mut line = line_of("ab");
        line.ensure_col(4);
        line.cells[4].set_rune('z', CellAttributes::default());
        assert_eq!(line.text(), "ab  z");
    }

    #[test]
    fn erase_range_extends_and_clears() {
        let mut line = line_of("abcdef");
        line.erase_range(2, 4, CellAttributes::default());
        assert_eq!(line.text(), "ab  ef");
        assert!(line.cells[2].is_empty());
        assert!(line.cells[3].is_empty());
    }

    #[test]
    fn erase_range_empty_span_is_noop() {
        let mut line = line_of("abc");
        line.erase_range(2, 2, CellAttributes::default());
        assert_eq!(line.text(), "abc");
    }
}
