//! Raw buffer coordinates.

/// A position in raw (absolute-history) coordinates.
///
/// `line` indexes the full line history including scrolled-out rows still
/// held in the ring; `col` is a viewport column. View-relative positions are
/// derived on the buffer, which knows the scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u64,
    pub col: u16,
}

impl Position {
    #[must_use]
    pub const fn new(line: u64, col: u16) -> Self {
        Self { line, col }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_line_major() {
        assert!(Position::new(1, 0) > Position::new(0, 79));
        assert!(Position::new(2, 3) < Position::new(2, 4));
        assert_eq!(Position::new(5, 5), Position::new(5, 5));
    }
}
