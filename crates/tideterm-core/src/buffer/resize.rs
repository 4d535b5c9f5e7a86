//! Viewport resize with content reflow.
//!
//! Resizing first rejoins every wrap chain into its logical line, then
//! re-splits at the new width. The cursor follows its logical position:
//! its offset within the chain is carried across the rejoin and mapped
//! back with division/modulo on the new width. Shrinking then growing back
//! to the original width reconstructs the original rows exactly.

use std::collections::VecDeque;

use super::Buffer;
use crate::cell::Cell;
use crate::line::Line;

impl Buffer {
    /// Resize the viewport, reflowing wrapped content.
    pub fn resize_view(&mut self, width: u16, height: u16) {
        let width = width.max(1);
        let height = height.max(1);
        if width == self.view_width && height == self.view_height {
            return;
        }

        let old_width = usize::from(self.view_width);
        let cursor_raw = self.cursor.line as usize;
        let cursor_col = usize::from(self.cursor.col);

        // Rejoin wrap chains into logical lines, tracking where the cursor
        // lands inside its chain.
        let mut logical: Vec<Line> = Vec::new();
        let mut rows_in_chain = 0usize;
        let mut cursor_logical: (usize, usize) = (0, 0);
        for (raw, line) in self.lines.drain(..).enumerate() {
            match logical.last_mut() {
                Some(last) if line.wrapped => {
                    // Pad so the continuation's columns stay aligned.
                    let aligned = rows_in_chain * old_width;
                    if last.cells.len() < aligned {
                        last.cells.resize(aligned, Cell::default());
                    }
                    last.cells.extend(line.cells);
                }
                _ => {
                    logical.push(line);
                    rows_in_chain = 0;
                }
            }
            if raw == cursor_raw {
                cursor_logical = (logical.len() - 1, rows_in_chain * old_width + cursor_col);
            }
            rows_in_chain += 1;
        }

        // Re-split at the new width.
        let new_width = usize::from(width);
        let mut lines: VecDeque<Line> = VecDeque::new();
        let mut new_cursor_line = 0u64;
        let mut new_cursor_col = 0u16;
        for (index, mut line) in logical.into_iter().enumerate() {
            while line.cells.last().map_or(false, Cell::is_empty) {
                line.cells.pop();
            }
            let base_row = lines.len() as u64;
            let head_wrapped = line.wrapped;
            let fragments = (line.cells.len().div_ceil(new_width)).max(1);
            if index == cursor_logical.0 {
                let (col, row) = (cursor_logical.1 % new_width, cursor_logical.1 / new_width);
                if row < fragments {
                    new_cursor_line = base_row + row as u64;
                    new_cursor_col = col as u16;
                } else {
                    // Cursor past the reflowed content: park at the chain end.
                    new_cursor_line = base_row + fragments as u64 - 1;
                    new_cursor_col =
                        (cursor_logical.1 - (fragments - 1) * new_width).min(new_width) as u16;
                }
            }
            if line.cells.is_empty() {
                lines.push_back(Line {
                    cells: Vec::new(),
                    wrapped: head_wrapped,
                });
                continue;
            }
            for (i, chunk) in line.cells.chunks(new_width).enumerate() {
                lines.push_back(Line {
                    cells: chunk.to_vec(),
                    wrapped: if i == 0 { head_wrapped } else { true },
                });
            }
        }
        if lines.is_empty() {
            lines.push_back(Line::new());
        }

        self.lines = lines;
        self.view_width = width;
        self.view_height = height;
        self.max_lines = self.max_lines.max(u64::from(height));
        self.top_margin = 0;
        self.bottom_margin = height - 1;
        self.scroll_offset = 0;
        self.cursor.line = new_cursor_line.min(self.lines.len() as u64 - 1);
        self.cursor.col = new_cursor_col;
        self.saved_cursor = None;
        let count = self.lines.len() as u64;
        self.sixels.retain(|s| s.line < count);
        self.fix_selection();
        self.evict_overflow();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn written(width: u16, height: u16, text: &str) -> Buffer {
        let mut buf = Buffer::new(width, height, 200);
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                buf.carriage_return();
                buf.new_line();
            }
            buf.write(part.chars());
        }
        buf
    }

    #[test]
    fn shrink_splits_into_wrapped_rows() {
        let mut buf = written(10, 5, "abcdefgh");
        buf.resize_view(3, 5);
        assert_eq!(buf.visible_text(), vec!["abc", "def", "gh"]);
        assert!(buf.raw_line(1).unwrap().wrapped);
        assert!(buf.raw_line(2).unwrap().wrapped);
        assert!(!buf.raw_line(0).unwrap().wrapped);
    }

    #[test]
    fn grow_rejoins_wrapped_rows() {
        let mut buf = written(3, 5, "abcdefgh");
        assert_eq!(buf.visible_text(), vec!["abc", "def", "gh"]);
        buf.resize_view(10, 5);
        assert_eq!(buf.visible_text(), vec!["abcdefgh"]);
    }

    #[test]
    fn shrink_then_grow_is_idempotent() {
        let mut buf = written(12, 8, "hello world\nsecond line\nthird");
        let before = buf.visible_text();
        buf.resize_view(5, 8);
        buf.resize_view(7, 8);
        buf.resize_view(12, 8);
        assert_eq!(buf.visible_text(), before);
    }

    #[test]
    fn cursor_follows_its_rune_on_shrink() {
        let mut buf = written(10, 5, "abcdefgh");
        // Cursor sits after 'h': logical column 8.
        buf.resize_view(3, 5);
        assert_eq!(buf.cursor_line(), 2);
        assert_eq!(buf.cursor_column(), 2);
        buf.write("i".chars());
        assert_eq!(buf.visible_text(), vec!["abc", "def", "ghi"]);
    }

    #[test]
    fn cursor_follows_on_grow() {
        let mut buf = written(3, 5, "abcdefgh");
        buf.resize_view(10, 5);
        assert_eq!(buf.cursor_line(), 0);
        assert_eq!(buf.cursor_column(), 8);
        buf.write("i".chars());
        assert_eq!(buf.visible_text(), vec!["abcdefghi"]);
    }

    #[test]
    fn real_newlines_do_not_rejoin() {
        let mut buf = written(10, 5, "abc\ndef");
        buf.resize_view(40, 5);
        assert_eq!(buf.visible_text(), vec!["abc", "def"]);
    }

    #[test]
    fn resize_resets_margins_and_scroll() {
        let mut buf = written(10, 5, "x");
        buf.set_margins(1, 3);
        buf.resize_view(8, 4);
        buf.set_position(0, 3);
        assert_eq!(buf.cursor_line(), 3);
        assert_eq!(buf.scroll_offset(), 0);
    }

    #[test]
    fn height_only_resize_preserves_rows() {
        let mut buf = written(10, 5, "one\ntwo\nthree");
        buf.resize_view(10, 3);
        assert_eq!(buf.visible_text(), vec!["one", "two", "three"]);
        buf.resize_view(10, 6);
        assert_eq!(buf.visible_text(), vec!["one", "two", "three"]);
    }

    proptest! {
        #[test]
        fn reflow_round_trip_preserves_text(
            text in "[a-z ]{1,60}",
            narrow in 2u16..9,
        ) {
            let mut buf = written(20, 10, &text);
            let before = buf.visible_text();
            buf.resize_view(narrow, 10);
            buf.resize_view(20, 10);
            prop_assert_eq!(buf.visible_text(), before);
        }
    }
}
