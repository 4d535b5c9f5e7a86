//! Selection, highlight, and word lookup.
//!
//! Selection endpoints are stored in raw coordinates exactly as the caller
//! set them; a backwards drag keeps start after end and everything here
//! normalizes at read time. Highlights are an independent span carrying an
//! optional hover annotation.

use super::Buffer;
use crate::position::Position;
use crate::sixel::SixelImage;

/// Hover-tooltip payload attached to a highlight span.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub text: String,
    pub image: Option<SixelImage>,
    /// Rendered size in cells; fractional so images can report exact extents.
    pub width: f32,
    pub height: f32,
}

/// Result of expanding a word around a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordMatch {
    pub text: String,
    pub start: Position,
    pub end: Position,
    /// Offset of the origin position's rune within `text`.
    pub origin_index: usize,
}

impl Buffer {
    // ── selection ──

    pub fn set_selection_start(&mut self, pos: Position) {
        self.selection_start = Some(pos);
    }

    pub fn set_selection_end(&mut self, pos: Position) {
        self.selection_end = Some(pos);
    }

    pub fn clear_selection(&mut self) {
        self.selection_start = None;
        self.selection_end = None;
    }

    /// The selection span, normalized so start ≤ end.
    #[must_use]
    pub fn selection(&self) -> Option<(Position, Position)> {
        let (a, b) = (self.selection_start?, self.selection_end?);
        Some(if a <= b { (a, b) } else { (b, a) })
    }

    /// Whether a raw position falls inside the selection.
    #[must_use]
    pub fn in_selection(&self, pos: Position) -> bool {
        self.selection()
            .map_or(false, |(start, end)| start <= pos && pos <= end)
    }

    /// Extracted selection text. Wrap chains join without a newline;
    /// real line boundaries insert one, trimming trailing blanks first.
    #[must_use]
    pub fn selected_text(&self) -> Option<String> {
        let (start, end) = self.selection()?;
        Some(self.extract_text(start, end))
    }

    fn extract_text(&self, start: Position, end: Position) -> String {
        let last = (self.line_count().saturating_sub(1)).min(end.line);
        let mut out = String::new();
        let mut line_idx = start.line;
        while line_idx <= last {
            let Some(line) = self.raw_line(line_idx) else {
                break;
            };
            let from = if line_idx == start.line {
                usize::from(start.col)
            } else {
                0
            };
            let to = if line_idx == end.line {
                usize::from(end.col) + 1
            } else {
                usize::from(self.view_width())
            };
            let to = to.min(line.cells.len());
            let mut segment = String::new();
            if from < to {
                segment.extend(
                    line.cells[from..to]
                        .iter()
                        .map(|c| if c.is_empty() { ' ' } else { c.rune }),
                );
            }
            let joins_next = line_idx < last
                && self
                    .raw_line(line_idx + 1)
                    .map_or(false, |next| next.wrapped);
            if joins_next {
                out.push_str(&segment);
            } else {
                out.push_str(segment.trim_end());
                if line_idx < last {
                    out.push('\n');
                }
            }
            line_idx += 1;
        }
        out
    }

    /// Snap the selection to whole rows.
    pub fn extend_selection_to_entire_lines(&mut self) {
        if let Some((start, end)) = self.selection() {
            self.selection_start = Some(Position::new(start.line, 0));
            self.selection_end = Some(Position::new(end.line, self.view_width() - 1));
        }
    }

    /// Clamp stale endpoints after the buffer shrank under them.
    pub(crate) fn fix_selection(&mut self) {
        let last_line = self.line_count().saturating_sub(1);
        let last_col = self.view_width() - 1;
        for endpoint in [&mut self.selection_start, &mut self.selection_end] {
            if let Some(p) = endpoint {
                p.line = p.line.min(last_line);
                p.col = p.col.min(last_col);
            }
        }
    }

    // ── word lookup ──

    /// Expand outward from `pos` while `matches` accepts the rune, crossing
    /// wrapped-line boundaries. Empty cells read as spaces.
    #[must_use]
    pub fn find_word_at<F>(&self, pos: Position, matches: F) -> Option<WordMatch>
    where
        F: Fn(char) -> bool,
    {
        let width = usize::from(self.view_width());

        // Locate the wrap chain containing the position.
        let mut chain_start = pos.line.min(self.line_count().saturating_sub(1));
        while chain_start > 0
            && self
                .raw_line(chain_start)
                .map_or(false, |line| line.wrapped)
        {
            chain_start -= 1;
        }
        let mut chain_end = pos.line;
        while self
            .raw_line(chain_end + 1)
            .map_or(false, |line| line.wrapped)
        {
            chain_end += 1;
        }

        // Flatten the chain, padding every row to the view width so columns
        // map linearly.
        let mut runes: Vec<char> = Vec::new();
        for line_idx in chain_start..=chain_end {
            let line = self.raw_line(line_idx)?;
            for col in 0..width {
                runes.push(match line.cells.get(col) {
                    Some(c) if !c.is_empty() => c.rune,
                    _ => ' ',
                });
            }
        }

        let origin = (pos.line - chain_start) as usize * width + usize::from(pos.col);
        if origin >= runes.len() || !matches(runes[origin]) {
            return None;
        }

        let mut start = origin;
        while start > 0 && matches(runes[start - 1]) {
            start -= 1;
        }
        let mut end = origin;
        while end + 1 < runes.len() && matches(runes[end + 1]) {
            end += 1;
        }

        let to_position = |index: usize| {
            Position::new(
                chain_start + (index / width) as u64,
                (index % width) as u16,
            )
        };
        Some(WordMatch {
            text: runes[start..=end].iter().collect(),
            start: to_position(start),
            end: to_position(end),
            origin_index: origin - start,
        })
    }

    /// Set the selection to the word around `pos`, if any.
    pub fn select_word_at<F>(&mut self, pos: Position, matches: F)
    where
        F: Fn(char) -> bool,
    {
        if let Some(word) = self.find_word_at(pos, matches) {
            self.selection_start = Some(word.start);
            self.selection_end = Some(word.end);
        }
    }

    // ── highlight ──

    /// Overlay a span with an optional annotation, replacing any previous
    /// highlight.
    pub fn highlight(&mut self, start: Position, end: Position, annotation: Option<Annotation>) {
        self.highlight_start = Some(start);
        self.highlight_end = Some(end);
        self.highlight_annotation = annotation;
    }

    pub fn clear_highlight(&mut self) {
        self.highlight_start = None;
        self.highlight_end = None;
        self.highlight_annotation = None;
    }

    /// The highlighted span, normalized; `None` once the buffer no longer
    /// contains it.
    #[must_use]
    pub fn highlight_span(&self) -> Option<(Position, Position)> {
        let (a, b) = (self.highlight_start?, self.highlight_end?);
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        (end.line < self.line_count()).then_some((start, end))
    }

    #[must_use]
    pub fn highlight_annotation(&self) -> Option<&Annotation> {
        self.highlight_annotation.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_rune(c: char) -> bool {
        c.is_alphanumeric() || c == '-' || c == '.'
    }

    fn filled(width: u16, height: u16, rows: &[&str]) -> Buffer {
        let mut buf = Buffer::new(width, height, 100);
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                buf.carriage_return();
                buf.new_line();
            }
            buf.write(row.chars());
        }
        buf
    }

    #[test]
    fn backward_drag_normalizes() {
        let mut buf = filled(10, 5, &["hello", "world"]);
        buf.set_selection_start(Position::new(1, 2));
        buf.set_selection_end(Position::new(0, 1));
        let forward = buf.selected_text();

        buf.set_selection_start(Position::new(0, 1));
        buf.set_selection_end(Position::new(1, 2));
        assert_eq!(forward, buf.selected_text());
        assert_eq!(forward.as_deref(), Some("ello\nwor"));
    }

    #[test]
    fn wrapped_lines_join_without_newline() {
        let mut buf = Buffer::new(3, 10, 100);
        buf.write("abcdef".chars());
        buf.set_selection_start(Position::new(0, 0));
        buf.set_selection_end(Position::new(1, 2));
        assert_eq!(buf.selected_text().as_deref(), Some("abcdef"));
    }

    #[test]
    fn real_newline_trims_trailing_blanks() {
        let mut buf = filled(10, 5, &["hi", "there"]);
        buf.set_selection_start(Position::new(0, 0));
        buf.set_selection_end(Position::new(1, 4));
        assert_eq!(buf.selected_text().as_deref(), Some("hi\nthere"));
    }

    #[test]
    fn in_selection_bounds() {
        let mut buf = filled(10, 5, &["hello", "world"]);
        buf.set_selection_start(Position::new(0, 2));
        buf.set_selection_end(Position::new(1, 1));
        assert!(buf.in_selection(Position::new(0, 2)));
        assert!(buf.in_selection(Position::new(0, 9)));
        assert!(buf.in_selection(Position::new(1, 1)));
        assert!(!buf.in_selection(Position::new(0, 1)));
        assert!(!buf.in_selection(Position::new(1, 2)));
    }

    #[test]
    fn word_expansion_within_line() {
        let buf = filled(20, 5, &["foo bar-baz qux"]);
        let word = buf.find_word_at(Position::new(0, 6), word_rune).unwrap();
        assert_eq!(word.text, "bar-baz");
        assert_eq!(word.start, Position::new(0, 4));
        assert_eq!(word.end, Position::new(0, 10));
        assert_eq!(word.origin_index, 2);
    }

    #[test]
    fn word_expansion_crosses_wrap_boundary() {
        let mut buf = Buffer::new(4, 10, 100);
        buf.write("ab cdef".chars());
        // "cdef" spans the wrap: "ab c" / "def".
        let word = buf.find_word_at(Position::new(1, 1), word_rune).unwrap();
        assert_eq!(word.text, "cdef");
        assert_eq!(word.start, Position::new(0, 3));
        assert_eq!(word.end, Position::new(1, 2));
    }

    #[test]
    fn word_lookup_on_blank_is_none() {
        let buf = filled(10, 5, &["a b"]);
        assert!(buf.find_word_at(Position::new(0, 1), word_rune).is_none());
        assert!(buf.find_word_at(Position::new(0, 8), word_rune).is_none());
    }

    #[test]
    fn select_word_at_sets_selection() {
        let mut buf = filled(20, 5, &["foo bar"]);
        buf.select_word_at(Position::new(0, 5), word_rune);
        assert_eq!(buf.selected_text().as_deref(), Some("bar"));
    }

    #[test]
    fn extend_selection_to_entire_lines() {
        let mut buf = filled(10, 5, &["hello", "world"]);
        buf.set_selection_start(Position::new(0, 3));
        buf.set_selection_end(Position::new(1, 1));
        buf.extend_selection_to_entire_lines();
        assert_eq!(buf.selected_text().as_deref(), Some("hello\nworld"));
    }

    #[test]
    fn fix_selection_clamps_stale_endpoints() {
        let mut buf = filled(10, 5, &["hello"]);
        buf.set_selection_start(Position::new(0, 0));
        buf.set_selection_end(Position::new(99, 9));
        buf.fix_selection();
        let (_, end) = buf.selection().unwrap();
        assert_eq!(end.line, 0);
    }

    #[test]
    fn highlight_span_rejects_outgrown_spans() {
        let mut buf = filled(10, 5, &["hello"]);
        buf.highlight(
            Position::new(0, 1),
            Position::new(0, 3),
            Some(Annotation {
                text: "note".into(),
                image: None,
                width: 4.0,
                height: 1.0,
            }),
        );
        assert!(buf.highlight_span().is_some());
        assert_eq!(buf.highlight_annotation().unwrap().text, "note");
        buf.highlight(Position::new(7, 0), Position::new(8, 0), None);
        assert!(buf.highlight_span().is_none());
        buf.clear_highlight();
        assert!(buf.highlight_annotation().is_none());
    }
}
