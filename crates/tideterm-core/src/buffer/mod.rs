//! The screen/scrollback document model.
//!
//! A buffer is a bounded ring of [`Line`]s plus a cursor, scroll-region
//! margins, tab stops, selection/highlight spans, and embedded sixel
//! placements. Escape-sequence handlers mutate it; the renderer reads it
//! through the view-relative accessors.
//!
//! Two coordinate systems are in play. Raw coordinates index the full line
//! history (the ring); view coordinates are rows of the visible window.
//! Cursor and margin math always uses the content window anchored at the
//! bottom of history; the render accessors additionally apply the user's
//! scrollback offset.

mod resize;
mod selection;

pub use selection::{Annotation, WordMatch};

use std::collections::VecDeque;

use crate::cell::{Cell, CellAttributes};
use crate::charset::Charset;
use crate::line::Line;
use crate::modes::{CursorShape, Modes};
use crate::position::Position;
use crate::sixel::SixelImage;

/// Cursor state captured by DECSC and restored by DECRC.
#[derive(Debug, Clone)]
struct SavedCursor {
    position: Position,
    attrs: CellAttributes,
    charsets: [Option<Charset>; 2],
    current_charset: usize,
}

/// A decoded sixel image anchored in the line history.
#[derive(Debug, Clone)]
pub struct SixelPlacement {
    /// Raw row of the image's top edge.
    pub line: u64,
    pub col: u16,
    /// Rows the image spans, cell-rounded.
    pub cell_height: u16,
    pub image: SixelImage,
}

/// A sixel placement visible in the current view window.
#[derive(Debug, Clone, Copy)]
pub struct VisibleSixel<'a> {
    /// View row of the image top; negative when the top is scrolled off.
    pub view_line: i64,
    pub sixel: &'a SixelPlacement,
}

/// The terminal document: grid, scrollback, cursor, and overlay state.
#[derive(Debug, Clone)]
pub struct Buffer {
    lines: VecDeque<Line>,
    view_width: u16,
    view_height: u16,
    max_lines: u64,
    cursor: Position,
    cursor_attr: CellAttributes,
    cursor_shape: CursorShape,
    scroll_offset: u64,
    top_margin: u16,
    bottom_margin: u16,
    tab_stops: Vec<u16>,
    charsets: [Option<Charset>; 2],
    current_charset: usize,
    pub modes: Modes,
    selection_start: Option<Position>,
    selection_end: Option<Position>,
    highlight_start: Option<Position>,
    highlight_end: Option<Position>,
    highlight_annotation: Option<Annotation>,
    sixels: Vec<SixelPlacement>,
    saved_cursor: Option<SavedCursor>,
}

impl Buffer {
    /// Create a buffer. `max_lines` is the scrollback cap and is raised to
    /// at least the viewport height.
    #[must_use]
    pub fn new(view_width: u16, view_height: u16, max_lines: u64) -> Self {
        let view_width = view_width.max(1);
        let view_height = view_height.max(1);
        let mut lines = VecDeque::new();
        lines.push_back(Line::new());
        Self {
            lines,
            view_width,
            view_height,
            max_lines: max_lines.max(u64::from(view_height)),
            cursor: Position::default(),
            cursor_attr: CellAttributes::default(),
            cursor_shape: CursorShape::default(),
            scroll_offset: 0,
            top_margin: 0,
            bottom_margin: view_height - 1,
            tab_stops: Vec::new(),
            charsets: [None, None],
            current_charset: 0,
            modes: Modes::default(),
            selection_start: None,
            selection_end: None,
            highlight_start: None,
            highlight_end: None,
            highlight_annotation: None,
            sixels: Vec::new(),
            saved_cursor: None,
        }
    }

    // ── coordinate conversion ──

    /// Raw index of the content window's top row (scroll offset ignored).
    fn raw_base(&self) -> u64 {
        (self.lines.len() as u64).saturating_sub(u64::from(self.view_height))
    }

    /// Content-window view row to raw row.
    pub fn convert_view_line_to_raw_line(&self, view_line: u16) -> u64 {
        self.raw_base() + u64::from(view_line)
    }

    /// Raw row to content-window view row, if it falls inside the window.
    pub fn convert_raw_line_to_view_line(&self, raw_line: u64) -> Option<u16> {
        let base = self.raw_base();
        if raw_line < base {
            return None;
        }
        let view = raw_line - base;
        (view < u64::from(self.view_height)).then_some(view as u16)
    }

    /// Raw row of the top of the render window (scroll offset applied).
    fn display_base(&self) -> u64 {
        self.raw_base().saturating_sub(self.scroll_offset)
    }

    fn cursor_view_line(&self) -> u16 {
        self.cursor
            .line
            .saturating_sub(self.raw_base())
            .min(u64::from(self.view_height) - 1) as u16
    }

    // ── accessors ──

    #[must_use]
    pub fn view_width(&self) -> u16 {
        self.view_width
    }

    #[must_use]
    pub fn view_height(&self) -> u16 {
        self.view_height
    }

    #[must_use]
    pub fn line_count(&self) -> u64 {
        self.lines.len() as u64
    }

    /// Cursor column as stored; equals `view_width` while a wrap is pending.
    #[must_use]
    pub fn cursor_column(&self) -> u16 {
        self.cursor.col
    }

    /// Cursor row in view coordinates, for the renderer.
    #[must_use]
    pub fn cursor_line(&self) -> u16 {
        self.cursor_view_line()
    }

    /// Cursor in raw coordinates.
    #[must_use]
    pub fn cursor_position(&self) -> Position {
        self.cursor
    }

    #[must_use]
    pub fn is_cursor_visible(&self) -> bool {
        self.modes.show_cursor && self.scroll_offset == 0
    }

    #[must_use]
    pub fn cursor_shape(&self) -> CursorShape {
        self.cursor_shape
    }

    pub fn set_cursor_shape(&mut self, shape: CursorShape) {
        self.cursor_shape = shape;
    }

    #[must_use]
    pub fn cursor_attr(&self) -> CellAttributes {
        self.cursor_attr
    }

    pub fn cursor_attr_mut(&mut self) -> &mut CellAttributes {
        &mut self.cursor_attr
    }

    #[must_use]
    pub fn raw_line(&self, raw: u64) -> Option<&Line> {
        self.lines.get(raw as usize)
    }

    /// Cell at view coordinates; `None` when the row or column is absent.
    #[must_use]
    pub fn get_cell(&self, col: u16, view_row: u16) -> Option<&Cell> {
        if view_row >= self.view_height || col >= self.view_width {
            return None;
        }
        let raw = self.display_base() + u64::from(view_row);
        self.lines.get(raw as usize).and_then(|l| l.cell(col))
    }

    /// The visible rows, scroll offset applied. May be shorter than the
    /// viewport when history is still sparse.
    #[must_use]
    pub fn get_visible_lines(&self) -> Vec<&Line> {
        let base = self.display_base();
        (0..u64::from(self.view_height))
            .filter_map(|row| self.lines.get((base + row) as usize))
            .collect()
    }

    /// Visible rows as trimmed text, one string per existing row.
    #[must_use]
    pub fn visible_text(&self) -> Vec<String> {
        self.get_visible_lines().iter().map(|l| l.text()).collect()
    }

    // ── line plumbing ──

    fn ensure_raw_line(&mut self, raw: u64) {
        while self.lines.len() as u64 <= raw {
            self.lines.push_back(Line::new());
        }
    }

    fn current_line_mut(&mut self) -> &mut Line {
        self.ensure_raw_line(self.cursor.line);
        let idx = self.cursor.line as usize;
        &mut self.lines[idx]
    }

    /// Drop rows from the front once history exceeds the cap, shifting
    /// every raw coordinate the buffer holds.
    fn evict_overflow(&mut self) {
        while self.lines.len() as u64 > self.max_lines {
            self.lines.pop_front();
            self.cursor.line = self.cursor.line.saturating_sub(1);
            if let Some(saved) = &mut self.saved_cursor {
                saved.position.line = saved.position.line.saturating_sub(1);
            }
            Self::shift_span(&mut self.selection_start, &mut self.selection_end);
            let dropped = Self::shift_span(&mut self.highlight_start, &mut self.highlight_end);
            if dropped {
                self.highlight_annotation = None;
            }
            self.sixels.retain_mut(|s| {
                if s.line == 0 {
                    false
                } else {
                    s.line -= 1;
                    true
                }
            });
        }
    }

    /// Shift a raw-coordinate span down one row; clears it (returning true)
    /// if an endpoint falls off the front.
    fn shift_span(start: &mut Option<Position>, end: &mut Option<Position>) -> bool {
        let falls_off = |p: &Option<Position>| p.map_or(false, |p| p.line == 0);
        if falls_off(start) || falls_off(end) {
            *start = None;
            *end = None;
            return true;
        }
        for p in [start, end] {
            if let Some(p) = p {
                p.line -= 1;
            }
        }
        false
    }

    fn has_scroll_region(&self) -> bool {
        self.top_margin != 0 || self.bottom_margin != self.view_height - 1
    }

    // ── writing ──

    fn translate(&self, rune: char) -> char {
        match self.charsets[self.current_charset] {
            Some(cs) => cs.translate(rune),
            None => rune,
        }
    }

    /// Select G0 or G1 as the active set (SI / SO).
    pub fn select_charset(&mut self, index: usize) {
        self.current_charset = index.min(1);
    }

    /// Designate a charset into G0 or G1.
    pub fn designate_charset(&mut self, index: usize, charset: Option<Charset>) {
        self.charsets[index.min(1)] = charset;
    }

    /// Write printable runes at the cursor.
    ///
    /// Applies charset translation and the current attributes, advances the
    /// cursor, auto-wraps at the right edge (or drops input when DECAWM is
    /// reset), and snaps the scrollback view to the bottom.
    pub fn write<I: IntoIterator<Item = char>>(&mut self, runes: I) {
        for rune in runes {
            self.write_rune(rune);
        }
    }

    fn write_rune(&mut self, rune: char) {
        self.scroll_offset = 0;
        let rune = self.translate(rune);
        if self.cursor.col >= self.view_width {
            if self.modes.auto_wrap {
                self.wrap_to_next_line();
            } else {
                return;
            }
        }
        let col = self.cursor.col;
        let attrs = self.cursor_attr;
        let insert = self.modes.insert;
        let width = self.view_width;
        let line = self.current_line_mut();
        line.ensure_col(col);
        if insert {
            line.cells.insert(col as usize, Cell::default());
            line.cells.truncate(width as usize);
        }
        if let Some(cell) = line.cell_mut(col) {
            cell.set_rune(rune, attrs);
        }
        self.cursor.col += 1;
    }

    fn wrap_to_next_line(&mut self) {
        self.cursor.col = 0;
        let cur_view = self.cursor_view_line();
        if cur_view == self.bottom_margin {
            if self.has_scroll_region() {
                self.area_scroll_up(1);
            } else {
                self.lines.push_back(Line::wrapped());
                self.cursor.line += 1;
                self.evict_overflow();
            }
        } else if cur_view < self.view_height - 1 {
            self.cursor.line += 1;
            self.ensure_raw_line(self.cursor.line);
            self.current_line_mut().wrapped = true;
        }
        // At the screen bottom below a region: stay put and overwrite.
    }

    // ── vertical movement and scrolling ──

    /// IND: cursor down, scrolling when at the region's bottom row.
    pub fn index(&mut self) {
        let cur_view = self.cursor_view_line();
        if cur_view == self.bottom_margin {
            if self.has_scroll_region() {
                self.area_scroll_up(1);
            } else {
                self.lines.push_back(Line::new());
                self.cursor.line += 1;
                self.evict_overflow();
            }
        } else if cur_view < self.view_height - 1 {
            self.cursor.line += 1;
            self.ensure_raw_line(self.cursor.line);
        }
    }

    /// RI: cursor up, scrolling when at the region's top row.
    pub fn reverse_index(&mut self) {
        let cur_view = self.cursor_view_line();
        if cur_view == self.top_margin {
            self.area_scroll_down(1);
        } else if cur_view > 0 {
            self.cursor.line -= 1;
        }
    }

    /// LF and friends: index, plus carriage return under LNM.
    pub fn new_line(&mut self) {
        self.index();
        if self.modes.line_feed {
            self.cursor.col = 0;
        }
    }

    /// VT: index until the cursor sits on a non-continuation line.
    pub fn vertical_tab(&mut self) {
        self.index();
        while self
            .lines
            .get(self.cursor.line as usize)
            .map_or(false, |l| l.wrapped)
        {
            let before = (self.cursor.line, self.line_count());
            self.index();
            if (self.cursor.line, self.line_count()) == before {
                // Pinned below a scroll region; nothing more to skip.
                break;
            }
        }
    }

    /// CR: column 0 of the logical line, walking up any wrap chain.
    pub fn carriage_return(&mut self) {
        while self.cursor.line > 0 {
            match self.lines.get(self.cursor.line as usize) {
                Some(line) if line.wrapped => self.cursor.line -= 1,
                _ => break,
            }
        }
        self.cursor.col = 0;
    }

    /// BS: one column left, crossing a wrap boundary at column 0.
    pub fn backspace(&mut self) {
        if self.cursor.col >= self.view_width {
            // Cancel a pending wrap first.
            self.cursor.col = self.view_width - 1;
        }
        if self.cursor.col > 0 {
            self.cursor.col -= 1;
        } else if self
            .lines
            .get(self.cursor.line as usize)
            .map_or(false, |l| l.wrapped)
            && self.cursor.line > 0
        {
            self.cursor.line -= 1;
            self.cursor.col = self.view_width - 1;
        }
    }

    /// Shift the scroll region's rows up, dropping the top row and opening
    /// blanks at the bottom. Content leaving a region never enters
    /// scrollback.
    pub fn area_scroll_up(&mut self, count: u16) {
        let top = self.convert_view_line_to_raw_line(self.top_margin) as usize;
        let bottom = self.convert_view_line_to_raw_line(self.bottom_margin) as usize;
        self.ensure_raw_line(bottom as u64);
        for _ in 0..count {
            self.lines.remove(top);
            self.lines.insert(bottom, Line::new());
        }
    }

    /// Shift the scroll region's rows down, opening blanks at the top.
    pub fn area_scroll_down(&mut self, count: u16) {
        let top = self.convert_view_line_to_raw_line(self.top_margin) as usize;
        let bottom = self.convert_view_line_to_raw_line(self.bottom_margin) as usize;
        self.ensure_raw_line(bottom as u64);
        for _ in 0..count {
            self.lines.remove(bottom);
            self.lines.insert(top, Line::new());
        }
    }

    /// DECSTBM. Margins arrive as view rows, top inclusive to bottom
    /// inclusive; invalid pairs reset to the full screen.
    pub fn set_margins(&mut self, top: u16, bottom: u16) {
        let bottom = bottom.min(self.view_height - 1);
        if top >= bottom {
            self.top_margin = 0;
            self.bottom_margin = self.view_height - 1;
        } else {
            self.top_margin = top;
            self.bottom_margin = bottom;
        }
    }

    pub fn reset_margins(&mut self) {
        self.top_margin = 0;
        self.bottom_margin = self.view_height - 1;
    }

    // ── insert / delete ──

    /// IL. No-op when the cursor sits outside an active scroll region.
    pub fn insert_lines(&mut self, count: u16) {
        let cur_view = self.cursor_view_line();
        if cur_view < self.top_margin || cur_view > self.bottom_margin {
            return;
        }
        let at = self.convert_view_line_to_raw_line(cur_view) as usize;
        let bottom = self.convert_view_line_to_raw_line(self.bottom_margin) as usize;
        self.ensure_raw_line(bottom as u64);
        for _ in 0..count {
            self.lines.remove(bottom);
            self.lines.insert(at, Line::new());
        }
    }

    /// DL. No-op when the cursor sits outside an active scroll region.
    pub fn delete_lines(&mut self, count: u16) {
        let cur_view = self.cursor_view_line();
        if cur_view < self.top_margin || cur_view > self.bottom_margin {
            return;
        }
        let at = self.convert_view_line_to_raw_line(cur_view) as usize;
        let bottom = self.convert_view_line_to_raw_line(self.bottom_margin) as usize;
        self.ensure_raw_line(bottom as u64);
        for _ in 0..count {
            self.lines.remove(at);
            self.lines.insert(bottom, Line::new());
        }
    }

    /// ICH: open blanks at the cursor, pushing the tail off the right edge.
    pub fn insert_blank_characters(&mut self, count: u16) {
        let col = self.cursor.col.min(self.view_width - 1);
        let width = self.view_width;
        let line = self.current_line_mut();
        line.ensure_col(col);
        for _ in 0..count {
            line.cells.insert(col as usize, Cell::default());
        }
        line.cells.truncate(width as usize);
    }

    /// DCH: close up cells at the cursor, pulling the tail left.
    pub fn delete_chars(&mut self, count: u16) {
        let col = self.cursor.col.min(self.view_width - 1) as usize;
        let line = self.current_line_mut();
        if col >= line.cells.len() {
            return;
        }
        let end = (col + count as usize).min(line.cells.len());
        line.cells.drain(col..end);
    }

    /// ECH: blank cells from the cursor without shifting.
    pub fn erase_characters(&mut self, count: u16) {
        let col = self.cursor.col.min(self.view_width - 1);
        let end = col.saturating_add(count).min(self.view_width);
        let attrs = self.cursor_attr;
        self.current_line_mut().erase_range(col, end, attrs);
    }

    // ── erase family ──

    fn erase_view_row(&mut self, view_row: u16, from: u16, to: u16) {
        let raw = self.convert_view_line_to_raw_line(view_row);
        self.ensure_raw_line(raw);
        let attrs = self.cursor_attr;
        if let Some(line) = self.lines.get_mut(raw as usize) {
            line.erase_range(from, to, attrs);
        }
        self.clear_sixels_at_raw_line(raw);
    }

    /// EL 2: the whole cursor line.
    pub fn erase_line(&mut self) {
        let row = self.cursor_view_line();
        self.erase_view_row(row, 0, self.view_width);
    }

    /// EL 1: columns `[0, cursor]` inclusive.
    pub fn erase_line_to_cursor(&mut self) {
        let row = self.cursor_view_line();
        let to = self.cursor.col.min(self.view_width - 1) + 1;
        self.erase_view_row(row, 0, to);
    }

    /// EL 0: columns `[cursor, width)`.
    pub fn erase_line_from_cursor(&mut self) {
        let row = self.cursor_view_line();
        let from = self.cursor.col.min(self.view_width);
        self.erase_view_row(row, from, self.view_width);
    }

    /// ED 2: every visible row.
    pub fn erase_display(&mut self) {
        for row in 0..self.view_height {
            self.erase_view_row(row, 0, self.view_width);
        }
    }

    /// ED 1: rows above the cursor, plus the cursor row through the cursor.
    pub fn erase_display_to_cursor(&mut self) {
        let cur = self.cursor_view_line();
        for row in 0..cur {
            self.erase_view_row(row, 0, self.view_width);
        }
        self.erase_line_to_cursor();
    }

    /// ED 0: the cursor row from the cursor, plus every row below.
    pub fn erase_display_from_cursor(&mut self) {
        self.erase_line_from_cursor();
        let cur = self.cursor_view_line();
        for row in cur + 1..self.view_height {
            self.erase_view_row(row, 0, self.view_width);
        }
    }

    /// DECALN: margins reset, scroll offset cleared, every cell 'E',
    /// cursor home.
    pub fn screen_alignment_test(&mut self) {
        self.reset_margins();
        self.scroll_offset = 0;
        let attrs = self.cursor_attr;
        for row in 0..self.view_height {
            let raw = self.convert_view_line_to_raw_line(row);
            self.ensure_raw_line(raw);
            if let Some(line) = self.lines.get_mut(raw as usize) {
                line.ensure_col(self.view_width - 1);
                for cell in &mut line.cells {
                    cell.set_rune('E', attrs);
                }
            }
        }
        self.set_position(0, 0);
    }

    // ── positioning ──

    /// CUP/HVP. `col`/`line` are 0-based view coordinates; under DECOM the
    /// line is relative to the top margin and clamped to the region.
    pub fn set_position(&mut self, col: u16, line: u16) {
        let (line, ceiling) = if self.modes.origin {
            (line.saturating_add(self.top_margin), self.bottom_margin)
        } else {
            (line, self.view_height - 1)
        };
        self.cursor.col = col.min(self.view_width - 1);
        self.cursor.line = self.convert_view_line_to_raw_line(line.min(ceiling));
        self.ensure_raw_line(self.cursor.line);
    }

    /// Relative cursor movement with the same clamping as [`set_position`].
    ///
    /// [`set_position`]: Buffer::set_position
    pub fn move_position(&mut self, dx: i32, dy: i32) {
        let cur_view = self.cursor_view_line();
        let base_line = if self.modes.origin {
            cur_view.saturating_sub(self.top_margin)
        } else {
            cur_view
        };
        let line = (i32::from(base_line) + dy).max(0) as u16;
        let col = (i32::from(self.cursor.col.min(self.view_width - 1)) + dx).max(0) as u16;
        self.set_position(col, line);
    }

    /// Move to column `col` on the current row.
    pub fn set_column(&mut self, col: u16) {
        self.cursor.col = col.min(self.view_width - 1);
    }

    // ── tab stops ──

    fn next_tab_stop(&self, col: u16) -> u16 {
        let default_stop = (col / 8 + 1) * 8;
        let explicit = self
            .tab_stops
            .iter()
            .copied()
            .filter(|&s| s > col)
            .min()
            .unwrap_or(u16::MAX);
        default_stop.min(explicit).min(self.view_width - 1)
    }

    /// HT: advance to the next stop, writing spaces into empty cells.
    pub fn tab(&mut self) {
        let col = self.cursor.col.min(self.view_width - 1);
        let target = self.next_tab_stop(col);
        let attrs = self.cursor_attr;
        let line = self.current_line_mut();
        line.ensure_col(target);
        for cell in &mut line.cells[col as usize..target as usize] {
            if cell.is_empty() {
                cell.set_rune(' ', attrs);
            }
        }
        self.cursor.col = target;
    }

    fn prev_tab_stop(&self, col: u16) -> u16 {
        if col == 0 {
            return 0;
        }
        let default_stop = (col - 1) / 8 * 8;
        let explicit = self
            .tab_stops
            .iter()
            .copied()
            .filter(|&s| s < col)
            .max()
            .unwrap_or(0);
        default_stop.max(explicit)
    }

    /// CBT: move back to the previous stop without touching cells.
    pub fn tab_reverse(&mut self) {
        let col = self.cursor.col.min(self.view_width - 1);
        self.cursor.col = self.prev_tab_stop(col);
    }

    /// HTS: set an explicit stop at the cursor column.
    pub fn tab_set_at_cursor(&mut self) {
        let col = self.cursor.col.min(self.view_width - 1);
        if let Err(at) = self.tab_stops.binary_search(&col) {
            self.tab_stops.insert(at, col);
        }
    }

    /// TBC 0: clear the explicit stop at the cursor column.
    pub fn tab_clear_at_cursor(&mut self) {
        let col = self.cursor.col.min(self.view_width - 1);
        if let Ok(at) = self.tab_stops.binary_search(&col) {
            self.tab_stops.remove(at);
        }
    }

    /// TBC 3: clear all explicit stops.
    pub fn tab_clear_all(&mut self) {
        self.tab_stops.clear();
    }

    /// Stamp the current attributes onto the cell under the cursor, if one
    /// exists. SGR handling calls this so attribute changes show on the
    /// cell even before anything is written over it.
    pub fn restyle_cursor_cell(&mut self) {
        if self.cursor.col >= self.view_width {
            return;
        }
        let col = self.cursor.col;
        let attrs = self.cursor_attr;
        if let Some(line) = self.lines.get_mut(self.cursor.line as usize) {
            if let Some(cell) = line.cell_mut(col) {
                cell.attrs = attrs;
            }
        }
    }

    // ── saved cursor ──

    /// DECSC.
    pub fn save_cursor(&mut self) {
        self.saved_cursor = Some(SavedCursor {
            position: self.cursor,
            attrs: self.cursor_attr,
            charsets: self.charsets,
            current_charset: self.current_charset,
        });
    }

    /// DECRC. Without a prior save this homes the cursor with default
    /// attributes, per VT100.
    pub fn restore_cursor(&mut self) {
        match self.saved_cursor.clone() {
            Some(saved) => {
                self.cursor = saved.position;
                self.cursor.line = self
                    .cursor
                    .line
                    .min((self.lines.len() as u64).saturating_sub(1));
                self.cursor.col = self.cursor.col.min(self.view_width);
                self.cursor_attr = saved.attrs;
                self.charsets = saved.charsets;
                self.current_charset = saved.current_charset;
            }
            None => {
                self.set_position(0, 0);
                self.cursor_attr = CellAttributes::default();
            }
        }
    }

    /// DECSTR. Resets modes, attributes, margins, and charsets without
    /// touching screen content or history.
    pub fn soft_reset(&mut self) {
        self.modes = Modes::default();
        self.cursor_attr = CellAttributes::default();
        self.cursor_shape = CursorShape::default();
        self.reset_margins();
        self.charsets = [None, None];
        self.current_charset = 0;
        self.saved_cursor = None;
    }

    // ── scrollback viewport ──

    #[must_use]
    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn scroll_up(&mut self, lines: u64) {
        self.scroll_offset = (self.scroll_offset + lines).min(self.raw_base());
    }

    pub fn scroll_down(&mut self, lines: u64) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn set_scroll_offset(&mut self, offset: u64) {
        self.scroll_offset = offset.min(self.raw_base());
    }

    // ── sixel placements ──

    /// Anchor a decoded image at the cursor.
    pub fn add_sixel(&mut self, image: SixelImage, cell_height: u16) {
        self.sixels.push(SixelPlacement {
            line: self.cursor.line,
            col: self.cursor.col.min(self.view_width - 1),
            cell_height,
            image,
        });
    }

    /// Remove placements whose vertical span touches a raw row.
    pub fn clear_sixels_at_raw_line(&mut self, raw: u64) {
        self.sixels
            .retain(|s| !(s.line <= raw && raw < s.line + u64::from(s.cell_height)));
    }

    /// Placements overlapping the render window, with view-relative rows.
    #[must_use]
    pub fn get_visible_sixels(&self) -> Vec<VisibleSixel<'_>> {
        let base = self.display_base();
        let end = base + u64::from(self.view_height);
        self.sixels
            .iter()
            .filter(|s| s.line < end && s.line + u64::from(s.cell_height) > base)
            .map(|s| VisibleSixel {
                view_line: s.line as i64 - base as i64,
                sixel: s,
            })
            .collect()
    }
}
