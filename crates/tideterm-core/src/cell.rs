//! Grid cells and SGR attribute state.

use unicode_width::UnicodeWidthChar;

use crate::theme::{Colour, ColourRole, Theme};

bitflags::bitflags! {
    /// Boolean SGR style bits carried by a cell.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StyleFlags: u16 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const INVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

/// Current SGR state: colours plus style flags.
///
/// `None` for a colour means "theme default". INVERSE is applied at read
/// time via [`CellAttributes::resolved_fg`] / [`resolved_bg`], never by
/// mutating the stored colours.
///
/// [`resolved_bg`]: CellAttributes::resolved_bg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CellAttributes {
    pub fg: Option<Colour>,
    pub bg: Option<Colour>,
    pub flags: StyleFlags,
}

impl CellAttributes {
    /// Foreground as a renderer should draw it, after INVERSE and HIDDEN.
    #[must_use]
    pub fn resolved_fg(&self, theme: &Theme) -> Colour {
        if self.flags.contains(StyleFlags::HIDDEN) {
            return self.resolved_bg(theme);
        }
        if self.flags.contains(StyleFlags::INVERSE) {
            self.bg.unwrap_or_else(|| theme.colour(ColourRole::Background))
        } else {
            self.fg.unwrap_or_else(|| theme.colour(ColourRole::Foreground))
        }
    }

    /// Background as a renderer should draw it, after INVERSE.
    #[must_use]
    pub fn resolved_bg(&self, theme: &Theme) -> Colour {
        if self.flags.contains(StyleFlags::INVERSE) {
            self.fg.unwrap_or_else(|| theme.colour(ColourRole::Foreground))
        } else {
            self.bg.unwrap_or_else(|| theme.colour(ColourRole::Background))
        }
    }

    pub fn set_flag(&mut self, flag: StyleFlags, on: bool) {
        self.flags.set(flag, on);
    }
}

/// A single terminal grid cell: a measured rune plus its attributes.
///
/// Rune `'\0'` marks an empty cell. Empty cells are never rendered as
/// glyphs and are trimmed from line-end string conversion, but they still
/// carry a background colour (erase operations stamp the current one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub rune: char,
    pub width: u8,
    pub attrs: CellAttributes,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            rune: '\0',
            width: 0,
            attrs: CellAttributes::default(),
        }
    }
}

impl Cell {
    /// Build a cell from a rune, measuring its display width.
    #[must_use]
    pub fn new(rune: char, attrs: CellAttributes) -> Self {
        let width = UnicodeWidthChar::width(rune).unwrap_or(0) as u8;
        Self { rune, width, attrs }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rune == '\0'
    }

    /// Set the rune in place, re-measuring width and stamping attributes.
    pub fn set_rune(&mut self, rune: char, attrs: CellAttributes) {
        self.rune = rune;
        self.width = UnicodeWidthChar::width(rune).unwrap_or(0) as u8;
        self.attrs = attrs;
    }

    /// Erase to empty, keeping only the background of the given attributes.
    pub fn erase(&mut self, attrs: CellAttributes) {
        self.rune = '\0';
        self.width = 0;
        self.attrs = CellAttributes {
            bg: attrs.bg,
            ..CellAttributes::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cell_is_empty() {
        let cell = Cell::default();
        assert!(cell.is_empty());
        assert_eq!(cell.width, 0);
    }

    #[test]
    fn new_cell_measures_width() {
        let attrs = CellAttributes::default();
        assert_eq!(Cell::new('a', attrs).width, 1);
        assert_eq!(Cell::new('界', attrs).width, 2);
    }

    #[test]
    fn erase_keeps_background_only() {
        let mut attrs = CellAttributes::default();
        attrs.fg = Some(Colour::rgb(1, 2, 3));
        attrs.bg = Some(Colour::rgb(9, 9, 9));
        attrs.flags = StyleFlags::BOLD;
        let mut cell = Cell::new('x', attrs);
        cell.erase(attrs);
        assert!(cell.is_empty());
        assert_eq!(cell.attrs.bg, Some(Colour::rgb(9, 9, 9)));
        assert_eq!(cell.attrs.fg, None);
        assert!(cell.attrs.flags.is_empty());
    }

    #[test]
    fn inverse_swaps_resolved_colours() {
        let theme = Theme::default();
        let mut attrs = CellAttributes {
            fg: Some(Colour::rgb(10, 20, 30)),
            bg: Some(Colour::rgb(40, 50, 60)),
            flags: StyleFlags::empty(),
        };
        assert_eq!(attrs.resolved_fg(&theme), Colour::rgb(10, 20, 30));
        attrs.flags = StyleFlags::INVERSE;
        assert_eq!(attrs.resolved_fg(&theme), Colour::rgb(40, 50, 60));
        assert_eq!(attrs.resolved_bg(&theme), Colour::rgb(10, 20, 30));
    }

    #[test]
    fn inverse_with_defaults_uses_theme_roles() {
        let theme = Theme::default();
        let attrs = CellAttributes {
            flags: StyleFlags::INVERSE,
            ..CellAttributes::default()
        };
        assert_eq!(attrs.resolved_fg(&theme), theme.background());
        assert_eq!(attrs.resolved_bg(&theme), theme.foreground());
    }

    #[test]
    fn hidden_paints_foreground_as_background() {
        let theme = Theme::default();
        let attrs = CellAttributes {
            fg: Some(Colour::rgb(1, 1, 1)),
            bg: Some(Colour::rgb(2, 2, 2)),
            flags: StyleFlags::HIDDEN,
        };
        assert_eq!(attrs.resolved_fg(&theme), Colour::rgb(2, 2, 2));
    }
}
