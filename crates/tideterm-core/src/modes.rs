//! Terminal mode state.
//!
//! Screen-content modes live on each buffer and travel with main/alt
//! switches only insofar as each buffer keeps its own copy. Mouse tracking
//! is a terminal-wide protocol concern and is modelled separately
//! ([`MouseMode`] / [`MouseExtMode`] live on `Terminal`, not here).

/// Per-buffer boolean modes, named after the sequences that toggle them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modes {
    /// IRM, `CSI 4 h/l`. Set means insert-shift on write; reset (the
    /// default) overwrites in place.
    pub insert: bool,
    /// LNM, `CSI 20 h/l`. Set makes LF imply CR.
    pub line_feed: bool,
    /// DECCKM, `CSI ? 1 h/l`.
    pub application_cursor_keys: bool,
    /// DECSCNM, `CSI ? 5 h/l`. Reverse video for the whole screen.
    pub screen_reverse: bool,
    /// DECOM, `CSI ? 6 h/l`. Cursor addressing relative to the margins.
    pub origin: bool,
    /// DECAWM, `CSI ? 7 h/l`.
    pub auto_wrap: bool,
    /// `CSI ? 12/13 h/l`.
    pub blinking_cursor: bool,
    /// DECTCEM, `CSI ? 25 h/l`.
    pub show_cursor: bool,
    /// `CSI ? 2004 h/l`.
    pub bracketed_paste: bool,
    /// DECSDM-adjacent scrolling behaviour, `CSI ? 80 h/l`.
    pub sixel_scrolling: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            insert: false,
            line_feed: false,
            application_cursor_keys: false,
            screen_reverse: false,
            origin: false,
            auto_wrap: true,
            blinking_cursor: false,
            show_cursor: true,
            bracketed_paste: false,
            sixel_scrolling: true,
        }
    }
}

/// Which mouse events the application asked to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMode {
    #[default]
    None,
    /// `?9`: button presses only, no modifiers.
    X10,
    /// `?1000`: press and release with modifiers.
    Vt200,
    /// `?1002`: VT200 plus motion while a button is held.
    ButtonEvent,
    /// `?1003`: all motion.
    AnyEvent,
}

/// Coordinate encoding extension for mouse reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseExtMode {
    #[default]
    None,
    /// `?1005`.
    Utf8,
    /// `?1006`.
    Sgr,
    /// `?1015`.
    Urxvt,
}

/// How the cursor should be drawn, selected by DECSCUSR (`CSI Ps SP q`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Block,
    Underline,
    Bar,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_power_on_state() {
        let modes = Modes::default();
        assert!(modes.auto_wrap);
        assert!(modes.show_cursor);
        assert!(modes.sixel_scrolling);
        assert!(!modes.insert);
        assert!(!modes.line_feed);
        assert!(!modes.origin);
    }
}
