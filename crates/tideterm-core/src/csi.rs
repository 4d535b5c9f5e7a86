//! CSI sequence handlers.
//!
//! Parameters arrive as the raw bytes between `ESC [` and the final byte.
//! They are parsed into numbers here (`;`-separated, empty slots read as
//! zero, private-marker prefixes noted) and dispatched on the final byte.
//! Unrecognized finals, modes, and SGR codes are logged and ignored; the
//! stream never desyncs.

use smallvec::SmallVec;

use crate::cell::{CellAttributes, StyleFlags};
use crate::modes::{CursorShape, MouseExtMode, MouseMode};
use crate::terminal::Terminal;
use crate::theme::{Colour, Theme};
use crate::window::WindowState;

type Params = SmallVec<[u16; 8]>;

fn parse_params(raw: &[u8]) -> (Params, bool, bool) {
    let mut private = false;
    let mut gt = false;
    let mut rest = raw;
    while let Some((&byte, tail)) = rest.split_first() {
        match byte {
            b'?' => private = true,
            b'>' => gt = true,
            b'<' | b'=' => {}
            _ => break,
        }
        rest = tail;
    }
    let mut params = Params::new();
    if !rest.is_empty() {
        for part in rest.split(|&b| b == b';') {
            let mut value: u32 = 0;
            for &digit in part {
                if digit.is_ascii_digit() {
                    value = (value * 10 + u32::from(digit - b'0')).min(u32::from(u16::MAX));
                }
            }
            params.push(value as u16);
        }
    }
    (params, private, gt)
}

/// Missing or zero count parameters default to 1.
fn count_or_one(params: &Params, index: usize) -> u16 {
    params.get(index).copied().filter(|&v| v != 0).unwrap_or(1)
}

pub(crate) fn dispatch(
    term: &mut Terminal,
    raw_params: &[u8],
    intermediates: &[u8],
    final_byte: char,
) -> bool {
    let (params, private, gt) = parse_params(raw_params);
    match final_byte {
        // CUU/CUD/CUF/CUB and their HPR/VPR aliases.
        'A' => {
            let n = i32::from(count_or_one(&params, 0));
            term.active_buffer_mut().move_position(0, -n);
            true
        }
        'B' | 'e' => {
            let n = i32::from(count_or_one(&params, 0));
            term.active_buffer_mut().move_position(0, n);
            true
        }
        'C' | 'a' => {
            let n = i32::from(count_or_one(&params, 0));
            term.active_buffer_mut().move_position(n, 0);
            true
        }
        'D' => {
            let n = i32::from(count_or_one(&params, 0));
            term.active_buffer_mut().move_position(-n, 0);
            true
        }
        // CNL/CPL.
        'E' => {
            let n = i32::from(count_or_one(&params, 0));
            let buffer = term.active_buffer_mut();
            buffer.move_position(0, n);
            buffer.set_column(0);
            true
        }
        'F' => {
            let n = i32::from(count_or_one(&params, 0));
            let buffer = term.active_buffer_mut();
            buffer.move_position(0, -n);
            buffer.set_column(0);
            true
        }
        // CHA.
        'G' | '`' => {
            term.active_buffer_mut().set_column(count_or_one(&params, 0) - 1);
            true
        }
        // VPA.
        'd' => {
            let row = count_or_one(&params, 0) - 1;
            let col = term.active_buffer().cursor_column();
            term.active_buffer_mut().set_position(col, row);
            true
        }
        // CUP/HVP.
        'H' | 'f' => {
            let row = count_or_one(&params, 0) - 1;
            let col = count_or_one(&params, 1) - 1;
            term.active_buffer_mut().set_position(col, row);
            true
        }
        // ED.
        'J' => match params.first().copied().unwrap_or(0) {
            0 => {
                term.active_buffer_mut().erase_display_from_cursor();
                true
            }
            1 => {
                term.active_buffer_mut().erase_display_to_cursor();
                true
            }
            2 | 3 => {
                term.active_buffer_mut().erase_display();
                true
            }
            mode => {
                tracing::debug!(mode, "unhandled ED mode");
                false
            }
        },
        // EL.
        'K' => match params.first().copied().unwrap_or(0) {
            0 => {
                term.active_buffer_mut().erase_line_from_cursor();
                true
            }
            1 => {
                term.active_buffer_mut().erase_line_to_cursor();
                true
            }
            2 => {
                term.active_buffer_mut().erase_line();
                true
            }
            mode => {
                tracing::debug!(mode, "unhandled EL mode");
                false
            }
        },
        'L' => {
            term.active_buffer_mut().insert_lines(count_or_one(&params, 0));
            true
        }
        'M' => {
            term.active_buffer_mut().delete_lines(count_or_one(&params, 0));
            true
        }
        'P' => {
            term.active_buffer_mut().delete_chars(count_or_one(&params, 0));
            true
        }
        '@' => {
            term.active_buffer_mut()
                .insert_blank_characters(count_or_one(&params, 0));
            true
        }
        'X' => {
            term.active_buffer_mut()
                .erase_characters(count_or_one(&params, 0));
            true
        }
        // SU/SD.
        'S' => {
            term.active_buffer_mut().area_scroll_up(count_or_one(&params, 0));
            true
        }
        'T' => {
            term.active_buffer_mut()
                .area_scroll_down(count_or_one(&params, 0));
            true
        }
        // CBT.
        'Z' => {
            for _ in 0..count_or_one(&params, 0) {
                term.active_buffer_mut().tab_reverse();
            }
            true
        }
        // DECSTBM. Homes the cursor.
        'r' => {
            let height = term.active_buffer().view_height();
            let top = count_or_one(&params, 0);
            let bottom = params
                .get(1)
                .copied()
                .filter(|&v| v != 0)
                .unwrap_or(height);
            let buffer = term.active_buffer_mut();
            buffer.set_margins(top - 1, bottom.saturating_sub(1));
            buffer.set_position(0, 0);
            true
        }
        'm' => sgr(term, &params),
        'h' => set_modes(term, &params, private, true),
        'l' => set_modes(term, &params, private, false),
        'c' => device_attributes(term, gt),
        'n' => device_status_report(term, params.first().copied().unwrap_or(0)),
        't' => window_manipulation(term, &params),
        // TBC.
        'g' => match params.first().copied().unwrap_or(0) {
            0 => {
                term.active_buffer_mut().tab_clear_at_cursor();
                false
            }
            3 => {
                term.active_buffer_mut().tab_clear_all();
                false
            }
            mode => {
                tracing::debug!(mode, "unhandled TBC mode");
                false
            }
        },
        // DECSCUSR.
        'q' if intermediates == b" " => {
            let shape = match params.first().copied().unwrap_or(0) {
                0..=2 => CursorShape::Block,
                3 | 4 => CursorShape::Underline,
                5 | 6 => CursorShape::Bar,
                other => {
                    tracing::debug!(other, "unhandled cursor shape");
                    return false;
                }
            };
            term.active_buffer_mut().set_cursor_shape(shape);
            true
        }
        // DECSTR.
        'p' if intermediates == b"!" => {
            term.active_buffer_mut().soft_reset();
            term.mouse_mode = MouseMode::None;
            term.mouse_ext_mode = MouseExtMode::None;
            true
        }
        // ANSI save/restore cursor, aliasing DECSC/DECRC.
        's' => {
            term.active_buffer_mut().save_cursor();
            false
        }
        'u' => {
            term.active_buffer_mut().restore_cursor();
            true
        }
        other => {
            tracing::debug!(
                final_byte = %other,
                params = ?raw_params,
                "unhandled CSI sequence"
            );
            false
        }
    }
}

// ── SGR ──

fn sgr(term: &mut Terminal, params: &Params) -> bool {
    let theme = term.theme().clone();
    let defaults: &[u16] = &[0];
    let params: &[u16] = if params.is_empty() { defaults } else { params };
    {
        let attrs = term.active_buffer_mut().cursor_attr_mut();
        let mut i = 0;
        while i < params.len() {
            let code = params[i];
            match code {
                0 => *attrs = CellAttributes::default(),
                1 => attrs.set_flag(StyleFlags::BOLD, true),
                2 => attrs.set_flag(StyleFlags::DIM, true),
                3 => attrs.set_flag(StyleFlags::ITALIC, true),
                4 => attrs.set_flag(StyleFlags::UNDERLINE, true),
                5 | 6 => attrs.set_flag(StyleFlags::BLINK, true),
                7 => attrs.set_flag(StyleFlags::INVERSE, true),
                8 => attrs.set_flag(StyleFlags::HIDDEN, true),
                9 => attrs.set_flag(StyleFlags::STRIKETHROUGH, true),
                21 | 22 => {
                    attrs.set_flag(StyleFlags::BOLD, false);
                    attrs.set_flag(StyleFlags::DIM, false);
                }
                23 => attrs.set_flag(StyleFlags::ITALIC, false),
                24 => attrs.set_flag(StyleFlags::UNDERLINE, false),
                25 => attrs.set_flag(StyleFlags::BLINK, false),
                27 => attrs.set_flag(StyleFlags::INVERSE, false),
                28 => attrs.set_flag(StyleFlags::HIDDEN, false),
                29 => attrs.set_flag(StyleFlags::STRIKETHROUGH, false),
                30..=37 | 90..=97 => attrs.fg = theme.colour_from_4bit(code as u8),
                39 => attrs.fg = None,
                40..=47 | 100..=107 => attrs.bg = theme.colour_from_4bit(code as u8),
                49 => attrs.bg = None,
                38 | 48 => match extended_colour(&theme, &params[i + 1..]) {
                    Some((colour, consumed)) => {
                        if code == 38 {
                            attrs.fg = Some(colour);
                        } else {
                            attrs.bg = Some(colour);
                        }
                        i += consumed;
                    }
                    None => {
                        tracing::debug!(code, "malformed extended colour, SGR aborted");
                        break;
                    }
                },
                other => tracing::debug!(code = other, "unhandled SGR code"),
            }
            i += 1;
        }
    }
    term.active_buffer_mut().restyle_cursor_cell();
    true
}

/// `5;N` palette or `2;R;G;B` literal, returning the parameters consumed.
fn extended_colour(theme: &Theme, rest: &[u16]) -> Option<(Colour, usize)> {
    match rest.first()? {
        5 => {
            let index = rest.get(1)?;
            Some((theme.colour_from_8bit((*index).min(255) as u8), 2))
        }
        2 => {
            let channel = |i: usize| rest.get(i).map(|&v| v.min(255) as u8);
            Some((
                theme.colour_from_24bit(channel(1)?, channel(2)?, channel(3)?),
                4,
            ))
        }
        _ => None,
    }
}

// ── modes ──

fn set_modes(term: &mut Terminal, params: &Params, private: bool, enabled: bool) -> bool {
    let mut dirty = false;
    for &mode in params {
        dirty |= if private {
            set_private_mode(term, mode, enabled)
        } else {
            set_ansi_mode(term, mode, enabled)
        };
    }
    dirty
}

fn set_ansi_mode(term: &mut Terminal, mode: u16, enabled: bool) -> bool {
    match mode {
        // IRM.
        4 => {
            term.active_buffer_mut().modes.insert = enabled;
            false
        }
        // LNM.
        20 => {
            term.active_buffer_mut().modes.line_feed = enabled;
            false
        }
        other => {
            tracing::debug!(mode = other, enabled, "unrecognized ANSI mode");
            false
        }
    }
}

fn set_private_mode(term: &mut Terminal, mode: u16, enabled: bool) -> bool {
    match mode {
        1 => {
            term.active_buffer_mut().modes.application_cursor_keys = enabled;
            false
        }
        // DECCOLM. The column switch itself is not emulated; the side
        // effects (clear, home, margins reset) are.
        3 => {
            let buffer = term.active_buffer_mut();
            buffer.erase_display();
            buffer.reset_margins();
            buffer.set_position(0, 0);
            true
        }
        5 => {
            term.active_buffer_mut().modes.screen_reverse = enabled;
            true
        }
        6 => {
            let buffer = term.active_buffer_mut();
            buffer.modes.origin = enabled;
            buffer.set_position(0, 0);
            true
        }
        7 => {
            term.active_buffer_mut().modes.auto_wrap = enabled;
            false
        }
        9 => {
            term.mouse_mode = if enabled { MouseMode::X10 } else { MouseMode::None };
            false
        }
        12 | 13 => {
            term.active_buffer_mut().modes.blinking_cursor = enabled;
            true
        }
        25 => {
            term.active_buffer_mut().modes.show_cursor = enabled;
            true
        }
        47 => {
            if enabled {
                term.use_alt_buffer();
            } else {
                term.use_main_buffer();
            }
            true
        }
        80 => {
            term.active_buffer_mut().modes.sixel_scrolling = enabled;
            false
        }
        1000 => {
            term.mouse_mode = if enabled { MouseMode::Vt200 } else { MouseMode::None };
            false
        }
        1002 => {
            term.mouse_mode = if enabled {
                MouseMode::ButtonEvent
            } else {
                MouseMode::None
            };
            false
        }
        1003 => {
            term.mouse_mode = if enabled {
                MouseMode::AnyEvent
            } else {
                MouseMode::None
            };
            false
        }
        1005 => {
            term.mouse_ext_mode = if enabled { MouseExtMode::Utf8 } else { MouseExtMode::None };
            false
        }
        1006 => {
            term.mouse_ext_mode = if enabled { MouseExtMode::Sgr } else { MouseExtMode::None };
            false
        }
        1015 => {
            term.mouse_ext_mode = if enabled {
                MouseExtMode::Urxvt
            } else {
                MouseExtMode::None
            };
            false
        }
        1047 => {
            if enabled {
                term.use_alt_buffer();
            } else {
                term.active_buffer_mut().erase_display();
                term.use_main_buffer();
            }
            true
        }
        1048 => {
            if enabled {
                term.active_buffer_mut().save_cursor();
            } else {
                term.active_buffer_mut().restore_cursor();
            }
            true
        }
        1049 => {
            if enabled {
                term.active_buffer_mut().save_cursor();
                term.reset_alt_buffer();
                term.use_alt_buffer();
            } else {
                term.use_main_buffer();
                term.active_buffer_mut().restore_cursor();
            }
            true
        }
        2004 => {
            term.active_buffer_mut().modes.bracketed_paste = enabled;
            false
        }
        other => {
            tracing::debug!(mode = other, enabled, "unrecognized private mode");
            false
        }
    }
}

// ── device queries ──

fn device_attributes(term: &mut Terminal, secondary: bool) -> bool {
    if secondary {
        term.queue_reply(b"\x1b[>0;0;0c");
    } else {
        // VT100 with advanced video option.
        term.queue_reply(b"\x1b[?1;2c");
    }
    false
}

fn device_status_report(term: &mut Terminal, kind: u16) -> bool {
    match kind {
        5 => term.queue_reply(b"\x1b[0n"),
        6 => {
            let buffer = term.active_buffer();
            let row = buffer.cursor_line() + 1;
            let col = buffer.cursor_column().min(buffer.view_width() - 1) + 1;
            term.queue_reply(format!("\x1b[{row};{col}R"));
        }
        other => tracing::debug!(kind = other, "unhandled DSR request"),
    }
    false
}

// ── window manipulation ──

fn window_manipulation(term: &mut Terminal, params: &Params) -> bool {
    fn arg(params: &Params, index: &mut usize) -> u16 {
        let value = params.get(*index).copied().unwrap_or(0);
        if *index < params.len() {
            *index += 1;
        }
        value
    }
    let mut index = 0;
    while index < params.len() {
        let op = params[index];
        index += 1;
        match op {
            1 => term.window_mut().restore(),
            2 => term.window_mut().minimise(),
            3 => {
                let x = arg(params, &mut index);
                let y = arg(params, &mut index);
                term.window_mut().move_to(i32::from(x), i32::from(y));
            }
            4 => {
                let height = arg(params, &mut index);
                let width = arg(params, &mut index);
                term.window_mut()
                    .resize_in_pixels(u32::from(width), u32::from(height));
            }
            // Raise/lower are not plumbed through.
            5 | 6 => {}
            8 => {
                let rows = arg(params, &mut index);
                let cols = arg(params, &mut index);
                term.window_mut().resize_in_chars(cols, rows);
            }
            9 => match arg(params, &mut index) {
                0 => term.window_mut().restore(),
                1 => term.window_mut().maximise(),
                other => tracing::debug!(other, "unhandled maximize selector"),
            },
            10 => match arg(params, &mut index) {
                0 => term.window_mut().set_fullscreen(false),
                1 => term.window_mut().set_fullscreen(true),
                2 => {
                    let now = term.window_mut().is_fullscreen();
                    term.window_mut().set_fullscreen(!now);
                }
                other => tracing::debug!(other, "unhandled fullscreen selector"),
            },
            11 => {
                let reply: &[u8] = match term.window_mut().state() {
                    WindowState::Minimised => b"\x1b[2t",
                    _ => b"\x1b[1t",
                };
                term.queue_reply(reply);
            }
            13 => {
                let (x, y) = term.window_mut().position();
                term.queue_reply(format!("\x1b[3;{x};{y}t"));
            }
            14 => {
                let (width, height) = term.window_mut().size_in_pixels();
                term.queue_reply(format!("\x1b[4;{height};{width}t"));
            }
            15 => {
                let (width, height) = term.window_mut().screen_size_in_pixels();
                term.queue_reply(format!("\x1b[5;{height};{width}t"));
            }
            18 => {
                let (cols, rows) = term.window_mut().size_in_chars();
                term.queue_reply(format!("\x1b[8;{rows};{cols}t"));
            }
            19 => {
                let (cols, rows) = term.window_mut().screen_size_in_chars();
                term.queue_reply(format!("\x1b[9;{rows};{cols}t"));
            }
            20 => term.queue_reply(b"\x1b]L\x1b\\"),
            21 => {
                let title = term.window_mut().title();
                term.queue_reply(format!("\x1b]l{title}\x1b\\"));
            }
            22 => {
                let _ = arg(params, &mut index);
                term.window_mut().save_title_to_stack();
            }
            23 => {
                let _ = arg(params, &mut index);
                term.window_mut().restore_title_from_stack();
            }
            other => tracing::debug!(op = other, "unhandled window manipulation op"),
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::TerminalConfig;

    fn term() -> Terminal {
        Terminal::new(TerminalConfig {
            cols: 20,
            rows: 6,
            ..TerminalConfig::default()
        })
    }

    fn text(term: &Terminal) -> Vec<String> {
        term.active_buffer().visible_text()
    }

    #[test]
    fn parse_params_strips_private_markers() {
        let (params, private, gt) = parse_params(b"?1049");
        assert!(private);
        assert!(!gt);
        assert_eq!(&params[..], &[1049]);

        let (params, private, gt) = parse_params(b">0");
        assert!(gt);
        assert!(!private);
        assert_eq!(&params[..], &[0]);
    }

    #[test]
    fn parse_params_empty_slots_are_zero() {
        let (params, ..) = parse_params(b"5;;3");
        assert_eq!(&params[..], &[5, 0, 3]);
        let (params, ..) = parse_params(b"");
        assert!(params.is_empty());
    }

    #[test]
    fn cursor_arrows_move_and_clamp() {
        let mut t = term();
        t.write_bytes(b"\x1b[5;5H\x1b[2A\x1b[3C");
        assert_eq!(t.active_buffer().cursor_line(), 2);
        assert_eq!(t.active_buffer().cursor_column(), 7);
        t.write_bytes(b"\x1b[99D\x1b[99A");
        assert_eq!(t.active_buffer().cursor_line(), 0);
        assert_eq!(t.active_buffer().cursor_column(), 0);
    }

    #[test]
    fn erase_in_line_modes() {
        let mut t = term();
        t.write_bytes(b"abcdefgh\x1b[1;4H\x1b[1K");
        assert_eq!(text(&t), vec!["    efgh".to_string()]);
        t.write_bytes(b"\x1b[1;6H\x1b[K");
        assert_eq!(text(&t), vec!["    e".to_string()]);
        t.write_bytes(b"\x1b[2K");
        assert_eq!(text(&t), vec!["".to_string()]);
    }

    #[test]
    fn insert_and_delete_chars_sequences() {
        let mut t = term();
        t.write_bytes(b"abcdef\x1b[1;3H\x1b[2@");
        assert_eq!(text(&t), vec!["ab  cdef".to_string()]);
        t.write_bytes(b"\x1b[2P");
        assert_eq!(text(&t), vec!["abcdef".to_string()]);
        t.write_bytes(b"\x1b[2X");
        assert_eq!(text(&t), vec!["ab  ef".to_string()]);
    }

    #[test]
    fn scroll_up_sequence_moves_rows() {
        let mut t = term();
        t.write_bytes(b"a\r\nb\r\nc\x1b[2S");
        let rows = text(&t);
        assert_eq!(rows[0], "c");
    }

    #[test]
    fn back_tab_returns_to_previous_stop() {
        let mut t = term();
        t.write_bytes(b"\x1b[1;12H\x1b[Z");
        assert_eq!(t.active_buffer().cursor_column(), 8);
        t.write_bytes(b"\x1b[Z");
        assert_eq!(t.active_buffer().cursor_column(), 0);
    }

    #[test]
    fn sgr_256_palette_cube() {
        let mut t = term();
        t.write_bytes(b"\x1b[38;5;196m");
        assert_eq!(
            t.active_buffer().cursor_attr().fg,
            Some(Colour::rgb(255, 0, 0))
        );
    }

    #[test]
    fn sgr_malformed_extended_colour_aborts_quietly() {
        let mut t = term();
        t.write_bytes(b"\x1b[38;7;1m\x1b[1m");
        assert_eq!(t.active_buffer().cursor_attr().fg, None);
        // The stream keeps parsing afterwards.
        assert!(t
            .active_buffer()
            .cursor_attr()
            .flags
            .contains(StyleFlags::BOLD));
    }

    #[test]
    fn insert_mode_toggle() {
        let mut t = term();
        t.write_bytes(b"\x1b[4h");
        assert!(t.active_buffer().modes.insert);
        t.write_bytes(b"\x1b[4l");
        assert!(!t.active_buffer().modes.insert);
    }

    #[test]
    fn unknown_modes_are_ignored() {
        let mut t = term();
        t.write_bytes(b"\x1b[999h\x1b[?4242h ok");
        assert_eq!(text(&t), vec![" ok".to_string()]);
    }

    #[test]
    fn origin_mode_homes_to_margin() {
        let mut t = term();
        t.write_bytes(b"\x1b[3;5r\x1b[?6h");
        assert_eq!(t.active_buffer().cursor_line(), 2);
        t.write_bytes(b"\x1b[1;1H");
        assert_eq!(t.active_buffer().cursor_line(), 2);
        t.write_bytes(b"\x1b[99;1H");
        assert_eq!(t.active_buffer().cursor_line(), 4);
    }

    #[test]
    fn deccolm_clears_and_homes() {
        let mut t = term();
        t.write_bytes(b"hello\x1b[?3h");
        assert_eq!(text(&t).join(""), "");
        assert_eq!(t.active_buffer().cursor_line(), 0);
        assert_eq!(t.active_buffer().cursor_column(), 0);
    }

    #[test]
    fn show_cursor_mode() {
        let mut t = term();
        assert!(t.active_buffer().is_cursor_visible());
        t.write_bytes(b"\x1b[?25l");
        assert!(!t.active_buffer().is_cursor_visible());
        t.write_bytes(b"\x1b[?25h");
        assert!(t.active_buffer().is_cursor_visible());
    }

    #[test]
    fn window_size_report_uses_manipulator() {
        let mut t = term();
        t.write_bytes(b"\x1b[18t");
        assert_eq!(t.take_replies(), b"\x1b[8;24;80t".to_vec());
        t.write_bytes(b"\x1b[14t");
        // 80x24 cells at 8x16 px.
        assert_eq!(t.take_replies(), b"\x1b[4;384;640t".to_vec());
    }

    #[test]
    fn window_state_report() {
        let mut t = term();
        t.write_bytes(b"\x1b[2t\x1b[11t");
        assert_eq!(t.take_replies(), b"\x1b[2t".to_vec());
        t.write_bytes(b"\x1b[1t\x1b[11t");
        assert_eq!(t.take_replies(), b"\x1b[1t".to_vec());
    }

    #[test]
    fn title_stack_sequences() {
        let mut t = term();
        t.write_bytes(b"\x1b]2;old\x07\x1b[22;0t\x1b]2;new\x07\x1b[23;0t\x1b[21t");
        assert_eq!(t.take_replies(), b"\x1b]lold\x1b\\".to_vec());
    }

    #[test]
    fn secondary_da_reply() {
        let mut t = term();
        t.write_bytes(b"\x1b[>c");
        assert_eq!(t.take_replies(), b"\x1b[>0;0;0c".to_vec());
    }

    #[test]
    fn soft_reset_restores_defaults() {
        let mut t = term();
        t.write_bytes(b"\x1b[1m\x1b[?6h\x1b[2;4r\x1b[?1000h\x1b[!p");
        assert!(t.active_buffer().cursor_attr().flags.is_empty());
        assert!(!t.active_buffer().modes.origin);
        assert_eq!(t.mouse_mode, MouseMode::None);
        // Margins back to full screen: index at the bottom grows history.
        t.write_bytes(b"\x1b[6;1H\x1bD");
        assert_eq!(t.active_buffer().line_count(), 7);
    }

    #[test]
    fn ansi_save_restore_cursor() {
        let mut t = term();
        t.write_bytes(b"\x1b[3;7H\x1b[s\x1b[H\x1b[u");
        assert_eq!(t.active_buffer().cursor_line(), 2);
        assert_eq!(t.active_buffer().cursor_column(), 6);
    }
}
