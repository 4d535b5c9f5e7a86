//! ESC-sequence dispatch: the byte after `0x1B`.

use crate::terminal::{EngineState, Terminal};

/// Handle the byte following ESC. The engine state is Ground on entry;
/// composite sequences set the follow-up state themselves.
pub(crate) fn dispatch(term: &mut Terminal, rune: char) -> bool {
    match rune {
        '[' => {
            term.state = EngineState::Csi {
                params: Vec::new(),
                intermediates: Vec::new(),
            };
            false
        }
        ']' => {
            term.state = EngineState::Osc {
                data: Vec::new(),
                esc: false,
            };
            false
        }
        '(' => {
            term.state = EngineState::Scs { index: 0 };
            false
        }
        ')' => {
            term.state = EngineState::Scs { index: 1 };
            false
        }
        // G2/G3 designators: accept and discard the set byte.
        '*' | '+' => {
            term.state = EngineState::Swallow { count: 1 };
            false
        }
        // Keypad application/numeric mode.
        '>' | '=' => false,
        '7' => {
            term.active_buffer_mut().save_cursor();
            false
        }
        '8' => {
            term.active_buffer_mut().restore_cursor();
            true
        }
        // IND
        'D' => {
            term.active_buffer_mut().index();
            true
        }
        // NEL
        'E' => {
            let buffer = term.active_buffer_mut();
            buffer.index();
            buffer.set_column(0);
            true
        }
        // HTS
        'H' => {
            term.active_buffer_mut().tab_set_at_cursor();
            false
        }
        // RI
        'M' => {
            term.active_buffer_mut().reverse_index();
            true
        }
        'P' => {
            term.state = EngineState::Sixel {
                data: Vec::new(),
                esc: false,
            };
            false
        }
        // RIS
        'c' => {
            term.reset();
            true
        }
        '#' => {
            term.state = EngineState::ScreenState;
            false
        }
        '^' => {
            term.state = EngineState::PrivacyMessage { esc: false };
            false
        }
        // Stray string terminator.
        '\\' => false,
        c => {
            tracing::debug!(rune = %c, "unhandled escape sequence");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::terminal::{Terminal, TerminalConfig};

    fn term() -> Terminal {
        Terminal::new(TerminalConfig {
            cols: 10,
            rows: 4,
            ..TerminalConfig::default()
        })
    }

    #[test]
    fn save_and_restore_cursor() {
        let mut t = term();
        t.write_bytes(b"ab\x1b7cd\x1b8X");
        // Restore returns to col 2, where X overwrites 'c'.
        assert_eq!(t.active_buffer().visible_text(), vec!["abXd".to_string()]);
    }

    #[test]
    fn nel_moves_to_start_of_next_line() {
        let mut t = term();
        t.write_bytes(b"ab\x1bEcd");
        assert_eq!(
            t.active_buffer().visible_text(),
            vec!["ab".to_string(), "cd".to_string()]
        );
    }

    #[test]
    fn reverse_index_at_top_scrolls_down() {
        let mut t = term();
        t.write_bytes(b"top\x1b[H\x1bM");
        assert_eq!(
            t.active_buffer().visible_text(),
            vec![
                String::new(),
                "top".to_string(),
                String::new(),
                String::new()
            ]
        );
    }

    #[test]
    fn hts_sets_stop_used_by_tab() {
        let mut t = term();
        t.write_bytes(b"\x1b[1;6H\x1bH\x1b[1;1H\t");
        assert_eq!(t.active_buffer().cursor_column(), 5);
    }

    #[test]
    fn unknown_escape_is_ignored() {
        let mut t = term();
        t.write_bytes(b"\x1bQok");
        assert_eq!(t.active_buffer().visible_text(), vec!["ok".to_string()]);
    }
}
