//! OSC string handlers: titles and colour queries.

use crate::terminal::Terminal;
use crate::theme::Colour;

/// Dispatch a completed OSC string (terminator already consumed).
pub(crate) fn dispatch(term: &mut Terminal, data: &[u8]) -> bool {
    let text = String::from_utf8_lossy(data);
    let (selector, argument) = match text.split_once(';') {
        Some((s, a)) => (s, a),
        None => (text.as_ref(), ""),
    };
    match selector {
        // Icon name and window title are treated as one.
        "0" | "2" | "l" => {
            term.set_title(argument);
            false
        }
        "10" if argument == "?" => {
            let fg = term.theme().foreground();
            term.queue_reply(colour_report(10, fg));
            false
        }
        "11" if argument == "?" => {
            let bg = term.theme().background();
            term.queue_reply(colour_report(11, bg));
            false
        }
        other => {
            tracing::debug!(selector = other, "unhandled OSC string");
            false
        }
    }
}

/// xterm-style colour report with 16-bit channels.
fn colour_report(code: u8, colour: Colour) -> String {
    let scale = |v: u8| u16::from(v) * 0x101;
    format!(
        "\x1b]{};rgb:{:04x}/{:04x}/{:04x}\x07",
        code,
        scale(colour.r),
        scale(colour.g),
        scale(colour.b)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::TerminalConfig;
    use crate::theme::{ColourRole, ThemeBuilder};

    #[test]
    fn title_selectors_set_the_title() {
        let mut t = Terminal::new(TerminalConfig::default());
        t.write_bytes(b"\x1b]0;hello\x07");
        assert_eq!(t.title(), "hello");
        t.write_bytes(b"\x1b]2;world\x1b\\");
        assert_eq!(t.title(), "world");
    }

    #[test]
    fn title_keeps_embedded_semicolons() {
        let mut t = Terminal::new(TerminalConfig::default());
        t.write_bytes(b"\x1b]2;a;b;c\x07");
        assert_eq!(t.title(), "a;b;c");
    }

    #[test]
    fn background_query_reports_theme_colour() {
        let theme = ThemeBuilder::new()
            .with_colour(ColourRole::Background, Colour::rgb(0x1d, 0x1f, 0x21))
            .build();
        let mut t = Terminal::new(TerminalConfig {
            theme,
            ..TerminalConfig::default()
        });
        t.write_bytes(b"\x1b]11;?\x07");
        assert_eq!(t.take_replies(), b"\x1b]11;rgb:1d1d/1f1f/2121\x07".to_vec());
    }

    #[test]
    fn foreground_query_reports_theme_colour() {
        let theme = ThemeBuilder::new()
            .with_colour(ColourRole::Foreground, Colour::rgb(0xc5, 0xc8, 0xc6))
            .build();
        let mut t = Terminal::new(TerminalConfig {
            theme,
            ..TerminalConfig::default()
        });
        t.write_bytes(b"\x1b]10;?\x07");
        assert_eq!(t.take_replies(), b"\x1b]10;rgb:c5c5/c8c8/c6c6\x07".to_vec());
    }

    #[test]
    fn unknown_osc_is_ignored() {
        let mut t = Terminal::new(TerminalConfig::default());
        t.write_bytes(b"\x1b]52;c;aGVsbG8=\x07ok");
        assert_eq!(t.active_buffer().visible_text(), vec!["ok".to_string()]);
        assert!(!t.has_replies());
    }
}
