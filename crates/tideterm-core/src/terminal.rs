//! Terminal orchestration: buffers, the escape state machine, replies.
//!
//! `Terminal` is pure state. Bytes go in through [`Terminal::write_bytes`],
//! buffer mutations and queued reply bytes come out; the host owns all I/O
//! (see the pty crate's session loop) and drains [`Terminal::take_replies`]
//! back to the child process.

use smallvec::SmallVec;

use crate::buffer::Buffer;
use crate::charset::Charset;
use crate::modes::{MouseExtMode, MouseMode};
use crate::sixel;
use crate::theme::Theme;
use crate::window::{NullWindowManipulator, WindowManipulator};
use crate::{ansi, csi, osc};

pub(crate) const MAIN_BUFFER: usize = 0;
pub(crate) const ALT_BUFFER: usize = 1;

/// Caps on accumulated sequence payloads so a hostile stream cannot hold
/// memory hostage.
const MAX_OSC_BYTES: usize = 4096;
const MAX_CSI_PARAM_BYTES: usize = 128;
const MAX_SIXEL_BYTES: usize = 4 * 1024 * 1024;

/// Escape-engine state. One variant per partially-consumed sequence kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineState {
    Ground,
    Escape,
    Csi {
        params: Vec<u8>,
        intermediates: Vec<u8>,
    },
    Osc {
        data: Vec<u8>,
        esc: bool,
    },
    Scs {
        index: usize,
    },
    ScreenState,
    Swallow {
        count: u8,
    },
    Sixel {
        data: Vec<u8>,
        esc: bool,
    },
    PrivacyMessage {
        esc: bool,
    },
    /// Swallowing an oversized sequence until its terminator; nothing
    /// reaches the grid.
    Discard {
        terminator: Terminator,
        esc: bool,
    },
}

/// What ends a discarded sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Terminator {
    /// BEL or ST.
    Bel,
    /// ST only.
    St,
    /// Any CSI final byte.
    CsiFinal,
}

/// Streaming UTF-8 decoder sitting below the state machine. Invalid bytes
/// decode to U+FFFD without desyncing the stream.
#[derive(Debug, Default)]
struct Utf8Decoder {
    buf: [u8; 4],
    len: u8,
    need: u8,
}

impl Utf8Decoder {
    fn reset(&mut self) {
        self.len = 0;
        self.need = 0;
    }

    fn push(&mut self, byte: u8) -> SmallVec<[char; 2]> {
        let mut out = SmallVec::new();
        if self.need == 0 {
            match byte {
                0x00..=0x7F => out.push(byte as char),
                0xC2..=0xDF => self.start(byte, 2),
                0xE0..=0xEF => self.start(byte, 3),
                0xF0..=0xF4 => self.start(byte, 4),
                _ => out.push(char::REPLACEMENT_CHARACTER),
            }
        } else if byte & 0xC0 == 0x80 {
            self.buf[usize::from(self.len)] = byte;
            self.len += 1;
            if self.len == self.need {
                match std::str::from_utf8(&self.buf[..usize::from(self.len)]) {
                    Ok(s) => out.extend(s.chars()),
                    Err(_) => out.push(char::REPLACEMENT_CHARACTER),
                }
                self.reset();
            }
        } else {
            // Broken sequence: emit a replacement and reprocess the byte.
            self.reset();
            out.push(char::REPLACEMENT_CHARACTER);
            out.extend(self.push(byte));
        }
        out
    }

    fn start(&mut self, byte: u8, need: u8) {
        self.buf[0] = byte;
        self.len = 1;
        self.need = need;
    }
}

/// Construction parameters for a [`Terminal`].
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    pub cols: u16,
    pub rows: u16,
    /// Scrollback cap for the main buffer; the alternate screen never
    /// keeps history.
    pub scrollback_lines: u64,
    pub theme: Theme,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            scrollback_lines: 2000,
            theme: Theme::default(),
        }
    }
}

/// A button position in a [`MouseEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

/// A host mouse event, in view-relative cell coordinates (0-based).
#[derive(Debug, Clone, Copy)]
pub struct MouseEvent {
    /// `None` for motion with no button held.
    pub button: Option<MouseButton>,
    pub pressed: bool,
    pub col: u16,
    pub row: u16,
    pub shift: bool,
    pub meta: bool,
    pub ctrl: bool,
    pub motion: bool,
}

/// The emulator: three buffers, a theme, window capability, mouse protocol
/// state, and the escape engine.
pub struct Terminal {
    buffers: [Buffer; 3],
    active: usize,
    theme: Theme,
    window: Box<dyn WindowManipulator>,
    pub(crate) mouse_mode: MouseMode,
    pub(crate) mouse_ext_mode: MouseExtMode,
    title: String,
    replies: Vec<u8>,
    pub(crate) state: EngineState,
    utf8: Utf8Decoder,
    scrollback_lines: u64,
}

impl Terminal {
    /// Create a terminal with a [`NullWindowManipulator`].
    #[must_use]
    pub fn new(config: TerminalConfig) -> Self {
        Self::with_window(config, Box::new(NullWindowManipulator::new()))
    }

    /// Create a terminal backed by a host window implementation.
    #[must_use]
    pub fn with_window(config: TerminalConfig, window: Box<dyn WindowManipulator>) -> Self {
        let TerminalConfig {
            cols,
            rows,
            scrollback_lines,
            theme,
        } = config;
        Self {
            buffers: [
                Buffer::new(cols, rows, scrollback_lines),
                Buffer::new(cols, rows, 0),
                Buffer::new(cols, rows, 0),
            ],
            active: MAIN_BUFFER,
            theme,
            window,
            mouse_mode: MouseMode::default(),
            mouse_ext_mode: MouseExtMode::default(),
            title: String::new(),
            replies: Vec::new(),
            state: EngineState::Ground,
            utf8: Utf8Decoder::default(),
            scrollback_lines,
        }
    }

    // ── buffers ──

    #[must_use]
    pub fn active_buffer(&self) -> &Buffer {
        &self.buffers[self.active]
    }

    pub fn active_buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffers[self.active]
    }

    #[must_use]
    pub fn is_alt_buffer_active(&self) -> bool {
        self.active == ALT_BUFFER
    }

    /// Switch to the main screen, carrying the current view size over.
    pub fn use_main_buffer(&mut self) {
        self.switch_buffer(MAIN_BUFFER);
    }

    /// Switch to the alternate screen, carrying the current view size over.
    pub fn use_alt_buffer(&mut self) {
        self.switch_buffer(ALT_BUFFER);
    }

    /// Reallocate the alternate screen, as `?1049` does on entry.
    pub(crate) fn reset_alt_buffer(&mut self) {
        let (w, h) = (
            self.active_buffer().view_width(),
            self.active_buffer().view_height(),
        );
        self.buffers[ALT_BUFFER] = Buffer::new(w, h, 0);
    }

    fn switch_buffer(&mut self, index: usize) {
        let (w, h) = (
            self.active_buffer().view_width(),
            self.active_buffer().view_height(),
        );
        self.buffers[index].resize_view(w, h);
        self.active = index;
    }

    /// RIS: reallocate all three buffers and return to the main screen.
    pub fn reset(&mut self) {
        let (w, h) = (
            self.active_buffer().view_width(),
            self.active_buffer().view_height(),
        );
        self.buffers = [
            Buffer::new(w, h, self.scrollback_lines),
            Buffer::new(w, h, 0),
            Buffer::new(w, h, 0),
        ];
        self.active = MAIN_BUFFER;
        self.mouse_mode = MouseMode::default();
        self.mouse_ext_mode = MouseExtMode::default();
        self.state = EngineState::Ground;
        self.utf8 = Utf8Decoder::default();
    }

    /// Resize the active buffer's view. Inactive buffers pick the size up
    /// when switched to.
    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.active_buffer_mut().resize_view(cols, rows);
    }

    // ── ancillary state ──

    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.window.set_title(title);
    }

    pub(crate) fn window_mut(&mut self) -> &mut dyn WindowManipulator {
        self.window.as_mut()
    }

    pub(crate) fn queue_reply(&mut self, bytes: impl AsRef<[u8]>) {
        self.replies.extend_from_slice(bytes.as_ref());
    }

    /// Drain queued device-query answers; the host writes them to the pty.
    #[must_use]
    pub fn take_replies(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.replies)
    }

    #[must_use]
    pub fn has_replies(&self) -> bool {
        !self.replies.is_empty()
    }

    /// Wrap pasted input in bracketed-paste markers when mode 2004 is set.
    #[must_use]
    pub fn wrap_paste(&self, data: &[u8]) -> Vec<u8> {
        if self.active_buffer().modes.bracketed_paste {
            let mut out = Vec::with_capacity(data.len() + 12);
            out.extend_from_slice(b"\x1b[200~");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\x1b[201~");
            out
        } else {
            data.to_vec()
        }
    }

    // ── byte intake ──

    /// Feed a single byte of child-process output.
    pub fn write_byte(&mut self, byte: u8) -> bool {
        self.write_bytes(&[byte])
    }

    /// Feed child-process output. Returns whether anything visible changed.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> bool {
        let mut dirty = false;
        for &byte in bytes {
            for rune in self.utf8.push(byte) {
                dirty |= self.advance(rune);
            }
        }
        dirty
    }

    fn advance(&mut self, rune: char) -> bool {
        let state = std::mem::replace(&mut self.state, EngineState::Ground);
        match state {
            EngineState::Ground => self.ground(rune),
            EngineState::Escape => ansi::dispatch(self, rune),
            EngineState::Csi {
                params,
                intermediates,
            } => self.csi_byte(params, intermediates, rune),
            EngineState::Osc { data, esc } => self.osc_byte(data, esc, rune),
            EngineState::Scs { index } => {
                self.designate(index, rune);
                false
            }
            EngineState::ScreenState => self.screen_state(rune),
            EngineState::Swallow { count } => {
                if count > 1 {
                    self.state = EngineState::Swallow { count: count - 1 };
                }
                false
            }
            EngineState::Sixel { data, esc } => self.sixel_byte(data, esc, rune),
            EngineState::PrivacyMessage { esc } => {
                self.privacy_byte(esc, rune);
                false
            }
            EngineState::Discard { terminator, esc } => {
                self.discard_byte(terminator, esc, rune);
                false
            }
        }
    }

    fn discard_byte(&mut self, terminator: Terminator, esc: bool, rune: char) {
        match terminator {
            Terminator::CsiFinal => match rune {
                '@'..='~' => {}
                '\x1b' => self.state = EngineState::Escape,
                _ => {
                    self.state = EngineState::Discard {
                        terminator,
                        esc: false,
                    };
                }
            },
            Terminator::Bel | Terminator::St => match rune {
                '\x07' if terminator == Terminator::Bel => {}
                '\\' if esc => {}
                '\x1b' => {
                    self.state = EngineState::Discard {
                        terminator,
                        esc: true,
                    };
                }
                // A stray escape ends the string abnormally.
                _ if esc => {}
                _ => {
                    self.state = EngineState::Discard {
                        terminator,
                        esc: false,
                    };
                }
            },
        }
    }

    fn ground(&mut self, rune: char) -> bool {
        match rune {
            '\x1b' => {
                self.state = EngineState::Escape;
                false
            }
            '\n' | '\x0c' => {
                self.active_buffer_mut().new_line();
                true
            }
            '\x0b' => {
                self.active_buffer_mut().vertical_tab();
                true
            }
            '\r' => {
                self.active_buffer_mut().carriage_return();
                true
            }
            '\x08' => {
                self.active_buffer_mut().backspace();
                true
            }
            '\t' => {
                self.active_buffer_mut().tab();
                true
            }
            '\x0e' => {
                self.active_buffer_mut().select_charset(1);
                false
            }
            '\x0f' => {
                self.active_buffer_mut().select_charset(0);
                false
            }
            '\x07' => {
                tracing::trace!("bell");
                false
            }
            c if (c as u32) < 0x20 => {
                tracing::trace!(code = c as u32, "ignored control byte");
                false
            }
            c => {
                self.active_buffer_mut().write([c]);
                true
            }
        }
    }

    fn csi_byte(&mut self, mut params: Vec<u8>, mut intermediates: Vec<u8>, rune: char) -> bool {
        match rune {
            '\x1b' => {
                self.state = EngineState::Escape;
                false
            }
            '0'..='?' => {
                if params.len() >= MAX_CSI_PARAM_BYTES {
                    tracing::debug!("oversized CSI parameter list discarded");
                    self.state = EngineState::Discard {
                        terminator: Terminator::CsiFinal,
                        esc: false,
                    };
                    return false;
                }
                params.push(rune as u8);
                self.state = EngineState::Csi {
                    params,
                    intermediates,
                };
                false
            }
            ' '..='/' => {
                intermediates.push(rune as u8);
                self.state = EngineState::Csi {
                    params,
                    intermediates,
                };
                false
            }
            '@'..='~' => csi::dispatch(self, &params, &intermediates, rune),
            c if (c as u32) < 0x20 => {
                // Control bytes inside a sequence are tolerated.
                self.state = EngineState::Csi {
                    params,
                    intermediates,
                };
                false
            }
            c => {
                tracing::debug!(rune = %c, "malformed CSI byte, sequence dropped");
                false
            }
        }
    }

    fn osc_byte(&mut self, mut data: Vec<u8>, esc: bool, rune: char) -> bool {
        match rune {
            '\x07' => osc::dispatch(self, &data),
            '\\' if esc => osc::dispatch(self, &data),
            '\x1b' => {
                self.state = EngineState::Osc { data, esc: true };
                false
            }
            c => {
                if esc {
                    tracing::debug!("OSC aborted by stray escape");
                    return false;
                }
                if data.len() >= MAX_OSC_BYTES {
                    tracing::debug!("oversized OSC discarded");
                    self.state = EngineState::Discard {
                        terminator: Terminator::Bel,
                        esc: false,
                    };
                    return false;
                }
                let mut bytes = [0u8; 4];
                data.extend_from_slice(c.encode_utf8(&mut bytes).as_bytes());
                self.state = EngineState::Osc { data, esc: false };
                false
            }
        }
    }

    fn sixel_byte(&mut self, mut data: Vec<u8>, esc: bool, rune: char) -> bool {
        match rune {
            '\\' if esc => self.finish_sixel(&data),
            '\x1b' => {
                self.state = EngineState::Sixel { data, esc: true };
                false
            }
            c if esc => {
                tracing::debug!(rune = %c, "sixel stream aborted by stray escape");
                false
            }
            c if (c as u32) < 0x80 => {
                if data.len() >= MAX_SIXEL_BYTES {
                    tracing::debug!("oversized sixel stream discarded");
                    self.state = EngineState::Discard {
                        terminator: Terminator::St,
                        esc: false,
                    };
                    return false;
                }
                data.push(c as u8);
                self.state = EngineState::Sixel { data, esc: false };
                false
            }
            c => {
                tracing::debug!(rune = %c, "non-ascii byte in sixel stream");
                false
            }
        }
    }

    fn finish_sixel(&mut self, data: &[u8]) -> bool {
        let background = self.theme.background();
        match sixel::decode(data, background) {
            Ok(image) => {
                let (_, cell_px_h) = self.window.cell_size_in_pixels();
                let cell_px_h = u32::from(cell_px_h.max(1));
                let rows = image.height().div_ceil(cell_px_h).max(1).min(u32::from(u16::MAX)) as u16;
                let scrolling = self.active_buffer().modes.sixel_scrolling;
                let buffer = self.active_buffer_mut();
                buffer.add_sixel(image, rows);
                if scrolling {
                    for _ in 0..rows {
                        buffer.index();
                    }
                }
                true
            }
            Err(err) => {
                tracing::debug!(%err, "discarding undecodable sixel stream");
                false
            }
        }
    }

    fn designate(&mut self, index: usize, rune: char) {
        match Charset::from_designator(rune) {
            Some(charset) => self
                .active_buffer_mut()
                .designate_charset(index, Some(charset)),
            None => {
                tracing::debug!(designator = %rune, "unknown charset designator");
                self.active_buffer_mut().designate_charset(index, None);
            }
        }
    }

    fn screen_state(&mut self, rune: char) -> bool {
        match rune {
            '8' => {
                self.active_buffer_mut().screen_alignment_test();
                true
            }
            c => {
                tracing::debug!(rune = %c, "unhandled screen-state sequence");
                false
            }
        }
    }

    fn privacy_byte(&mut self, esc: bool, rune: char) {
        match rune {
            '\\' if esc => {}
            '\x18' | '\x1a' => {}
            '\x1b' => self.state = EngineState::PrivacyMessage { esc: true },
            _ => self.state = EngineState::PrivacyMessage { esc: false },
        }
    }

    // ── mouse reporting ──

    /// Encode a host mouse event in the protocol the application selected,
    /// or `None` when the current mode does not report it.
    #[must_use]
    pub fn encode_mouse_event(&self, event: MouseEvent) -> Option<Vec<u8>> {
        // Wheel events are press-only; xterm never reports their release.
        if !event.pressed
            && matches!(
                event.button,
                Some(MouseButton::WheelUp | MouseButton::WheelDown)
            )
        {
            return None;
        }
        match self.mouse_mode {
            MouseMode::None => return None,
            MouseMode::X10 => {
                if event.motion || !event.pressed {
                    return None;
                }
            }
            MouseMode::Vt200 => {
                if event.motion {
                    return None;
                }
            }
            MouseMode::ButtonEvent => {
                if event.motion && event.button.is_none() {
                    return None;
                }
            }
            MouseMode::AnyEvent => {}
        }

        let base: u8 = match event.button {
            Some(MouseButton::Left) => 0,
            Some(MouseButton::Middle) => 1,
            Some(MouseButton::Right) => 2,
            Some(MouseButton::WheelUp) => 64,
            Some(MouseButton::WheelDown) => 65,
            None => 3,
        };
        let mut cb = base;
        if self.mouse_mode != MouseMode::X10 {
            if event.shift {
                cb += 4;
            }
            if event.meta {
                cb += 8;
            }
            if event.ctrl {
                cb += 16;
            }
            if event.motion {
                cb += 32;
            }
        }
        let col = u32::from(event.col) + 1;
        let row = u32::from(event.row) + 1;

        match self.mouse_ext_mode {
            MouseExtMode::Sgr => {
                let suffix = if event.pressed { 'M' } else { 'm' };
                Some(format!("\x1b[<{cb};{col};{row}{suffix}").into_bytes())
            }
            MouseExtMode::Urxvt => {
                let cb = packed_button(cb, base, event.pressed);
                Some(format!("\x1b[{};{col};{row}M", u32::from(cb) + 32).into_bytes())
            }
            MouseExtMode::Utf8 => {
                let cb = packed_button(cb, base, event.pressed);
                let mut out = b"\x1b[M".to_vec();
                for value in [u32::from(cb) + 32, col + 32, row + 32] {
                    let rune = char::from_u32(value).unwrap_or(' ');
                    let mut bytes = [0u8; 4];
                    out.extend_from_slice(rune.encode_utf8(&mut bytes).as_bytes());
                }
                Some(out)
            }
            MouseExtMode::None => {
                let cb = packed_button(cb, base, event.pressed);
                let clamp = |v: u32| v.min(223) as u8 + 32;
                Some(vec![0x1b, b'[', b'M', cb + 32, clamp(col), clamp(row)])
            }
        }
    }
}

/// Packed-byte forms report a release as button 3. Wheel releases never
/// reach here; they are filtered out before encoding.
fn packed_button(cb: u8, base: u8, pressed: bool) -> u8 {
    if pressed {
        cb
    } else {
        cb - base + 3
    }
}
