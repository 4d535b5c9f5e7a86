#![forbid(unsafe_code)]

//! Host-agnostic VT/ANSI terminal engine with sixel graphics.
//!
//! `tideterm-core` is the platform-independent terminal model at the heart
//! of TideTerm. It owns buffer state, VT/ANSI parsing, cursor positioning,
//! scrollback with reflow, and sixel decoding, all without any host I/O
//! dependencies.
//!
//! # Primary responsibilities
//!
//! - **Buffer**: cell grid backed by an unbounded-feeling history ring,
//!   with scroll regions, tab stops, selection, and live reflow on resize.
//! - **Cell**: character content + SGR attributes (colours, bold, italic,
//!   etc.), resolved against a [`Theme`] at render time.
//! - **Terminal**: the escape-sequence state machine driving one main, one
//!   alternate, and one internal buffer, plus mouse event encoding and
//!   reply queuing.
//! - **Sixel**: a DEC sixel decoder producing RGBA images anchored to
//!   buffer rows.
//! - **Window**: a [`WindowManipulator`] trait the embedding GUI
//!   implements so `CSI t` and title sequences can reach the real window.
//!
//! # Design principles
//!
//! - **No I/O**: all types are pure data + logic; the host adapter
//!   supplies bytes (see the `tideterm-pty` crate).
//! - **Deterministic**: identical byte sequences always produce identical
//!   state.
//! - **Never desync**: malformed sequences are logged and skipped; the
//!   stream keeps parsing.

mod ansi;
mod csi;
mod osc;

pub mod buffer;
pub mod cell;
pub mod charset;
pub mod line;
pub mod modes;
pub mod position;
pub mod sixel;
pub mod terminal;
pub mod theme;
pub mod window;

pub use buffer::{Annotation, Buffer, SixelPlacement, VisibleSixel, WordMatch};
pub use cell::{Cell, CellAttributes, StyleFlags};
pub use charset::Charset;
pub use line::Line;
pub use modes::{CursorShape, Modes, MouseExtMode, MouseMode};
pub use position::Position;
pub use sixel::{SixelError, SixelImage};
pub use terminal::{MouseButton, MouseEvent, Terminal, TerminalConfig};
pub use theme::{Colour, ColourRole, Theme, ThemeBuilder, ThemeError};
pub use window::{NullWindowManipulator, WindowManipulator, WindowState};
