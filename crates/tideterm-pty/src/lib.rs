#![forbid(unsafe_code)]

//! PTY session plumbing for TideTerm.
//!
//! `tideterm-pty` connects the pure [`tideterm_core`] engine to a real
//! shell. It spawns the child process in a pseudo-terminal, pumps its
//! output through the escape engine on a reader thread, and flushes any
//! replies the engine queues (DA, DSR, colour queries) back down the PTY.
//!
//! The engine itself never blocks on I/O; the host renders from the shared
//! [`Terminal`] whenever a render notification arrives.
//!
//! [`Terminal`]: tideterm_core::Terminal

mod session;

pub use session::{Session, SessionConfig};

use std::fmt;
use std::io;

/// Map a `portable-pty` error into `io::Error` for a uniform error surface.
pub(crate) fn portable_pty_error<E: fmt::Display>(err: E) -> io::Error {
    io::Error::other(err.to_string())
}
