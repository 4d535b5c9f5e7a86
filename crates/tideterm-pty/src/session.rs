//! A running shell attached to a [`Terminal`] through a PTY.

use std::io::{self, Read, Write};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use portable_pty::{Child, CommandBuilder, MasterPty, PtySize};
use tideterm_core::{NullWindowManipulator, Terminal, TerminalConfig, Theme, WindowManipulator};

use crate::portable_pty_error;

/// Configuration for a shell session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Initial PTY width in columns.
    pub cols: u16,
    /// Initial PTY height in rows.
    pub rows: u16,
    /// TERM to set in the child.
    pub term: String,
    /// Extra environment variables to set in the child.
    pub env: Vec<(String, String)>,
    /// Shell binary. Falls back to `$SHELL`, then `/bin/sh`.
    pub shell: Option<String>,
    /// Command line typed into the shell right after it starts.
    pub initial_command: Option<String>,
    /// Scrollback cap for the main buffer.
    pub scrollback_lines: u64,
    pub theme: Theme,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            term: "xterm-256color".to_string(),
            env: Vec::new(),
            shell: None,
            initial_command: None,
            scrollback_lines: 2000,
            theme: Theme::default(),
        }
    }
}

impl SessionConfig {
    fn shell_program(&self) -> String {
        self.shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok())
            .unwrap_or_else(|| "/bin/sh".to_string())
    }
}

/// A live shell session.
///
/// The child's output is consumed on a dedicated reader thread which feeds
/// the shared [`Terminal`], writes queued replies back to the child, and
/// coalesces render notifications into [`Session::render_events`]. Dropping
/// the session kills the child and joins the reader.
pub struct Session {
    terminal: Arc<Mutex<Terminal>>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    reader_thread: Option<thread::JoinHandle<()>>,
    render_rx: Option<Receiver<()>>,
}

impl Session {
    /// Spawn the configured shell in a fresh PTY, with no real window
    /// attached.
    pub fn spawn(config: SessionConfig) -> io::Result<Self> {
        Self::spawn_with_window(config, Box::new(NullWindowManipulator::new()))
    }

    /// Spawn with a host window implementation, so `CSI t` window ops,
    /// window reports, and title sequences reach the embedding GUI.
    pub fn spawn_with_window(
        config: SessionConfig,
        window: Box<dyn WindowManipulator>,
    ) -> io::Result<Self> {
        let terminal = Arc::new(Mutex::new(Terminal::with_window(
            TerminalConfig {
                cols: config.cols,
                rows: config.rows,
                scrollback_lines: config.scrollback_lines,
                theme: config.theme.clone(),
            },
            window,
        )));

        let pty_system = portable_pty::native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: config.rows,
                cols: config.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(portable_pty_error)?;

        let program = config.shell_program();
        let mut cmd = CommandBuilder::new(&program);
        cmd.env("TERM", &config.term);
        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        let child = pair.slave.spawn_command(cmd).map_err(portable_pty_error)?;
        let reader = pair.master.try_clone_reader().map_err(portable_pty_error)?;
        let writer = pair.master.take_writer().map_err(portable_pty_error)?;
        let writer = Arc::new(Mutex::new(writer));

        // Depth 1: a pending notification already covers any further
        // dirtiness, so the reader never blocks on a slow renderer.
        let (render_tx, render_rx) = mpsc::sync_channel::<()>(1);

        let reader_thread = thread::spawn({
            let terminal = Arc::clone(&terminal);
            let writer = Arc::clone(&writer);
            move || pump_output(reader, &terminal, &writer, &render_tx)
        });

        tracing::info!(program, cols = config.cols, rows = config.rows, "session spawned");

        let session = Self {
            terminal,
            writer,
            master: pair.master,
            child,
            reader_thread: Some(reader_thread),
            render_rx: Some(render_rx),
        };

        if let Some(command) = &config.initial_command {
            session.write(command.as_bytes())?;
            session.write(b"\n")?;
        }

        Ok(session)
    }

    /// The shared engine. Lock it to render or to inspect state.
    #[must_use]
    pub fn terminal(&self) -> Arc<Mutex<Terminal>> {
        Arc::clone(&self.terminal)
    }

    /// Receiver that yields once per batch of visible changes. Can be
    /// taken once; subsequent calls return `None`.
    pub fn take_render_events(&mut self) -> Option<Receiver<()>> {
        self.render_rx.take()
    }

    /// Write raw input (key presses, mouse reports) to the child.
    pub fn write(&self, data: &[u8]) -> io::Result<()> {
        let mut writer = lock_unpoisoned(&self.writer);
        writer.write_all(data)?;
        writer.flush()
    }

    /// Write pasted text, bracketing it when the child asked for that.
    pub fn paste(&self, data: &[u8]) -> io::Result<()> {
        let wrapped = lock_unpoisoned(&self.terminal).wrap_paste(data);
        self.write(&wrapped)
    }

    /// Resize both the PTY and the engine's active buffer.
    pub fn resize(&self, cols: u16, rows: u16) -> io::Result<()> {
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(portable_pty_error)?;
        lock_unpoisoned(&self.terminal).set_size(cols, rows);
        Ok(())
    }

    /// Whether the child process is still running.
    pub fn is_alive(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(_)) => false,
            Err(err) => {
                tracing::warn!(%err, "child wait failed");
                false
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.reader_thread.take() {
            let _ = handle.join();
        }
    }
}

fn pump_output(
    mut reader: Box<dyn Read + Send>,
    terminal: &Mutex<Terminal>,
    writer: &Mutex<Box<dyn Write + Send>>,
    render_tx: &SyncSender<()>,
) {
    let mut buf = [0u8; 8192];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => {
                tracing::debug!("pty reader reached eof");
                break;
            }
            Ok(n) => n,
            Err(err) => {
                tracing::warn!(%err, "pty read failed");
                break;
            }
        };

        let (dirty, replies) = {
            let mut terminal = lock_unpoisoned_ref(terminal);
            let dirty = terminal.write_bytes(&buf[..n]);
            let replies = if terminal.has_replies() {
                terminal.take_replies()
            } else {
                Vec::new()
            };
            (dirty, replies)
        };

        if !replies.is_empty() {
            let mut writer = lock_unpoisoned_ref(writer);
            if let Err(err) = writer.write_all(&replies).and_then(|()| writer.flush()) {
                tracing::warn!(%err, "reply write failed");
            }
        }

        if dirty {
            match render_tx.try_send(()) {
                Ok(()) | Err(TrySendError::Full(())) => {}
                Err(TrySendError::Disconnected(())) => break,
            }
        }
    }
    let _ = render_tx.try_send(());
}

fn lock_unpoisoned<T>(mutex: &Arc<Mutex<T>>) -> MutexGuard<'_, T> {
    lock_unpoisoned_ref(mutex)
}

fn lock_unpoisoned_ref<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};
    use tideterm_core::WindowState;

    /// Delegates to the null window but flags minimise calls, so tests can
    /// observe `CSI t` traffic arriving from the child.
    struct RecordingWindow {
        inner: NullWindowManipulator,
        minimised: Arc<AtomicBool>,
    }

    impl WindowManipulator for RecordingWindow {
        fn state(&self) -> WindowState {
            self.inner.state()
        }
        fn minimise(&mut self) {
            self.minimised.store(true, Ordering::SeqCst);
            self.inner.minimise();
        }
        fn maximise(&mut self) {
            self.inner.maximise();
        }
        fn restore(&mut self) {
            self.inner.restore();
        }
        fn set_title(&mut self, title: &str) {
            self.inner.set_title(title);
        }
        fn title(&self) -> String {
            self.inner.title()
        }
        fn save_title_to_stack(&mut self) {
            self.inner.save_title_to_stack();
        }
        fn restore_title_from_stack(&mut self) {
            self.inner.restore_title_from_stack();
        }
        fn position(&self) -> (i32, i32) {
            self.inner.position()
        }
        fn size_in_pixels(&self) -> (u32, u32) {
            self.inner.size_in_pixels()
        }
        fn size_in_chars(&self) -> (u16, u16) {
            self.inner.size_in_chars()
        }
        fn screen_size_in_pixels(&self) -> (u32, u32) {
            self.inner.screen_size_in_pixels()
        }
        fn screen_size_in_chars(&self) -> (u16, u16) {
            self.inner.screen_size_in_chars()
        }
        fn resize_in_pixels(&mut self, width: u32, height: u32) {
            self.inner.resize_in_pixels(width, height);
        }
        fn resize_in_chars(&mut self, cols: u16, rows: u16) {
            self.inner.resize_in_chars(cols, rows);
        }
        fn move_to(&mut self, x: i32, y: i32) {
            self.inner.move_to(x, y);
        }
        fn is_fullscreen(&self) -> bool {
            self.inner.is_fullscreen()
        }
        fn set_fullscreen(&mut self, enabled: bool) {
            self.inner.set_fullscreen(enabled);
        }
        fn cell_size_in_pixels(&self) -> (u16, u16) {
            self.inner.cell_size_in_pixels()
        }
        fn report_error(&mut self, message: &str) {
            self.inner.report_error(message);
        }
    }

    fn config() -> SessionConfig {
        SessionConfig {
            shell: Some("/bin/sh".to_string()),
            env: vec![("PS1".to_string(), "$ ".to_string())],
            ..SessionConfig::default()
        }
    }

    fn wait_for<F: Fn(&Terminal) -> bool>(session: &Session, predicate: F) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        let terminal = session.terminal();
        while Instant::now() < deadline {
            if predicate(&lock_unpoisoned(&terminal)) {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        false
    }

    #[test]
    fn echo_round_trip() {
        let session = Session::spawn(config()).expect("spawn");
        session.write(b"echo tide-check\n").expect("write");
        assert!(wait_for(&session, |t| {
            t.active_buffer()
                .visible_text()
                .iter()
                .any(|line| line.contains("tide-check"))
        }));
    }

    #[test]
    fn resize_propagates_to_engine() {
        let session = Session::spawn(config()).expect("spawn");
        session.resize(100, 30).expect("resize");
        let terminal = session.terminal();
        let terminal = lock_unpoisoned(&terminal);
        assert_eq!(terminal.active_buffer().view_width(), 100);
        assert_eq!(terminal.active_buffer().view_height(), 30);
    }

    #[test]
    fn child_exit_is_observed() {
        let mut session = Session::spawn(config()).expect("spawn");
        session.write(b"exit\n").expect("write");
        let deadline = Instant::now() + Duration::from_secs(5);
        while session.is_alive() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(!session.is_alive());
    }

    #[test]
    fn window_ops_from_child_reach_custom_manipulator() {
        let minimised = Arc::new(AtomicBool::new(false));
        let window = Box::new(RecordingWindow {
            inner: NullWindowManipulator::new(),
            minimised: Arc::clone(&minimised),
        });
        let session = Session::spawn_with_window(config(), window).expect("spawn");
        session.write(b"printf '\\033[2t'\n").expect("write");
        let deadline = Instant::now() + Duration::from_secs(5);
        while !minimised.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(minimised.load(Ordering::SeqCst));
    }

    #[test]
    fn initial_command_runs_at_startup() {
        let session = Session::spawn(SessionConfig {
            initial_command: Some("echo booted".to_string()),
            ..config()
        })
        .expect("spawn");
        assert!(wait_for(&session, |t| {
            t.active_buffer()
                .visible_text()
                .iter()
                .any(|line| line.contains("booted"))
        }));
    }

    #[test]
    fn render_events_fire_on_output() {
        let mut session = Session::spawn(config()).expect("spawn");
        let events = session.take_render_events().expect("first take");
        assert!(session.take_render_events().is_none());
        session.write(b"echo ping\n").expect("write");
        assert!(events.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
