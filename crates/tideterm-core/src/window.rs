//! Host window capability.
//!
//! The engine never touches a real window; `CSI t` handling, title
//! sequences, and sixel cell sizing go through this trait, implemented by
//! the embedding GUI. [`NullWindowManipulator`] satisfies headless hosts
//! and tests.

/// Current window presentation state, as reported by `CSI 11 t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Minimised,
    Normal,
    Maximised,
}

/// Operations the terminal needs from the window that hosts it.
pub trait WindowManipulator: Send {
    fn state(&self) -> WindowState;
    fn minimise(&mut self);
    fn maximise(&mut self);
    fn restore(&mut self);

    fn set_title(&mut self, title: &str);
    fn title(&self) -> String;
    fn save_title_to_stack(&mut self);
    fn restore_title_from_stack(&mut self);

    /// Top-left corner in screen pixels.
    fn position(&self) -> (i32, i32);
    fn size_in_pixels(&self) -> (u32, u32);
    fn size_in_chars(&self) -> (u16, u16);
    fn screen_size_in_pixels(&self) -> (u32, u32);
    fn screen_size_in_chars(&self) -> (u16, u16);
    fn resize_in_pixels(&mut self, width: u32, height: u32);
    fn resize_in_chars(&mut self, cols: u16, rows: u16);
    fn move_to(&mut self, x: i32, y: i32);

    fn is_fullscreen(&self) -> bool;
    fn set_fullscreen(&mut self, enabled: bool);

    /// Pixel size of one character cell, used to round sixel images to
    /// cell extents.
    fn cell_size_in_pixels(&self) -> (u16, u16);

    /// Surface a non-fatal problem to the user.
    fn report_error(&mut self, message: &str);
}

/// A window manipulator that accepts everything and reports fixed sizes.
#[derive(Debug, Clone)]
pub struct NullWindowManipulator {
    title: String,
    title_stack: Vec<String>,
    state: WindowState,
    fullscreen: bool,
}

impl Default for NullWindowManipulator {
    fn default() -> Self {
        Self::new()
    }
}

impl NullWindowManipulator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: String::new(),
            title_stack: Vec::new(),
            state: WindowState::Normal,
            fullscreen: false,
        }
    }
}

impl WindowManipulator for NullWindowManipulator {
    fn state(&self) -> WindowState {
        self.state
    }

    fn minimise(&mut self) {
        self.state = WindowState::Minimised;
    }

    fn maximise(&mut self) {
        self.state = WindowState::Maximised;
    }

    fn restore(&mut self) {
        self.state = WindowState::Normal;
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn save_title_to_stack(&mut self) {
        self.title_stack.push(self.title.clone());
    }

    fn restore_title_from_stack(&mut self) {
        if let Some(title) = self.title_stack.pop() {
            self.title = title;
        }
    }

    fn position(&self) -> (i32, i32) {
        (0, 0)
    }

    fn size_in_pixels(&self) -> (u32, u32) {
        let (cols, rows) = self.size_in_chars();
        let (cw, ch) = self.cell_size_in_pixels();
        (u32::from(cols) * u32::from(cw), u32::from(rows) * u32::from(ch))
    }

    fn size_in_chars(&self) -> (u16, u16) {
        (80, 24)
    }

    fn screen_size_in_pixels(&self) -> (u32, u32) {
        (1920, 1080)
    }

    fn screen_size_in_chars(&self) -> (u16, u16) {
        (240, 67)
    }

    fn resize_in_pixels(&mut self, _width: u32, _height: u32) {}

    fn resize_in_chars(&mut self, _cols: u16, _rows: u16) {}

    fn move_to(&mut self, _x: i32, _y: i32) {}

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_fullscreen(&mut self, enabled: bool) {
        self.fullscreen = enabled;
    }

    fn cell_size_in_pixels(&self) -> (u16, u16) {
        (8, 16)
    }

    fn report_error(&mut self, message: &str) {
        tracing::warn!(message, "window error report");
    }
}
