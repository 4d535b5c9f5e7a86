//! Colour roles and palette resolution.
//!
//! A [`Theme`] maps the 16 ANSI colours plus the UI roles (background,
//! foreground, selection, cursor) to concrete RGBA values, and resolves the
//! three colour models an escape stream can ask for: 4-bit SGR codes, the
//! 8-bit 256-colour palette (16 named + 6×6×6 cube + grayscale ramp), and
//! 24-bit literals.

use std::fmt;

/// An RGBA colour value.
///
/// Everything the engine hands to a renderer is resolved to this concrete
/// form; opacity is baked into the alpha channel at theme-build time rather
/// than at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Colour {
    /// Create an opaque colour.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a colour with an explicit alpha channel.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Return this colour with a different alpha channel.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// Logical colour roles a theme must resolve.
///
/// The first 16 variants match the ANSI palette order (SGR 30-37 then 90-97).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColourRole {
    Black = 0,
    Red = 1,
    Green = 2,
    Yellow = 3,
    Blue = 4,
    Magenta = 5,
    Cyan = 6,
    White = 7,
    BrightBlack = 8,
    BrightRed = 9,
    BrightGreen = 10,
    BrightYellow = 11,
    BrightBlue = 12,
    BrightMagenta = 13,
    BrightCyan = 14,
    BrightWhite = 15,
    Background = 16,
    Foreground = 17,
    SelectionBackground = 18,
    SelectionForeground = 19,
    CursorBackground = 20,
    CursorForeground = 21,
}

/// Number of roles a theme resolves.
pub const ROLE_COUNT: usize = 22;

impl ColourRole {
    /// Map an ANSI palette index (0-15) to its role.
    #[must_use]
    pub const fn from_ansi_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Black),
            1 => Some(Self::Red),
            2 => Some(Self::Green),
            3 => Some(Self::Yellow),
            4 => Some(Self::Blue),
            5 => Some(Self::Magenta),
            6 => Some(Self::Cyan),
            7 => Some(Self::White),
            8 => Some(Self::BrightBlack),
            9 => Some(Self::BrightRed),
            10 => Some(Self::BrightGreen),
            11 => Some(Self::BrightYellow),
            12 => Some(Self::BrightBlue),
            13 => Some(Self::BrightMagenta),
            14 => Some(Self::BrightCyan),
            15 => Some(Self::BrightWhite),
            _ => None,
        }
    }
}

/// Errors raised while building a theme from configuration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeError {
    /// A hex colour string was not exactly `#RRGGBB`.
    InvalidHex(String),
}

impl fmt::Display for ThemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHex(s) => write!(f, "invalid hex colour {s:?}: expected #RRGGBB"),
        }
    }
}

impl std::error::Error for ThemeError {}

/// Parse a strict `#RRGGBB` hex colour (7 characters, leading `#`).
pub fn parse_hex(s: &str) -> Result<Colour, ThemeError> {
    let bytes = s.as_bytes();
    if bytes.len() != 7 || bytes[0] != b'#' {
        return Err(ThemeError::InvalidHex(s.to_string()));
    }
    let channel = |i: usize| -> Result<u8, ThemeError> {
        u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
    };
    Ok(Colour::rgb(channel(1)?, channel(3)?, channel(5)?))
}

/// Built-in defaults for every role, indexed by `ColourRole as usize`.
const DEFAULT_COLOURS: [Colour; ROLE_COUNT] = [
    Colour::rgb(0x1d, 0x1f, 0x21), // black
    Colour::rgb(0xcc, 0x66, 0x66), // red
    Colour::rgb(0xb5, 0xbd, 0x68), // green
    Colour::rgb(0xf0, 0xc6, 0x74), // yellow
    Colour::rgb(0x81, 0xa2, 0xbe), // blue
    Colour::rgb(0xb2, 0x94, 0xbb), // magenta
    Colour::rgb(0x8a, 0xbe, 0xb7), // cyan
    Colour::rgb(0xc5, 0xc8, 0xc6), // white
    Colour::rgb(0x66, 0x66, 0x66), // bright black
    Colour::rgb(0xd5, 0x4e, 0x53), // bright red
    Colour::rgb(0xb9, 0xca, 0x4a), // bright green
    Colour::rgb(0xe7, 0xc5, 0x47), // bright yellow
    Colour::rgb(0x7a, 0xa6, 0xda), // bright blue
    Colour::rgb(0xc3, 0x97, 0xd8), // bright magenta
    Colour::rgb(0x70, 0xc0, 0xb1), // bright cyan
    Colour::rgb(0xea, 0xea, 0xea), // bright white
    Colour::rgb(0x1d, 0x1f, 0x21), // background
    Colour::rgb(0xc5, 0xc8, 0xc6), // foreground
    Colour::rgb(0x33, 0x66, 0x99), // selection background
    Colour::rgb(0xff, 0xff, 0xff), // selection foreground
    Colour::rgb(0xc5, 0xc8, 0xc6), // cursor background
    Colour::rgb(0x1d, 0x1f, 0x21), // cursor foreground
];

/// Resolved colour palette for the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    colours: [Colour; ROLE_COUNT],
}

impl Default for Theme {
    fn default() -> Self {
        ThemeBuilder::new().build()
    }
}

impl Theme {
    /// Look up the colour for a role.
    #[must_use]
    pub fn colour(&self, role: ColourRole) -> Colour {
        self.colours[role as usize]
    }

    /// Resolve a 4-bit SGR colour code (30-37, 40-47, 90-97, 100-107).
    ///
    /// Returns `None` for codes outside those ranges.
    #[must_use]
    pub fn colour_from_4bit(&self, code: u8) -> Option<Colour> {
        let index = match code {
            30..=37 => code - 30,
            40..=47 => code - 40,
            90..=97 => code - 90 + 8,
            100..=107 => code - 100 + 8,
            _ => return None,
        };
        ColourRole::from_ansi_index(index).map(|role| self.colour(role))
    }

    /// Resolve an 8-bit palette index.
    ///
    /// 0-15 use the themed ANSI colours, 16-231 the 6×6×6 colour cube
    /// (`55 + 40·coordinate` per channel, 0 when the coordinate is 0), and
    /// 232-255 the grayscale ramp.
    #[must_use]
    pub fn colour_from_8bit(&self, index: u8) -> Colour {
        match index {
            0..=15 => ColourRole::from_ansi_index(index)
                .map(|role| self.colour(role))
                .unwrap_or(DEFAULT_COLOURS[ColourRole::Foreground as usize]),
            16..=231 => {
                let cube = index - 16;
                let channel = |coord: u8| if coord == 0 { 0 } else { 55 + 40 * coord };
                Colour::rgb(channel(cube / 36), channel(cube / 6 % 6), channel(cube % 6))
            }
            _ => {
                let level = 8 + 10 * (index - 232);
                Colour::rgb(level, level, level)
            }
        }
    }

    /// Resolve a 24-bit literal colour.
    #[must_use]
    pub fn colour_from_24bit(&self, r: u8, g: u8, b: u8) -> Colour {
        Colour::rgb(r, g, b)
    }

    /// Default background colour.
    #[must_use]
    pub fn background(&self) -> Colour {
        self.colour(ColourRole::Background)
    }

    /// Default foreground colour.
    #[must_use]
    pub fn foreground(&self) -> Colour {
        self.colour(ColourRole::Foreground)
    }
}

/// Builder accepting per-role overrides on top of the built-in defaults.
#[derive(Debug, Clone)]
pub struct ThemeBuilder {
    overrides: [Option<Colour>; ROLE_COUNT],
    opacity: f32,
}

impl Default for ThemeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeBuilder {
    /// Start from the built-in defaults with full opacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            overrides: [None; ROLE_COUNT],
            opacity: 1.0,
        }
    }

    /// Override a single role.
    #[must_use]
    pub fn with_colour(mut self, role: ColourRole, colour: Colour) -> Self {
        self.overrides[role as usize] = Some(colour);
        self
    }

    /// Override a single role from a `#RRGGBB` string.
    pub fn with_hex(self, role: ColourRole, hex: &str) -> Result<Self, ThemeError> {
        let colour = parse_hex(hex)?;
        Ok(self.with_colour(role, colour))
    }

    /// Window opacity in `[0, 1]`, baked into the background alpha at build.
    #[must_use]
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Resolve every role, falling back to defaults for unset ones.
    #[must_use]
    pub fn build(self) -> Theme {
        let mut colours = DEFAULT_COLOURS;
        for (slot, over) in colours.iter_mut().zip(self.overrides.iter()) {
            if let Some(colour) = over {
                *slot = *colour;
            }
        }
        let alpha = (self.opacity * 255.0).round() as u8;
        let bg = ColourRole::Background as usize;
        colours[bg] = colours[bg].with_alpha(alpha);
        Theme { colours }
    }
}
