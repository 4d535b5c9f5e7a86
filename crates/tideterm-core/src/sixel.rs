//! DEC sixel bitmap decoding.
//!
//! The escape engine buffers everything between `ESC P` and `ESC \` and
//! hands it here. [`decode`] parses the header (aspect ratio, transparency
//! selector), then the body: `!` repeat introducer, `"` raster attributes,
//! `#` colour define/select, `$` graphics carriage return, `-` graphics
//! newline, and data bytes `0x3F..=0x7E` each painting a six-pixel vertical
//! column. The result is a concrete RGBA raster; untouched pixels take the
//! supplied background colour.

use std::fmt;

use crate::theme::Colour;

/// Hard cap on either image dimension. Anything larger is a decode error
/// rather than an allocation.
pub const MAX_DIMENSION: u32 = 4096;

/// Decoded sixel raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SixelImage {
    width: u32,
    height: u32,
    pixels: Vec<Colour>,
}

impl SixelImage {
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at `(x, y)`; out of range returns `None`.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Colour> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }
}

/// Reasons a sixel stream fails to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SixelError {
    /// No `q` ending the header parameters.
    UnterminatedHeader,
    /// A numeric parameter overflowed or was missing where required.
    BadNumber,
    /// A body byte outside every recognized class.
    UnexpectedByte(u8),
    /// `"` raster attributes without exactly four parameters.
    BadRasterAttributes(usize),
    /// `#` with a parameter count that is neither 1 (select) nor 5 (define).
    BadColourArguments(usize),
    /// Colour space selector other than 1 (HLS) or 2 (RGB percent).
    BadColourSpace(u32),
    /// Declared or touched size beyond [`MAX_DIMENSION`].
    TooLarge { width: u32, height: u32 },
}

impl fmt::Display for SixelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedHeader => write!(f, "sixel header missing 'q' terminator"),
            Self::BadNumber => write!(f, "bad numeric parameter in sixel stream"),
            Self::UnexpectedByte(b) => write!(f, "unexpected byte {b:#04x} in sixel body"),
            Self::BadRasterAttributes(n) => {
                write!(f, "raster attributes expect 4 parameters, got {n}")
            }
            Self::BadColourArguments(n) => {
                write!(f, "colour introducer expects 1 or 5 parameters, got {n}")
            }
            Self::BadColourSpace(cs) => write!(f, "unknown colour space selector {cs}"),
            Self::TooLarge { width, height } => {
                write!(f, "sixel image {width}x{height} exceeds {MAX_DIMENSION}")
            }
        }
    }
}

impl std::error::Error for SixelError {}

/// VT340 default palette for the first 16 colour registers.
const DEFAULT_PALETTE: [Colour; 16] = [
    Colour::rgb(0, 0, 0),
    Colour::rgb(51, 51, 204),
    Colour::rgb(204, 36, 36),
    Colour::rgb(51, 204, 51),
    Colour::rgb(204, 51, 204),
    Colour::rgb(51, 204, 204),
    Colour::rgb(204, 204, 51),
    Colour::rgb(135, 135, 135),
    Colour::rgb(66, 66, 66),
    Colour::rgb(84, 84, 153),
    Colour::rgb(153, 66, 66),
    Colour::rgb(84, 153, 84),
    Colour::rgb(153, 84, 153),
    Colour::rgb(84, 153, 153),
    Colour::rgb(153, 153, 84),
    Colour::rgb(204, 204, 204),
];

struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Option<Colour>>,
}

impl Canvas {
    fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    fn grow_to(&mut self, width: u32, height: u32) -> Result<(), SixelError> {
        if width <= self.width && height <= self.height {
            return Ok(());
        }
        let width = width.max(self.width);
        let height = height.max(self.height);
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(SixelError::TooLarge { width, height });
        }
        let mut pixels = vec![None; (width * height) as usize];
        for y in 0..self.height {
            for x in 0..self.width {
                pixels[(y * width + x) as usize] = self.pixels[(y * self.width + x) as usize];
            }
        }
        self.width = width;
        self.height = height;
        self.pixels = pixels;
        Ok(())
    }

    fn set(&mut self, x: u32, y: u32, colour: Colour) -> Result<(), SixelError> {
        self.grow_to(x + 1, y + 1)?;
        self.pixels[(y * self.width + x) as usize] = Some(colour);
        Ok(())
    }

    fn into_image(self, background: Colour) -> SixelImage {
        SixelImage {
            width: self.width,
            height: self.height,
            pixels: self
                .pixels
                .into_iter()
                .map(|p| p.unwrap_or(background))
                .collect(),
        }
    }
}

struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    canvas: Canvas,
    palette: [Colour; 256],
    colour: Colour,
    x: u32,
    y: u32,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        let mut palette = [Colour::rgb(0, 0, 0); 256];
        palette[..16].copy_from_slice(&DEFAULT_PALETTE);
        Self {
            data,
            pos: 0,
            canvas: Canvas::new(),
            colour: palette[0],
            palette,
            x: 0,
            y: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    /// Parse a decimal run. `required` makes an empty run an error.
    fn number(&mut self, required: bool) -> Result<u32, SixelError> {
        let start = self.pos;
        let mut value: u32 = 0;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u32::from(b - b'0')))
                .ok_or(SixelError::BadNumber)?;
            self.pos += 1;
        }
        if required && self.pos == start {
            return Err(SixelError::BadNumber);
        }
        Ok(value)
    }

    /// `;`-separated numeric parameters, empty slots reading as 0.
    fn params(&mut self) -> Result<Vec<u32>, SixelError> {
        let mut out = vec![self.number(false)?];
        while self.peek() == Some(b';') {
            self.pos += 1;
            out.push(self.number(false)?);
        }
        Ok(out)
    }

    /// Consume the header up to and including the `q` body introducer.
    ///
    /// The aspect-ratio and transparency parameters are accepted and
    /// discarded: the image is produced at 1:1 and transparency is handled
    /// by the caller-supplied background fill.
    fn header(&mut self) -> Result<(), SixelError> {
        loop {
            match self.bump() {
                Some(b'q') => return Ok(()),
                Some(b'0'..=b'9' | b';') => {}
                Some(b) if b < 0x20 => {}
                Some(b) => return Err(SixelError::UnexpectedByte(b)),
                None => return Err(SixelError::UnterminatedHeader),
            }
        }
    }

    fn raster_attributes(&mut self) -> Result<(), SixelError> {
        let params = self.params()?;
        if params.len() != 4 {
            return Err(SixelError::BadRasterAttributes(params.len()));
        }
        // Pan;Pad aspect ratio ignored, Ph;Pv pre-size the canvas.
        let (width, height) = (params[2], params[3]);
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(SixelError::TooLarge { width, height });
        }
        self.canvas.grow_to(width, height)
    }

    fn colour_introducer(&mut self) -> Result<(), SixelError> {
        let params = self.params()?;
        match params.len() {
            1 => {
                self.colour = self.palette[(params[0] % 256) as usize];
                Ok(())
            }
            5 => {
                let register = (params[0] % 256) as usize;
                let colour = match params[1] {
                    1 => hls_to_rgb(params[2], params[3], params[4]),
                    2 => {
                        let scale = |v: u32| ((v.min(100) * 255 + 50) / 100) as u8;
                        Colour::rgb(scale(params[2]), scale(params[3]), scale(params[4]))
                    }
                    other => return Err(SixelError::BadColourSpace(other)),
                };
                self.palette[register] = colour;
                self.colour = colour;
                Ok(())
            }
            n => Err(SixelError::BadColourArguments(n)),
        }
    }

    fn data_byte(&mut self, byte: u8, repeat: u32) -> Result<(), SixelError> {
        let bits = byte - 0x3F;
        for _ in 0..repeat {
            for bit in 0..6 {
                if bits & (1 << bit) != 0 {
                    self.canvas.set(self.x, self.y + bit, self.colour)?;
                }
            }
            self.x += 1;
            if self.x > MAX_DIMENSION {
                return Err(SixelError::TooLarge {
                    width: self.x,
                    height: self.y + 6,
                });
            }
        }
        Ok(())
    }

    fn body(&mut self) -> Result<(), SixelError> {
        while let Some(byte) = self.bump() {
            match byte {
                b'!' => {
                    let repeat = self.number(true)?;
                    match self.bump() {
                        Some(b @ 0x3F..=0x7E) => self.data_byte(b, repeat)?,
                        Some(b) => return Err(SixelError::UnexpectedByte(b)),
                        None => return Err(SixelError::BadNumber),
                    }
                }
                b'"' => self.raster_attributes()?,
                b'#' => self.colour_introducer()?,
                b'$' => self.x = 0,
                b'-' => {
                    self.x = 0;
                    self.y += 6;
                }
                0x3F..=0x7E => self.data_byte(byte, 1)?,
                b if b < 0x20 => {}
                b => return Err(SixelError::UnexpectedByte(b)),
            }
        }
        Ok(())
    }
}

/// Decode a sixel payload (the bytes between `ESC P` and `ESC \`).
///
/// `background` fills every pixel the stream never painted.
pub fn decode(data: &[u8], background: Colour) -> Result<SixelImage, SixelError> {
    let mut decoder = Decoder::new(data);
    decoder.header()?;
    decoder.body()?;
    Ok(decoder.canvas.into_image(background))
}

/// DEC HLS to RGB. Hue is offset so 0 is blue, per the VT340 colour wheel.
fn hls_to_rgb(hue: u32, lightness: u32, saturation: u32) -> Colour {
    let h = f64::from((hue + 240) % 360) / 360.0;
    let l = f64::from(lightness.min(100)) / 100.0;
    let s = f64::from(saturation.min(100)) / 100.0;
    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return Colour::rgb(v, v, v);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |mut t: f64| -> u8 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round() as u8
    };
    Colour::rgb(
        channel(h + 1.0 / 3.0),
        channel(h),
        channel(h - 1.0 / 3.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Colour = Colour::rgb(9, 9, 9);

    #[test]
    fn red_full_column() {
        // Define register 0 as RGB-percent red, then paint one full column.
        let image = decode(b"q#0;2;100;0;0#0~", BG).unwrap();
        assert_eq!(image.width(), 1);
        assert_eq!(image.height(), 6);
        for y in 0..6 {
            assert_eq!(image.pixel(0, y), Some(Colour::rgb(255, 0, 0)));
        }
    }

    #[test]
    fn partial_column_leaves_background() {
        // '@' = 0x40 = bit 0 only: top pixel set, rest untouched.
        let image = decode(b"q#0;2;100;0;0#0@", BG).unwrap();
        assert_eq!(image.width(), 1);
        assert_eq!(image.height(), 1);
        assert_eq!(image.pixel(0, 0), Some(Colour::rgb(255, 0, 0)));

        // With a raster declaring 1x6, the untouched rows are background.
        let image = decode(b"q\"1;1;1;6#0;2;100;0;0#0@", BG).unwrap();
        assert_eq!(image.height(), 6);
        assert_eq!(image.pixel(0, 5), Some(BG));
    }

    #[test]
    fn repeat_introducer_paints_run() {
        let image = decode(b"q#1!5~", BG).unwrap();
        assert_eq!(image.width(), 5);
        assert_eq!(image.height(), 6);
        assert_eq!(image.pixel(4, 5), Some(DEFAULT_PALETTE[1]));
    }

    #[test]
    fn newline_advances_six_rows() {
        let image = decode(b"q#1~-~", BG).unwrap();
        assert_eq!(image.width(), 1);
        assert_eq!(image.height(), 12);
        assert_eq!(image.pixel(0, 6), Some(DEFAULT_PALETTE[1]));
    }

    #[test]
    fn carriage_return_rewinds_column() {
        let image = decode(b"q#1~~$#2~", BG).unwrap();
        // Second pass overpaints column 0 with register 2.
        assert_eq!(image.pixel(0, 0), Some(DEFAULT_PALETTE[2]));
        assert_eq!(image.pixel(1, 0), Some(DEFAULT_PALETTE[1]));
        assert_eq!(image.width(), 2);
    }

    #[test]
    fn header_params_are_accepted() {
        let image = decode(b"0;0;0q#1~", BG).unwrap();
        assert_eq!(image.width(), 1);
    }

    #[test]
    fn missing_body_introducer_is_error() {
        assert_eq!(decode(b"0;0;0", BG), Err(SixelError::UnterminatedHeader));
    }

    #[test]
    fn bad_colour_space_is_error() {
        assert_eq!(
            decode(b"q#0;7;1;2;3~", BG),
            Err(SixelError::BadColourSpace(7))
        );
    }

    #[test]
    fn bad_colour_argument_count_is_error() {
        assert_eq!(
            decode(b"q#0;2;100~", BG),
            Err(SixelError::BadColourArguments(3))
        );
    }

    #[test]
    fn bad_raster_argument_count_is_error() {
        assert_eq!(
            decode(b"q\"1;1;4~", BG),
            Err(SixelError::BadRasterAttributes(3))
        );
    }

    #[test]
    fn repeat_without_count_is_error() {
        assert_eq!(decode(b"q!~", BG), Err(SixelError::BadNumber));
    }

    #[test]
    fn out_of_range_body_byte_is_error() {
        assert_eq!(decode(b"q\x25", BG), Err(SixelError::UnexpectedByte(0x25)));
    }

    #[test]
    fn oversized_raster_is_error() {
        assert!(matches!(
            decode(b"q\"1;1;9999;6~", BG),
            Err(SixelError::TooLarge { .. })
        ));
    }

    #[test]
    fn hls_grey_axis() {
        assert_eq!(hls_to_rgb(0, 100, 0), Colour::rgb(255, 255, 255));
        assert_eq!(hls_to_rgb(0, 0, 0), Colour::rgb(0, 0, 0));
    }

    #[test]
    fn rgb_percent_scaling_rounds() {
        let image = decode(b"q#0;2;50;0;100#0@", BG).unwrap();
        assert_eq!(image.pixel(0, 0), Some(Colour::rgb(128, 0, 255)));
    }
}
