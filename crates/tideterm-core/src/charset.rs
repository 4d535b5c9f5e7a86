//! SCS character-set translation.
//!
//! Only the DEC Special Graphics set (`ESC ( 0`) translates anything; every
//! other designator behaves as plain ASCII. Translation happens at write
//! time while the active G-set selects it (SO/SI toggle between G0 and G1).

/// A designatable character set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Ascii,
    DecSpecialGraphics,
}

impl Charset {
    /// Designator byte following `ESC (` or `ESC )`.
    #[must_use]
    pub fn from_designator(byte: char) -> Option<Self> {
        match byte {
            '0' => Some(Self::DecSpecialGraphics),
            'B' => Some(Self::Ascii),
            _ => None,
        }
    }

    /// Translate a rune through this charset.
    #[must_use]
    pub fn translate(self, rune: char) -> char {
        match self {
            Self::Ascii => rune,
            Self::DecSpecialGraphics => dec_special_graphics(rune),
        }
    }
}

fn dec_special_graphics(rune: char) -> char {
    match rune {
        '`' => '◆',
        'a' => '▒',
        'b' => '␉',
        'c' => '␌',
        'd' => '␍',
        'e' => '␊',
        'f' => '°',
        'g' => '±',
        'h' => '␤',
        'i' => '␋',
        'j' => '┘',
        'k' => '┐',
        'l' => '┌',
        'm' => '└',
        'n' => '┼',
        'o' => '⎺',
        'p' => '⎻',
        'q' => '─',
        'r' => '⎼',
        's' => '⎽',
        't' => '├',
        'u' => '┤',
        'v' => '┴',
        'w' => '┬',
        'x' => '│',
        'y' => '≤',
        'z' => '≥',
        '{' => 'π',
        '|' => '≠',
        '}' => '£',
        '~' => '·',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn designators() {
        assert_eq!(
            Charset::from_designator('0'),
            Some(Charset::DecSpecialGraphics)
        );
        assert_eq!(Charset::from_designator('B'), Some(Charset::Ascii));
        assert_eq!(Charset::from_designator('A'), None);
    }

    #[test]
    fn special_graphics_box_drawing() {
        let cs = Charset::DecSpecialGraphics;
        assert_eq!(cs.translate('q'), '─');
        assert_eq!(cs.translate('x'), '│');
        assert_eq!(cs.translate('l'), '┌');
        // Runes outside the table pass through.
        assert_eq!(cs.translate('Q'), 'Q');
    }

    #[test]
    fn ascii_is_identity() {
        assert_eq!(Charset::Ascii.translate('q'), 'q');
    }
}
