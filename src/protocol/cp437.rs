//! # Code Page 437 Decoding
//!
//! Converts the single-byte text a host sends under code page 0 (PC437, the
//! ESC/POS power-on default) into Unicode for display.
//!
//! ASCII (0x20–0x7E) passes through unchanged. The upper half maps to the IBM
//! PC glyphs: accented Latin, box drawing, shade blocks, Greek and math.

/// Unicode for CP437 bytes 0x80–0xFF.
///
/// Reference: IBM Code Page 437 character set.
const UPPER: [char; 128] = [
    // 0x80–0x8F: Accented uppercase/lowercase
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å',
    // 0x90–0x9F: More accented, currency, ƒ
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ',
    // 0xA0–0xAF: Spanish, fractions, punctuation
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»',
    // 0xB0–0xBF: Shade blocks, box drawing
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐',
    // 0xC0–0xCF
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧',
    // 0xD0–0xDF: Box drawing, block elements
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀',
    // 0xE0–0xEF: Greek letters and math
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩',
    // 0xF0–0xFF: Math symbols, degree, non-breaking space
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{00A0}',
];

/// Map one CP437 byte to Unicode.
///
/// Control bytes below 0x20 and DEL come back as-is; the renderer decides
/// what to do with them.
#[inline]
pub fn decode(byte: u8) -> char {
    if byte < 0x80 {
        byte as char
    } else {
        UPPER[(byte - 0x80) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_bytes(bytes: &[u8]) -> String {
        bytes.iter().map(|&b| decode(b)).collect()
    }

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(decode_bytes(b"Hello, world!"), "Hello, world!");
    }

    #[test]
    fn test_empty() {
        assert_eq!(decode_bytes(b""), "");
    }

    #[test]
    fn test_accented_latin() {
        assert_eq!(decode(0xA4), 'ñ');
        assert_eq!(decode(0xA5), 'Ñ');
        assert_eq!(decode(0x82), 'é');
        assert_eq!(decode(0x81), 'ü');
        assert_eq!(decode(0x80), 'Ç');
    }

    #[test]
    fn test_spanish_text() {
        assert_eq!(decode_bytes(&[0x41, 0xA4, 0x6F]), "Año");
        assert_eq!(decode_bytes(&[0xA8, 0x51, 0x75, 0x82, 0x3F]), "¿Qué?");
    }

    #[test]
    fn test_box_frame() {
        assert_eq!(decode_bytes(&[0xDA, 0xC4, 0xC4, 0xBF]), "┌──┐");
        assert_eq!(decode_bytes(&[0xC9, 0xCD, 0xBB]), "╔═╗");
    }

    #[test]
    fn test_block_and_math() {
        assert_eq!(decode(0xDB), '█');
        assert_eq!(decode(0xDF), '▀');
        assert_eq!(decode(0xF8), '°');
        assert_eq!(decode(0xE3), 'π');
        assert_eq!(decode(0xFF), '\u{00A0}');
    }
}
