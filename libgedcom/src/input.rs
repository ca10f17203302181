//! Line decoding: bytes to text, text to numbered lines.
//!
//! This is the thin edge of the pipeline. It picks an encoding from the byte
//! order mark (or the shape of the first character), and splits on any of
//! the four line terminators GEDCOM files are found with in the wild.

use std::fmt;

/// A logical line with its 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

/// The decoding `decode_bytes` actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoding {
    Ascii,
    Utf8,
    Utf16Le,
    Utf16Be,
    /// Not valid UTF-8: one byte per character.
    Latin1,
}

impl fmt::Display for Decoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Decoding::Ascii => "ASCII",
            Decoding::Utf8 => "UTF-8",
            Decoding::Utf16Le => "UTF-16LE",
            Decoding::Utf16Be => "UTF-16BE",
            Decoding::Latin1 => "ISO-8859-1",
        })
    }
}

/// Decode raw file bytes into text.
///
/// UTF-16 (either byte order) and UTF-8 are recognized by their byte order
/// marks or by a leading `0` digit paired with a zero byte. Anything that is
/// not valid UTF-8 falls back to a one-byte-per-character reading, which
/// keeps ASCII intact for legacy 8-bit files.
pub fn decode_bytes(bytes: &[u8]) -> (String, Decoding) {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => match std::str::from_utf8(rest) {
            Ok(text) => (text.to_string(), Decoding::Utf8),
            Err(_) => (latin1(rest), Decoding::Latin1),
        },
        [0xFF, 0xFE, rest @ ..] => (decode_utf16(rest, false), Decoding::Utf16Le),
        [0xFE, 0xFF, rest @ ..] => (decode_utf16(rest, true), Decoding::Utf16Be),
        [b'0', 0x00, ..] => (decode_utf16(bytes, false), Decoding::Utf16Le),
        [0x00, b'0', ..] => (decode_utf16(bytes, true), Decoding::Utf16Be),
        _ => match std::str::from_utf8(bytes) {
            Ok(text) if text.is_ascii() => (text.to_string(), Decoding::Ascii),
            Ok(text) => (text.to_string(), Decoding::Utf8),
            Err(_) => (latin1(bytes), Decoding::Latin1),
        },
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn decode_utf16(bytes: &[u8], big_endian: bool) -> String {
    let units = bytes.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Split text into lines, accepting CR, LF, CRLF and LFCR terminators.
///
/// A leading byte order mark is dropped. Line numbers count every physical
/// line, blank ones included.
pub fn split_lines(source: &str) -> Vec<InputLine<'_>> {
    let source = source.strip_prefix('\u{FEFF}').unwrap_or(source);
    let bytes = source.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    let mut number = 1;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\r' || b == b'\n' {
            lines.push(InputLine {
                number,
                text: &source[start..i],
            });
            number += 1;
            let pair = if b == b'\r' { b'\n' } else { b'\r' };
            i += if bytes.get(i + 1) == Some(&pair) { 2 } else { 1 };
            start = i;
        } else {
            i += 1;
        }
    }
    if start < bytes.len() {
        lines.push(InputLine {
            number,
            text: &source[start..],
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<&str> {
        split_lines(source).into_iter().map(|l| l.text).collect()
    }

    #[test]
    fn test_split_all_terminators() {
        assert_eq!(texts("a\r\nb\r\n"), vec!["a", "b"]);
        assert_eq!(texts("a\nb"), vec!["a", "b"]);
        assert_eq!(texts("a\rb\r"), vec!["a", "b"]);
        assert_eq!(texts("a\n\rb\n\r"), vec!["a", "b"]);
    }

    #[test]
    fn test_blank_lines_are_counted() {
        let lines = split_lines("0 HEAD\n\n0 TRLR\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].number, 3);
        assert_eq!(lines[1].text, "");
    }

    #[test]
    fn test_bom_is_dropped() {
        assert_eq!(texts("\u{FEFF}0 HEAD"), vec!["0 HEAD"]);
    }

    #[test]
    fn test_decode_utf16_little_endian() {
        let bytes = [0xFF, 0xFE, b'0', 0, b' ', 0, b'H', 0];
        let (text, cs) = decode_bytes(&bytes);
        assert_eq!(text, "0 H");
        assert_eq!(cs, Decoding::Utf16Le);
    }

    #[test]
    fn test_decode_utf16_big_endian_without_bom() {
        let bytes = [0, b'0', 0, b' ', 0, b'H'];
        let (text, cs) = decode_bytes(&bytes);
        assert_eq!(text, "0 H");
        assert_eq!(cs, Decoding::Utf16Be);
    }

    #[test]
    fn test_decode_falls_back_for_invalid_utf8() {
        let (text, cs) = decode_bytes(&[b'0', b' ', 0xE9]);
        assert_eq!(text, "0 \u{e9}");
        assert_eq!(cs, Decoding::Latin1);
        assert_eq!(cs.to_string(), "ISO-8859-1");
    }

    #[test]
    fn test_decode_labels_plain_text() {
        assert_eq!(decode_bytes(b"0 HEAD").1, Decoding::Ascii);
        assert_eq!(decode_bytes("0 NOTE caf\u{e9}".as_bytes()).1, Decoding::Utf8);
        assert_eq!(decode_bytes(&[0xEF, 0xBB, 0xBF, b'0']).1, Decoding::Utf8);
    }
}
