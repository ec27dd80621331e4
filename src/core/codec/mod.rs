//! Byte codec for user input and traffic display
//!
//! Converts operator-entered text into raw byte buffers and renders raw
//! bytes back as display strings:
//! - bracket-delimited hex tokens in send text (`AB[0D 0A]` sends the two
//!   characters followed by CR LF)
//! - uppercase spaced hex rendering for the log's hex section
//! - visible-escape rendering for the log's text section
//! - markup escaping for embedding in the rich-text scrollback

mod hex;
mod text;

pub use self::hex::{parse_hex, render_hex};
pub use text::render_display;

use bytes::Bytes;

/// Codec errors for malformed user input
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// A hex token contains a non-hex character
    #[error("invalid hex digit '{1}' in token \"{0}\"")]
    InvalidDigit(String, char),

    /// A hex token has an odd number of digits
    #[error("hex token \"{0}\" has an odd number of digits")]
    OddDigitCount(String),

    /// A hex token parses to a value wider than one byte
    #[error("hex token \"{0}\" exceeds a single byte")]
    ValueOutOfRange(String),

    /// A `[` opened a hex token that never closes
    #[error("unterminated hex token starting at offset {0}")]
    UnterminatedToken(usize),
}

/// Convert operator send text into raw bytes.
///
/// Characters outside brackets pass through as their UTF-8 bytes. A
/// `[`..`]` pair delimits a hex token sequence parsed by [`parse_hex`].
pub fn encode_input(text: &str) -> Result<Bytes, EncodingError> {
    let mut output = Vec::with_capacity(text.len());
    let mut rest = text;
    let mut consumed = 0usize;

    while let Some(open) = rest.find('[') {
        output.extend_from_slice(rest[..open].as_bytes());
        let inner = &rest[open + 1..];
        let close = inner
            .find(']')
            .ok_or(EncodingError::UnterminatedToken(consumed + open))?;
        output.extend_from_slice(&parse_hex(&inner[..close])?);
        consumed += open + 1 + close + 1;
        rest = &inner[close + 1..];
    }
    output.extend_from_slice(rest.as_bytes());

    Ok(Bytes::from(output))
}

/// Escape characters the scrollback view would interpret as markup.
///
/// Applied once, to the fully assembled record block.
pub fn escape_markup(text: &str) -> String {
    let mut output = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            _ => output.push(c),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_plain_text() {
        assert_eq!(&encode_input("AT\\").unwrap()[..], b"AT\\");
    }

    #[test]
    fn test_encode_hex_token() {
        assert_eq!(&encode_input("[41 42]").unwrap()[..], &[0x41, 0x42]);
        assert_eq!(&encode_input("AB[0D 0A]CD").unwrap()[..], b"AB\r\nCD");
    }

    #[test]
    fn test_encode_multiple_tokens() {
        assert_eq!(
            &encode_input("[48]i[21 21]").unwrap()[..],
            &[0x48, b'i', 0x21, 0x21]
        );
    }

    #[test]
    fn test_encode_empty_token() {
        assert_eq!(&encode_input("a[]b").unwrap()[..], b"ab");
    }

    #[test]
    fn test_encode_unterminated() {
        assert!(matches!(
            encode_input("AB[0D"),
            Err(EncodingError::UnterminatedToken(2))
        ));
    }

    #[test]
    fn test_encode_bad_token() {
        assert!(encode_input("[zz]").is_err());
        assert!(encode_input("[123]").is_err());
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup("a < b & \"c\" > d"),
            "a &lt; b &amp; &quot;c&quot; &gt; d"
        );
    }
}
