//! Hex token parsing and rendering

use super::EncodingError;

/// Render bytes as two uppercase hex digits each, space separated.
///
/// `parse_hex(render_hex(b)) == b` holds for every buffer `b`.
pub fn render_hex(data: &[u8]) -> String {
    let mut output = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            output.push(' ');
        }
        output.push_str(&format!("{byte:02X}"));
    }
    output
}

/// Parse a hex token sequence into bytes.
///
/// Tokens are separated by whitespace or commas. A token of one or two hex
/// digits is a single byte; an even run of more than two digits is split
/// into byte pairs; a `0x`-prefixed token is parsed as one value and must
/// fit a byte.
pub fn parse_hex(text: &str) -> Result<Vec<u8>, EncodingError> {
    let mut output = Vec::new();
    for token in text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        parse_token(token, &mut output)?;
    }
    Ok(output)
}

fn parse_token(token: &str, output: &mut Vec<u8>) -> Result<(), EncodingError> {
    if let Some(rest) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        let value = match u32::from_str_radix(rest, 16) {
            Ok(v) => v,
            Err(_) => {
                if let Some(c) = rest.chars().find(|c| !c.is_ascii_hexdigit()) {
                    return Err(EncodingError::InvalidDigit(token.to_string(), c));
                }
                if rest.is_empty() {
                    return Err(EncodingError::InvalidDigit(token.to_string(), 'x'));
                }
                // all hex digits but too wide even for u32
                return Err(EncodingError::ValueOutOfRange(token.to_string()));
            }
        };
        if value > 0xFF {
            return Err(EncodingError::ValueOutOfRange(token.to_string()));
        }
        output.push(value as u8);
        return Ok(());
    }

    if let Some(c) = token.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(EncodingError::InvalidDigit(token.to_string(), c));
    }

    match token.len() {
        1 | 2 => {
            // token is known to be pure hex, radix parse cannot fail
            let value = u8::from_str_radix(token, 16)
                .map_err(|_| EncodingError::OddDigitCount(token.to_string()))?;
            output.push(value);
        }
        n if n % 2 == 0 => {
            for pair in token.as_bytes().chunks(2) {
                let pair = std::str::from_utf8(pair)
                    .map_err(|_| EncodingError::OddDigitCount(token.to_string()))?;
                let value = u8::from_str_radix(pair, 16)
                    .map_err(|_| EncodingError::OddDigitCount(token.to_string()))?;
                output.push(value);
            }
        }
        _ => return Err(EncodingError::OddDigitCount(token.to_string())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_upper_spaced() {
        assert_eq!(render_hex(b"Hello"), "48 65 6C 6C 6F");
        assert_eq!(render_hex(&[]), "");
    }

    #[test]
    fn test_parse_pairs() {
        assert_eq!(parse_hex("41 42").unwrap(), vec![0x41, 0x42]);
        assert_eq!(parse_hex("0D0A").unwrap(), vec![0x0D, 0x0A]);
        assert_eq!(parse_hex("41,42, 43").unwrap(), vec![0x41, 0x42, 0x43]);
    }

    #[test]
    fn test_parse_single_digit() {
        assert_eq!(parse_hex("F").unwrap(), vec![0x0F]);
    }

    #[test]
    fn test_parse_prefixed() {
        assert_eq!(parse_hex("0x41 0x0a").unwrap(), vec![0x41, 0x0A]);
        assert!(matches!(
            parse_hex("0x1FF"),
            Err(EncodingError::ValueOutOfRange(_))
        ));
    }

    #[test]
    fn test_parse_odd_run() {
        assert!(matches!(
            parse_hex("41424"),
            Err(EncodingError::OddDigitCount(_))
        ));
    }

    #[test]
    fn test_parse_invalid_digit() {
        assert!(matches!(
            parse_hex("4G"),
            Err(EncodingError::InvalidDigit(_, 'G'))
        ));
    }

    #[test]
    fn test_round_trip() {
        let buffers: &[&[u8]] = &[b"", b"\x00", b"Hello\r\n", &[0x00, 0x7F, 0x80, 0xFF]];
        for b in buffers {
            assert_eq!(parse_hex(&render_hex(b)).unwrap(), b.to_vec());
        }
    }
}
