//! Display rendering for raw byte buffers

/// Render bytes as a printable string with control bytes in visible
/// escape form.
///
/// Printable ASCII and space pass through; `\r`, `\n`, `\t`, NUL and ESC
/// become two-character escapes; everything else becomes `\xHH`. The
/// rendering is display-only and not required to round-trip.
pub fn render_display(data: &[u8]) -> String {
    let mut output = String::with_capacity(data.len() * 2);

    for &byte in data {
        match byte {
            b'\r' => output.push_str("\\r"),
            b'\n' => output.push_str("\\n"),
            b'\t' => output.push_str("\\t"),
            b'\0' => output.push_str("\\0"),
            0x1b => output.push_str("\\e"),
            b if b.is_ascii_graphic() || b == b' ' => output.push(b as char),
            b => output.push_str(&format!("\\x{b:02x}")),
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_ascii() {
        assert_eq!(render_display(b"Hello"), "Hello");
    }

    #[test]
    fn test_render_control_bytes() {
        assert_eq!(render_display(b"Hi\r\n"), "Hi\\r\\n");
        assert_eq!(render_display(&[0x00, 0x1b]), "\\0\\e");
    }

    #[test]
    fn test_render_high_bytes() {
        assert_eq!(render_display(&[0x80, 0xFF]), "\\x80\\xff");
    }
}
