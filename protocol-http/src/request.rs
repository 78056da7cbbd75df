//! Request-head encoding.
//!
//! Each encoder writes into the front of `dst` and returns the number of
//! bytes written, or `None` without touching `dst` when it is too small.
//! They copy bytes as given; check them first with [`is_valid_name`] and
//! [`is_valid_text`].

use crate::parser::is_token;

/// Line terminator, also used alone as the header/body separator.
pub const CRLF: &[u8] = b"\r\n";

/// Separator between a header name and its value.
pub const HEADER_SEPARATOR: &[u8] = b": ";

/// Encode `line` followed by CRLF.
pub fn encode_line(dst: &mut [u8], line: &[u8]) -> Option<usize> {
    write_parts(dst, &[line, CRLF])
}

/// Encode `name: value` followed by CRLF.
pub fn encode_header(dst: &mut [u8], name: &[u8], value: &[u8]) -> Option<usize> {
    write_parts(dst, &[name, HEADER_SEPARATOR, value, CRLF])
}

/// Encode a `Content-Length` header for a body of `len` bytes.
pub fn encode_content_length(dst: &mut [u8], len: usize) -> Option<usize> {
    let mut digits = [0u8; 20];
    let n = format_decimal(&mut digits, len as u64);
    encode_header(dst, b"Content-Length", &digits[digits.len() - n..])
}

/// Length of the encoded form of `name: value\r\n`.
pub fn header_len(name: &[u8], value: &[u8]) -> usize {
    name.len() + HEADER_SEPARATOR.len() + value.len() + CRLF.len()
}

/// A header name is a non-empty run of token characters.
pub fn is_valid_name(name: &[u8]) -> bool {
    !name.is_empty() && name.iter().all(|&b| is_token(b))
}

/// A request line or header value: ASCII with no line breaks.
pub fn is_valid_text(text: &[u8]) -> bool {
    text.iter().all(|&b| b.is_ascii() && b != b'\r' && b != b'\n')
}

fn write_parts(dst: &mut [u8], parts: &[&[u8]]) -> Option<usize> {
    let total: usize = parts.iter().map(|p| p.len()).sum();
    if total > dst.len() {
        return None;
    }
    let mut pos = 0;
    for part in parts {
        dst[pos..pos + part.len()].copy_from_slice(part);
        pos += part.len();
    }
    Some(total)
}

/// Writes `value` right-aligned into `buf`, returning the digit count.
fn format_decimal(buf: &mut [u8; 20], mut value: u64) -> usize {
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    buf.len() - pos
}
