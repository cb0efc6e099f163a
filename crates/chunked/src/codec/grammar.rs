//! Shared pieces of the chunked transfer-coding grammar
//! ([RFC 9112 Section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1)).
//!
//! ```text
//! chunk       = size-hex [";" extension] CRLF chunk-data CRLF
//! last-chunk  = "0" CRLF [trailer-headers] CRLF
//! size-hex    = 1*HEXDIG
//! ```

use bytes::{BufMut, BytesMut};
use std::io;
use std::io::Write;

pub(crate) const CRLF: &[u8] = b"\r\n";

/// The terminal frame without trailers.
pub(crate) const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Upper bound of a size line produced by the encoder: 16 hex digits plus CRLF.
pub(crate) const MAX_ENCODED_SIZE_LINE: usize = 18;

/// Writes `size` as lowercase hex followed by CRLF.
pub(crate) fn put_size_line(dst: &mut BytesMut, size: usize) -> io::Result<()> {
    dst.reserve(MAX_ENCODED_SIZE_LINE);
    write!(FastWrite(dst), "{size:x}\r\n")
}

/// Parses a size line with its CRLF already stripped.
///
/// Chunk extensions after `;` are skipped without being interpreted, and linear
/// whitespace between the digits and the extension (or line end) is tolerated.
/// On failure the returned reason describes what was wrong with the line.
pub(crate) fn parse_size_line(line: &[u8]) -> Result<u64, &'static str> {
    let size_part = match line.iter().position(|&b| b == b';') {
        Some(pos) => &line[..pos],
        None => line,
    };

    let digits_end = size_part.iter().rposition(|&b| b != b' ' && b != b'\t').map_or(0, |pos| pos + 1);
    let digits = &size_part[..digits_end];

    if digits.is_empty() {
        return Err("missing chunk size");
    }

    let mut size: u64 = 0;
    for &b in digits {
        let digit = hex_value(b).ok_or("invalid hex digit in chunk size")?;
        size = size
            .checked_mul(16)
            .and_then(|size| size.checked_add(u64::from(digit)))
            .ok_or("chunk size overflow")?;
    }

    Ok(size)
}

/// Searches `buf[from..]` for the LF that ends a line.
///
/// Returns the index of the LF in `buf`. The caller is responsible for checking
/// the preceding CR, a bare LF is not a valid line end in this grammar.
#[inline]
pub(crate) fn find_lf(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?.iter().position(|&b| b == b'\n').map(|pos| pos + from)
}

#[inline]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Writer over a `BytesMut` that never fails, for `write!` formatting.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
