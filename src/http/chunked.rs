//! Chunked transfer coding (RFC 9112 §7.1).
//!
//! Encoding emits the whole payload as a single chunk followed by the
//! zero-size terminator. Decoding accepts any chunk sequence, ignores
//! chunk extensions, and stops at the terminator; trailers are read and
//! discarded.

use crate::base::NetError;
use crate::socket::Connection;

/// Encodes a payload as one chunk plus the terminator.
pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 16);
    if !data.is_empty() {
        out.extend_from_slice(format!("{:x}\r\n", data.len()).as_bytes());
        out.extend_from_slice(data);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

/// Decodes a complete chunk-coded buffer into the payload.
pub fn decode(data: &[u8]) -> Result<Vec<u8>, NetError> {
    let mut out = Vec::new();
    let mut rest = data;
    loop {
        let line_end = find_crlf(rest).ok_or(NetError::BadChunk)?;
        let size = parse_size(&rest[..line_end])?;
        rest = &rest[line_end + 2..];
        if size == 0 {
            return Ok(out);
        }
        if rest.len() < size + 2 || &rest[size..size + 2] != b"\r\n" {
            return Err(NetError::BadChunk);
        }
        out.extend_from_slice(&rest[..size]);
        rest = &rest[size + 2..];
    }
}

/// Reads a chunk-coded body off a connection.
pub fn decode_from(conn: &mut Connection) -> Result<Vec<u8>, NetError> {
    let mut out = Vec::new();
    loop {
        let line = conn.read_line()?.ok_or(NetError::BadChunk)?;
        let size = parse_size(line.as_bytes())?;
        if size == 0 {
            // Trailers, if any, up to the final blank line.
            loop {
                match conn.read_line()? {
                    Some(line) if line.is_empty() => return Ok(out),
                    Some(_) => continue,
                    None => return Err(NetError::BadChunk),
                }
            }
        }
        out.extend_from_slice(&conn.read_exact_buffered(size)?);
        match conn.read_line()? {
            Some(line) if line.is_empty() => {}
            _ => return Err(NetError::BadChunk),
        }
    }
}

/// Parses a chunk-size line, ignoring any `;ext=val` extensions.
fn parse_size(line: &[u8]) -> Result<usize, NetError> {
    let text = std::str::from_utf8(line).map_err(|_| NetError::BadChunk)?;
    let digits = text.split(';').next().unwrap_or("").trim();
    if digits.is_empty() {
        return Err(NetError::BadChunk);
    }
    usize::from_str_radix(digits, 16).map_err(|_| NetError::BadChunk)
}

fn find_crlf(data: &[u8]) -> Option<usize> {
    data.windows(2).position(|w| w == b"\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_single_chunk() {
        assert_eq!(encode(b"hello"), b"5\r\nhello\r\n0\r\n\r\n");
    }

    #[test]
    fn test_encode_empty_is_terminator_only() {
        assert_eq!(encode(b""), b"0\r\n\r\n");
    }

    #[test]
    fn test_decode_multi_chunk() {
        let wire = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        assert_eq!(decode(wire).unwrap(), b"Wikipedia");
    }

    #[test]
    fn test_decode_ignores_extensions() {
        let wire = b"5;name=val\r\nhello\r\n0\r\n\r\n";
        assert_eq!(decode(wire).unwrap(), b"hello");
    }

    #[test]
    fn test_decode_rejects_bad_size() {
        assert!(matches!(
            decode(b"zz\r\nhello\r\n0\r\n\r\n"),
            Err(NetError::BadChunk)
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_chunk() {
        assert!(matches!(decode(b"5\r\nhel"), Err(NetError::BadChunk)));
    }

    #[test]
    fn test_encode_decode_agree() {
        let payload = b"some payload with \0 NUL and \r\n line breaks".to_vec();
        assert_eq!(decode(&encode(&payload)).unwrap(), payload);
    }
}
