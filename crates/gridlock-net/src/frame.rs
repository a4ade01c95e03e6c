//! Byte-level framing: NUL-terminated text and single-byte messages.

use std::io::{Read, Write};

use crate::error::NetError;

/// Auth verdict bytes.
pub const ACCEPT: u8 = b'A';
pub const REJECT: u8 = b'R';

/// Upper bound on any text message (passwords, setup lines, profile
/// blobs). A peer exceeding it is malformed, not buffered forever.
pub const MAX_TEXT: usize = 4096;

/// Write a NUL-terminated string. Embedded NULs are refused — they would
/// truncate on the peer side.
pub fn write_nul_str<W: Write>(writer: &mut W, text: &str) -> Result<(), NetError> {
    if text.as_bytes().contains(&0) {
        return Err(NetError::Malformed("embedded NUL in outgoing text".into()));
    }
    writer.write_all(text.as_bytes())?;
    writer.write_all(&[0])?;
    writer.flush()?;
    Ok(())
}

/// Read up to the terminating NUL. Length-implicit, bounded by
/// [`MAX_TEXT`].
pub fn read_nul_str<R: Read>(reader: &mut R) -> Result<String, NetError> {
    let mut bytes = Vec::new();
    let mut buf = [0u8; 1];
    loop {
        reader.read_exact(&mut buf)?;
        if buf[0] == 0 {
            break;
        }
        bytes.push(buf[0]);
        if bytes.len() > MAX_TEXT {
            return Err(NetError::Malformed("text message exceeds bound".into()));
        }
    }
    String::from_utf8(bytes).map_err(|_| NetError::Malformed("text is not UTF-8".into()))
}

pub fn write_byte<W: Write>(writer: &mut W, byte: u8) -> Result<(), NetError> {
    writer.write_all(&[byte])?;
    writer.flush()?;
    Ok(())
}

pub fn read_byte<R: Read>(reader: &mut R) -> Result<u8, NetError> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn nul_str_round_trip() {
        let mut buf = Vec::new();
        write_nul_str(&mut buf, "hello relay").unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_nul_str(&mut cursor).unwrap(), "hello relay");
    }

    #[test]
    fn empty_string_round_trip() {
        let mut buf = Vec::new();
        write_nul_str(&mut buf, "").unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_nul_str(&mut cursor).unwrap(), "");
    }

    #[test]
    fn embedded_nul_is_refused() {
        let mut buf = Vec::new();
        assert!(matches!(
            write_nul_str(&mut buf, "a\0b"),
            Err(NetError::Malformed(_))
        ));
    }

    #[test]
    fn missing_terminator_is_short_read() {
        let mut cursor = Cursor::new(b"unterminated".to_vec());
        assert!(matches!(
            read_nul_str(&mut cursor),
            Err(NetError::ShortRead)
        ));
    }

    #[test]
    fn oversized_text_is_malformed() {
        let mut data = vec![b'a'; MAX_TEXT + 10];
        data.push(0);
        let mut cursor = Cursor::new(data);
        assert!(matches!(
            read_nul_str(&mut cursor),
            Err(NetError::Malformed(_))
        ));
    }

    #[test]
    fn byte_round_trip() {
        let mut buf = Vec::new();
        write_byte(&mut buf, b'f').unwrap();
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_byte(&mut cursor).unwrap(), b'f');
    }
}
