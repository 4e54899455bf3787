//! Header I/O over any `Read`/`Write` stream.

use std::io::{self, Read, Write};

use crate::header::{EntanglementInfoHeader, Header};

/// Size of the largest header; bounds the stack buffer used by [`decode`].
pub const MAX_HEADER_LEN: usize = EntanglementInfoHeader::LEN;

/// Encodes `header` and writes it to `w`.
pub fn encode<W: Write, H: Header>(w: &mut W, header: &H) -> io::Result<()> {
    w.write_all(&header.to_bytes())
}

/// Reads exactly [`Header::LEN`] bytes from `r` and decodes them.
pub fn decode<H: Header>(r: &mut impl Read) -> io::Result<H> {
    let mut buf = [0u8; MAX_HEADER_LEN];
    let buf = &mut buf[..H::LEN];
    r.read_exact(buf)?;
    H::parse(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MessageType, ProtocolHeader, QubitRefHeader};

    #[test]
    fn roundtrip_over_stream() {
        let mut buf = Vec::new();
        encode(&mut buf, &ProtocolHeader::new(MessageType::NewOk, 7, 2)).unwrap();
        encode(&mut buf, &QubitRefHeader { qubit_id: 42 }).unwrap();

        let mut cursor = io::Cursor::new(&buf);
        let hdr: ProtocolHeader = decode(&mut cursor).unwrap();
        assert_eq!(hdr.msg_type, MessageType::NewOk);
        assert_eq!(hdr.length, 2);
        let note: QubitRefHeader = decode(&mut cursor).unwrap();
        assert_eq!(note.qubit_id, 42);
    }

    #[test]
    fn short_stream_is_eof() {
        let mut cursor = io::Cursor::new(&[2u8, 4, 0][..]);
        let err = decode::<ProtocolHeader>(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
