//! Length-prefixed framing around an encoded [`Packet`].
//!
//! Every message on the wire is a 4-byte little-endian unsigned length
//! followed by exactly that many body bytes. This module only deals with the
//! length prefix and delegates body encoding to [`Packet`]; the actual
//! socket reads live in the server crate, which is the only place that
//! touches a live connection.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    error::{ProtocolError, Result},
    packet::{MAX_FRAME_BYTES, Packet},
};

/// Encodes `packet` as a complete frame: 4-byte little-endian length prefix
/// followed by the packet body.
///
/// # Errors
///
/// Returns an error if the packet body itself cannot be encoded (see
/// [`Packet::encode`]) or if the encoded body exceeds [`MAX_FRAME_BYTES`].
pub fn encode_frame(packet: &Packet) -> Result<Bytes> {
    let mut body = BytesMut::new();
    packet.encode(&mut body)?;

    if body.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::InvalidFrameLength {
            length: body.len() as i64,
            max: MAX_FRAME_BYTES,
        });
    }

    let mut wire = BytesMut::with_capacity(4 + body.len());
    #[allow(clippy::cast_possible_truncation)]
    wire.put_u32_le(body.len() as u32);
    wire.put_slice(&body);
    Ok(wire.freeze())
}

/// Validates a length prefix read off the wire, returning the number of body
/// bytes that must follow.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidFrameLength`] if `length` is non-positive
/// or larger than [`MAX_FRAME_BYTES`].
pub fn validate_frame_length(length: i64) -> Result<usize> {
    if length <= 0 || length as u64 > MAX_FRAME_BYTES as u64 {
        return Err(ProtocolError::InvalidFrameLength { length, max: MAX_FRAME_BYTES });
    }
    Ok(length as usize)
}

/// Decodes a packet from a frame body that has already been read off the
/// wire (length prefix already consumed and validated).
///
/// # Errors
///
/// Propagates any [`ProtocolError`] from [`Packet::decode`]; also rejects
/// trailing bytes left over after a packet that claims fewer bytes than
/// `body` actually contains, since the frame length is the sole source of
/// truth for how many bytes belong to one packet.
pub fn decode_frame_body(body: &[u8]) -> Result<Packet> {
    let mut cursor = body;
    let packet = Packet::decode(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(ProtocolError::Malformed(format!(
            "{} trailing bytes after packet",
            cursor.len()
        )));
    }
    Ok(packet)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn round_trip_through_frame() {
        let packet = Packet::new(100, Uuid::new_v4(), "alice", 42).with_payload(b"hi".to_vec());
        let wire = encode_frame(&packet).expect("encodes");

        let length = i32::from_le_bytes(wire[0..4].try_into().unwrap());
        let body_len = validate_frame_length(i64::from(length)).expect("valid length");
        assert_eq!(body_len, wire.len() - 4);

        let decoded = decode_frame_body(&wire[4..]).expect("decodes");
        assert_eq!(decoded, packet);
    }

    #[test]
    fn rejects_zero_length() {
        assert!(validate_frame_length(0).is_err());
    }

    #[test]
    fn rejects_oversize_length() {
        assert!(validate_frame_length((MAX_FRAME_BYTES as i64) + 1).is_err());
    }

    #[test]
    fn rejects_trailing_bytes() {
        let packet = Packet::new(100, Uuid::new_v4(), "", 0);
        let mut body = BytesMut::new();
        packet.encode(&mut body).unwrap();
        body.put_u8(0xFF);
        assert!(decode_frame_body(&body).is_err());
    }
}
