//! The binary packet structure carried inside every frame.
//!
//! Wire layout, all integers little-endian:
//!
//! 1. protocol version - u8, must be [`Packet::VERSION`]
//! 2. command code - i32
//! 3. packet id - 16 raw bytes (UUID)
//! 4. user id - i32 length, then UTF-8 bytes
//! 5. timestamp - i64 epoch-nanoseconds
//! 6. metadata - i32 count, then repeated (i32 len + UTF-8, i32 len + UTF-8) pairs
//! 7. payload - i32 length (0 if absent), then raw bytes

use std::collections::BTreeMap;

use bytes::{Buf, BufMut, Bytes};
use uuid::Uuid;

use crate::error::{ProtocolError, Result};

/// Maximum size of a single frame body, including the packet id, metadata,
/// and payload. Matches the limit enforced by the frame codec.
pub const MAX_FRAME_BYTES: usize = 25 * 1024 * 1024;

/// A decoded protocol packet.
///
/// Immutable after construction: every field that mutates session or catalog
/// state does so by producing a new `Packet`, never by mutating one in
/// place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Command code identifying the request or response kind.
    pub command: i32,
    /// Opaque id correlating a request with its response.
    pub packet_id: Uuid,
    /// Authenticated user id the sender claims to act as; empty if none.
    pub user_id: String,
    /// Epoch-nanosecond timestamp set by the sender.
    pub timestamp_nanos: i64,
    /// Free-form string metadata (chunk indices, flags, ids travel here).
    pub metadata: BTreeMap<String, String>,
    /// Raw payload bytes (JSON body, or a file chunk).
    pub payload: Bytes,
}

impl Packet {
    /// The only protocol version this implementation speaks.
    pub const VERSION: u8 = 1;

    /// Builds a packet with no metadata and no payload.
    #[must_use]
    pub fn new(command: i32, packet_id: Uuid, user_id: impl Into<String>, timestamp_nanos: i64) -> Self {
        Self {
            command,
            packet_id,
            user_id: user_id.into(),
            timestamp_nanos,
            metadata: BTreeMap::new(),
            payload: Bytes::new(),
        }
    }

    /// Returns `self` with `key` set to `value` in the metadata map.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Returns `self` with `payload` set.
    #[must_use]
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Reads a metadata value and parses it, returning `None` if the key is
    /// absent or does not parse.
    #[must_use]
    pub fn metadata_parsed<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.metadata.get(key).and_then(|v| v.parse().ok())
    }

    /// Encodes this packet's body (everything after the frame length
    /// prefix) into `dst`.
    ///
    /// # Errors
    ///
    /// Never fails in practice for well-formed in-memory packets; returns
    /// [`ProtocolError::Malformed`] only if a declared length cannot fit in
    /// an `i32`, which requires a multi-gigabyte field.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        dst.put_u8(Self::VERSION);
        dst.put_i32_le(self.command);
        dst.put_slice(self.packet_id.as_bytes());

        put_string(dst, &self.user_id)?;
        dst.put_i64_le(self.timestamp_nanos);

        let count = i32::try_from(self.metadata.len())
            .map_err(|_| ProtocolError::Malformed("metadata map too large".to_string()))?;
        dst.put_i32_le(count);
        for (key, value) in &self.metadata {
            put_string(dst, key)?;
            put_string(dst, value)?;
        }

        let payload_len = i32::try_from(self.payload.len())
            .map_err(|_| ProtocolError::Malformed("payload too large".to_string()))?;
        dst.put_i32_le(payload_len);
        dst.put_slice(&self.payload);

        Ok(())
    }

    /// Decodes a packet body from `src`, advancing it past every byte that
    /// was consumed.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnsupportedVersion`] if the version byte is
    /// not [`Self::VERSION`], [`ProtocolError::FrameTruncated`] if `src` runs
    /// out of bytes before the packet is fully read, and
    /// [`ProtocolError::InvalidUtf8`] if a string field is not valid UTF-8.
    pub fn decode(src: &mut impl Buf) -> Result<Self> {
        let version = take_u8(src)?;
        if version != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(version));
        }

        let command = take_i32(src)?;

        if src.remaining() < 16 {
            return Err(ProtocolError::FrameTruncated { expected: 16, actual: src.remaining() });
        }
        let mut id_bytes = [0u8; 16];
        src.copy_to_slice(&mut id_bytes);
        let packet_id = Uuid::from_bytes(id_bytes);

        let user_id = take_string(src, "user_id")?;
        let timestamp_nanos = take_i64(src)?;

        let metadata_count = take_i32(src)?;
        if metadata_count < 0 {
            return Err(ProtocolError::Malformed("negative metadata count".to_string()));
        }
        let mut metadata = BTreeMap::new();
        for _ in 0..metadata_count {
            let key = take_string(src, "metadata_key")?;
            let value = take_string(src, "metadata_value")?;
            metadata.insert(key, value);
        }

        let payload_len = take_i32(src)?;
        if payload_len < 0 {
            return Err(ProtocolError::Malformed("negative payload length".to_string()));
        }
        let payload_len = payload_len as usize;
        if src.remaining() < payload_len {
            return Err(ProtocolError::FrameTruncated {
                expected: payload_len,
                actual: src.remaining(),
            });
        }
        let payload = src.copy_to_bytes(payload_len);

        Ok(Self { command, packet_id, user_id, timestamp_nanos, metadata, payload })
    }
}

fn put_string(dst: &mut impl BufMut, s: &str) -> Result<()> {
    let len = i32::try_from(s.len())
        .map_err(|_| ProtocolError::Malformed("string field too large".to_string()))?;
    dst.put_i32_le(len);
    dst.put_slice(s.as_bytes());
    Ok(())
}

fn take_u8(src: &mut impl Buf) -> Result<u8> {
    if src.remaining() < 1 {
        return Err(ProtocolError::FrameTruncated { expected: 1, actual: 0 });
    }
    Ok(src.get_u8())
}

fn take_i32(src: &mut impl Buf) -> Result<i32> {
    if src.remaining() < 4 {
        return Err(ProtocolError::FrameTruncated { expected: 4, actual: src.remaining() });
    }
    Ok(src.get_i32_le())
}

fn take_i64(src: &mut impl Buf) -> Result<i64> {
    if src.remaining() < 8 {
        return Err(ProtocolError::FrameTruncated { expected: 8, actual: src.remaining() });
    }
    Ok(src.get_i64_le())
}

fn take_string(src: &mut impl Buf, field: &'static str) -> Result<String> {
    let len = take_i32(src)?;
    if len < 0 {
        return Err(ProtocolError::Malformed(format!("negative length for field {field}")));
    }
    let len = len as usize;
    if src.remaining() < len {
        return Err(ProtocolError::FrameTruncated { expected: len, actual: src.remaining() });
    }
    let bytes = src.copy_to_bytes(len);
    String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8 { field })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn arbitrary_packet() -> impl Strategy<Value = Packet> {
        (
            any::<i32>(),
            any::<[u8; 16]>(),
            "[a-zA-Z0-9]{0,16}",
            any::<i64>(),
            proptest::collection::btree_map("[a-zA-Z0-9]{1,8}", "[a-zA-Z0-9]{0,8}", 0..4),
            proptest::collection::vec(any::<u8>(), 0..64),
        )
            .prop_map(|(command, id, user_id, timestamp, metadata, payload)| Packet {
                command,
                packet_id: Uuid::from_bytes(id),
                user_id,
                timestamp_nanos: timestamp,
                metadata,
                payload: Bytes::from(payload),
            })
    }

    proptest! {
        #[test]
        fn round_trip(packet in arbitrary_packet()) {
            let mut wire = Vec::new();
            packet.encode(&mut wire).expect("encodes");

            let mut cursor = &wire[..];
            let decoded = Packet::decode(&mut cursor).expect("decodes");

            prop_assert_eq!(decoded, packet);
            prop_assert!(cursor.is_empty());
        }
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut wire = vec![7u8];
        wire.extend_from_slice(&0i32.to_le_bytes());
        let mut cursor = &wire[..];
        let err = Packet::decode(&mut cursor).unwrap_err();
        assert_eq!(err, ProtocolError::UnsupportedVersion(7));
    }

    #[test]
    fn rejects_truncated_packet() {
        let wire = vec![Packet::VERSION];
        let mut cursor = &wire[..];
        assert!(matches!(Packet::decode(&mut cursor), Err(ProtocolError::FrameTruncated { .. })));
    }

    #[test]
    fn metadata_parsed_reads_typed_values() {
        let packet = Packet::new(200, Uuid::nil(), "", 0).with_metadata("ChunkIndex", "3");
        assert_eq!(packet.metadata_parsed::<u64>("ChunkIndex"), Some(3));
        assert_eq!(packet.metadata_parsed::<u64>("Missing"), None);
    }
}
