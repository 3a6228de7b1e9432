use bytes::{BufMut, BytesMut};

use crate::error::{FlvError, Result};

/// Fixed container preamble: magic, version 1, audio+video flags, body
/// offset 9, and the zero previous-tag-size preceding the first tag.
pub const FILE_HEADER: [u8; 13] = [
    b'F', b'L', b'V', 0x01, 0x05, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x00,
];

/// Bytes of tag framing before the payload.
pub const TAG_HEADER_SIZE: usize = 11;

/// Largest payload a 24-bit tag size field can describe.
pub const MAX_TAG_PAYLOAD: usize = 0xFF_FFFF;

/// Encode one tag into the wire format.
///
/// ```text
/// ┌────────┬─────────┬───────────────┬──────────┬────────────┬─────────┬──────────────┐
/// │ Type   │ Size    │ Timestamp     │ TsExt    │ Stream id  │ Payload │ PrevTagSize  │
/// │ (1B)   │ (3B BE) │ (3B BE,      │ (1B,     │ (3B,       │ (Size   │ (4B BE,      │
/// │        │         │  low 24 bits) │ bits     │  always 0) │  bytes) │  Size + 11)  │
/// │        │         │               │  24–31)  │            │         │              │
/// └────────┴─────────┴───────────────┴──────────┴────────────┴─────────┴──────────────┘
/// ```
pub fn encode_tag(type_id: u8, timestamp: u32, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_TAG_PAYLOAD {
        return Err(FlvError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_TAG_PAYLOAD,
        });
    }

    dst.reserve(TAG_HEADER_SIZE + payload.len() + 4);
    dst.put_u8(type_id);
    dst.put_uint(payload.len() as u64, 3);
    dst.put_uint(u64::from(timestamp & 0x00FF_FFFF), 3);
    dst.put_u8((timestamp >> 24) as u8);
    dst.put_uint(0, 3);
    dst.put_slice(payload);
    dst.put_u32((payload.len() + TAG_HEADER_SIZE) as u32);
    Ok(())
}
