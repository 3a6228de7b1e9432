use bytes::BytesMut;

/// Reassembly state for one chunk stream.
///
/// Fields left `None` have not been supplied by any header yet; compact
/// header formats inherit them from the values stored here. When
/// `bytes_remaining` is zero the payload buffer is empty.
#[derive(Debug, Default)]
pub(crate) struct ChunkStream {
    pub message_size: Option<u32>,
    pub type_id: Option<u8>,
    pub stream_id: Option<u32>,
    pub timestamp: Option<u32>,
    pub timestamp_delta: u32,
    pub bytes_remaining: u32,
    pub payload: BytesMut,
}

impl ChunkStream {
    /// True when no message is mid-reassembly on this chunk stream.
    pub fn is_idle(&self) -> bool {
        self.bytes_remaining == 0
    }
}
