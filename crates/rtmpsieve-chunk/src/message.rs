use bytes::Bytes;

/// Message type ids carried in chunk headers.
pub mod type_id {
    /// Protocol control: update the session chunk size.
    pub const SET_CHUNK_SIZE: u8 = 1;
    /// Protocol control: abort an in-flight message.
    pub const ABORT: u8 = 2;
    /// Protocol control: byte-count acknowledgement.
    pub const ACKNOWLEDGEMENT: u8 = 3;
    /// User control events (stream begin/EOF/dry, pings, buffer state).
    pub const USER_CONTROL: u8 = 4;
    /// Window acknowledgement size.
    pub const WINDOW_ACK_SIZE: u8 = 5;
    /// Peer bandwidth limit.
    pub const SET_PEER_BANDWIDTH: u8 = 6;
    /// Audio data.
    pub const AUDIO: u8 = 8;
    /// Video data.
    pub const VIDEO: u8 = 9;
    /// AMF3 data message.
    pub const DATA_AMF3: u8 = 15;
    /// AMF3 shared object message.
    pub const SHARED_OBJECT_AMF3: u8 = 16;
    /// AMF3 command message.
    pub const COMMAND_AMF3: u8 = 17;
    /// AMF0 data message (metadata such as `onMetaData`).
    pub const DATA_AMF0: u8 = 18;
    /// AMF0 shared object message.
    pub const SHARED_OBJECT_AMF0: u8 = 19;
    /// AMF0 command message (connect, play, onStatus, ...).
    pub const COMMAND_AMF0: u8 = 20;
    /// A batch of independently framed sub-messages.
    pub const AGGREGATE: u8 = 22;

    /// True for type ids this tool recognizes.
    pub fn is_known(id: u8) -> bool {
        matches!(id, 1..=6 | 8 | 9 | 15..=20 | 22)
    }
}

/// One complete application-level message reassembled from chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Presentation timestamp in milliseconds (wraps at 2^32).
    pub timestamp: u32,
    /// Protocol message type id.
    pub type_id: u8,
    /// Application-level stream id, independent of the chunk stream id.
    pub stream_id: u32,
    /// Message payload, passed through opaquely.
    pub payload: Bytes,
}

impl Message {
    /// True for audio/video messages that belong in the output container.
    pub fn is_media(&self) -> bool {
        matches!(self.type_id, type_id::AUDIO | type_id::VIDEO)
    }
}
