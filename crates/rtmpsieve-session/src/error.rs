/// Errors that abort one capture's conversion.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Chunk-level error from the demultiplexer.
    #[error("chunk error: {0}")]
    Chunk(#[from] rtmpsieve_chunk::ChunkError),

    /// I/O error while reading the handshake prelude.
    #[error("handshake I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A control message payload was too short for its fields.
    #[error("control payload too short for type {type_id} ({actual} bytes, need {expected})")]
    ControlPayloadTooShort {
        type_id: u8,
        expected: usize,
        actual: usize,
    },

    /// An aggregate message ended in the middle of a sub-frame.
    #[error("aggregate message truncated ({remaining} trailing bytes)")]
    TruncatedAggregate { remaining: usize },
}

pub type Result<T> = std::result::Result<T, SessionError>;
