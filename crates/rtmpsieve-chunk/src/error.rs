/// Errors that can occur while demultiplexing chunk streams.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// A chunk arrived for a message whose size was never declared, so
    /// framing cannot be determined.
    #[error("unknown message size on chunk stream {chunk_stream_id}, cannot proceed")]
    UnknownMessageSize { chunk_stream_id: u32 },

    /// An I/O error occurred while reading the input.
    #[error("chunk I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChunkError>;
