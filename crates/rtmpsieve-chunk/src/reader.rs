use std::collections::HashMap;
use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::error::{ChunkError, Result};
use crate::message::{type_id, Message};
use crate::stream::ChunkStream;

/// Chunk size every session starts with, per protocol.
pub const DEFAULT_CHUNK_SIZE: u32 = 128;

/// Timestamp-delta sentinel selecting the extended 32-bit timestamp.
pub const EXTENDED_TIMESTAMP: u32 = 0xFF_FFFF;

/// Header formats carried in the top two bits of the basic header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderFormat {
    /// Format 0: absolute timestamp, size, type id and stream id.
    Full,
    /// Format 1: delta, size and type id; stream id inherited.
    NoStreamId,
    /// Format 2: delta only.
    DeltaOnly,
    /// Format 3: bare continuation, everything inherited.
    Continuation,
}

impl HeaderFormat {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Full,
            1 => Self::NoStreamId,
            2 => Self::DeltaOnly,
            _ => Self::Continuation,
        }
    }
}

/// Outcome of consuming one chunk from the input.
enum Chunk {
    Message(Message),
    Partial,
    EndOfInput,
}

/// Reads complete messages from a raw chunked byte stream.
///
/// Keeps one reassembly state per chunk stream id and handles partial
/// reads internally; callers always get complete messages.
pub struct MessageReader<R> {
    inner: R,
    streams: HashMap<u32, ChunkStream>,
    chunk_size: u32,
}

impl<R: Read> MessageReader<R> {
    /// Create a reader using the protocol's initial chunk size.
    pub fn new(inner: R) -> Self {
        Self::with_chunk_size(inner, DEFAULT_CHUNK_SIZE)
    }

    /// Create a reader with an explicit initial chunk size. Captures
    /// missing their handshake often need a non-default value here.
    pub fn with_chunk_size(inner: R, chunk_size: u32) -> Self {
        Self {
            inner,
            streams: HashMap::new(),
            chunk_size,
        }
    }

    /// Chunk size currently in effect.
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Update the chunk size used for subsequent chunk reads.
    pub fn set_chunk_size(&mut self, chunk_size: u32) {
        self.chunk_size = chunk_size;
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read chunks until the next complete message is assembled.
    ///
    /// Returns `Ok(None)` at end of input. Input ending inside a chunk
    /// payload is reported and treated as end of input; input ending
    /// inside header fields is an I/O error.
    pub fn next_message(&mut self) -> Result<Option<Message>> {
        loop {
            match self.read_chunk()? {
                Chunk::Message(message) => return Ok(Some(message)),
                Chunk::Partial => continue,
                Chunk::EndOfInput => return Ok(None),
            }
        }
    }

    fn read_chunk(&mut self) -> Result<Chunk> {
        let Some(head) = read_u8_or_eof(&mut self.inner)? else {
            return Ok(Chunk::EndOfInput);
        };
        let format = HeaderFormat::from_bits(head >> 6);
        let chunk_stream_id = match head & 0x3F {
            0 => 64 + u32::from(read_u8(&mut self.inner)?),
            1 => 64 + u32::from(read_u16_le(&mut self.inner)?),
            id => u32::from(id),
        };

        let stream = self.streams.entry(chunk_stream_id).or_insert_with(|| {
            tracing::debug!(chunk_stream_id, "new chunk stream");
            ChunkStream::default()
        });

        if format != HeaderFormat::Continuation {
            stream.timestamp_delta = read_u24_be(&mut self.inner)?;
            if !stream.is_idle() {
                tracing::warn!(
                    chunk_stream_id,
                    dropped = stream.payload.len(),
                    "discarding incomplete message"
                );
                stream.bytes_remaining = 0;
                stream.payload.clear();
            }

            if format != HeaderFormat::DeltaOnly {
                stream.message_size = Some(read_u24_be(&mut self.inner)?);
                let ty = read_u8(&mut self.inner)?;
                if !type_id::is_known(ty) {
                    tracing::warn!(chunk_stream_id, type_id = ty, "unknown message type");
                }
                stream.type_id = Some(ty);

                if format == HeaderFormat::Full {
                    stream.stream_id = Some(read_u32_le(&mut self.inner)?);
                    stream.timestamp = Some(0);
                }
            }
        }

        let (Some(size), Some(ty)) = (stream.message_size, stream.type_id) else {
            return Err(ChunkError::UnknownMessageSize { chunk_stream_id });
        };
        let stream_id = match stream.stream_id {
            Some(id) => id,
            None => {
                tracing::warn!(chunk_stream_id, "missing application stream id, assuming 1");
                stream.stream_id = Some(1);
                1
            }
        };
        let mut timestamp = match stream.timestamp {
            Some(ts) => ts,
            None => {
                tracing::warn!(chunk_stream_id, "missing timestamp, assuming 0");
                0
            }
        };

        if stream.is_idle() {
            stream.payload.clear();
            stream.bytes_remaining = size;
            timestamp = timestamp.wrapping_add(stream.timestamp_delta);
        }

        // Real-world producers send the extended timestamp on format-3
        // continuations too whenever the stored delta is the sentinel, so
        // it is honored for every header format.
        if stream.timestamp_delta == EXTENDED_TIMESTAMP {
            timestamp = read_u32_be(&mut self.inner)?;
        }
        stream.timestamp = Some(timestamp);

        let want = self.chunk_size.min(stream.bytes_remaining) as usize;
        let got = read_up_to(&mut self.inner, &mut stream.payload, want)?;
        stream.bytes_remaining -= got as u32;
        if got < want {
            tracing::warn!(
                chunk_stream_id,
                missing = stream.bytes_remaining,
                "input ended inside a chunk, dropping partial message"
            );
            stream.bytes_remaining = 0;
            stream.payload.clear();
            return Ok(Chunk::EndOfInput);
        }

        if stream.bytes_remaining == 0 {
            let payload = stream.payload.split().freeze();
            return Ok(Chunk::Message(Message {
                timestamp,
                type_id: ty,
                stream_id,
                payload,
            }));
        }

        Ok(Chunk::Partial)
    }
}

fn read_u8_or_eof<R: Read>(reader: &mut R) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(ChunkError::Io(err)),
        }
    }
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u16_le<R: Read>(reader: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u24_be<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 3];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes([0, buf[0], buf[1], buf[2]]))
}

fn read_u32_be<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_u32_le<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Append up to `want` bytes to `dst`, stopping early only at EOF.
fn read_up_to<R: Read>(reader: &mut R, dst: &mut BytesMut, want: usize) -> Result<usize> {
    let start = dst.len();
    dst.resize(start + want, 0);
    let mut filled = 0;
    while filled < want {
        match reader.read(&mut dst[start + filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                dst.truncate(start + filled);
                return Err(ChunkError::Io(err));
            }
        }
    }
    dst.truncate(start + filled);
    Ok(filled)
}
