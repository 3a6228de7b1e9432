//! RTMP chunk stream demultiplexing.
//!
//! RTMP multiplexes application messages over chunk streams: each message
//! is cut into chunks no larger than the session chunk size, and chunk
//! headers shrink by inheriting fields from the previous header on the
//! same chunk stream. This crate reassembles complete messages from a raw
//! byte stream, one pull at a time.
//!
//! No partial messages, no buffer management in user code.

pub mod error;
pub mod message;
pub mod reader;
mod stream;

pub use error::{ChunkError, Result};
pub use message::{type_id, Message};
pub use reader::{MessageReader, DEFAULT_CHUNK_SIZE, EXTENDED_TIMESTAMP};
