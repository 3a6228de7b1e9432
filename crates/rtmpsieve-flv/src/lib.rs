//! FLV container output.
//!
//! Recovered audio/video messages are re-tagged into FLV: a fixed 13-byte
//! file header followed by framed tags carrying the payload plus timing
//! metadata. One container file per application stream id; files are
//! created lazily when a stream first produces media.

pub mod codec;
pub mod error;
pub mod muxer;
pub mod writer;

pub use codec::{encode_tag, FILE_HEADER, MAX_TAG_PAYLOAD, TAG_HEADER_SIZE};
pub use error::{FlvError, Result};
pub use muxer::Muxer;
pub use writer::FlvWriter;
