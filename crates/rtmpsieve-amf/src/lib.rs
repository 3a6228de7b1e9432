//! AMF0 structured value decoding.
//!
//! RTMP carries its out-of-band control and metadata payloads as AMF0, a
//! compact self-describing binary format with nested composites and
//! back-references. This crate decodes those payloads into a generic value
//! tree for diagnostic reporting; it never touches media payloads.

pub mod decoder;
pub mod error;
pub mod value;

pub use decoder::decode_all;
pub use error::{Amf0Error, Result};
pub use value::Amf0Value;
