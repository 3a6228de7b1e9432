//! RTMP session interpretation.
//!
//! Sits between the chunk demultiplexer and the container muxer: parses
//! the optional handshake prelude, interprets control messages (feeding
//! chunk-size updates back to the demultiplexer), decodes AMF0 payloads
//! for diagnostics, expands aggregate messages, and yields the
//! audio/video messages worth keeping.

pub mod error;
pub mod handshake;
pub mod interpreter;
pub mod session;
pub mod timing;

pub use error::{Result, SessionError};
pub use handshake::{read_handshake, Handshake};
pub use interpreter::{interpret, Outcome};
pub use session::{Session, SessionConfig};
pub use timing::{Anomaly, TimestampMonitor};
