/// Errors that can occur while decoding an AMF0 payload.
#[derive(Debug, thiserror::Error)]
pub enum Amf0Error {
    /// The payload ended in the middle of a value.
    #[error("unexpected end of AMF0 data at offset {offset:#x}")]
    UnexpectedEof { offset: usize },

    /// An unrecognized type marker was encountered.
    #[error("unknown AMF0 marker {marker:#04x} at offset {offset:#x}")]
    UnknownMarker { marker: u8, offset: usize },

    /// A reference pointed past the end of the reference table.
    #[error("AMF0 reference {index} out of range (table has {len} entries)")]
    ReferenceOutOfRange { index: u16, len: usize },

    /// An object-end marker appeared outside an object body.
    #[error("unexpected object-end marker at offset {offset:#x}")]
    UnexpectedObjectEnd { offset: usize },
}

pub type Result<T> = std::result::Result<T, Amf0Error>;
