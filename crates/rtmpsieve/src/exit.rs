use std::fmt;
use std::io;

use rtmpsieve_chunk::ChunkError;
use rtmpsieve_flv::FlvError;
use rtmpsieve_session::SessionError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
#[allow(dead_code)]
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Io(source) | SessionError::Chunk(ChunkError::Io(source)) => {
            io_error(context, source)
        }
        SessionError::Chunk(other) => CliError::new(DATA_INVALID, format!("{context}: {other}")),
        other @ (SessionError::ControlPayloadTooShort { .. }
        | SessionError::TruncatedAggregate { .. }) => {
            CliError::new(DATA_INVALID, format!("{context}: {other}"))
        }
    }
}

pub fn flv_error(context: &str, err: FlvError) -> CliError {
    match err {
        FlvError::Io(source) => io_error(context, source),
        FlvError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_map_by_kind() {
        let denied = io_error("open", io::ErrorKind::PermissionDenied.into());
        assert_eq!(denied.code, PERMISSION_DENIED);

        let missing = io_error("open", io::ErrorKind::NotFound.into());
        assert_eq!(missing.code, FAILURE);

        let truncated = io_error("read", io::ErrorKind::UnexpectedEof.into());
        assert_eq!(truncated.code, DATA_INVALID);
    }

    #[test]
    fn framing_errors_are_invalid_data() {
        let err = session_error(
            "demux",
            SessionError::Chunk(ChunkError::UnknownMessageSize { chunk_stream_id: 4 }),
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("demux"));
    }

    #[test]
    fn oversized_payload_is_invalid_data() {
        let err = flv_error(
            "mux",
            FlvError::PayloadTooLarge {
                size: 1,
                max: 0,
            },
        );
        assert_eq!(err.code, DATA_INVALID);
    }
}
