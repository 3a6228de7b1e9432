use bytes::Buf;
use rtmpsieve_chunk::{type_id, Message};

use crate::error::{Result, SessionError};

/// User control event types.
mod event {
    pub const STREAM_BEGIN: u16 = 0;
    pub const STREAM_EOF: u16 = 1;
    pub const STREAM_DRY: u16 = 2;
    pub const STREAM_IS_RECORDED: u16 = 4;
    pub const PING_REQUEST: u16 = 6;
    pub const BUFFER_EMPTY: u16 = 31;
    pub const BUFFER_READY: u16 = 32;
}

/// What the session pump should do after interpreting a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Media messages to forward to the muxer.
    Media(Vec<Message>),
    /// The peer changed the chunk size; feed it back to the reader.
    SetChunkSize(u32),
    /// Fully handled: control, diagnostics, or noise.
    Handled,
}

/// Classify one complete message and decide what to do with it.
pub fn interpret(message: Message) -> Result<Outcome> {
    match message.type_id {
        type_id::SET_CHUNK_SIZE => {
            let size = control_u32(&message)?;
            tracing::info!(size, "set chunk size");
            Ok(Outcome::SetChunkSize(size))
        }
        type_id::USER_CONTROL => {
            user_control(&message)?;
            Ok(Outcome::Handled)
        }
        type_id::WINDOW_ACK_SIZE | type_id::SET_PEER_BANDWIDTH => Ok(Outcome::Handled),
        type_id::AUDIO | type_id::VIDEO => {
            if message.payload.is_empty() {
                Ok(Outcome::Handled)
            } else {
                Ok(Outcome::Media(vec![message]))
            }
        }
        type_id::DATA_AMF0 => {
            let values = rtmpsieve_amf::decode_all(&message.payload);
            tracing::info!(stream_id = message.stream_id, ?values, "AMF0 data");
            Ok(Outcome::Handled)
        }
        type_id::COMMAND_AMF0 => {
            let values = rtmpsieve_amf::decode_all(&message.payload);
            tracing::info!(stream_id = message.stream_id, ?values, "AMF0 command");
            Ok(Outcome::Handled)
        }
        type_id::AGGREGATE => Ok(Outcome::Media(expand_aggregate(&message)?)),
        other => {
            tracing::debug!(type_id = other, "unhandled message type");
            Ok(Outcome::Handled)
        }
    }
}

fn control_u32(message: &Message) -> Result<u32> {
    if message.payload.len() < 4 {
        return Err(SessionError::ControlPayloadTooShort {
            type_id: message.type_id,
            expected: 4,
            actual: message.payload.len(),
        });
    }
    let mut buf = &message.payload[..];
    Ok(buf.get_u32())
}

fn user_control(message: &Message) -> Result<()> {
    if message.payload.len() < 6 {
        return Err(SessionError::ControlPayloadTooShort {
            type_id: message.type_id,
            expected: 6,
            actual: message.payload.len(),
        });
    }
    let mut buf = &message.payload[..];
    let event = buf.get_u16();
    let value = buf.get_u32();

    match event {
        event::STREAM_BEGIN => tracing::debug!(stream = value, "user control: stream begin"),
        event::STREAM_EOF => tracing::debug!(stream = value, "user control: stream EOF"),
        event::STREAM_DRY => tracing::debug!(stream = value, "user control: stream dry"),
        event::STREAM_IS_RECORDED => {
            tracing::debug!(stream = value, "user control: stream is recorded")
        }
        event::PING_REQUEST | event::BUFFER_EMPTY | event::BUFFER_READY => {}
        other => tracing::debug!(event = other, value, "unhandled user control event"),
    }
    Ok(())
}

/// Split an aggregate payload into its audio/video sub-messages.
///
/// Each sub-frame is framed like a container tag: type, 24-bit size,
/// split timestamp, 24-bit stream id, payload, and a restated total
/// size. The first sub-frame's timestamp anchors the batch at the outer
/// message's timestamp.
fn expand_aggregate(message: &Message) -> Result<Vec<Message>> {
    const SUB_HEADER_LEN: usize = 11;
    const TRAILER_LEN: usize = 4;

    let mut buf = message.payload.clone();
    let mut messages = Vec::new();
    let mut first_timestamp = None;

    while buf.has_remaining() {
        if buf.remaining() < SUB_HEADER_LEN {
            return Err(SessionError::TruncatedAggregate {
                remaining: buf.remaining(),
            });
        }
        let sub_type = buf.get_u8();
        let size = buf.get_uint(3) as u32;
        let low = buf.get_uint(3) as u32;
        let high = u32::from(buf.get_u8());
        let timestamp = high << 24 | low;
        let sub_stream_id = buf.get_uint(3) as u32;

        if buf.remaining() < size as usize + TRAILER_LEN {
            return Err(SessionError::TruncatedAggregate {
                remaining: buf.remaining(),
            });
        }
        let payload = buf.copy_to_bytes(size as usize);
        let trailing = buf.get_u32();
        if trailing != size {
            tracing::warn!(
                expected = size,
                got = trailing,
                "aggregate sub-frame size mismatch"
            );
        }

        let first = *first_timestamp.get_or_insert(timestamp);
        let rebased = timestamp
            .wrapping_sub(first)
            .wrapping_add(message.timestamp);

        match sub_type {
            type_id::AUDIO | type_id::VIDEO => messages.push(Message {
                timestamp: rebased,
                type_id: sub_type,
                stream_id: sub_stream_id,
                payload,
            }),
            other => {
                tracing::warn!(type_id = other, "non-media message inside aggregate");
            }
        }
    }

    Ok(messages)
}
