use std::collections::VecDeque;
use std::io::{Chain, Cursor, Read};

use rtmpsieve_chunk::{Message, MessageReader, DEFAULT_CHUNK_SIZE};

use crate::error::Result;
use crate::handshake::{read_handshake, Handshake};
use crate::interpreter::{interpret, Outcome};
use crate::timing::TimestampMonitor;

/// Session knobs supplied by the caller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Chunk size in effect before any Set Chunk Size message. Captures
    /// missing their handshake usually need a non-default value.
    pub initial_chunk_size: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Bytes consumed while probing the handshake get chained back in front
/// of the remaining input, so no backward seek is ever needed.
type SessionInput<R> = Chain<Cursor<Vec<u8>>, R>;

/// Drives one capture from raw bytes to media messages.
///
/// Pull-based: [`Session::next_media`] interprets control traffic,
/// applies chunk-size updates, expands aggregates, and hands out one
/// audio/video message at a time until the input is exhausted.
pub struct Session<R> {
    reader: MessageReader<SessionInput<R>>,
    pending: VecDeque<Message>,
    timing: TimestampMonitor,
    handshake: Handshake,
}

impl<R: Read> Session<R> {
    /// Consume the handshake prelude and set up the chunk reader.
    pub fn new(mut input: R, config: SessionConfig) -> Result<Self> {
        let handshake = read_handshake(&mut input)?;
        let leftover = match &handshake {
            Handshake::Absent { leftover, .. } => leftover.clone(),
            Handshake::Present { .. } => Vec::new(),
        };
        let reader = MessageReader::with_chunk_size(
            Cursor::new(leftover).chain(input),
            config.initial_chunk_size,
        );
        Ok(Self {
            reader,
            pending: VecDeque::new(),
            timing: TimestampMonitor::default(),
            handshake,
        })
    }

    /// The handshake outcome observed at session start.
    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// Chunk size currently in effect.
    pub fn chunk_size(&self) -> u32 {
        self.reader.chunk_size()
    }

    /// Pull the next audio/video message, interpreting everything else
    /// along the way. Returns `Ok(None)` once the input is exhausted.
    pub fn next_media(&mut self) -> Result<Option<Message>> {
        loop {
            if let Some(message) = self.pending.pop_front() {
                self.timing.observe(&message);
                return Ok(Some(message));
            }

            let Some(message) = self.reader.next_message()? else {
                return Ok(None);
            };
            match interpret(message)? {
                Outcome::Media(messages) => self.pending.extend(messages),
                Outcome::SetChunkSize(size) => self.reader.set_chunk_size(size),
                Outcome::Handled => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rtmpsieve_chunk::type_id;

    use super::*;

    fn put_u24(out: &mut Vec<u8>, value: u32) {
        out.extend_from_slice(&value.to_be_bytes()[1..]);
    }

    fn format0_chunk(csid: u8, delta: u32, ty: u8, stream_id: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![csid & 0x3F];
        put_u24(&mut out, delta);
        put_u24(&mut out, payload.len() as u32);
        out.push(ty);
        out.extend_from_slice(&stream_id.to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn version3_handshake() -> Vec<u8> {
        let mut out = vec![3u8];
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&[4, 0, 0, 1]);
        out.extend_from_slice(&vec![0u8; 3064]);
        out
    }

    fn session(wire: Vec<u8>) -> Session<Cursor<Vec<u8>>> {
        Session::new(Cursor::new(wire), SessionConfig::default()).unwrap()
    }

    #[test]
    fn media_flows_through_after_handshake() {
        let mut wire = version3_handshake();
        wire.extend_from_slice(&format0_chunk(4, 0, type_id::VIDEO, 1, &[1, 2, 3]));
        wire.extend_from_slice(&format0_chunk(4, 40, type_id::AUDIO, 1, &[4]));

        let mut session = session(wire);
        assert!(session.handshake().is_present());

        let first = session.next_media().unwrap().unwrap();
        assert_eq!(first.type_id, type_id::VIDEO);
        assert_eq!(first.payload.as_ref(), &[1, 2, 3]);

        let second = session.next_media().unwrap().unwrap();
        assert_eq!(second.type_id, type_id::AUDIO);
        assert!(session.next_media().unwrap().is_none());
    }

    #[test]
    fn missing_handshake_replays_first_byte_to_chunk_layer() {
        // No handshake at all: the capture starts with a format-0 basic
        // header for chunk stream 4 (byte 0x04, not a valid version).
        let wire = format0_chunk(4, 0, type_id::VIDEO, 1, &[0xAB, 0xCD]);

        let mut session = session(wire);
        assert!(!session.handshake().is_present());

        let message = session.next_media().unwrap().unwrap();
        assert_eq!(message.payload.as_ref(), &[0xAB, 0xCD]);
    }

    #[test]
    fn set_chunk_size_reaches_the_reader() {
        let mut wire = version3_handshake();
        wire.extend_from_slice(&format0_chunk(
            2,
            0,
            type_id::SET_CHUNK_SIZE,
            0,
            &4096u32.to_be_bytes(),
        ));
        // A 200-byte video message needs the enlarged chunk size to
        // arrive in one chunk.
        let payload = vec![0x5Au8; 200];
        wire.extend_from_slice(&format0_chunk(4, 0, type_id::VIDEO, 1, &payload));

        let mut session = session(wire);
        let message = session.next_media().unwrap().unwrap();
        assert_eq!(session.chunk_size(), 4096);
        assert_eq!(message.payload.len(), 200);
    }

    #[test]
    fn control_and_metadata_messages_are_invisible() {
        let mut wire = version3_handshake();
        let mut user_control = 0u16.to_be_bytes().to_vec();
        user_control.extend_from_slice(&1u32.to_be_bytes());
        wire.extend_from_slice(&format0_chunk(2, 0, type_id::USER_CONTROL, 0, &user_control));
        wire.extend_from_slice(&format0_chunk(
            2,
            0,
            type_id::WINDOW_ACK_SIZE,
            0,
            &0x0010_0000u32.to_be_bytes(),
        ));
        // onMetaData-ish AMF0 data message.
        let mut amf = vec![0x02, 0x00, 0x0A];
        amf.extend_from_slice(b"onMetaData");
        wire.extend_from_slice(&format0_chunk(3, 0, type_id::DATA_AMF0, 1, &amf));
        wire.extend_from_slice(&format0_chunk(4, 0, type_id::AUDIO, 1, &[7]));

        let mut session = session(wire);
        let message = session.next_media().unwrap().unwrap();
        assert_eq!(message.type_id, type_id::AUDIO);
        assert!(session.next_media().unwrap().is_none());
    }

    #[test]
    fn empty_media_payloads_never_surface() {
        let mut wire = version3_handshake();
        wire.extend_from_slice(&format0_chunk(4, 0, type_id::AUDIO, 1, &[]));
        wire.extend_from_slice(&format0_chunk(4, 10, type_id::VIDEO, 1, &[1]));

        let mut session = session(wire);
        let message = session.next_media().unwrap().unwrap();
        assert_eq!(message.type_id, type_id::VIDEO);
        assert!(session.next_media().unwrap().is_none());
    }

    #[test]
    fn aggregate_messages_expand_in_order() {
        fn sub_frame(ty: u8, timestamp: u32, payload: &[u8]) -> Vec<u8> {
            let mut out = vec![ty];
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes()[1..]);
            out.extend_from_slice(&(timestamp & 0x00FF_FFFF).to_be_bytes()[1..]);
            out.push((timestamp >> 24) as u8);
            out.extend_from_slice(&1u32.to_be_bytes()[1..]);
            out.extend_from_slice(payload);
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            out
        }

        let mut aggregate = sub_frame(type_id::VIDEO, 100, &[1]);
        aggregate.extend_from_slice(&sub_frame(type_id::AUDIO, 130, &[2]));
        aggregate.extend_from_slice(&sub_frame(type_id::VIDEO, 145, &[3]));

        let mut wire = version3_handshake();
        wire.extend_from_slice(&format0_chunk(4, 500, type_id::AGGREGATE, 1, &aggregate));

        let mut session = session(wire);
        let mut timestamps = Vec::new();
        while let Some(message) = session.next_media().unwrap() {
            timestamps.push(message.timestamp);
        }
        assert_eq!(timestamps, vec![500, 530, 545]);
    }

    #[test]
    fn fatal_chunk_errors_propagate() {
        let mut wire = version3_handshake();
        // Format-2 header on a chunk stream that never declared a size.
        wire.push(0x84);
        put_u24(&mut wire, 0);

        let mut session = session(wire);
        assert!(session.next_media().is_err());
    }

    #[test]
    fn empty_capture_is_an_error() {
        let result = Session::new(Cursor::new(Vec::<u8>::new()), SessionConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn initial_chunk_size_comes_from_config() {
        let wire = version3_handshake();
        let session = Session::new(
            Cursor::new(wire),
            SessionConfig {
                initial_chunk_size: 256,
            },
        )
        .unwrap();
        assert_eq!(session.chunk_size(), 256);
    }
}
