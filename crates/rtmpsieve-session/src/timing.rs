use std::collections::HashMap;

use rtmpsieve_chunk::Message;

/// Largest forward step between consecutive timestamps on one
/// (stream, type) pair before it is reported, in milliseconds.
const MAX_FORWARD_JUMP_MS: i64 = 2000;

/// A reported timestamp irregularity. Purely diagnostic; the raw
/// timestamps are always used as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    MovingBackwards { delta: i64 },
    JumpingForwards { delta: i64 },
}

/// Watches timestamp progression per (application stream, message type)
/// pair, independent of chunk stream ids.
#[derive(Debug, Default)]
pub struct TimestampMonitor {
    previous: HashMap<(u32, u8), u32>,
}

impl TimestampMonitor {
    /// Record one media message, reporting backwards or jumping
    /// timestamps.
    pub fn observe(&mut self, message: &Message) -> Option<Anomaly> {
        let key = (message.stream_id, message.type_id);
        let previous = self.previous.get(&key).copied().unwrap_or(0);
        let delta = i64::from(message.timestamp) - i64::from(previous);
        self.previous.insert(key, message.timestamp);

        if delta < 0 {
            tracing::warn!(
                stream_id = message.stream_id,
                type_id = message.type_id,
                delta,
                from = previous,
                to = message.timestamp,
                "timestamp moving backwards"
            );
            Some(Anomaly::MovingBackwards { delta })
        } else if delta > MAX_FORWARD_JUMP_MS {
            tracing::warn!(
                stream_id = message.stream_id,
                type_id = message.type_id,
                delta,
                from = previous,
                to = message.timestamp,
                "timestamp jumping forwards"
            );
            Some(Anomaly::JumpingForwards { delta })
        } else {
            None
        }
    }
}
