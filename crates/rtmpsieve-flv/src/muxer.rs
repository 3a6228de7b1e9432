use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Write;

use crate::error::Result;
use crate::writer::FlvWriter;

/// Routes media records to per-stream container sinks.
///
/// Sinks are created lazily through the naming callback on the first
/// record for each application stream id, and every open writer is
/// flushed by [`Muxer::finish`]. Call it on both success and error
/// paths so no handle is left dangling.
pub struct Muxer<W, F> {
    open: F,
    streams: HashMap<u32, FlvWriter<W>>,
}

impl<W: Write, F: FnMut(u32) -> std::io::Result<W>> Muxer<W, F> {
    /// Create a muxer over a sink-naming callback.
    pub fn new(open: F) -> Self {
        Self {
            open,
            streams: HashMap::new(),
        }
    }

    /// Write one media record to the container for its stream id.
    pub fn write(
        &mut self,
        stream_id: u32,
        type_id: u8,
        timestamp: u32,
        payload: &[u8],
    ) -> Result<()> {
        let writer = match self.streams.entry(stream_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                tracing::info!(stream_id, "opening output stream");
                let sink = (self.open)(stream_id)?;
                entry.insert(FlvWriter::new(sink))
            }
        };
        writer.write_tag(type_id, timestamp, payload)
    }

    /// Application stream ids with open writers.
    pub fn stream_ids(&self) -> Vec<u32> {
        self.streams.keys().copied().collect()
    }

    /// True if no stream has produced media yet.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Flush every open writer, reporting the first failure after
    /// attempting them all.
    pub fn finish(&mut self) -> Result<()> {
        let mut result = Ok(());
        for writer in self.streams.values_mut() {
            if let Err(err) = writer.flush() {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }
}
