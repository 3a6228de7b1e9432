use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};

use crate::codec::{encode_tag, FILE_HEADER};
use crate::error::{FlvError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes one FLV stream to any `Write` sink.
///
/// The 13-byte file header goes out with the first tag, so a stream that
/// never produces media never produces a file body either.
pub struct FlvWriter<W> {
    inner: W,
    buf: BytesMut,
    header_written: bool,
}

impl<W: Write> FlvWriter<W> {
    /// Create a writer over a sink.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            header_written: false,
        }
    }

    /// Whether the file header has been written yet.
    pub fn header_written(&self) -> bool {
        self.header_written
    }

    /// Frame one tag and write it, preceded by the file header on the
    /// first call.
    pub fn write_tag(&mut self, type_id: u8, timestamp: u32, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        if !self.header_written {
            self.buf.put_slice(&FILE_HEADER);
        }
        encode_tag(type_id, timestamp, payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FlvError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FlvError::Io(err)),
            }
        }
        self.header_written = true;
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FlvError::Io(err)),
            }
        }
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
