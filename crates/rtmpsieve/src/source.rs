//! Input and output plumbing: where capture bytes come from and where
//! recovered streams go.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

/// Spelling that selects stdin/stdout instead of files.
pub const STDIO: &str = "-";

/// Open one capture for reading, discarding `skip` leading bytes.
pub fn open_input(spec: &str, skip: u64) -> io::Result<Box<dyn Read>> {
    let mut reader: Box<dyn Read> = if spec == STDIO {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(spec)?))
    };
    if skip > 0 {
        discard(&mut reader, skip)?;
    }
    Ok(reader)
}

/// Map (input identity, application stream id) to an output sink.
///
/// File inputs produce `<input>.<stream-id>.flv` next to the input;
/// stdin writes every stream to stdout, matching pipe usage.
pub fn open_output(input: &str, stream_id: u32) -> io::Result<Box<dyn Write>> {
    if input == STDIO {
        return Ok(Box::new(io::stdout().lock()));
    }
    let path = format!("{input}.{stream_id}.flv");
    tracing::info!(path = %path, "writing stream");
    Ok(Box::new(BufWriter::new(File::create(path)?)))
}

/// Reads and throws away exactly `n` bytes. Pipes cannot seek, so the
/// skip is a bounded copy for every input kind.
fn discard<R: Read + ?Sized>(reader: &mut R, n: u64) -> io::Result<()> {
    let copied = io::copy(&mut reader.take(n), &mut io::sink())?;
    if copied < n {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("input ended inside the {n}-byte skip"),
        ));
    }
    Ok(())
}
