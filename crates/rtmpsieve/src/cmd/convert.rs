use std::io::{Read, Write};

use rtmpsieve_flv::Muxer;
use rtmpsieve_session::{Session, SessionConfig};

use crate::cmd::ConvertArgs;
use crate::exit::{flv_error, io_error, session_error, CliResult, FAILURE, SUCCESS};
use crate::source;

pub fn run(args: ConvertArgs) -> CliResult<i32> {
    let mut failures = 0usize;
    for file in &args.input.files {
        if let Err(err) = convert_file(file, args.input.skip, args.input.chunk_size) {
            tracing::error!(file = %file, error = %err, "conversion failed");
            failures += 1;
        }
    }
    Ok(if failures > 0 { FAILURE } else { SUCCESS })
}

fn convert_file(file: &str, skip: u64, chunk_size: u32) -> CliResult<()> {
    tracing::info!(file = %file, "reading capture");
    let input = source::open_input(file, skip)
        .map_err(|err| io_error(&format!("failed opening {file}"), err))?;

    let mut session = Session::new(
        input,
        SessionConfig {
            initial_chunk_size: chunk_size,
        },
    )
    .map_err(|err| session_error("handshake read failed", err))?;
    let mut muxer = Muxer::new(|stream_id| source::open_output(file, stream_id));

    // Flush whatever was opened even when the pump bails out.
    let pumped = pump(&mut session, &mut muxer);
    let flushed = muxer.finish();
    pumped?;
    flushed.map_err(|err| flv_error("flushing outputs failed", err))?;
    Ok(())
}

fn pump<R, W, F>(session: &mut Session<R>, muxer: &mut Muxer<W, F>) -> CliResult<()>
where
    R: Read,
    W: Write,
    F: FnMut(u32) -> std::io::Result<W>,
{
    while let Some(message) = session
        .next_media()
        .map_err(|err| session_error("capture processing failed", err))?
    {
        muxer
            .write(
                message.stream_id,
                message.type_id,
                message.timestamp,
                &message.payload,
            )
            .map_err(|err| flv_error("writing tag failed", err))?;
    }
    Ok(())
}
