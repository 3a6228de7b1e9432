use std::collections::BTreeMap;
use std::io::Read;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rtmpsieve_chunk::type_id;
use rtmpsieve_session::{Session, SessionConfig};
use serde::Serialize;

use crate::cmd::InspectArgs;
use crate::exit::{io_error, session_error, CliResult, FAILURE, SUCCESS};
use crate::output::OutputFormat;
use crate::source;

#[derive(Serialize)]
struct CaptureReport {
    file: String,
    handshake: &'static str,
    streams: Vec<StreamReport>,
}

#[derive(Serialize, Default)]
struct StreamReport {
    stream_id: u32,
    audio_messages: u64,
    video_messages: u64,
    payload_bytes: u64,
    first_timestamp: Option<u32>,
    last_timestamp: Option<u32>,
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let mut failures = 0usize;
    for file in &args.input.files {
        match inspect_file(file, args.input.skip, args.input.chunk_size) {
            Ok(report) => print_report(&report, format),
            Err(err) => {
                tracing::error!(file = %file, error = %err, "inspection failed");
                failures += 1;
            }
        }
    }
    Ok(if failures > 0 { FAILURE } else { SUCCESS })
}

fn inspect_file(file: &str, skip: u64, chunk_size: u32) -> CliResult<CaptureReport> {
    let input = source::open_input(file, skip)
        .map_err(|err| io_error(&format!("failed opening {file}"), err))?;
    let mut session = Session::new(
        input,
        SessionConfig {
            initial_chunk_size: chunk_size,
        },
    )
    .map_err(|err| session_error("handshake read failed", err))?;

    let mut streams: BTreeMap<u32, StreamReport> = BTreeMap::new();
    pump(&mut session, &mut streams)?;

    Ok(CaptureReport {
        file: file.to_string(),
        handshake: if session.handshake().is_present() {
            "present"
        } else {
            "missing"
        },
        streams: streams.into_values().collect(),
    })
}

fn pump<R: Read>(
    session: &mut Session<R>,
    streams: &mut BTreeMap<u32, StreamReport>,
) -> CliResult<()> {
    while let Some(message) = session
        .next_media()
        .map_err(|err| session_error("capture processing failed", err))?
    {
        let entry = streams
            .entry(message.stream_id)
            .or_insert_with(|| StreamReport {
                stream_id: message.stream_id,
                ..StreamReport::default()
            });
        match message.type_id {
            type_id::AUDIO => entry.audio_messages += 1,
            type_id::VIDEO => entry.video_messages += 1,
            _ => {}
        }
        entry.payload_bytes += message.payload.len() as u64;
        if entry.first_timestamp.is_none() {
            entry.first_timestamp = Some(message.timestamp);
        }
        entry.last_timestamp = Some(message.timestamp);
    }
    Ok(())
}

fn print_report(report: &CaptureReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "STREAM", "AUDIO", "VIDEO", "BYTES", "FIRST TS", "LAST TS",
                ]);
            for stream in &report.streams {
                table.add_row(vec![
                    stream.stream_id.to_string(),
                    stream.audio_messages.to_string(),
                    stream.video_messages.to_string(),
                    stream.payload_bytes.to_string(),
                    timestamp_cell(stream.first_timestamp),
                    timestamp_cell(stream.last_timestamp),
                ]);
            }
            println!("{} (handshake {})", report.file, report.handshake);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{} (handshake {})", report.file, report.handshake);
            for stream in &report.streams {
                println!(
                    "  stream={} audio={} video={} bytes={} first={} last={}",
                    stream.stream_id,
                    stream.audio_messages,
                    stream.video_messages,
                    stream.payload_bytes,
                    timestamp_cell(stream.first_timestamp),
                    timestamp_cell(stream.last_timestamp),
                );
            }
        }
    }
}

fn timestamp_cell(timestamp: Option<u32>) -> String {
    match timestamp {
        Some(ms) => format!("{ms}ms"),
        None => "-".to_string(),
    }
}
