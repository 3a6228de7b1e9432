use std::io::Read;

use crate::error::Result;

/// Version byte of a plaintext session.
pub const PLAIN_VERSION: u8 = 3;

/// Version byte advertised by encrypted sessions.
pub const ENCRYPTED_VERSION: u8 = 6;

/// Server preamble after the version byte: uptime plus four version
/// components.
const PREAMBLE_LEN: usize = 8;

/// Handshake randomness following the preamble, discarded wholesale.
const FILLER_LEN: u64 = 3064;

/// Outcome of scanning the start of a capture for the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    /// A version-3 handshake was consumed.
    Present {
        /// Server uptime in milliseconds.
        uptime_ms: u32,
        /// Four-part server version.
        version: [u8; 4],
    },
    /// No usable handshake. The consumed byte is returned so the caller
    /// can re-present it to the chunk layer, which keeps reading from
    /// the post-skip offset without seeking backwards.
    Absent { version: u8, leftover: Vec<u8> },
}

impl Handshake {
    /// True when a well-formed handshake was found.
    pub fn is_present(&self) -> bool {
        matches!(self, Handshake::Present { .. })
    }
}

/// Consume the optional handshake prelude from the start of a capture.
///
/// Version 3 reads the server preamble and discards the filler. Any
/// other version is reported (encrypted sessions distinctly) and the
/// consumed byte is handed back for the chunk layer to retry on.
pub fn read_handshake<R: Read>(input: &mut R) -> Result<Handshake> {
    let mut version = [0u8; 1];
    input.read_exact(&mut version)?;
    let version = version[0];

    if version != PLAIN_VERSION {
        if version == ENCRYPTED_VERSION {
            tracing::error!("encrypted stream, payloads cannot be recovered");
        } else {
            tracing::error!(version, "bad protocol version");
        }
        tracing::warn!(
            "bad or missing handshake; trying to continue. If this does not work, \
             try another chunk size and/or skip offset."
        );
        return Ok(Handshake::Absent {
            version,
            leftover: vec![version],
        });
    }

    let mut preamble = [0u8; PREAMBLE_LEN];
    input.read_exact(&mut preamble)?;
    let uptime_ms = u32::from_be_bytes([preamble[0], preamble[1], preamble[2], preamble[3]]);
    let server_version = [preamble[4], preamble[5], preamble[6], preamble[7]];

    let (days, hours, minutes, seconds) = split_uptime(uptime_ms);
    tracing::debug!(
        uptime = format_args!("{days}d {hours}h {minutes}m {seconds:.3}s"),
        version = format_args!(
            "{}.{}.{}.{}",
            server_version[0], server_version[1], server_version[2], server_version[3]
        ),
        "server handshake"
    );

    // A short filler only means the capture stopped inside the
    // handshake; the chunk layer will see a clean end of input.
    std::io::copy(&mut input.take(FILLER_LEN), &mut std::io::sink())?;

    Ok(Handshake::Present {
        uptime_ms,
        version: server_version,
    })
}

fn split_uptime(uptime_ms: u32) -> (u64, u64, u64, f64) {
    let total_seconds = f64::from(uptime_ms) / 1e3;
    let whole = total_seconds as u64;
    let seconds = total_seconds - (whole - whole % 60) as f64;
    let minutes = (whole / 60) % 60;
    let hours = (whole / 3600) % 24;
    let days = whole / 86_400;
    (days, hours, minutes, seconds)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;

    fn version3_prelude(uptime_ms: u32, version: [u8; 4]) -> Vec<u8> {
        let mut out = vec![PLAIN_VERSION];
        out.extend_from_slice(&uptime_ms.to_be_bytes());
        out.extend_from_slice(&version);
        out.extend_from_slice(&vec![0u8; FILLER_LEN as usize]);
        out
    }

    #[test]
    fn consumes_exactly_the_version3_prelude() {
        let mut wire = version3_prelude(90_000, [4, 5, 0, 1]);
        wire.extend_from_slice(&[0xAB, 0xCD]);
        let mut cursor = Cursor::new(wire);

        let handshake = read_handshake(&mut cursor).unwrap();
        assert_eq!(
            handshake,
            Handshake::Present {
                uptime_ms: 90_000,
                version: [4, 5, 0, 1],
            }
        );
        assert!(handshake.is_present());

        // 1 version byte + 8 preamble + 3064 filler consumed, no more.
        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![0xAB, 0xCD]);
    }

    #[test]
    fn non_version3_hands_back_the_consumed_byte() {
        let mut cursor = Cursor::new(vec![0x04, 0x01, 0x02]);
        let handshake = read_handshake(&mut cursor).unwrap();
        assert_eq!(
            handshake,
            Handshake::Absent {
                version: 0x04,
                leftover: vec![0x04],
            }
        );

        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![0x01, 0x02]);
    }

    #[test]
    fn encrypted_version_is_still_absent() {
        let mut cursor = Cursor::new(vec![ENCRYPTED_VERSION]);
        let handshake = read_handshake(&mut cursor).unwrap();
        assert!(!handshake.is_present());
    }

    #[test]
    fn empty_input_is_an_io_error() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        assert!(read_handshake(&mut cursor).is_err());
    }

    #[test]
    fn short_filler_is_tolerated() {
        let mut wire = vec![PLAIN_VERSION];
        wire.extend_from_slice(&0u32.to_be_bytes());
        wire.extend_from_slice(&[1, 0, 0, 0]);
        wire.extend_from_slice(&[0u8; 100]);
        let mut cursor = Cursor::new(wire);

        let handshake = read_handshake(&mut cursor).unwrap();
        assert!(handshake.is_present());
    }

    #[test]
    fn uptime_splits_into_components() {
        // 1 day, 2 hours, 3 minutes, 4.5 seconds.
        let ms = ((86_400 + 2 * 3600 + 3 * 60) * 1000 + 4500) as u32;
        let (days, hours, minutes, seconds) = split_uptime(ms);
        assert_eq!((days, hours, minutes), (1, 2, 3));
        assert!((seconds - 4.5).abs() < 1e-9);
    }
}
