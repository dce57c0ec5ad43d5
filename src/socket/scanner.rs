//! Byte-level state machines used to pick apart an HTTP reply without an
//! HTTP library: the status-line scanner and the header terminator matcher.

use crate::errors::{PayError, Result};
use encoding_rs::Encoding;
use std::io::Read;

const HTTP_PREFIX: &[u8] = b"HTTP/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusScan {
    /// Number of prefix bytes matched so far.
    Prefix(usize),
    Line,
    Done,
}

/// Reads bytes until `HTTP/` is matched contiguously, then buffers the rest of
/// the status line and returns the numeric code from its second token.
///
/// A mismatch resets the prefix match and drops whatever was buffered, so any
/// garbage ahead of the status line is skipped.
pub fn read_status_code<R: Read>(reader: &mut R, charset: &'static Encoding) -> Result<u16> {
    let mut buffer = Vec::with_capacity(64);
    let mut state = StatusScan::Prefix(0);

    for byte in reader.by_ref().bytes() {
        let byte = byte?;
        state = match state {
            StatusScan::Prefix(i) if byte == HTTP_PREFIX[i] => {
                buffer.push(byte);
                if i + 1 == HTTP_PREFIX.len() {
                    StatusScan::Line
                } else {
                    StatusScan::Prefix(i + 1)
                }
            }
            StatusScan::Prefix(_) => {
                buffer.clear();
                StatusScan::Prefix(0)
            }
            StatusScan::Line => {
                buffer.push(byte);
                if byte == b'\n' {
                    StatusScan::Done
                } else {
                    StatusScan::Line
                }
            }
            StatusScan::Done => StatusScan::Done,
        };
        if state == StatusScan::Done {
            break;
        }
    }

    if let StatusScan::Prefix(_) = state {
        return Err(PayError::HeaderNotFound);
    }

    let (line, _) = charset.decode_without_bom_handling(&buffer);
    let line = line.trim();
    line.split(' ')
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| PayError::InvalidStatusLine(line.to_string()))
}

/// Matcher for the `CR LF CR LF` sequence ending the header block.
///
/// Resets are asymmetric: a CR outside `Start`/`CrLf` falls back to `Cr`,
/// while an LF anywhere but after a CR falls back to `Start`. Bare-LF header
/// blocks are not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderEnd {
    Start,
    Cr,
    CrLf,
    CrLfCr,
    Done,
}

impl HeaderEnd {
    pub fn next(self, byte: u8) -> Self {
        match (self, byte) {
            (HeaderEnd::Start, b'\r') => HeaderEnd::Cr,
            (HeaderEnd::CrLf, b'\r') => HeaderEnd::CrLfCr,
            (_, b'\r') => HeaderEnd::Cr,
            (HeaderEnd::Cr, b'\n') => HeaderEnd::CrLf,
            (HeaderEnd::CrLfCr, b'\n') => HeaderEnd::Done,
            _ => HeaderEnd::Start,
        }
    }
}

/// Discards bytes up to and including the header terminator. Stops quietly
/// at end of stream.
pub fn skip_headers<R: Read>(reader: &mut R) -> Result<()> {
    let mut state = HeaderEnd::Start;
    for byte in reader.by_ref().bytes() {
        state = state.next(byte?);
        if state == HeaderEnd::Done {
            break;
        }
    }
    Ok(())
}
