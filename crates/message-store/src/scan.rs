//! Locating GRIB messages inside a byte buffer.

use gribview_common::DecodeError;
use tracing::warn;

use crate::sections::parse_indicator;

/// One framed message found by [`scan_messages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSpan {
    pub offset: u64,
    pub length: u64,
    pub edition: u8,
}

impl MessageSpan {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset as usize..(self.offset + self.length) as usize
    }
}

/// Find every `GRIB ... 7777` message in `data`.
///
/// Bytes between messages are skipped. A `GRIB` marker whose declared
/// length runs past the buffer, or whose trailer is not `7777`, is not a
/// message; scanning resumes one byte after it.
pub fn scan_messages(data: &[u8]) -> Vec<MessageSpan> {
    let mut spans = Vec::new();
    let mut pos = 0usize;

    while let Some(found) = find_marker(&data[pos..]) {
        let offset = pos + found;
        match frame_at(data, offset) {
            Ok(span) => {
                pos = offset + span.length as usize;
                spans.push(span);
            }
            Err(e) => {
                warn!(offset = offset, error = %e, "Skipping unframed GRIB marker");
                pos = offset + 1;
            }
        }
    }

    spans
}

/// Frame the message that starts exactly at `offset`.
pub fn frame_at(data: &[u8], offset: usize) -> Result<MessageSpan, DecodeError> {
    let indicator = parse_indicator(data.get(offset..).unwrap_or_default())?;
    let length = indicator.message_length as usize;
    let end = offset.checked_add(length).filter(|end| *end <= data.len());

    match end {
        Some(end) if length >= 12 && &data[end - 4..end] == b"7777" => Ok(MessageSpan {
            offset: offset as u64,
            length: length as u64,
            edition: indicator.edition,
        }),
        _ => Err(DecodeError::Format(format!(
            "declared length {} at offset {} does not end in 7777",
            length, offset
        ))),
    }
}

fn find_marker(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"GRIB")
}
