//! GRIB2 files on disk.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use bytes::Bytes;
use gribview_common::{AttributeTable, DecodeError, DecodedGrid, RecordHeader, RecordLocator};
use tracing::{debug, info, warn};

use crate::message::Grib2Message;
use crate::scan::scan_messages;
use crate::sections::parse_indicator;
use crate::MessageStore;

/// Reads GRIB files by path; the locator source is the path.
///
/// Nothing is cached: every call opens the file again, so a file that
/// disappears after loading turns into decode failures rather than stale
/// data.
#[derive(Debug, Clone, Default)]
pub struct GribFileStore;

impl GribFileStore {
    pub fn new() -> Self {
        Self
    }

    fn read_message(&self, locator: &RecordLocator) -> Result<Bytes, DecodeError> {
        let unavailable = |e: std::io::Error| DecodeError::SourceUnavailable {
            source_id: locator.source.clone(),
            reason: e.to_string(),
        };
        let invalid_offset = || DecodeError::InvalidOffset {
            source_id: locator.source.clone(),
            offset: locator.offset,
        };

        let mut file = File::open(&locator.source).map_err(unavailable)?;
        let file_len = file.metadata().map_err(unavailable)?.len();
        file.seek(SeekFrom::Start(locator.offset)).map_err(unavailable)?;

        let mut head = [0u8; 16];
        file.read_exact(&mut head).map_err(|_| invalid_offset())?;
        let indicator = parse_indicator(&head).map_err(|_| invalid_offset())?;

        let available = file_len.saturating_sub(locator.offset);
        if indicator.message_length > available {
            return Err(DecodeError::Format(format!(
                "message at offset {} in {} declares {} bytes, file has {} left",
                locator.offset, locator.source, indicator.message_length, available
            )));
        }
        let length = indicator.message_length as usize;
        if length < 16 {
            return Err(invalid_offset());
        }
        let mut message = vec![0u8; length];
        message[..16].copy_from_slice(&head);
        file.read_exact(&mut message[16..]).map_err(|_| invalid_offset())?;

        if &message[length - 4..] != b"7777" {
            return Err(DecodeError::Format(format!(
                "message at offset {} in {} does not end in 7777",
                locator.offset, locator.source
            )));
        }

        Ok(Bytes::from(message))
    }

    fn parse(&self, locator: &RecordLocator) -> Result<Grib2Message, DecodeError> {
        Grib2Message::parse(self.read_message(locator)?)
    }
}

impl MessageStore for GribFileStore {
    fn list_messages(&self, source: &str) -> Result<Vec<RecordHeader>, DecodeError> {
        let data = std::fs::read(source).map_err(|e| DecodeError::SourceUnavailable {
            source_id: source.to_string(),
            reason: e.to_string(),
        })?;

        let mut headers = Vec::new();
        for span in scan_messages(&data) {
            if span.edition != 2 {
                warn!(
                    source = source,
                    offset = span.offset,
                    edition = span.edition,
                    "Skipping message of unsupported GRIB edition"
                );
                continue;
            }

            match Grib2Message::parse(Bytes::copy_from_slice(&data[span.range()])) {
                Ok(message) => headers.push(RecordHeader {
                    locator: RecordLocator::new(source, span.offset),
                    extent: message.extent(),
                    attributes: message.bootstrap_attributes(),
                }),
                Err(e) => {
                    warn!(source = source, offset = span.offset, error = %e, "Skipping unreadable message");
                }
            }
        }

        info!(source = source, messages = headers.len(), bytes = data.len(), "Listed GRIB file");
        Ok(headers)
    }

    fn decode(&self, locator: &RecordLocator) -> Result<DecodedGrid, DecodeError> {
        let grid = self.parse(locator)?.decode()?;
        debug!(
            source = %locator.source,
            offset = locator.offset,
            ni = grid.extent.ni,
            nj = grid.extent.nj,
            "Decoded message"
        );
        Ok(grid)
    }

    fn full_attributes(&self, locator: &RecordLocator) -> Result<AttributeTable, DecodeError> {
        Ok(self.parse(locator)?.full_attributes())
    }

    fn raw_message(&self, locator: &RecordLocator) -> Result<Bytes, DecodeError> {
        self.read_message(locator)
    }
}
