//! In-memory message store.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use gribview_common::{
    AttributeTable, DecodeError, DecodedGrid, GridExtent, RecordHeader, RecordLocator,
};
use tracing::warn;

use crate::message::Grib2Message;
use crate::scan::scan_messages;
use crate::MessageStore;

#[derive(Debug, Clone)]
enum Payload {
    Grid { values: Vec<f64> },
    Message(Box<Grib2Message>),
    Corrupt,
}

#[derive(Debug, Clone)]
struct Entry {
    header: RecordHeader,
    payload: Payload,
}

/// Grids and messages held in memory, keyed by a source name.
///
/// Locator offsets are positions within a source (0, 1, 2, ...). Counts
/// every decode so callers can check how often samples were requested.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sources: HashMap<String, Vec<Entry>>,
    unavailable: HashSet<String>,
    decode_count: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, source: &str, extent: GridExtent, attributes: AttributeTable, payload: Payload) -> RecordLocator {
        let entries = self.sources.entry(source.to_string()).or_default();
        let locator = RecordLocator::new(source, entries.len() as u64);

        let mut attributes = attributes;
        attributes.insert("Ni", extent.ni.to_string());
        attributes.insert("Nj", extent.nj.to_string());

        entries.push(Entry {
            header: RecordHeader {
                locator: locator.clone(),
                extent,
                attributes,
            },
            payload,
        });
        locator
    }

    /// Add a record with precomputed row-major samples.
    pub fn add_grid(
        &mut self,
        source: &str,
        extent: GridExtent,
        attributes: AttributeTable,
        values: Vec<f64>,
    ) -> RecordLocator {
        self.push(source, extent, attributes, Payload::Grid { values })
    }

    /// Add a record that lists fine but never decodes.
    pub fn add_corrupt(&mut self, source: &str, extent: GridExtent, attributes: AttributeTable) -> RecordLocator {
        self.push(source, extent, attributes, Payload::Corrupt)
    }

    /// Add one encoded GRIB2 message.
    pub fn add_message(&mut self, source: &str, raw: impl Into<Bytes>) -> Result<RecordLocator, DecodeError> {
        let message = Grib2Message::parse(raw.into())?;
        let extent = message.extent();
        let attributes = message.bootstrap_attributes();
        Ok(self.push(source, extent, attributes, Payload::Message(Box::new(message))))
    }

    /// Add every GRIB2 message found in `data`, as if it were a file.
    ///
    /// Returns how many records were added.
    pub fn add_file_bytes(&mut self, source: &str, data: &[u8]) -> usize {
        let mut added = 0;
        for span in scan_messages(data) {
            match self.add_message(source, Bytes::copy_from_slice(&data[span.range()])) {
                Ok(_) => added += 1,
                Err(e) => warn!(source = source, offset = span.offset, error = %e, "Skipping message"),
            }
        }
        added
    }

    /// Make every later call against `source` fail, as if the file vanished.
    pub fn set_unavailable(&mut self, source: &str) {
        self.unavailable.insert(source.to_string());
    }

    /// Number of decode calls served so far, failed ones included.
    pub fn decode_count(&self) -> usize {
        self.decode_count.load(Ordering::Relaxed)
    }

    fn entries(&self, source: &str) -> Result<&Vec<Entry>, DecodeError> {
        if self.unavailable.contains(source) {
            return Err(DecodeError::SourceUnavailable {
                source_id: source.to_string(),
                reason: "source marked unavailable".to_string(),
            });
        }
        self.sources
            .get(source)
            .ok_or_else(|| DecodeError::SourceUnavailable {
                source_id: source.to_string(),
                reason: "unknown source".to_string(),
            })
    }

    fn entry(&self, locator: &RecordLocator) -> Result<&Entry, DecodeError> {
        self.entries(&locator.source)?
            .get(locator.offset as usize)
            .ok_or_else(|| DecodeError::InvalidOffset {
                source_id: locator.source.clone(),
                offset: locator.offset,
            })
    }
}

impl MessageStore for MemoryStore {
    fn list_messages(&self, source: &str) -> Result<Vec<RecordHeader>, DecodeError> {
        Ok(self.entries(source)?.iter().map(|e| e.header.clone()).collect())
    }

    fn decode(&self, locator: &RecordLocator) -> Result<DecodedGrid, DecodeError> {
        self.decode_count.fetch_add(1, Ordering::Relaxed);
        let entry = self.entry(locator)?;
        match &entry.payload {
            Payload::Grid { values } => Ok(DecodedGrid::new(entry.header.extent, values.clone())),
            Payload::Message(message) => message.decode(),
            Payload::Corrupt => Err(DecodeError::Unpacking(format!(
                "record {} of {} is corrupt",
                locator.offset, locator.source
            ))),
        }
    }

    fn full_attributes(&self, locator: &RecordLocator) -> Result<AttributeTable, DecodeError> {
        let entry = self.entry(locator)?;
        match &entry.payload {
            Payload::Message(message) => Ok(message.full_attributes()),
            _ => {
                let mut attrs = entry.header.attributes.clone();
                attrs.insert("numberOfDataPoints", entry.header.extent.len().to_string());
                attrs.insert("values", format!("<{} values>", entry.header.extent.len()));
                Ok(attrs)
            }
        }
    }

    fn raw_message(&self, locator: &RecordLocator) -> Result<Bytes, DecodeError> {
        match &self.entry(locator)?.payload {
            Payload::Message(message) => Ok(message.raw.clone()),
            _ => Err(DecodeError::Format(format!(
                "record {} of {} has no encoded form",
                locator.offset, locator.source
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent() -> GridExtent {
        GridExtent::new(2, 2, 10.0, 0.0, 0.0, 10.0)
    }

    #[test]
    fn test_grid_round_trip_and_count() {
        let mut store = MemoryStore::new();
        let loc = store.add_grid("mem", extent(), AttributeTable::new(), vec![1.0, 2.0, 3.0, 4.0]);

        let grid = store.decode(&loc).unwrap();
        assert_eq!(grid.values, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(store.decode_count(), 1);

        let listed = store.list_messages("mem").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].attributes.get("Ni"), Some("2"));
    }

    #[test]
    fn test_corrupt_and_unavailable() {
        let mut store = MemoryStore::new();
        let bad = store.add_corrupt("mem", extent(), AttributeTable::new());
        assert!(matches!(store.decode(&bad), Err(DecodeError::Unpacking(_))));
        assert!(store.raw_message(&bad).is_err());

        let good = store.add_grid("mem", extent(), AttributeTable::new(), vec![0.0; 4]);
        store.set_unavailable("mem");
        assert!(matches!(
            store.decode(&good),
            Err(DecodeError::SourceUnavailable { .. })
        ));
        assert_eq!(store.decode_count(), 2);
    }

    #[test]
    fn test_unknown_offset() {
        let mut store = MemoryStore::new();
        store.add_grid("mem", extent(), AttributeTable::new(), vec![0.0; 4]);
        let missing = RecordLocator::new("mem", 9);
        assert!(matches!(
            store.decode(&missing),
            Err(DecodeError::InvalidOffset { offset: 9, .. })
        ));
        assert!(store.list_messages("other").is_err());
    }
}
