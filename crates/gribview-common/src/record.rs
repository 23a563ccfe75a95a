//! Field records: one decoded grid layer as the viewer tracks it.

use serde::{Deserialize, Serialize};

use crate::{AttributeTable, GridExtent};

/// Stable identity of a loaded record, unaffected by sorting or deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u64);

/// Where to find a record's encoded message again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordLocator {
    /// Source identity (file path for file-backed stores)
    pub source: String,
    /// Byte offset of the message within the source
    pub offset: u64,
}

impl RecordLocator {
    pub fn new(source: impl Into<String>, offset: u64) -> Self {
        Self {
            source: source.into(),
            offset,
        }
    }
}

/// What a message store reports for one message when a source is listed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordHeader {
    pub locator: RecordLocator,
    pub extent: GridExtent,
    /// Bootstrap attributes (a handful of well-known keys)
    pub attributes: AttributeTable,
}

/// One entry of the viewer's ordered record list.
///
/// Samples are never stored here; the locator is enough to decode them again.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub id: RecordId,
    /// 1-based position in the list, kept dense
    pub index: usize,
    pub locator: RecordLocator,
    pub extent: GridExtent,
    pub attributes: AttributeTable,
    /// Range of the most recently decoded samples
    pub min_val: f64,
    pub max_val: f64,
    pub selected: bool,
    /// Whether `attributes` holds the full dump rather than the bootstrap set
    pub fully_detailed: bool,
}

impl FieldRecord {
    pub fn from_header(id: RecordId, index: usize, header: RecordHeader) -> Self {
        let mut record = Self {
            id,
            index,
            locator: header.locator,
            extent: header.extent,
            attributes: header.attributes,
            min_val: 0.0,
            max_val: 0.0,
            selected: false,
            fully_detailed: false,
        };
        record.set_index(index);
        record
    }

    /// Reassign the ordinal and mirror it into the `index` attribute.
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
        self.attributes.insert("index", index.to_string());
    }
}
