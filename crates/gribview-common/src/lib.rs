//! Common types shared across the gribview crates.

pub mod attributes;
pub mod error;
pub mod grid;
pub mod record;

pub use attributes::{compare_attribute_values, parse_numeric, AttributeTable, BULK_KEYS};
pub use error::{ConfigError, DecodeError, ExportError, GribviewError, GribviewResult};
pub use grid::{mask_missing, DecodedGrid, GridExtent, GridIndex, MISSING_VALUE};
pub use record::{FieldRecord, RecordHeader, RecordId, RecordLocator};
