//! Message stores: where the viewer gets record listings, samples and
//! encoded bytes from.
//!
//! The viewer core only talks to the [`MessageStore`] trait. [`GribFileStore`]
//! reads GRIB2 files from disk on every call; [`MemoryStore`] keeps grids in
//! memory for tests and scripted sessions.

pub mod file_store;
pub mod memory;
pub mod message;
pub mod scan;
pub mod sections;
pub mod tables;
pub mod unpacking;

use bytes::Bytes;
use gribview_common::{AttributeTable, DecodeError, DecodedGrid, RecordHeader, RecordLocator};

pub use file_store::GribFileStore;
pub use memory::MemoryStore;
pub use message::Grib2Message;
pub use scan::{scan_messages, MessageSpan};

/// Decoding capability the viewer is built on.
///
/// No handles are kept between calls; a locator is all it takes to get a
/// record's samples, metadata or bytes again.
pub trait MessageStore {
    /// Headers for every displayable message in `source`, in file order.
    fn list_messages(&self, source: &str) -> Result<Vec<RecordHeader>, DecodeError>;

    /// Row-major samples of one record, missing points as NaN.
    fn decode(&self, locator: &RecordLocator) -> Result<DecodedGrid, DecodeError>;

    /// Every attribute the store knows for one record.
    fn full_attributes(&self, locator: &RecordLocator) -> Result<AttributeTable, DecodeError>;

    /// The record's original encoded message.
    fn raw_message(&self, locator: &RecordLocator) -> Result<Bytes, DecodeError>;
}

impl<T: MessageStore + ?Sized> MessageStore for &T {
    fn list_messages(&self, source: &str) -> Result<Vec<RecordHeader>, DecodeError> {
        (**self).list_messages(source)
    }

    fn decode(&self, locator: &RecordLocator) -> Result<DecodedGrid, DecodeError> {
        (**self).decode(locator)
    }

    fn full_attributes(&self, locator: &RecordLocator) -> Result<AttributeTable, DecodeError> {
        (**self).full_attributes(locator)
    }

    fn raw_message(&self, locator: &RecordLocator) -> Result<Bytes, DecodeError> {
        (**self).raw_message(locator)
    }
}
