//! Common test fixtures: grid extents and record headers.

use gribview_common::{AttributeTable, GridExtent, RecordHeader, RecordLocator};

/// Common grid extents for testing.
pub mod extent {
    use gribview_common::GridExtent;

    /// 2x2 grid running north to south: lat 10..0, lon 0..10
    pub fn small_2x2() -> GridExtent {
        GridExtent::new(2, 2, 10.0, 0.0, 0.0, 10.0)
    }

    /// 11x11 grid at one degree, north to south: lat 10..0, lon 0..10
    pub fn descending_11x11() -> GridExtent {
        GridExtent::new(11, 11, 10.0, 0.0, 0.0, 10.0)
    }

    /// 9x5 grid running south to north: lat -20..20, lon 0..40
    pub fn ascending_9x5() -> GridExtent {
        GridExtent::new(9, 5, -20.0, 0.0, 20.0, 40.0)
    }

    /// One-degree global grid, 0..359 east, 90..-90
    pub fn global_1deg() -> GridExtent {
        GridExtent::new(360, 181, 90.0, 0.0, -90.0, 359.0)
    }

    /// Grid crossing the prime meridian with a negative first longitude
    pub fn europe() -> GridExtent {
        GridExtent::new(41, 21, 60.0, -10.0, 40.0, 30.0)
    }

    /// Single column; cannot be picked with the mouse
    pub fn single_column() -> GridExtent {
        GridExtent::new(1, 5, 10.0, 0.0, 0.0, 0.0)
    }
}

/// Bootstrap attributes in the shape a message store reports them.
pub fn bootstrap_attributes(short_name: &str, level: u32, data_date: &str, step: u32) -> AttributeTable {
    let mut attrs = AttributeTable::new();
    attrs.insert("shortName", short_name);
    attrs.insert("level", level.to_string());
    attrs.insert("dataDate", data_date);
    attrs.insert("dataTime", "1200");
    attrs.insert("startStep", step.to_string());
    attrs.insert("endStep", step.to_string());
    attrs.insert("stepRange", step.to_string());
    attrs
}

/// A record header for `extent` at `source`/`offset` with the given attributes.
pub fn header(source: &str, offset: u64, extent: GridExtent, attributes: AttributeTable) -> RecordHeader {
    let mut attributes = attributes;
    attributes.insert("Ni", extent.ni.to_string());
    attributes.insert("Nj", extent.nj.to_string());
    RecordHeader {
        locator: RecordLocator::new(source, offset),
        extent,
        attributes,
    }
}
