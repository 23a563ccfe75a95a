//! Coordinate mapping between screen pixels, grid positions and geography.
//!
//! Only regular latitude/longitude grids are supported.

pub mod geographic;

pub use geographic::{
    fraction_to_geo, fraction_to_index, geo_to_fraction, geo_to_index, index_to_pixel,
    longitude_span, pixel_to_fraction, pixel_to_geo, pixel_to_grid, wrap_longitude, GeoPoint,
    GridFraction, GridPoint, PixelFrame,
};
