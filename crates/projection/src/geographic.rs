//! Regular latitude/longitude grids.
//!
//! Three coordinate families meet here:
//! - pixel space: screen coordinates under a pan/zoom frame
//! - grid space: fractional column/row positions, and normalized fractions in `[0, 1]`
//! - geographic space: latitude/longitude in degrees, longitude in `[0, 360)`
//!
//! Pixel-driven lookups (what is under the cursor) reject positions outside the
//! grid. Geographic lookups (where does a fixed point land) clamp to the nearest
//! edge instead.

use gribview_common::{GridExtent, GridIndex};

/// Full turn in degrees of longitude.
const FULL_TURN: f64 = 360.0;

/// Screen placement of grid point `(0, 0)` and the size of one cell in pixels.
///
/// `origin_x`/`origin_y` already include the canvas origin and the pan offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelFrame {
    pub origin_x: f64,
    pub origin_y: f64,
    pub zoom: f64,
}

impl PixelFrame {
    pub fn new(origin_x: f64, origin_y: f64, zoom: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            zoom,
        }
    }
}

/// Fractional column (`x`) and row (`y`) position inside a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub x: f64,
    pub y: f64,
}

impl GridPoint {
    /// Cell containing this point, truncating toward the origin.
    pub fn cell(&self) -> GridIndex {
        GridIndex::new(self.x.max(0.0) as usize, self.y.max(0.0) as usize)
    }

    /// Normalize by `N-1` in each direction. The extent must be pickable.
    pub fn to_fraction(&self, extent: &GridExtent) -> GridFraction {
        GridFraction {
            fi: self.x / (extent.ni - 1) as f64,
            fj: self.y / (extent.nj - 1) as f64,
        }
    }
}

/// Position inside a grid normalized to `[0, 1]` along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridFraction {
    pub fi: f64,
    pub fj: f64,
}

impl GridFraction {
    pub fn new(fi: f64, fj: f64) -> Self {
        Self { fi, fj }
    }
}

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Wrap a longitude into `[0, 360)`.
pub fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = lon.rem_euclid(FULL_TURN);
    // rem_euclid may round up to exactly 360 for tiny negative inputs
    if wrapped >= FULL_TURN {
        0.0
    } else {
        wrapped
    }
}

/// Eastward longitude span from the first to the last grid point, in `[0, 360)`.
pub fn longitude_span(extent: &GridExtent) -> f64 {
    let span = extent.lon2 - extent.lon1;
    if span < 0.0 {
        span + FULL_TURN
    } else {
        span
    }
}

/// Grid position under a screen pixel.
///
/// Returns `None` when the grid has fewer than two points along either axis,
/// when the zoom is not positive, or when the pixel falls outside
/// `[0, Ni-1] × [0, Nj-1]`.
pub fn pixel_to_grid(extent: &GridExtent, frame: &PixelFrame, px: f64, py: f64) -> Option<GridPoint> {
    if !extent.is_pickable() || frame.zoom <= 0.0 {
        return None;
    }

    let x = (px - frame.origin_x) / frame.zoom;
    let y = (py - frame.origin_y) / frame.zoom;

    if x < 0.0 || y < 0.0 || x > (extent.ni - 1) as f64 || y > (extent.nj - 1) as f64 {
        return None;
    }

    Some(GridPoint { x, y })
}

/// Normalized grid fraction under a screen pixel.
pub fn pixel_to_fraction(
    extent: &GridExtent,
    frame: &PixelFrame,
    px: f64,
    py: f64,
) -> Option<GridFraction> {
    pixel_to_grid(extent, frame, px, py).map(|p| p.to_fraction(extent))
}

/// Geographic coordinate of a normalized grid position.
pub fn fraction_to_geo(extent: &GridExtent, fraction: GridFraction) -> GeoPoint {
    let lat = extent.lat1 + fraction.fj * (extent.lat2 - extent.lat1);
    let lon = wrap_longitude(extent.lon1 + fraction.fi * longitude_span(extent));
    GeoPoint { lat, lon }
}

/// Geographic coordinate under a screen pixel, if the pixel is over the grid.
pub fn pixel_to_geo(extent: &GridExtent, frame: &PixelFrame, px: f64, py: f64) -> Option<GeoPoint> {
    pixel_to_fraction(extent, frame, px, py).map(|f| fraction_to_geo(extent, f))
}

/// Normalized grid position of a geographic coordinate, clamped to `[0, 1]`.
///
/// Longitudes east of the grid's last column or west of its first one snap
/// to whichever edge is closer around the circle.
pub fn geo_to_fraction(extent: &GridExtent, point: GeoPoint) -> GridFraction {
    let lat_span = extent.lat2 - extent.lat1;
    let fj = if lat_span.abs() > f64::EPSILON {
        (point.lat - extent.lat1) / lat_span
    } else {
        0.0
    };

    let lon_span = longitude_span(extent);
    let east = wrap_longitude(point.lon - extent.lon1);
    let fi = if lon_span <= f64::EPSILON {
        0.0
    } else if east <= lon_span {
        east / lon_span
    } else if east - lon_span <= FULL_TURN - east {
        1.0
    } else {
        0.0
    };

    GridFraction {
        fi: fi.clamp(0.0, 1.0),
        fj: fj.clamp(0.0, 1.0),
    }
}

/// Nearest grid cell to a normalized position, clamped to the index bounds.
pub fn fraction_to_index(extent: &GridExtent, fraction: GridFraction) -> GridIndex {
    let max_i = extent.ni.saturating_sub(1);
    let max_j = extent.nj.saturating_sub(1);

    let i = (fraction.fi * max_i as f64).round().clamp(0.0, max_i as f64) as usize;
    let j = (fraction.fj * max_j as f64).round().clamp(0.0, max_j as f64) as usize;
    GridIndex::new(i, j)
}

/// Nearest grid cell to a geographic coordinate; never fails.
pub fn geo_to_index(extent: &GridExtent, point: GeoPoint) -> GridIndex {
    fraction_to_index(extent, geo_to_fraction(extent, point))
}

/// Screen position of a grid cell.
pub fn index_to_pixel(frame: &PixelFrame, index: GridIndex) -> (f64, f64) {
    (
        frame.origin_x + index.i as f64 * frame.zoom,
        frame.origin_y + index.j as f64 * frame.zoom,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descending_grid() -> GridExtent {
        GridExtent::new(11, 11, 10.0, 0.0, 0.0, 10.0)
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(-10.0), 350.0);
        assert_eq!(wrap_longitude(360.0), 0.0);
        assert_eq!(wrap_longitude(725.0), 5.0);
        assert!(wrap_longitude(-1e-17) < 360.0);
    }

    #[test]
    fn test_longitude_span_across_meridian() {
        let extent = GridExtent::new(2, 2, 0.0, 350.0, 10.0, 10.0);
        assert_eq!(longitude_span(&extent), 20.0);
    }

    #[test]
    fn test_pixel_to_grid_strict_bounds() {
        let extent = descending_grid();
        let frame = PixelFrame::new(100.0, 50.0, 2.0);

        assert!(pixel_to_grid(&extent, &frame, 99.9, 60.0).is_none());
        assert!(pixel_to_grid(&extent, &frame, 121.0, 60.0).is_none());

        let p = pixel_to_grid(&extent, &frame, 120.0, 70.0).unwrap();
        assert_eq!(p.x, 10.0);
        assert_eq!(p.y, 10.0);
    }

    #[test]
    fn test_pixel_to_grid_needs_two_points_per_axis() {
        let extent = GridExtent::new(1, 5, 0.0, 0.0, 4.0, 0.0);
        let frame = PixelFrame::new(0.0, 0.0, 1.0);
        assert!(pixel_to_grid(&extent, &frame, 0.0, 0.0).is_none());
    }

    #[test]
    fn test_cell_truncates() {
        let p = GridPoint { x: 1.9, y: 0.2 };
        assert_eq!(p.cell(), GridIndex::new(1, 0));
    }

    #[test]
    fn test_fraction_to_geo_descending() {
        let extent = descending_grid();
        let geo = fraction_to_geo(&extent, GridFraction::new(0.5, 0.25));
        assert!((geo.lat - 7.5).abs() < 1e-12);
        assert!((geo.lon - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_fraction_to_geo_wraps_longitude() {
        let extent = GridExtent::new(3, 3, -5.0, -20.0, 5.0, 20.0);
        let geo = fraction_to_geo(&extent, GridFraction::new(0.0, 0.0));
        assert_eq!(geo.lon, 340.0);
        assert_eq!(geo.lat, -5.0);
    }

    #[test]
    fn test_geo_to_fraction_clamps_latitude() {
        let extent = descending_grid();
        let f = geo_to_fraction(&extent, GeoPoint::new(45.0, 5.0));
        assert_eq!(f.fj, 0.0);
        let f = geo_to_fraction(&extent, GeoPoint::new(-45.0, 5.0));
        assert_eq!(f.fj, 1.0);
    }

    #[test]
    fn test_geo_to_fraction_snaps_longitude_to_nearest_edge() {
        let extent = descending_grid();
        // Just east of the last column
        assert_eq!(geo_to_fraction(&extent, GeoPoint::new(5.0, 20.0)).fi, 1.0);
        // Just west of the first column
        assert_eq!(geo_to_fraction(&extent, GeoPoint::new(5.0, 355.0)).fi, 0.0);
    }

    #[test]
    fn test_geo_to_index_center_of_2x2() {
        let extent = GridExtent::new(2, 2, 10.0, 0.0, 0.0, 10.0);
        assert_eq!(geo_to_index(&extent, GeoPoint::new(5.0, 5.0)), GridIndex::new(1, 1));
    }

    #[test]
    fn test_index_to_pixel() {
        let frame = PixelFrame::new(10.0, 20.0, 4.0);
        assert_eq!(index_to_pixel(&frame, GridIndex::new(3, 2)), (22.0, 28.0));
    }
}
