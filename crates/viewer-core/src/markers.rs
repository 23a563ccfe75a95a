//! User-placed geographic sample points and their extracted series.

use gribview_common::{GridExtent, RecordId};
use projection::{geo_to_index, index_to_pixel, GeoPoint, PixelFrame};

/// Distance in screen pixels within which a marker is hit.
pub const MARKER_HIT_RADIUS: f64 = 6.0;

/// One extracted value, tagged with the record it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub record: RecordId,
    /// `None` when the record had no value there or failed to decode
    pub value: Option<f64>,
}

/// A geographic point sampled against every record.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// 1-based display id, dense
    pub id: usize,
    pub position: GeoPoint,
    pub series: Vec<Sample>,
}

/// Ordered markers. Ids follow list order.
#[derive(Debug, Clone, Default)]
pub struct MarkerStore {
    markers: Vec<Marker>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Marker> {
        self.markers.iter_mut()
    }

    pub fn get(&self, id: usize) -> Option<&Marker> {
        id.checked_sub(1).and_then(|i| self.markers.get(i))
    }

    /// Add a marker at the end; returns its id.
    pub fn add(&mut self, position: GeoPoint) -> usize {
        let id = self.markers.len() + 1;
        self.markers.push(Marker {
            id,
            position,
            series: Vec::new(),
        });
        id
    }

    /// Reposition a marker. Returns false for an unknown id.
    pub fn move_to(&mut self, id: usize, position: GeoPoint) -> bool {
        match id.checked_sub(1).and_then(|i| self.markers.get_mut(i)) {
            Some(marker) => {
                marker.position = position;
                true
            }
            None => false,
        }
    }

    /// Remove a marker and renumber the rest. Returns false for an unknown id.
    pub fn remove(&mut self, id: usize) -> bool {
        let Some(i) = id.checked_sub(1).filter(|i| *i < self.markers.len()) else {
            return false;
        };
        self.markers.remove(i);
        for (i, marker) in self.markers.iter_mut().enumerate() {
            marker.id = i + 1;
        }
        true
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Empty every series, keeping the markers.
    pub fn clear_series(&mut self) {
        for marker in &mut self.markers {
            marker.series.clear();
        }
    }

    pub fn has_samples(&self) -> bool {
        self.markers.iter().any(|m| !m.series.is_empty())
    }

    /// Screen position of a marker over a grid, snapped to its nearest cell.
    pub fn screen_position(marker: &Marker, extent: &GridExtent, frame: &PixelFrame) -> (f64, f64) {
        index_to_pixel(frame, geo_to_index(extent, marker.position))
    }

    /// Topmost marker within [`MARKER_HIT_RADIUS`] of a pixel.
    pub fn marker_at_pixel(&self, extent: &GridExtent, frame: &PixelFrame, px: f64, py: f64) -> Option<usize> {
        self.markers
            .iter()
            .rev()
            .find(|m| {
                let (x, y) = Self::screen_position(m, extent, frame);
                (x - px).hypot(y - py) <= MARKER_HIT_RADIUS
            })
            .map(|m| m.id)
    }
}
