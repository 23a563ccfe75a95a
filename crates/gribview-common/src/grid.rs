//! Grid extents and decoded sample sets.

use serde::{Deserialize, Serialize};

/// Raw value used by producers to flag "no data".
pub const MISSING_VALUE: f64 = 9999.0;

const MISSING_TOLERANCE: f64 = 1e-8;

/// Shape and corner coordinates of a regular lat/lon grid.
///
/// `lat1`/`lon1` locate the first grid point and `lat2`/`lon2` the last one,
/// so a grid may run north-to-south (`lat1 > lat2`) or south-to-north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridExtent {
    /// Number of columns (points along a parallel)
    pub ni: usize,
    /// Number of rows (points along a meridian)
    pub nj: usize,
    pub lat1: f64,
    pub lon1: f64,
    pub lat2: f64,
    pub lon2: f64,
}

impl GridExtent {
    pub fn new(ni: usize, nj: usize, lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Self {
        Self {
            ni,
            nj,
            lat1,
            lon1,
            lat2,
            lon2,
        }
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.ni * self.nj
    }

    /// Check if grid has no points.
    pub fn is_empty(&self) -> bool {
        self.ni == 0 || self.nj == 0
    }

    /// Row-major offset of a column/row pair.
    pub fn flat_index(&self, index: GridIndex) -> usize {
        index.j * self.ni + index.i
    }

    /// Whether the grid has at least two points in each direction, which
    /// pixel picking needs to normalize by `N-1`.
    pub fn is_pickable(&self) -> bool {
        self.ni > 1 && self.nj > 1
    }
}

/// Column (`i`) and row (`j`) of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    pub i: usize,
    pub j: usize,
}

impl GridIndex {
    pub fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }
}

/// A decoded field: extent plus row-major samples, with missing points as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGrid {
    pub extent: GridExtent,
    pub values: Vec<f64>,
}

impl DecodedGrid {
    /// Build a grid, converting the missing sentinel to NaN.
    pub fn new(extent: GridExtent, mut values: Vec<f64>) -> Self {
        mask_missing(&mut values);
        Self { extent, values }
    }

    /// An empty sample set, the result of a failed decode.
    pub fn empty(extent: GridExtent) -> Self {
        Self {
            extent,
            values: Vec::new(),
        }
    }

    /// True when the samples cover the extent and the extent is non-degenerate.
    pub fn has_samples(&self) -> bool {
        !self.extent.is_empty() && !self.values.is_empty() && self.values.len() >= self.extent.len()
    }

    /// Minimum and maximum of the non-missing samples, `(0, 0)` if there are none.
    pub fn value_range(&self) -> (f64, f64) {
        let (min, max) = self
            .values
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        if min.is_infinite() || max.is_infinite() {
            (0.0, 0.0)
        } else {
            (min, max)
        }
    }

    /// Sample at a cell, `None` when missing or out of range.
    pub fn value_at(&self, index: GridIndex) -> Option<f64> {
        if index.i >= self.extent.ni || index.j >= self.extent.nj {
            return None;
        }
        self.values
            .get(self.extent.flat_index(index))
            .copied()
            .filter(|v| !v.is_nan())
    }
}

/// Replace every missing-sentinel sample with NaN in place.
pub fn mask_missing(values: &mut [f64]) {
    for v in values.iter_mut() {
        if (*v - MISSING_VALUE).abs() < MISSING_TOLERANCE {
            *v = f64::NAN;
        }
    }
}
