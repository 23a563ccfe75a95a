//! Test helpers shared across the gribview crates: grid and extent
//! fixtures, a synthetic GRIB2 message builder and temp-file helpers.

pub mod fixtures;
pub mod generators;
pub mod grib2;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use grib2::{grib1_stub, overwrite_grid_dimensions, Grib2Builder};
pub use paths::*;

/// Assert two numbers differ by at most `epsilon`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($actual:expr, $expected:expr, $epsilon:expr) => {{
        let (actual, expected, epsilon) = ($actual as f64, $expected as f64, $epsilon as f64);
        assert!(
            (actual - expected).abs() <= epsilon,
            "assertion failed: {} is not within {} of {}",
            actual,
            epsilon,
            expected
        );
    }};
}

/// Assert a (lat, lon) pair against another within `epsilon`.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($lat1:expr, $lon1:expr), ($lat2:expr, $lon2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($lat1, $lat2, $epsilon);
        $crate::assert_approx_eq!($lon1, $lon2, $epsilon);
    }};
}
