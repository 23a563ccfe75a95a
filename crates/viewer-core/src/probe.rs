//! Value and position under the cursor, for the status bar.

use message_store::MessageStore;
use projection::{fraction_to_geo, pixel_to_grid};

use crate::state::AppState;

/// Status bar text when the cursor is not over a value.
pub const IDLE_HINT: &str = "Place mouse over the map for value - Scroll: Zoom, Right Drag: Pan";

/// What the cursor is pointing at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub lat: f64,
    pub lon: f64,
    /// `None` over a missing sample
    pub value: Option<f64>,
}

impl Probe {
    /// One-line status bar text.
    pub fn status_text(probe: Option<&Probe>) -> String {
        match probe {
            Some(Probe {
                lat,
                lon,
                value: Some(value),
            }) => format!(
                "Lat={:.3} Lon={:.3} Val={:.3} - Scroll: Zoom, Right Drag: Pan",
                lat, lon, value
            ),
            _ => IDLE_HINT.to_string(),
        }
    }
}

impl<S: MessageStore> AppState<S> {
    /// Probe the active raster at a screen pixel.
    ///
    /// Positions outside the grid give `None`. The value is read from the
    /// cell containing the point, not the nearest one.
    pub fn probe(&self, x: f64, y: f64) -> Option<Probe> {
        let position = self.selection.active()?;
        let record = self.records.get(position)?;
        self.raster.as_ref()?.image.as_ref()?;

        let point = pixel_to_grid(&record.extent, &self.view.frame(), x, y)?;
        let geo = fraction_to_geo(&record.extent, point.to_fraction(&record.extent));
        let grid = self.decode_position(position)?;

        Some(Probe {
            lat: geo.lat,
            lon: geo.lon,
            value: grid.value_at(point.cell()),
        })
    }

    /// Status bar text for a cursor position.
    pub fn probe_status(&self, x: f64, y: f64) -> String {
        Probe::status_text(self.probe(x, y).as_ref())
    }
}
