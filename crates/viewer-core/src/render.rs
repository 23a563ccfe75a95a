//! Colour-scale settings and rasterizing the active record.

use gribview_common::{DecodedGrid, RecordId};
use message_store::MessageStore;
use renderer::{render_grid, RgbaImage, ValueRange};
use tracing::{debug, warn};

use crate::config::ViewerConfig;
use crate::state::AppState;

/// Colour-scale controls.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub colormap: String,
    /// Replace the range with each new raster's min/max
    pub auto_fit: bool,
    pub range: ValueRange,
}

impl RenderSettings {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            colormap: config.colormap.clone(),
            auto_fit: config.auto_fit,
            range: ValueRange::new(config.value_min, config.value_max),
        }
    }
}

/// Raster currently shown for the active record.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRaster {
    pub record: RecordId,
    /// `None` when the record failed to decode
    pub image: Option<RgbaImage>,
}

impl<S: MessageStore> AppState<S> {
    /// Decode a record, degrading any failure to an empty grid.
    pub(crate) fn decode_position(&self, position: usize) -> Option<DecodedGrid> {
        let record = self.records.get(position)?;
        match self.store.decode(&record.locator) {
            Ok(grid) => Some(grid),
            Err(e) => {
                warn!(index = record.index, source = %record.locator.source, error = %e, "Decode failed");
                Some(DecodedGrid::empty(record.extent))
            }
        }
    }

    /// Decode and rasterize the active record, or clear the raster when
    /// nothing is active.
    pub fn render_active(&mut self) {
        let Some(position) = self.selection.active() else {
            self.raster = None;
            self.view.clear_texture();
            return;
        };
        if let Some(grid) = self.decode_position(position) {
            self.render_grid_at(position, &grid);
        }
    }

    /// Rasterize already-decoded samples for the record at `position`.
    pub(crate) fn render_grid_at(&mut self, position: usize, grid: &DecodedGrid) {
        let Some(record) = self.records.get_mut(position) else {
            return;
        };

        let (min, max) = if grid.has_samples() {
            grid.value_range()
        } else {
            (0.0, 0.0)
        };
        record.min_val = min;
        record.max_val = max;
        let id = record.id;

        if self.render.auto_fit {
            self.render.range = ValueRange::new(min, max);
        }

        let image = if grid.has_samples() {
            let colormap = self.colormaps.get(&self.render.colormap);
            let image = render_grid(
                &grid.values,
                grid.extent.ni,
                grid.extent.nj,
                &self.render.range,
                colormap,
            );
            self.view.set_texture(grid.extent.ni, grid.extent.nj);
            Some(image)
        } else {
            self.view.clear_texture();
            None
        };

        debug!(
            record = id.0,
            min = min,
            max = max,
            rendered = image.is_some(),
            "Rendered record"
        );
        self.raster = Some(ActiveRaster { record: id, image });
    }

    /// Set the colour range by hand; takes effect on the next render.
    ///
    /// With auto-fit on, that render replaces it again.
    pub fn set_value_range(&mut self, min: f64, max: f64) {
        self.render.range = ValueRange::new(min, max);
    }

    pub fn set_auto_fit(&mut self, auto_fit: bool) {
        self.render.auto_fit = auto_fit;
    }

    /// Re-render the active record with the current range.
    pub fn apply_range(&mut self) {
        self.render_active();
    }

    /// Turn auto-fit back on and re-render.
    pub fn refit(&mut self) {
        self.render.auto_fit = true;
        self.render_active();
    }

    /// Switch colormap; unknown names render grey.
    pub fn set_colormap(&mut self, name: &str) {
        if !self.colormaps.contains(name) {
            warn!(colormap = name, "Unknown colormap, rendering grey");
        }
        self.render.colormap = name.to_string();
        self.render_active();
    }

    /// Colormap names for a picker, sorted.
    pub fn colormap_names(&self) -> Vec<&str> {
        self.colormaps.names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::ClickMode;
    use message_store::MemoryStore;
    use renderer::Color;
    use test_utils::{bootstrap_attributes, extent};

    fn state(values: Vec<f64>) -> AppState<MemoryStore> {
        let mut store = MemoryStore::new();
        store.add_grid("mem", extent::small_2x2(), bootstrap_attributes("TMP", 850, "20240115", 0), values);
        let mut state = AppState::new(store, ViewerConfig::default());
        state.load_files(["mem"]);
        state
    }

    #[test]
    fn test_auto_fit_sets_range_and_record_extremes() {
        let state = state(vec![270.0, 9999.0, 280.0, 290.0]);
        assert_eq!(state.value_range(), ValueRange::new(270.0, 290.0));

        let record = state.records().get(0).unwrap();
        assert_eq!((record.min_val, record.max_val), (270.0, 290.0));

        let image = state.raster().unwrap().image.as_ref().unwrap();
        assert_eq!(image.pixel(1, 0).unwrap().a, 0);
        assert_eq!(image.pixel(0, 0).unwrap().a, 255);
    }

    #[test]
    fn test_manual_range_applies() {
        let mut state = state(vec![0.0, 1.0, 2.0, 3.0]);
        state.set_value_range(10.0, 20.0);
        state.apply_range();
        assert_eq!(state.value_range(), ValueRange::new(0.0, 3.0));

        state.set_auto_fit(false);
        state.set_value_range(10.0, 20.0);
        state.apply_range();
        assert_eq!(state.value_range(), ValueRange::new(10.0, 20.0));

        // Everything is below the range, so every pixel takes the first entry
        let image = state.raster().unwrap().image.clone().unwrap();
        let first = state.colormaps().get("jet").entry(0);
        assert_eq!(image.pixel(1, 1), Some(Color::new(first.r, first.g, first.b, 255)));

        state.refit();
        assert_eq!(state.value_range(), ValueRange::new(0.0, 3.0));
    }

    #[test]
    fn test_decode_failure_renders_nothing() {
        let mut store = MemoryStore::new();
        store.add_corrupt("mem", extent::small_2x2(), bootstrap_attributes("TMP", 850, "20240115", 0));
        let mut state = AppState::new(store, ViewerConfig::default());
        state.load_files(["mem"]);

        let raster = state.raster().unwrap();
        assert!(raster.image.is_none());
        let record = state.records().get(0).unwrap();
        assert_eq!((record.min_val, record.max_val), (0.0, 0.0));
    }

    #[test]
    fn test_undecodable_record_drops_previous_texture() {
        let mut store = MemoryStore::new();
        store.add_grid("mem", extent::small_2x2(), bootstrap_attributes("TMP", 850, "20240115", 0), vec![1.0; 4]);
        store.add_corrupt("mem", extent::small_2x2(), bootstrap_attributes("TMP", 850, "20240115", 6));
        let mut state = AppState::new(store, ViewerConfig::default());
        state.load_files(["mem"]);
        assert_eq!(state.view().texture_size(), Some((2, 2)));

        state.click(1, ClickMode::Single);
        assert!(state.raster().unwrap().image.is_none());
        assert_eq!(state.view().texture_size(), None);
    }

    #[test]
    fn test_unknown_colormap_falls_back_to_grey() {
        let mut state = state(vec![0.0, 1.0, 2.0, 3.0]);
        state.set_colormap("no-such-map");
        let image = state.raster().unwrap().image.clone().unwrap();
        let last = state.colormaps().get("grey").entry(511);
        let p = image.pixel(1, 1).unwrap();
        assert_eq!((p.r, p.g, p.b), (last.r, last.g, last.b));
        assert!(state.colormap_names().contains(&"jet"));
    }
}
