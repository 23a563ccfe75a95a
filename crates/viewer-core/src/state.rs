//! The application-state aggregate every viewer operation runs against.

use gribview_common::{DecodeError, FieldRecord, RecordId};
use message_store::MessageStore;
use projection::{pixel_to_geo, GeoPoint};
use renderer::{ColormapRegistry, ValueRange};
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::export::SaveStatus;
use crate::extraction::Extraction;
use crate::markers::MarkerStore;
use crate::records::{ColumnSet, RecordList};
use crate::render::{ActiveRaster, RenderSettings};
use crate::selection::{ClickMode, Selection, StepDirection};
use crate::view::{Canvas, ViewTransform};

/// Records, selection, view, markers and extraction progress of one session.
///
/// All mutation goes through `&mut self`, one event at a time.
pub struct AppState<S: MessageStore> {
    pub(crate) store: S,
    pub(crate) config: ViewerConfig,
    pub(crate) colormaps: ColormapRegistry,
    pub(crate) records: RecordList,
    pub(crate) columns: ColumnSet,
    pub(crate) selection: Selection,
    pub(crate) view: ViewTransform,
    pub(crate) markers: MarkerStore,
    pub(crate) extraction: Extraction,
    pub(crate) render: RenderSettings,
    pub(crate) raster: Option<ActiveRaster>,
    pub(crate) scroll_request: Option<usize>,
    pub(crate) save_status: Option<SaveStatus>,
    pub(crate) export_status: Option<SaveStatus>,
}

impl<S: MessageStore> AppState<S> {
    pub fn new(store: S, config: ViewerConfig) -> Self {
        let mut colormaps = ColormapRegistry::builtin();
        if let Some(path) = &config.colormap_file {
            match colormaps.load_file(path) {
                Ok(count) => info!(path = %path.display(), count = count, "Loaded colormaps"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to load colormaps"),
            }
        }

        let canvas = Canvas::new(0.0, 0.0, config.canvas_width, config.canvas_height);
        Self {
            store,
            columns: ColumnSet::new(config.columns.iter().cloned()),
            render: RenderSettings::from_config(&config),
            config,
            colormaps,
            records: RecordList::new(),
            selection: Selection::new(),
            view: ViewTransform::new(canvas),
            markers: MarkerStore::new(),
            extraction: Extraction::new(),
            raster: None,
            scroll_request: None,
            save_status: None,
            export_status: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn records(&self) -> &RecordList {
        &self.records
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewTransform {
        &mut self.view
    }

    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    pub fn extraction(&self) -> &Extraction {
        &self.extraction
    }

    pub fn render_settings(&self) -> &RenderSettings {
        &self.render
    }

    pub fn colormaps(&self) -> &ColormapRegistry {
        &self.colormaps
    }

    pub fn raster(&self) -> Option<&ActiveRaster> {
        self.raster.as_ref()
    }

    pub fn save_status(&self) -> Option<&SaveStatus> {
        self.save_status.as_ref()
    }

    /// Outcome of the last PNG or CSV export.
    pub fn export_status(&self) -> Option<&SaveStatus> {
        self.export_status.as_ref()
    }

    pub fn active_record(&self) -> Option<&FieldRecord> {
        self.selection.active().and_then(|p| self.records.get(p))
    }

    /// Row the record table should scroll to, consumed on read.
    pub fn take_scroll_request(&mut self) -> Option<usize> {
        self.scroll_request.take()
    }

    // ------------------------------------------------------------------
    // Record list
    // ------------------------------------------------------------------

    /// Append every message of one source.
    pub fn load_source(&mut self, source: &str) -> Result<usize, DecodeError> {
        let headers = self.store.list_messages(source)?;
        let added = self.records.append(headers);
        info!(source = source, records = added.len(), total = self.records.len(), "Loaded source");
        Ok(added.len())
    }

    /// Append several sources, skipping unreadable ones.
    ///
    /// When anything was added, the first new record becomes the only
    /// selected and active record and the view is fitted to it.
    pub fn load_files<I, T>(&mut self, sources: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let first_new = self.records.len();
        let mut added = 0;
        for source in sources {
            let source = source.as_ref();
            match self.load_source(source) {
                Ok(count) => added += count,
                Err(e) => warn!(source = source, error = %e, "Failed to load source"),
            }
        }

        if added > 0 {
            self.selection.single_select(self.records.as_mut_slice(), first_new);
            self.render_active();
            self.view.reset_to_fit();
            self.scroll_request = Some(first_new);
        }
        added
    }

    /// Drop every record and reset everything derived from them.
    pub fn clear_all(&mut self) {
        self.records.clear();
        self.selection.reset();
        self.scroll_request = None;
        self.save_status = None;
        self.export_status = None;
        self.raster = None;
        self.view.clear_texture();
        self.invalidate_series("records cleared");
        info!("Cleared all records");
    }

    /// Stable sort by a column; the first selected record becomes active and anchor.
    pub fn sort_by(&mut self, column: &str, ascending: bool) {
        let previous = self.active_record().map(|r| r.id);
        self.records.sort_by_column(column, ascending);

        let active = self.selection.refresh(self.records.as_slice(), None);
        self.selection.set_anchor(active);
        self.invalidate_series("records reordered");
        self.after_activation(previous);
        // The active record usually keeps its id but lands on a new row
        self.scroll_request = self.selection.active();
        debug!(column = column, ascending = ascending, "Sorted records");
    }

    /// Delete every selected record; the first remaining one becomes active.
    pub fn delete_selected(&mut self) -> usize {
        let removed = self.records.remove_selected();
        if removed == 0 {
            return 0;
        }

        self.selection.reset();
        if !self.records.is_empty() {
            self.selection.single_select(self.records.as_mut_slice(), 0);
        }
        self.invalidate_series("records deleted");
        self.render_active();
        self.scroll_request = self.selection.active();
        info!(removed = removed, remaining = self.records.len(), "Deleted records");
        removed
    }

    /// Load the full attribute table of a record on first inspection.
    ///
    /// Returns the record's keys, sorted. A failed lookup leaves the
    /// bootstrap attributes in place.
    pub fn inspect(&mut self, position: usize) -> Vec<String> {
        let Some(record) = self.records.get_mut(position) else {
            return Vec::new();
        };
        if !record.fully_detailed {
            match self.store.full_attributes(&record.locator) {
                Ok(full) => {
                    record.attributes.merge_missing(&full);
                    record.fully_detailed = true;
                }
                Err(e) => warn!(index = record.index, error = %e, "Failed to read full attributes"),
            }
        }
        record.attributes.keys().map(String::from).collect()
    }

    /// Keys that can be shown as table columns.
    pub fn available_columns(&self) -> Vec<String> {
        self.records.available_columns()
    }

    /// Show or hide a table column.
    pub fn toggle_column(&mut self, key: &str) -> bool {
        self.columns.toggle(key)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn click(&mut self, position: usize, mode: ClickMode) {
        let previous = self.active_record().map(|r| r.id);
        self.selection.click(self.records.as_mut_slice(), position, mode);
        self.after_activation(previous);
    }

    pub fn step(&mut self, direction: StepDirection, extend: bool) {
        let previous = self.active_record().map(|r| r.id);
        self.selection.step(self.records.as_mut_slice(), direction, extend);
        self.after_activation(previous);
    }

    /// Re-render and request a scroll when the active record changed.
    fn after_activation(&mut self, previous: Option<RecordId>) {
        let current = self.active_record().map(|r| r.id);
        if current != previous {
            self.render_active();
            self.scroll_request = self.selection.active();
        }
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    /// Zoom at a cursor position by `wheel` notches.
    pub fn zoom_at(&mut self, x: f64, y: f64, wheel: f64) {
        self.view.zoom_at(x, y, wheel, self.config.zoom_step);
    }

    /// Geographic point under a pixel of the active raster.
    pub fn pixel_to_geo(&self, x: f64, y: f64) -> Option<GeoPoint> {
        let record = self.active_record()?;
        self.raster.as_ref()?.image.as_ref()?;
        pixel_to_geo(&record.extent, &self.view.frame(), x, y)
    }

    // ------------------------------------------------------------------
    // Markers
    // ------------------------------------------------------------------

    /// Place a marker at a pixel over the active raster.
    pub fn place_marker(&mut self, x: f64, y: f64) -> Option<usize> {
        let position = self.pixel_to_geo(x, y)?;
        let id = self.markers.add(position);
        debug!(id = id, lat = position.lat, lon = position.lon, "Placed marker");
        Some(id)
    }

    /// Place a marker at a known geographic position.
    pub fn add_marker(&mut self, position: GeoPoint) -> usize {
        self.markers.add(position)
    }

    /// Drag a marker to a new pixel. Clears every series.
    pub fn move_marker(&mut self, id: usize, x: f64, y: f64) -> bool {
        let Some(position) = self.pixel_to_geo(x, y) else {
            return false;
        };
        let moved = self.markers.move_to(id, position);
        if moved {
            self.invalidate_series("marker moved");
        }
        moved
    }

    /// Remove a marker. Clears every series.
    pub fn remove_marker(&mut self, id: usize) -> bool {
        let removed = self.markers.remove(id);
        if removed {
            self.invalidate_series("marker removed");
        }
        removed
    }

    /// Marker under a pixel, hit-tested against the active record's grid.
    pub fn marker_at(&self, x: f64, y: f64) -> Option<usize> {
        let record = self.active_record()?;
        self.markers.marker_at_pixel(&record.extent, &self.view.frame(), x, y)
    }

    /// Screen positions of every marker over the active record.
    pub fn marker_screen_positions(&self) -> Vec<(usize, (f64, f64))> {
        let Some(record) = self.active_record() else {
            return Vec::new();
        };
        let frame = self.view.frame();
        self.markers
            .iter()
            .map(|m| (m.id, MarkerStore::screen_position(m, &record.extent, &frame)))
            .collect()
    }

    /// Series no longer line up with the record list: empty them and stop
    /// any extraction in progress.
    pub(crate) fn invalidate_series(&mut self, reason: &str) {
        self.markers.clear_series();
        if self.extraction.is_running() {
            self.extraction.halt(format!("Extraction halted: {}", reason));
            info!(reason = reason, "Extraction halted");
        }
    }

    /// Current color range.
    pub fn value_range(&self) -> ValueRange {
        self.render.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use message_store::MemoryStore;
    use test_utils::{bootstrap_attributes, extent};

    fn state_with(count: usize) -> AppState<MemoryStore> {
        let mut store = MemoryStore::new();
        for step in 0..count {
            store.add_grid(
                "mem",
                extent::small_2x2(),
                bootstrap_attributes("TMP", 850, "20240115", step as u32 * 6),
                vec![step as f64, 1.0, 2.0, 3.0],
            );
        }
        let mut state = AppState::new(store, ViewerConfig::default());
        state.load_files(["mem"]);
        state
    }

    #[test]
    fn test_load_selects_first_new_record() {
        let mut state = state_with(3);
        assert_eq!(state.selection().active(), Some(0));
        assert_eq!(state.take_scroll_request(), Some(0));
        assert_eq!(state.take_scroll_request(), None);

        // Loading the same source again appends after the existing three
        assert_eq!(state.load_files(["mem", "missing"]), 3);
        assert_eq!(state.records().len(), 6);
        assert_eq!(state.selection().active(), Some(3));
        assert_eq!(state.records().get(5).unwrap().index, 6);
    }

    #[test]
    fn test_load_fits_view_to_active_raster() {
        let state = state_with(1);
        assert_eq!(state.view().texture_size(), Some((2, 2)));
        assert_eq!(state.view().zoom(), 930.0 / 2.0);
    }

    #[test]
    fn test_delete_selects_first_remaining() {
        let mut state = state_with(4);
        state.click(1, ClickMode::Single);
        state.click(2, ClickMode::Toggle);
        assert_eq!(state.delete_selected(), 2);

        assert_eq!(state.records().len(), 2);
        assert_eq!(state.selection().active(), Some(0));
        let offsets: Vec<u64> = state.records().iter().map(|r| r.locator.offset).collect();
        assert_eq!(offsets, vec![0, 3]);
    }

    #[test]
    fn test_delete_everything_clears_raster() {
        let mut state = state_with(2);
        state.click(1, ClickMode::Range);
        assert_eq!(state.delete_selected(), 2);
        assert!(state.records().is_empty());
        assert_eq!(state.selection().active(), None);
        assert!(state.raster().is_none());
    }

    #[test]
    fn test_sort_keeps_selection_on_moved_record() {
        let mut state = state_with(3);
        state.click(2, ClickMode::Single);
        state.sort_by("stepRange", false);

        assert_eq!(state.selection().active(), Some(0));
        assert_eq!(state.selection().anchor(), Some(0));
        assert_eq!(state.active_record().unwrap().attributes.get("stepRange"), Some("12"));
    }

    #[test]
    fn test_sort_scrolls_to_moved_active_record() {
        let mut state = state_with(3);
        state.take_scroll_request();

        state.sort_by("stepRange", false);
        assert_eq!(state.active_record().unwrap().attributes.get("stepRange"), Some("0"));
        assert_eq!(state.take_scroll_request(), Some(2));

        // Same active record on the same row still asks for a scroll
        state.sort_by("stepRange", false);
        assert_eq!(state.take_scroll_request(), Some(2));
    }

    #[test]
    fn test_inspect_loads_full_table_once() {
        let mut state = state_with(1);
        let keys = state.inspect(0);
        assert!(keys.contains(&"numberOfDataPoints".to_string()));
        assert!(!keys.contains(&"values".to_string()));
        assert!(state.records().get(0).unwrap().fully_detailed);
        assert!(state.inspect(9).is_empty());
    }

    #[test]
    fn test_clear_all_resets() {
        let mut state = state_with(2);
        state.clear_all();
        assert!(state.records().is_empty());
        assert!(state.selection().active().is_none());
        assert!(state.save_status().is_none());
        assert!(state.available_columns().is_empty());
    }
}
