//! Input events from a host loop, applied to the state in arrival order.

use std::path::PathBuf;

use message_store::MessageStore;

use crate::extraction::TickOutcome;
use crate::selection::{ClickMode, StepDirection};
use crate::state::AppState;

/// Everything a host can ask of the viewer core.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    LoadFiles(Vec<String>),
    ClearAll,
    Sort { column: String, ascending: bool },
    DeleteSelected,
    ToggleColumn(String),
    Inspect(usize),

    Click { position: usize, mode: ClickMode },
    Step { direction: StepDirection, extend: bool },

    Wheel { x: f64, y: f64, delta: f64 },
    PanStart { x: f64, y: f64 },
    PanMove { x: f64, y: f64 },
    PanEnd,
    ResetView,

    PlaceMarker { x: f64, y: f64 },
    MoveMarker { id: usize, x: f64, y: f64 },
    RemoveMarker(usize),

    StartExtraction,
    StopExtraction,
    Tick,

    SetRange { min: f64, max: f64 },
    SetAutoFit(bool),
    ApplyRange,
    Refit,
    SetColormap(String),

    ExportPng(PathBuf),
    ExportCsv(PathBuf),
    SaveSelection(PathBuf),
}

impl<S: MessageStore> AppState<S> {
    /// Apply one event. Returns the tick outcome for [`ViewerEvent::Tick`].
    pub fn handle(&mut self, event: ViewerEvent) -> Option<TickOutcome> {
        match event {
            ViewerEvent::LoadFiles(sources) => {
                self.load_files(sources);
            }
            ViewerEvent::ClearAll => self.clear_all(),
            ViewerEvent::Sort { column, ascending } => self.sort_by(&column, ascending),
            ViewerEvent::DeleteSelected => {
                self.delete_selected();
            }
            ViewerEvent::ToggleColumn(key) => {
                self.toggle_column(&key);
            }
            ViewerEvent::Inspect(position) => {
                self.inspect(position);
            }

            ViewerEvent::Click { position, mode } => self.click(position, mode),
            ViewerEvent::Step { direction, extend } => self.step(direction, extend),

            ViewerEvent::Wheel { x, y, delta } => self.zoom_at(x, y, delta),
            ViewerEvent::PanStart { x, y } => {
                self.view.begin_pan(x, y);
            }
            ViewerEvent::PanMove { x, y } => self.view.drag_to(x, y),
            ViewerEvent::PanEnd => self.view.end_pan(),
            ViewerEvent::ResetView => self.view.reset_to_fit(),

            ViewerEvent::PlaceMarker { x, y } => {
                self.place_marker(x, y);
            }
            ViewerEvent::MoveMarker { id, x, y } => {
                self.move_marker(id, x, y);
            }
            ViewerEvent::RemoveMarker(id) => {
                self.remove_marker(id);
            }

            ViewerEvent::StartExtraction => {
                self.start_extraction();
            }
            ViewerEvent::StopExtraction => self.stop_extraction(),
            ViewerEvent::Tick => return Some(self.tick()),

            ViewerEvent::SetRange { min, max } => self.set_value_range(min, max),
            ViewerEvent::SetAutoFit(on) => self.set_auto_fit(on),
            ViewerEvent::ApplyRange => self.apply_range(),
            ViewerEvent::Refit => self.refit(),
            ViewerEvent::SetColormap(name) => self.set_colormap(&name),

            // Failures are reported through the export status
            ViewerEvent::ExportPng(path) => {
                let _ = self.export_png(&path);
            }
            ViewerEvent::ExportCsv(path) => {
                let _ = self.export_csv(&path);
            }
            ViewerEvent::SaveSelection(path) => {
                self.save_selection(&path);
            }
        }
        None
    }

    /// Apply a batch of queued events in order.
    pub fn handle_all<I>(&mut self, events: I) -> Vec<TickOutcome>
    where
        I: IntoIterator<Item = ViewerEvent>,
    {
        events.into_iter().filter_map(|e| self.handle(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use message_store::MemoryStore;
    use test_utils::{bootstrap_attributes, extent};

    #[test]
    fn test_events_apply_in_order() {
        let mut store = MemoryStore::new();
        for step in 0..3 {
            store.add_grid(
                "mem",
                extent::small_2x2(),
                bootstrap_attributes("TMP", 850, "20240115", step),
                vec![1.0, 2.0, 3.0, 4.0],
            );
        }
        let mut state = AppState::new(store, ViewerConfig::default());
        let zoom_center = 930.0 / 2.0;

        let outcomes = state.handle_all([
            ViewerEvent::LoadFiles(vec!["mem".to_string()]),
            ViewerEvent::PlaceMarker {
                x: zoom_center,
                y: zoom_center,
            },
            ViewerEvent::StartExtraction,
            ViewerEvent::Tick,
            ViewerEvent::Tick,
            ViewerEvent::Tick,
            ViewerEvent::Tick,
        ]);

        assert_eq!(
            outcomes,
            vec![
                TickOutcome::Progress { frame: 1, total: 3 },
                TickOutcome::Progress { frame: 2, total: 3 },
                TickOutcome::Done,
                TickOutcome::Idle,
            ]
        );
        let marker = state.markers().get(1).unwrap();
        assert_eq!(marker.series.len(), 3);
        assert!(marker.series.iter().all(|s| s.value == Some(4.0)));
    }

    #[test]
    fn test_failed_export_event_reports_status() {
        let mut state = AppState::new(MemoryStore::new(), ViewerConfig::default());
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing").join("view.png");

        assert_eq!(state.handle(ViewerEvent::ExportPng(out.clone())), None);
        let status = state.export_status().unwrap();
        assert!(!status.success);
        assert!(!out.exists());
    }
}
