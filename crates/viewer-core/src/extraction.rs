//! Cooperative time-series extraction: one record per tick.

use message_store::MessageStore;
use projection::geo_to_index;
use tracing::{debug, info};

use crate::markers::Sample;
use crate::state::AppState;

pub const STATUS_STARTED: &str = "Extracting…";
pub const STATUS_DONE: &str = "Extraction done";
pub const STATUS_NO_MARKERS: &str = "No markers to extract";
pub const STATUS_NO_RECORDS: &str = "No records loaded";

/// Result of one scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// No run in progress; nothing was done
    Idle,
    /// One record processed; `frame` of `total` done so far
    Progress { frame: usize, total: usize },
    /// The last record was processed
    Done,
    /// The run stopped early
    Aborted(String),
}

/// Progress cursor of the extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    cursor: usize,
    running: bool,
    status: String,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Next record position to process.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    fn begin(&mut self, cursor: usize) {
        self.cursor = cursor;
        self.running = true;
        self.status = STATUS_STARTED.to_string();
    }

    /// Stop without finishing, keeping the cursor where it was.
    pub fn halt(&mut self, status: impl Into<String>) {
        self.running = false;
        self.status = status.into();
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

impl<S: MessageStore> AppState<S> {
    /// Begin a run over the record list from the active record.
    ///
    /// Needs at least one marker and one record. Clears every series.
    pub fn start_extraction(&mut self) -> bool {
        if self.markers.is_empty() {
            self.extraction.halt(STATUS_NO_MARKERS);
            return false;
        }
        if self.records.is_empty() {
            self.extraction.halt(STATUS_NO_RECORDS);
            return false;
        }

        self.markers.clear_series();
        let cursor = self.selection.active().unwrap_or(0);
        self.extraction.begin(cursor);
        info!(
            markers = self.markers.len(),
            records = self.records.len(),
            start = cursor,
            "Extraction started"
        );
        true
    }

    /// Stop a run in progress.
    pub fn stop_extraction(&mut self) {
        if self.extraction.is_running() {
            self.extraction.halt("Extraction stopped");
            info!(cursor = self.extraction.cursor(), "Extraction stopped");
        }
    }

    /// Process the record under the cursor.
    ///
    /// The record is decoded once; the same samples feed every marker and
    /// the raster of the now active record. A record that fails to decode
    /// contributes a missing sample to each marker.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.extraction.is_running() {
            return TickOutcome::Idle;
        }
        if self.markers.is_empty() {
            return self.abort("Extraction aborted: no markers");
        }
        if self.records.is_empty() {
            return self.abort("Extraction aborted: no records");
        }

        let total = self.records.len();
        let position = self.extraction.cursor;
        if position >= total {
            return self.finish();
        }

        let Some(grid) = self.decode_position(position) else {
            return self.abort("Extraction aborted: record missing");
        };
        let Some(record) = self.records.get(position) else {
            return self.abort("Extraction aborted: record missing");
        };
        let record_id = record.id;
        let extent = record.extent;

        for marker in self.markers.iter_mut() {
            let value = if grid.has_samples() {
                grid.value_at(geo_to_index(&extent, marker.position))
            } else {
                None
            };
            marker.series.push(Sample {
                record: record_id,
                value,
            });
        }

        self.selection.single_select(self.records.as_mut_slice(), position);
        self.render_grid_at(position, &grid);
        self.scroll_request = Some(position);

        self.extraction.cursor += 1;
        let frame = self.extraction.cursor;
        self.extraction.set_status(format!("Frame {}/{}", frame, total));
        debug!(frame = frame, total = total, record = record_id.0, "Extraction tick");

        if frame >= total {
            return self.finish();
        }
        TickOutcome::Progress { frame, total }
    }

    /// Tick until the run ends. Returns the final outcome.
    pub fn run_extraction_to_end(&mut self) -> TickOutcome {
        loop {
            match self.tick() {
                TickOutcome::Progress { .. } => continue,
                outcome => return outcome,
            }
        }
    }

    fn finish(&mut self) -> TickOutcome {
        self.extraction.halt(STATUS_DONE);
        info!(records = self.records.len(), markers = self.markers.len(), "Extraction done");
        TickOutcome::Done
    }

    fn abort(&mut self, reason: &str) -> TickOutcome {
        self.extraction.halt(reason);
        info!(reason = reason, "Extraction aborted");
        TickOutcome::Aborted(reason.to_string())
    }
}
