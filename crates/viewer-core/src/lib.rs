//! Interactive core of the GRIB viewer.
//!
//! Everything a windowed or headless host needs, without the window:
//! - `state`: the [`AppState`] aggregate over a [`MessageStore`](message_store::MessageStore)
//! - `records` and `selection`: the record table and its multi-select rules
//! - `view`: pan and anchored zoom of the active raster
//! - `render` and `probe`: rasterizing the active record, reading values under the cursor
//! - `markers` and `extraction`: geographic sample points and the one-record-per-tick scheduler
//! - `export`: PNG, CSV and raw-message outputs
//! - `events`: host input applied in arrival order
//! - `config`: [`ViewerConfig`] from defaults, YAML and environment

pub mod config;
pub mod events;
pub mod export;
pub mod extraction;
pub mod markers;
pub mod probe;
pub mod records;
pub mod render;
pub mod selection;
pub mod state;
pub mod view;

pub use config::ViewerConfig;
pub use events::ViewerEvent;
pub use export::{save_messages, write_png, write_series_csv, SaveStatus};
pub use extraction::{Extraction, TickOutcome};
pub use markers::{Marker, MarkerStore, Sample};
pub use probe::Probe;
pub use records::{ColumnSet, RecordList};
pub use render::{ActiveRaster, RenderSettings};
pub use selection::{ClickMode, Selection, StepDirection};
pub use state::AppState;
pub use view::{Canvas, ViewTransform};
