//! Flat file outputs: PNG raster, marker-series CSV, and the raw messages
//! of selected records.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use gribview_common::{ExportError, FieldRecord};
use message_store::MessageStore;
use renderer::png::create_png;
use renderer::RgbaImage;
use tracing::{info, warn};

use crate::markers::MarkerStore;
use crate::records::{ColumnSet, RecordList};
use crate::state::AppState;

/// Outcome of the last file output (saved messages, PNG or CSV), shown to
/// the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveStatus {
    pub message: String,
    pub success: bool,
}

impl SaveStatus {
    fn saved(count: usize, path: &Path) -> Self {
        Self {
            message: format!("Saved {} message(s) to {}", count, path.display()),
            success: true,
        }
    }

    fn failed() -> Self {
        Self {
            message: "Failed to save selection. Check file permissions.".to_string(),
            success: false,
        }
    }

    fn exported(what: &str, path: &Path) -> Self {
        Self {
            message: format!("Exported {} to {}", what, path.display()),
            success: true,
        }
    }

    fn export_failed(what: &str, error: &ExportError) -> Self {
        Self {
            message: format!("Failed to export {}: {}", what, error),
            success: false,
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write a raster as an RGBA PNG.
pub fn write_png(image: &RgbaImage, path: &Path) -> Result<(), ExportError> {
    if image.is_empty() {
        return Err(ExportError::NothingToExport("raster is empty".to_string()));
    }
    let png = create_png(&image.pixels, image.width, image.height)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    fs::write(path, png).map_err(io_error(path))?;
    info!(path = %path.display(), width = image.width, height = image.height, "Wrote PNG");
    Ok(())
}

/// Write every marker series as CSV rows.
///
/// Header: `markerID,<columns>,lat,lon,value`. Attribute columns come from the
/// record each sample was taken from; `value` is empty for missing samples.
/// Returns the number of data rows.
pub fn write_series_csv<W: Write>(
    writer: W,
    markers: &MarkerStore,
    records: &RecordList,
    columns: &ColumnSet,
    precision: usize,
) -> Result<usize, csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["markerID".to_string()];
    header.extend(columns.iter().map(String::from));
    header.extend(["lat".to_string(), "lon".to_string(), "value".to_string()]);
    csv.write_record(&header)?;

    let mut rows = 0;
    for marker in markers.iter() {
        for sample in &marker.series {
            let record = records.find(sample.record);
            let mut row = vec![marker.id.to_string()];
            row.extend(columns.iter().map(|key| {
                record
                    .map(|r| r.attributes.get_or_empty(key).to_string())
                    .unwrap_or_default()
            }));
            row.push(format!("{:.*}", precision, marker.position.lat));
            row.push(format!("{:.*}", precision, marker.position.lon));
            row.push(
                sample
                    .value
                    .map(|v| format!("{:.*}", precision, v))
                    .unwrap_or_default(),
            );
            csv.write_record(&row)?;
            rows += 1;
        }
    }
    csv.flush()?;
    Ok(rows)
}

/// Concatenate the encoded messages of `records` into one file.
///
/// Any failure removes the partially written file.
pub fn save_messages<S: MessageStore>(
    store: &S,
    records: &[&FieldRecord],
    path: &Path,
) -> Result<usize, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NothingToExport("no records selected".to_string()));
    }

    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    let result = write_messages(store, records, &mut writer, path);
    drop(writer);

    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Failed to remove partial file");
        }
    }
    result
}

fn write_messages<S: MessageStore, W: Write>(
    store: &S,
    records: &[&FieldRecord],
    writer: &mut W,
    path: &Path,
) -> Result<usize, ExportError> {
    for record in records {
        let raw = store
            .raw_message(&record.locator)
            .map_err(|source| ExportError::Record {
                index: record.index,
                source,
            })?;
        writer.write_all(&raw).map_err(io_error(path))?;
    }
    writer.flush().map_err(io_error(path))?;
    Ok(records.len())
}

impl<S: MessageStore> AppState<S> {
    /// Export the active raster as PNG; the outcome also lands in the
    /// export status.
    pub fn export_png(&mut self, path: &Path) -> Result<(), ExportError> {
        let result = match self.raster.as_ref().and_then(|r| r.image.as_ref()) {
            Some(image) => write_png(image, path),
            None => Err(ExportError::NothingToExport("no raster to export".to_string())),
        };
        self.record_export("PNG", path, result)
    }

    /// Export all marker series as CSV using the displayed columns; the
    /// outcome also lands in the export status.
    pub fn export_csv(&mut self, path: &Path) -> Result<usize, ExportError> {
        let result = self.write_csv(path);
        if let Ok(rows) = &result {
            info!(path = %path.display(), rows = rows, "Wrote CSV");
        }
        self.record_export("CSV", path, result)
    }

    fn write_csv(&self, path: &Path) -> Result<usize, ExportError> {
        if !self.markers.has_samples() {
            return Err(ExportError::NothingToExport("no extracted samples".to_string()));
        }
        let file = File::create(path).map_err(io_error(path))?;
        write_series_csv(
            BufWriter::new(file),
            &self.markers,
            &self.records,
            &self.columns,
            self.config.csv_precision,
        )
        .map_err(|e| ExportError::Io {
            path: path.to_path_buf(),
            source: io::Error::from(e),
        })
    }

    fn record_export<T>(
        &mut self,
        what: &str,
        path: &Path,
        result: Result<T, ExportError>,
    ) -> Result<T, ExportError> {
        let status = match &result {
            Ok(_) => SaveStatus::exported(what, path),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "{} export failed", what);
                SaveStatus::export_failed(what, e)
            }
        };
        self.export_status = Some(status);
        result
    }

    /// Save the encoded messages of every selected record and report the
    /// outcome in the save status.
    pub fn save_selection(&mut self, path: &Path) -> &SaveStatus {
        let selected: Vec<&FieldRecord> = self.records.iter().filter(|r| r.selected).collect();
        let status = match save_messages(&self.store, &selected, path) {
            Ok(count) => {
                info!(path = %path.display(), count = count, "Saved selection");
                SaveStatus::saved(count, path)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to save selection");
                SaveStatus::failed()
            }
        };
        self.save_status.insert(status)
    }

    /// Save one record's encoded message, as the inspector does.
    pub fn save_record(&self, position: usize, path: &Path) -> Result<(), ExportError> {
        let record = self
            .records
            .get(position)
            .ok_or_else(|| ExportError::NothingToExport(format!("no record at {}", position + 1)))?;
        save_messages(&self.store, &[record], path).map(|_| ())
    }
}
