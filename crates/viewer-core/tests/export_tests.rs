//! Tests for PNG, CSV and raw-message exports written to disk.

use message_store::{GribFileStore, MemoryStore};
use projection::GeoPoint;
use test_utils::{bootstrap_attributes, extent, temp_test_dir, write_test_file, Grib2Builder};
use viewer_core::{AppState, ClickMode, ViewerConfig};

fn grib_file_state(dir: &std::path::Path, count: u32) -> (AppState<GribFileStore>, Vec<u8>) {
    let mut data = Vec::new();
    for hour in 0..count {
        data.extend(Grib2Builder::new().with_forecast_hour(hour * 6).build());
    }
    let path = write_test_file(dir, "input.grib2", &data);
    let mut state = AppState::new(GribFileStore::new(), ViewerConfig::default());
    state.load_files([path.to_string_lossy()]);
    (state, data)
}

// ============================================================================
// PNG
// ============================================================================

#[test]
fn test_png_export_writes_rgba_image() {
    let dir = temp_test_dir();
    let (mut state, _) = grib_file_state(dir.path(), 1);
    let out = dir.path().join("active.png");

    state.export_png(&out).unwrap();
    assert_eq!(
        state.export_status().map(|s| s.message.clone()),
        Some(format!("Exported PNG to {}", out.display()))
    );
    let png = std::fs::read(&out).unwrap();
    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    // IHDR: 2x2, bit depth 8, colour type 6 (RGBA)
    assert_eq!(&png[16..24], &[0, 0, 0, 2, 0, 0, 0, 2]);
    assert_eq!(png[24], 8);
    assert_eq!(png[25], 6);
}

#[test]
fn test_png_export_without_raster_fails() {
    let dir = temp_test_dir();
    let mut state = AppState::new(MemoryStore::new(), ViewerConfig::default());
    assert!(state.export_png(&dir.path().join("none.png")).is_err());
    assert!(!dir.path().join("none.png").exists());
    assert_eq!(state.export_status().map(|s| s.success), Some(false));
}

#[test]
fn test_png_export_to_unwritable_path_sets_status() {
    let dir = temp_test_dir();
    let (mut state, _) = grib_file_state(dir.path(), 1);
    let out = dir.path().join("no-such-dir").join("active.png");

    assert!(state.export_png(&out).is_err());
    let status = state.export_status().unwrap();
    assert!(!status.success);
    assert!(status.message.starts_with("Failed to export PNG: "));
}

// ============================================================================
// CSV
// ============================================================================

#[test]
fn test_csv_export_after_extraction() {
    let dir = temp_test_dir();
    let mut store = MemoryStore::new();
    for step in 0..2 {
        store.add_grid(
            "mem",
            extent::small_2x2(),
            bootstrap_attributes("TMP", 850, "20240115", step * 6),
            vec![1.0, 2.0, 3.0, if step == 0 { 4.5 } else { 9999.0 }],
        );
    }
    let config = ViewerConfig {
        columns: vec!["shortName".to_string(), "stepRange".to_string()],
        csv_precision: 3,
        ..Default::default()
    };
    let mut state = AppState::new(store, config);
    state.load_files(["mem"]);
    state.add_marker(GeoPoint::new(5.0, 5.0));
    state.start_extraction();
    state.run_extraction_to_end();

    let out = dir.path().join("series.csv");
    assert_eq!(state.export_csv(&out).unwrap(), 2);
    let text = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "markerID,index,shortName,stepRange,lat,lon,value");
    assert_eq!(lines[1], "1,1,TMP,0,5.000,5.000,4.500");
    assert_eq!(lines[2], "1,2,TMP,6,5.000,5.000,");
}

#[test]
fn test_csv_export_without_samples_fails() {
    let dir = temp_test_dir();
    let mut state = AppState::new(MemoryStore::new(), ViewerConfig::default());
    assert!(state.export_csv(&dir.path().join("empty.csv")).is_err());
    assert_eq!(state.export_status().map(|s| s.success), Some(false));
}

#[test]
fn test_csv_export_to_unwritable_path_sets_status() {
    let dir = temp_test_dir();
    let mut store = MemoryStore::new();
    store.add_grid("mem", extent::small_2x2(), bootstrap_attributes("TMP", 850, "20240115", 0), vec![1.0; 4]);
    let mut state = AppState::new(store, ViewerConfig::default());
    state.load_files(["mem"]);
    state.add_marker(GeoPoint::new(5.0, 5.0));
    state.start_extraction();
    state.run_extraction_to_end();

    let out = dir.path().join("no-such-dir").join("series.csv");
    assert!(state.export_csv(&out).is_err());
    let status = state.export_status().unwrap();
    assert!(!status.success);
    assert!(status.message.starts_with("Failed to export CSV: "));

    // A later success replaces the failure
    let ok = dir.path().join("series.csv");
    assert_eq!(state.export_csv(&ok).unwrap(), 1);
    assert_eq!(state.export_status().map(|s| s.success), Some(true));
}

// ============================================================================
// Raw messages
// ============================================================================

#[test]
fn test_save_selection_concatenates_messages() {
    let dir = temp_test_dir();
    let (mut state, data) = grib_file_state(dir.path(), 3);
    state.click(2, ClickMode::Range);

    let out = dir.path().join("subset.grib2");
    let status = state.save_selection(&out).clone();
    assert!(status.success);
    assert_eq!(status.message, format!("Saved 3 message(s) to {}", out.display()));
    assert_eq!(std::fs::read(&out).unwrap(), data);

    // The saved file loads back as the same three records
    let mut reloaded = AppState::new(GribFileStore::new(), ViewerConfig::default());
    assert_eq!(reloaded.load_files([out.to_string_lossy()]), 3);
}

#[test]
fn test_save_single_record() {
    let dir = temp_test_dir();
    let (state, data) = grib_file_state(dir.path(), 2);
    let out = dir.path().join("second.grib2");

    state.save_record(1, &out).unwrap();
    let saved = std::fs::read(&out).unwrap();
    assert_eq!(saved.as_slice(), &data[data.len() / 2..]);
    assert!(state.save_record(5, &out).is_err());
}

#[test]
fn test_failed_save_removes_partial_file() {
    let dir = temp_test_dir();
    let mut store = MemoryStore::new();
    store
        .add_message("mem", Grib2Builder::new().build())
        .unwrap();
    // Grids without an encoded form cannot be written back
    store.add_grid("mem", extent::small_2x2(), bootstrap_attributes("TMP", 850, "20240115", 0), vec![0.0; 4]);

    let mut state = AppState::new(store, ViewerConfig::default());
    state.load_files(["mem"]);
    state.click(1, ClickMode::Range);

    let out = dir.path().join("partial.grib2");
    let status = state.save_selection(&out).clone();
    assert!(!status.success);
    assert_eq!(status.message, "Failed to save selection. Check file permissions.");
    assert!(!out.exists());
    assert_eq!(state.save_status(), Some(&status));
}

#[test]
fn test_save_to_unwritable_path() {
    let dir = temp_test_dir();
    let (mut state, _) = grib_file_state(dir.path(), 1);
    let out = dir.path().join("no-such-dir").join("out.grib2");
    assert!(!state.save_selection(&out).success);
}
