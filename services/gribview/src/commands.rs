//! Command helpers: argument parsing, loading, and table output.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Result};
use message_store::MessageStore;
use projection::GeoPoint;
use viewer_core::{AppState, ClickMode, TickOutcome};

/// Parse `A,B` into two numbers.
pub fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected two comma-separated numbers, got '{}'", s))?;
    let a = a.trim().parse::<f64>().map_err(|e| format!("'{}': {}", a, e))?;
    let b = b.trim().parse::<f64>().map_err(|e| format!("'{}': {}", b, e))?;
    Ok((a, b))
}

/// Parse a 1-based record list such as `1,3-5` into sorted 0-based positions.
pub fn parse_ranges(s: &str) -> Result<Vec<usize>, String> {
    let mut positions = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (lo, hi) = match part.split_once('-') {
            Some((lo, hi)) => (parse_index(lo)?, parse_index(hi)?),
            None => {
                let i = parse_index(part)?;
                (i, i)
            }
        };
        if lo > hi {
            return Err(format!("range '{}' runs backwards", part));
        }
        positions.extend((lo..=hi).map(|i| i - 1));
    }
    positions.sort_unstable();
    positions.dedup();
    Ok(positions)
}

fn parse_index(s: &str) -> Result<usize, String> {
    match s.trim().parse::<usize>() {
        Ok(0) => Err("record indices start at 1".to_string()),
        Ok(i) => Ok(i),
        Err(e) => Err(format!("'{}': {}", s, e)),
    }
}

/// Load files and fail when nothing could be read.
pub fn load<S: MessageStore>(state: &mut AppState<S>, files: &[String]) -> Result<usize> {
    let added = state.load_files(files);
    if added == 0 {
        bail!("no GRIB2 messages found in {}", files.join(", "));
    }
    Ok(added)
}

/// 0-based position of a 1-based record index.
pub fn position<S: MessageStore>(state: &AppState<S>, index: usize) -> Result<usize> {
    if index == 0 || index > state.records().len() {
        bail!("record {} out of range 1..={}", index, state.records().len());
    }
    Ok(index - 1)
}

/// Make one record active.
pub fn select<S: MessageStore>(state: &mut AppState<S>, index: usize) -> Result<()> {
    let position = position(state, index)?;
    state.click(position, ClickMode::Single);
    Ok(())
}

/// Select exactly the records named by a range list.
pub fn select_ranges<S: MessageStore>(state: &mut AppState<S>, ranges: &str) -> Result<()> {
    let positions = parse_ranges(ranges).map_err(anyhow::Error::msg)?;
    let Some((&first, rest)) = positions.split_first() else {
        bail!("empty selection");
    };
    select(state, first + 1)?;
    for &p in rest {
        position(state, p + 1)?;
        state.click(p, ClickMode::Toggle);
    }
    Ok(())
}

/// Place markers, run extraction from the first record to the end and
/// write the series.
pub fn extract<S: MessageStore>(
    state: &mut AppState<S>,
    markers: &[(f64, f64)],
    output: &Path,
) -> Result<usize> {
    for &(lat, lon) in markers {
        state.add_marker(GeoPoint::new(lat, lon));
    }
    select(state, 1)?;
    if !state.start_extraction() {
        bail!("{}", state.extraction().status());
    }
    match state.run_extraction_to_end() {
        TickOutcome::Done => {}
        TickOutcome::Aborted(reason) => bail!(reason),
        outcome => bail!("extraction stopped unexpectedly: {:?}", outcome),
    }
    Ok(state.export_csv(output)?)
}

/// Record table with the displayed columns, left-aligned.
pub fn format_table<S: MessageStore>(state: &AppState<S>) -> String {
    let columns: Vec<&str> = state.columns().iter().collect();
    let rows: Vec<Vec<&str>> = state
        .records()
        .iter()
        .map(|r| columns.iter().map(|c| r.attributes.get_or_empty(c)).collect())
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| rows.iter().map(|r| r[i].len()).fold(c.len(), usize::max))
        .collect();

    let mut out = String::new();
    let line = |cells: &[&str], out: &mut String| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect();
        let _ = writeln!(out, "{}", padded.join("  ").trim_end());
    };
    line(&columns, &mut out);
    for row in &rows {
        line(row, &mut out);
    }
    out
}
