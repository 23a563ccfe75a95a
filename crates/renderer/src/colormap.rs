//! Color lookup tables.
//!
//! Every colormap is expanded to a fixed-size table of [`COLORMAP_SIZE`]
//! entries from a short list of hex color stops. Extra colormaps can be
//! loaded from JSON in the same stop format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gradient::{interpolate_color, Color};
use crate::RenderError;

/// Number of entries in every lookup table.
pub const COLORMAP_SIZE: usize = 512;

/// Name of the colormap used when none (or an unknown one) is requested.
pub const FALLBACK_COLORMAP: &str = "grey";

/// Color stop at a relative position in `[0, 1]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorStop {
    pub position: f32,
    pub color: String,
}

/// A colormap as written in JSON: a name and its stops.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColormapDefinition {
    pub name: String,
    pub stops: Vec<ColorStop>,
}

/// File format for user colormaps.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColormapFile {
    pub colormaps: Vec<ColormapDefinition>,
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// An expanded lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    name: String,
    table: Vec<Color>,
}

impl Colormap {
    /// Expand stops into a full table.
    pub fn from_definition(def: &ColormapDefinition) -> Result<Self, RenderError> {
        if def.stops.is_empty() {
            return Err(RenderError::Colormap(format!("'{}' has no stops", def.name)));
        }

        let mut stops = Vec::with_capacity(def.stops.len());
        for stop in &def.stops {
            let (r, g, b) = hex_to_rgb(&stop.color).ok_or_else(|| {
                RenderError::Colormap(format!("'{}': bad color '{}'", def.name, stop.color))
            })?;
            stops.push((stop.position.clamp(0.0, 1.0), Color::new(r, g, b, 255)));
        }
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));

        let table = (0..COLORMAP_SIZE)
            .map(|i| {
                let t = i as f32 / (COLORMAP_SIZE - 1) as f32;
                sample_stops(&stops, t)
            })
            .collect();

        Ok(Self {
            name: def.name.clone(),
            table,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Table entry, clamped to the last one.
    pub fn entry(&self, index: usize) -> Color {
        let last = self.table.len().saturating_sub(1);
        self.table
            .get(index.min(last))
            .copied()
            .unwrap_or_else(Color::transparent)
    }

    pub fn entries(&self) -> &[Color] {
        &self.table
    }
}

fn sample_stops(stops: &[(f32, Color)], t: f32) -> Color {
    let (first_pos, first_color) = stops[0];
    if t <= first_pos {
        return first_color;
    }

    for pair in stops.windows(2) {
        let (p0, c0) = pair[0];
        let (p1, c1) = pair[1];
        if t <= p1 {
            let span = p1 - p0;
            let local = if span > f32::EPSILON { (t - p0) / span } else { 1.0 };
            return interpolate_color(c0, c1, local);
        }
    }

    stops[stops.len() - 1].1
}

fn builtin_definitions() -> Vec<ColormapDefinition> {
    fn def(name: &str, colors: &[&str]) -> ColormapDefinition {
        let last = (colors.len() - 1).max(1) as f32;
        ColormapDefinition {
            name: name.to_string(),
            stops: colors
                .iter()
                .enumerate()
                .map(|(i, c)| ColorStop {
                    position: i as f32 / last,
                    color: c.to_string(),
                })
                .collect(),
        }
    }

    vec![
        def("grey", &["#000000", "#FFFFFF"]),
        def(
            "jet",
            &["#000080", "#0000FF", "#0080FF", "#00FFFF", "#80FF80", "#FFFF00", "#FF8000", "#FF0000", "#800000"],
        ),
        def(
            "viridis",
            &["#440154", "#482878", "#3E4A89", "#31688E", "#26828E", "#1F9E89", "#35B779", "#6DCD59", "#B4DE2C", "#FDE725"],
        ),
        def(
            "plasma",
            &["#0D0887", "#46039F", "#7201A8", "#9C179E", "#BD3786", "#D8576B", "#ED7953", "#FB9F3A", "#FDCA26", "#F0F921"],
        ),
        def("hot", &["#000000", "#E60000", "#FFD200", "#FFFFFF"]),
        def("coolwarm", &["#3B4CC0", "#7396F5", "#B0CBFC", "#DDDDDD", "#F6B69B", "#E57058", "#B40426"]),
        def(
            "turbo",
            &["#30123B", "#4662D7", "#36AAF9", "#1AE4B6", "#72FE5E", "#C8EF34", "#FABA39", "#F66B19", "#CA2A04", "#7A0403"],
        ),
        def("rainbow", &["#FF0000", "#FFFF00", "#00FF00", "#00FFFF", "#0000FF", "#FF00FF"]),
    ]
}

/// Named colormaps available to the viewer.
#[derive(Debug, Clone)]
pub struct ColormapRegistry {
    maps: BTreeMap<String, Colormap>,
    fallback: Colormap,
}

impl ColormapRegistry {
    /// Registry holding the built-in colormaps.
    pub fn builtin() -> Self {
        let mut maps = BTreeMap::new();
        for def in builtin_definitions() {
            // Built-in stops are static and well formed
            if let Ok(map) = Colormap::from_definition(&def) {
                maps.insert(def.name.clone(), map);
            }
        }
        let fallback = maps
            .get(FALLBACK_COLORMAP)
            .cloned()
            .unwrap_or_else(|| Colormap {
                name: FALLBACK_COLORMAP.to_string(),
                table: (0..COLORMAP_SIZE)
                    .map(|i| {
                        let v = (i * 255 / (COLORMAP_SIZE - 1)) as u8;
                        Color::new(v, v, v, 255)
                    })
                    .collect(),
            });
        Self { maps, fallback }
    }

    /// Add or replace colormaps from a JSON [`ColormapFile`]; returns how many were loaded.
    pub fn load_json(&mut self, json: &str) -> Result<usize, RenderError> {
        let file: ColormapFile =
            serde_json::from_str(json).map_err(|e| RenderError::Colormap(e.to_string()))?;
        let mut loaded = 0;
        for def in &file.colormaps {
            let map = Colormap::from_definition(def)?;
            debug!(name = %def.name, stops = def.stops.len(), "Loaded colormap");
            self.maps.insert(def.name.clone(), map);
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Load a [`ColormapFile`] from disk.
    pub fn load_file(&mut self, path: &std::path::Path) -> Result<usize, RenderError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RenderError::Colormap(format!("{}: {}", path.display(), e)))?;
        self.load_json(&content)
    }

    /// Colormap by name, grey for unknown names.
    pub fn get(&self, name: &str) -> &Colormap {
        self.maps.get(name).unwrap_or(&self.fallback)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.maps.contains_key(name)
    }

    /// All names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.maps.keys().map(String::as_str).collect()
    }
}

impl Default for ColormapRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#FF0000"), Some((255, 0, 0)));
        assert_eq!(hex_to_rgb("00FF00"), Some((0, 255, 0)));
        assert_eq!(hex_to_rgb("#GGGGGG"), None);
        assert_eq!(hex_to_rgb("#FFF"), None);
    }

    #[test]
    fn test_builtin_tables_have_fixed_size() {
        let registry = ColormapRegistry::builtin();
        for name in registry.names() {
            assert_eq!(registry.get(name).len(), COLORMAP_SIZE, "{}", name);
        }
    }

    #[test]
    fn test_grey_endpoints() {
        let registry = ColormapRegistry::builtin();
        let grey = registry.get("grey");
        assert_eq!(grey.entry(0), Color::new(0, 0, 0, 255));
        assert_eq!(grey.entry(COLORMAP_SIZE - 1), Color::new(255, 255, 255, 255));
        assert_eq!(grey.entry(COLORMAP_SIZE + 10), grey.entry(COLORMAP_SIZE - 1));
    }

    #[test]
    fn test_unknown_name_falls_back_to_grey() {
        let registry = ColormapRegistry::builtin();
        assert_eq!(registry.get("no-such-map").name(), "grey");
        assert!(!registry.contains("no-such-map"));
    }

    #[test]
    fn test_names_sorted() {
        let registry = ColormapRegistry::builtin();
        let names = registry.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"jet"));
    }

    #[test]
    fn test_load_json() {
        let mut registry = ColormapRegistry::builtin();
        let json = r##"{"colormaps": [{"name": "sea", "stops": [
            {"position": 0.0, "color": "#000033"},
            {"position": 1.0, "color": "#00CCFF"}
        ]}]}"##;
        assert_eq!(registry.load_json(json).unwrap(), 1);
        assert_eq!(registry.get("sea").entry(0), Color::new(0, 0, 0x33, 255));

        let bad = r##"{"colormaps": [{"name": "x", "stops": [{"position": 0.0, "color": "red"}]}]}"##;
        assert!(registry.load_json(bad).is_err());
    }
}
