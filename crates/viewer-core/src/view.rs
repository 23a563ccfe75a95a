//! Pan and zoom of the rendered raster inside the canvas.

use projection::PixelFrame;

/// Below this distance from the floor the zoom counts as fully zoomed out.
const ZOOM_FLOOR_EPSILON: f64 = 1e-5;

/// Screen rectangle the raster is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.width && py < self.y + self.height
    }
}

/// Zoom and pan offset of the active raster.
///
/// One raster pixel per grid point; `zoom` is screen pixels per grid point
/// and the offset is relative to the canvas origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    canvas: Canvas,
    zoom: f64,
    offset_x: f64,
    offset_y: f64,
    texture: Option<(usize, usize)>,
    pan_from: Option<(f64, f64)>,
}

impl ViewTransform {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            zoom: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            texture: None,
            pan_from: None,
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    pub fn texture_size(&self) -> Option<(usize, usize)> {
        self.texture
    }

    pub fn is_panning(&self) -> bool {
        self.pan_from.is_some()
    }

    /// Smallest zoom at which the raster still covers the canvas in one
    /// direction: `min(canvasW/texW, canvasH/texH)`.
    pub fn min_zoom(&self) -> Option<f64> {
        let (w, h) = self.texture?;
        Some((self.canvas.width / w as f64).min(self.canvas.height / h as f64))
    }

    /// Record the size of the raster now being shown.
    ///
    /// The zoom is raised to the new floor if needed; the offset is kept.
    pub fn set_texture(&mut self, width: usize, height: usize) {
        self.texture = if width > 0 && height > 0 {
            Some((width, height))
        } else {
            None
        };
        if let Some(min) = self.min_zoom() {
            if !(self.zoom >= min) {
                self.zoom = min;
            }
        }
    }

    pub fn clear_texture(&mut self) {
        self.texture = None;
        self.pan_from = None;
    }

    /// Resize the canvas, keeping the zoom above the new floor.
    pub fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
        if let Some(min) = self.min_zoom() {
            self.zoom = self.zoom.max(min);
        }
    }

    /// Fit the raster width to the canvas, top-left aligned.
    pub fn reset_to_fit(&mut self) {
        self.offset_x = 0.0;
        self.offset_y = 0.0;
        self.pan_from = None;
        if let Some((w, _)) = self.texture {
            self.zoom = self.canvas.width / w as f64;
        }
    }

    /// Zoom by `wheel` notches of `step`, keeping the point under the cursor fixed.
    ///
    /// At the floor the offset is pulled halfway toward the centered position.
    pub fn zoom_at(&mut self, cursor_x: f64, cursor_y: f64, wheel: f64, step: f64) {
        let Some(min) = self.min_zoom() else {
            return;
        };
        let (tex_w, tex_h) = match self.texture {
            Some(size) => size,
            None => return,
        };

        let old = if self.zoom > 0.0 { self.zoom } else { min };
        let mut new = old * (1.0 + step * wheel);
        if !(new > min) {
            new = min;
        }

        let cx = cursor_x - self.canvas.x;
        let cy = cursor_y - self.canvas.y;
        let scale = new / old;
        self.offset_x = cx - (cx - self.offset_x) * scale;
        self.offset_y = cy - (cy - self.offset_y) * scale;
        self.zoom = new;

        if (new - min).abs() < ZOOM_FLOOR_EPSILON {
            let center_x = (self.canvas.width - tex_w as f64 * new) / 2.0;
            let center_y = (self.canvas.height - tex_h as f64 * new) / 2.0;
            self.offset_x = (center_x + self.offset_x) / 2.0;
            self.offset_y = (center_y + self.offset_y) / 2.0;
        }
    }

    /// Start a pan gesture; ignored unless it starts inside the canvas.
    pub fn begin_pan(&mut self, x: f64, y: f64) -> bool {
        if self.canvas.contains(x, y) {
            self.pan_from = Some((x, y));
            true
        } else {
            false
        }
    }

    /// Move the raster with the pointer while a pan is in progress.
    pub fn drag_to(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.pan_from {
            self.offset_x += x - last_x;
            self.offset_y += y - last_y;
            self.pan_from = Some((x, y));
        }
    }

    pub fn end_pan(&mut self) {
        self.pan_from = None;
    }

    /// Placement of grid point `(0, 0)` on screen.
    pub fn frame(&self) -> PixelFrame {
        PixelFrame::new(
            self.canvas.x + self.offset_x,
            self.canvas.y + self.offset_y,
            self.zoom,
        )
    }
}
