use rayon::prelude::*;

use crate::animation::Frame;
use crate::braille::BrailleCanvas;
use crate::handle::DragHandleState;
use crate::map::geometry::{draw_circle, draw_ring, draw_wide_line, to_pixel};
use crate::map::land::LandMask;
use crate::map::projection::{Orthographic, Viewport};
use crate::map::visibility::{latitude_path, project_visible};

/// Text drawn over the handle knob
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    /// Character column
    pub col: u16,
    /// Character row
    pub row: u16,
    pub text: String,
}

/// Rendered layers for one frame, composed back to front:
/// land, parallel, outline, marker, handle.
pub struct GlobeLayers {
    pub land: BrailleCanvas,
    pub parallel: BrailleCanvas,
    pub outline: BrailleCanvas,
    pub marker: BrailleCanvas,
    pub handle: BrailleCanvas,
    pub labels: Vec<Label>,
}

/// Draws the globe, the latitude parallel, the city marker and the handle
pub struct GlobeRenderer {
    viewport: Viewport,
    land: LandMask,
    /// Longitude spacing of latitude-line samples
    parallel_step: f64,
}

impl GlobeRenderer {
    pub fn new(viewport: Viewport, land: LandMask, parallel_step: f64) -> Self {
        Self { viewport, land, parallel_step }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Canvas size in characters
    fn char_size(&self) -> (usize, usize) {
        (self.viewport.width.div_ceil(2), self.viewport.height.div_ceil(4))
    }

    fn blank(&self) -> BrailleCanvas {
        let (w, h) = self.char_size();
        BrailleCanvas::new(w, h)
    }

    /// Render all layers for a frame.
    pub fn render(&self, frame: &Frame) -> GlobeLayers {
        let projection = Orthographic::with_rotation(self.viewport, frame.rotation);
        let scale = projection.scale();

        let mut land = self.blank();
        self.fill_land(&mut land, &projection);

        let mut parallel = self.blank();
        latitude_path(frame.latitude, &projection, self.parallel_step).stroke(&mut parallel, scale / 70.0);

        let mut outline = self.blank();
        let (cx, cy, radius) = projection.outline();
        draw_ring(&mut outline, cx, cy, radius, scale / 100.0);

        let mut marker = self.blank();
        if let Some((lon, lat)) = frame.marker {
            self.draw_marker(&mut marker, &projection, lon, lat);
        }

        let mut handle = self.blank();
        let labels = self.draw_handle(&mut handle, &frame.handle);

        GlobeLayers { land, parallel, outline, marker, handle, labels }
    }

    /// Fill every disk pixel whose inverse projection lands on land.
    fn fill_land(&self, canvas: &mut BrailleCanvas, projection: &Orthographic) {
        let (cx, cy, radius) = projection.outline();
        let max_y = self.viewport.height.saturating_sub(1) as f64;
        let max_x = self.viewport.width.saturating_sub(1) as f64;
        let y0 = (cy - radius).floor().clamp(0.0, max_y) as usize;
        let y1 = (cy + radius).ceil().clamp(0.0, max_y) as usize;

        let rows: Vec<(usize, Vec<usize>)> = (y0..=y1)
            .into_par_iter()
            .map(|py| {
                let y = py as f64 + 0.5;
                let dy = y - cy;
                let span_sq = radius * radius - dy * dy;
                if span_sq < 0.0 {
                    return (py, Vec::new());
                }
                let half = span_sq.sqrt();
                let x0 = (cx - half).floor().clamp(0.0, max_x) as usize;
                let x1 = (cx + half).ceil().clamp(0.0, max_x) as usize;

                let xs = (x0..=x1)
                    .filter(|&px| {
                        projection
                            .invert(px as f64 + 0.5, y)
                            .is_some_and(|(lon, lat)| self.land.is_on_land(lon, lat))
                    })
                    .collect();
                (py, xs)
            })
            .collect();

        for (py, xs) in rows {
            for px in xs {
                canvas.set_pixel(px, py);
            }
        }
    }

    /// Filled dot plus a ring, only when the city faces the viewer.
    fn draw_marker(&self, canvas: &mut BrailleCanvas, projection: &Orthographic, lon: f64, lat: f64) {
        let Some((x, y)) = project_visible(projection, lon, lat) else {
            return;
        };
        let scale = self.viewport.scale;
        let dot_radius = ((scale / 35.0).round() as i32).max(1);
        draw_circle(canvas, to_pixel(x), to_pixel(y), dot_radius);
        draw_ring(canvas, x, y, (scale / 15.0).max(dot_radius as f64 + 2.0), scale / 70.0);
    }

    /// Handle line, knob and speed labels.
    fn draw_handle(&self, canvas: &mut BrailleCanvas, handle: &DragHandleState) -> Vec<Label> {
        let scale = self.viewport.scale;
        let (sx, sy) = handle.positions.start;
        let (ex, ey) = handle.positions.end;
        draw_wide_line(canvas, to_pixel(sx), to_pixel(sy), to_pixel(ex), to_pixel(ey), scale / 70.0);
        draw_circle(canvas, to_pixel(ex), to_pixel(ey), (scale / 6.0).round() as i32);

        if ex < 0.0 || ey < 0.0 {
            return Vec::new();
        }
        let col = (ex / 2.0) as u16;
        let row = ((ey - scale / 40.0).max(0.0) / 4.0) as u16;
        let speed = handle.label();
        vec![
            centered_label(col, row, speed),
            centered_label(col, row.saturating_add(1), "mph".to_string()),
        ]
    }
}

/// Label whose text is centered on a column
fn centered_label(col: u16, row: u16, text: String) -> Label {
    let half = (text.chars().count() / 2) as u16;
    Label { col: col.saturating_sub(half), row, text }
}
