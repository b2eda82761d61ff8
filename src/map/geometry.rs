use crate::braille::BrailleCanvas;

/// Pixel index for a floating point canvas coordinate
#[inline(always)]
pub fn to_pixel(v: f64) -> i32 {
    v.floor() as i32
}

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    walk_line(x0, y0, x1, y1, |x, y| canvas.set_pixel_signed(x, y));
}

/// Visit every pixel of a Bresenham line
fn walk_line(x0: i32, y0: i32, x1: i32, y1: i32, mut visit: impl FnMut(i32, i32)) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        visit(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a line with a stroke width in pixels.
/// Widths under 2 pixels fall back to a single-pixel line.
pub fn draw_wide_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32, width: f64) {
    let radius = (width / 2.0).floor() as i32;
    if radius < 1 {
        draw_line(canvas, x0, y0, x1, y1);
        return;
    }
    walk_line(x0, y0, x1, y1, |x, y| draw_circle(canvas, x, y, radius));
}

/// Draw a filled circle (for city markers)
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Stroke a circle outline with the given stroke width
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: f64, cy: f64, radius: f64, width: f64) {
    // Enough segments that each chord stays under ~2 pixels
    let segments = ((radius * std::f64::consts::TAU / 2.0).ceil() as usize).max(12);
    let mut path = Path::new();
    for i in 0..=segments {
        let angle = i as f64 / segments as f64 * std::f64::consts::TAU;
        let (sin, cos) = angle.sin_cos();
        let (x, y) = (cx + radius * cos, cy + radius * sin);
        if i == 0 {
            path.move_to(x, y);
        } else {
            path.line_to(x, y);
        }
    }
    path.stroke(canvas, width);
}

/// A vector path made of disconnected polyline subpaths
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    subpaths: Vec<Vec<(f64, f64)>>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new subpath at a point
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.subpaths.push(vec![(x, y)]);
    }

    /// Extend the current subpath; starts one if none is open
    pub fn line_to(&mut self, x: f64, y: f64) {
        match self.subpaths.last_mut() {
            Some(current) => current.push((x, y)),
            None => self.move_to(x, y),
        }
    }

    pub fn subpaths(&self) -> &[Vec<(f64, f64)>] {
        &self.subpaths
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.is_empty()
    }

    /// Stroke every subpath onto the canvas. Subpaths are never joined.
    pub fn stroke(&self, canvas: &mut BrailleCanvas, width: f64) {
        for subpath in &self.subpaths {
            if let [(x, y)] = subpath.as_slice() {
                draw_wide_line(canvas, to_pixel(*x), to_pixel(*y), to_pixel(*x), to_pixel(*y), width);
                continue;
            }
            for pair in subpath.windows(2) {
                let (x0, y0) = pair[0];
                let (x1, y1) = pair[1];
                draw_wide_line(canvas, to_pixel(x0), to_pixel(y0), to_pixel(x1), to_pixel(y1), width);
            }
        }
    }
}
