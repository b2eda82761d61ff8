use glam::DVec3;

use crate::animation::RotationState;
use crate::geo::to_cartesian;

/// Ratio between the smaller canvas side and the globe radius
const SCALE_DIVISOR: f64 = 3.5;

/// Fixed canvas geometry, derived once from the pixel size
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
    /// Globe radius in pixels
    pub scale: f64,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            scale: width.min(height) as f64 / SCALE_DIVISOR,
        }
    }

    /// Pixel center of the globe
    #[inline(always)]
    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

/// Orthographic projection of the rotating globe.
///
/// Rotation follows the usual `rotate([spin, pitch])` convention: the spin is
/// added to every longitude, then the sphere tilts around the screen's
/// horizontal axis by the pitch. Points more than 90° from the view axis are
/// clipped.
#[derive(Clone, Copy, Debug)]
pub struct Orthographic {
    viewport: Viewport,
    rotation: RotationState,
    sin_pitch: f64,
    cos_pitch: f64,
}

impl Orthographic {
    pub fn with_rotation(viewport: Viewport, rotation: RotationState) -> Self {
        let (sin_pitch, cos_pitch) = rotation.pitch.to_radians().sin_cos();
        Self { viewport, rotation, sin_pitch, cos_pitch }
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    pub fn scale(&self) -> f64 {
        self.viewport.scale
    }

    /// Rotate a geographic point into view space.
    /// `x` is depth toward the viewer, `y` points right, `z` points up.
    #[inline(always)]
    fn to_view(&self, lon: f64, lat: f64) -> DVec3 {
        let p = to_cartesian(lon + self.rotation.spin_longitude, lat);
        DVec3::new(
            p.x * self.cos_pitch - p.z * self.sin_pitch,
            p.y,
            p.z * self.cos_pitch + p.x * self.sin_pitch,
        )
    }

    /// Project a geographic point to canvas pixels.
    /// Returns `None` when the 90° clip excludes the point.
    #[inline]
    pub fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let v = self.to_view(lon, lat);
        // The clip compares against cos(90°) evaluated in floating point,
        // which is slightly above zero.
        if v.x <= 90f64.to_radians().cos() {
            return None;
        }
        let (cx, cy) = self.viewport.center();
        Some((cx + v.y * self.viewport.scale, cy - v.z * self.viewport.scale))
    }

    /// Map a canvas pixel back to lon/lat.
    /// Returns `None` outside the globe disk.
    #[inline]
    pub fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (cx, cy) = self.viewport.center();
        let sx = (x - cx) / self.viewport.scale;
        let sy = -(y - cy) / self.viewport.scale;

        let r2 = sx * sx + sy * sy;
        if r2 > 1.0 {
            return None;
        }
        let depth = (1.0 - r2).sqrt();

        // Undo the pitch tilt, then the spin
        let px = depth * self.cos_pitch + sy * self.sin_pitch;
        let pz = sy * self.cos_pitch - depth * self.sin_pitch;
        let lat = pz.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = sx.atan2(px).to_degrees() - self.rotation.spin_longitude;

        Some(((lon + 180.0).rem_euclid(360.0) - 180.0, lat))
    }

    /// The globe's outer circle as (center x, center y, radius).
    pub fn outline(&self) -> (f64, f64, f64) {
        let (cx, cy) = self.viewport.center();
        (cx, cy, self.viewport.scale)
    }
}
