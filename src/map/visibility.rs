use crate::animation::RotationState;
use crate::geo::is_front_facing;
use crate::map::geometry::Path;
use crate::map::projection::Orthographic;

/// Whether a point faces the viewer under the given rotation.
#[inline(always)]
pub fn is_visible(lon: f64, lat: f64, rotation: &RotationState) -> bool {
    is_front_facing(lon, lat, rotation.spin_longitude, rotation.pitch)
}

/// Project a point only if it passes both the half-space test and the
/// projection's own clip. The half-space test decides; the clip only guards
/// against points it rejects on the horizon.
#[inline]
pub fn project_visible(projection: &Orthographic, lon: f64, lat: f64) -> Option<(f64, f64)> {
    if !is_visible(lon, lat, &projection.rotation()) {
        return None;
    }
    projection.project(lon, lat)
}

/// Build the visible part of a latitude parallel.
///
/// Samples every `step` degrees of longitude from -180 to 180. Each run of
/// consecutive visible samples becomes its own subpath, so nothing is drawn
/// across the hidden side.
pub fn latitude_path(latitude: f64, projection: &Orthographic, step: f64) -> Path {
    let mut path = Path::new();
    let mut last_visible = false;

    let samples = (360.0 / step).floor() as usize;
    for i in 0..=samples {
        let lon = -180.0 + i as f64 * step;
        match project_visible(projection, lon, latitude) {
            Some((x, y)) => {
                if last_visible {
                    path.line_to(x, y);
                } else {
                    path.move_to(x, y);
                }
                last_visible = true;
            }
            None => last_visible = false,
        }
    }

    path
}
