//! Angular latitude handle drawn to the right of the globe.
//!
//! The handle pivots around the globe center. Its angle is restricted to the
//! right half-plane: straight up is latitude +90, straight down is -90.

use std::f64::consts::FRAC_PI_2;

use crate::geo::speed_at_latitude;
use crate::map::Viewport;

/// Screen position in canvas pixels
pub type Point = (f64, f64);

/// Fixed handle dimensions, derived from the globe scale
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandleGeometry {
    /// Pivot (the globe center)
    pub center: Point,
    /// Gap between the pivot and where the line starts
    pub inner_radius: f64,
    /// Line length
    pub outer_radius: f64,
    /// Radius of the draggable knob at the end of the line
    pub knob_radius: f64,
}

/// Line endpoints for a handle angle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandlePositions {
    pub start: Point,
    pub end: Point,
}

impl HandleGeometry {
    pub fn from_viewport(viewport: &Viewport) -> Self {
        let scale = viewport.scale;
        Self {
            center: viewport.center(),
            inner_radius: scale * 1.005,
            outer_radius: scale / 3.0,
            knob_radius: scale / 6.0,
        }
    }

    /// Angle of the pointer around the pivot, clamped to the right half-plane.
    pub fn angle_from_pointer(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.center.0;
        let dy = y - self.center.1;
        clamp_angle(dy.atan2(dx))
    }

    /// Line endpoints for an angle.
    pub fn positions_for_angle(&self, angle: f64) -> HandlePositions {
        let (sin, cos) = angle.sin_cos();
        let (cx, cy) = self.center;
        let outer = self.inner_radius + self.outer_radius;
        HandlePositions {
            start: (cx + self.inner_radius * cos, cy + self.inner_radius * sin),
            end: (cx + outer * cos, cy + outer * sin),
        }
    }

    /// Line endpoints for a latitude.
    pub fn compute_line_positions(&self, latitude: f64) -> HandlePositions {
        self.positions_for_angle(angle_from_latitude(latitude))
    }

    /// Recover the handle angle from its drawn endpoints.
    #[cfg(test)]
    pub fn angle_from_positions(&self, positions: &HandlePositions) -> f64 {
        let dx = positions.end.0 - self.center.0;
        let dy = positions.end.1 - self.center.1;
        dy.atan2(dx)
    }
}

/// Restrict an angle to [-π/2, π/2].
#[inline(always)]
pub fn clamp_angle(angle: f64) -> f64 {
    angle.clamp(-FRAC_PI_2, FRAC_PI_2)
}

/// Screen angles grow downward, latitudes grow upward.
#[inline(always)]
pub fn latitude_from_angle(angle: f64) -> f64 {
    (-angle * (180.0 / std::f64::consts::PI)).clamp(-90.0, 90.0)
}

#[inline(always)]
pub fn angle_from_latitude(latitude: f64) -> f64 {
    -latitude * (std::f64::consts::PI / 180.0)
}

/// Handle state derived from the current latitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragHandleState {
    pub angle: f64,
    pub positions: HandlePositions,
    /// Speed shown on the knob, in mph
    pub speed_mph: f64,
}

impl DragHandleState {
    pub fn from_latitude(geometry: &HandleGeometry, latitude: f64) -> Self {
        let angle = angle_from_latitude(latitude);
        Self::from_angle(geometry, angle, latitude)
    }

    /// Build from an already clamped angle and the latitude it maps to.
    fn from_angle(geometry: &HandleGeometry, angle: f64, latitude: f64) -> Self {
        Self {
            angle,
            positions: geometry.positions_for_angle(angle),
            speed_mph: speed_at_latitude(latitude),
        }
    }

    /// Position the handle under a pointer. Returns the state and the latitude it selects.
    pub fn from_pointer(geometry: &HandleGeometry, x: f64, y: f64) -> (Self, f64) {
        let angle = geometry.angle_from_pointer(x, y);
        let latitude = latitude_from_angle(angle);
        (Self::from_angle(geometry, angle, latitude), latitude)
    }

    /// Whether a pointer position grabs the knob.
    pub fn hit_test(&self, geometry: &HandleGeometry, x: f64, y: f64) -> bool {
        let (ex, ey) = self.positions.end;
        // One cell of slack each way; cells are 2x4 pixels
        let reach_x = geometry.knob_radius + 2.0;
        let reach_y = geometry.knob_radius + 4.0;
        let nx = (x - ex) / reach_x;
        let ny = (y - ey) / reach_y;
        nx * nx + ny * ny <= 1.0
    }

    /// Integer speed label shown inside the knob.
    pub fn label(&self) -> String {
        format!("{}", self.speed_mph.round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn geometry() -> HandleGeometry {
        HandleGeometry::from_viewport(&Viewport::new(700, 350))
    }

    #[test]
    fn test_geometry_from_scale() {
        let g = geometry();
        assert_eq!(g.center, (350.0, 175.0));
        assert_relative_eq!(g.inner_radius, 100.5);
        assert_relative_eq!(g.outer_radius, 100.0 / 3.0);
        assert_relative_eq!(g.knob_radius, 100.0 / 6.0);
    }

    #[test]
    fn test_angles_outside_range_clamp_to_nearest_bound() {
        assert_eq!(clamp_angle(PI), FRAC_PI_2);
        assert_eq!(clamp_angle(2.0), FRAC_PI_2);
        assert_eq!(clamp_angle(-PI), -FRAC_PI_2);
        assert_eq!(clamp_angle(-1.8), -FRAC_PI_2);
        assert_eq!(clamp_angle(0.3), 0.3);

        // Pointer left of the pivot, slightly below: clamps to the bottom
        let g = geometry();
        let angle = g.angle_from_pointer(g.center.0 - 50.0, g.center.1 + 1.0);
        assert_eq!(angle, FRAC_PI_2);
        assert_eq!(latitude_from_angle(angle), -90.0);
    }

    #[test]
    fn test_pointer_right_of_pivot_is_equator() {
        let g = geometry();
        let (state, lat) = DragHandleState::from_pointer(&g, g.center.0 + 120.0, g.center.1);
        assert_eq!(lat, 0.0);
        assert_eq!(state.speed_mph, speed_at_latitude(0.0));
        assert_eq!(state.label(), "1040");
    }

    #[test]
    fn test_drag_to_top_is_north_pole() {
        let g = geometry();
        let (state, lat) = DragHandleState::from_pointer(&g, g.center.0, g.center.1 - 80.0);
        assert_eq!(state.angle, -FRAC_PI_2);
        assert_eq!(lat, 90.0);
        assert_eq!(state.speed_mph, 0.0);
        assert_eq!(state.label(), "0");
    }

    #[test]
    fn test_latitude_angle_round_trip() {
        let g = geometry();
        let mut angle = -FRAC_PI_2;
        while angle <= FRAC_PI_2 {
            let lat = latitude_from_angle(angle);
            let positions = g.compute_line_positions(lat);
            assert_relative_eq!(g.angle_from_positions(&positions), angle, epsilon = 1e-9);
            angle += 0.05;
        }
    }

    #[test]
    fn test_positions_lie_on_radii() {
        let g = geometry();
        let p = g.compute_line_positions(30.0);
        let dist = |(x, y): Point| ((x - g.center.0).powi(2) + (y - g.center.1).powi(2)).sqrt();
        assert_relative_eq!(dist(p.start), g.inner_radius, epsilon = 1e-9);
        assert_relative_eq!(dist(p.end), g.inner_radius + g.outer_radius, epsilon = 1e-9);
        // Northern latitudes sit above the pivot
        assert!(p.end.1 < g.center.1);
    }

    #[test]
    fn test_hit_test() {
        let g = geometry();
        let state = DragHandleState::from_latitude(&g, 0.0);
        let (ex, ey) = state.positions.end;
        assert!(state.hit_test(&g, ex, ey));
        assert!(state.hit_test(&g, ex + g.knob_radius, ey));
        assert!(!state.hit_test(&g, g.center.0, g.center.1));

        // Slack is one terminal cell: 2 pixels across, 4 pixels down
        assert!(state.hit_test(&g, ex, ey + g.knob_radius + 3.0));
        assert!(!state.hit_test(&g, ex + g.knob_radius + 3.0, ey));
        assert!(!state.hit_test(&g, ex, ey + g.knob_radius + 5.0));
    }
}
