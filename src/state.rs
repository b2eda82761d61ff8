use tracing::{debug, info};

use crate::animation::{AnimationTarget, RotationState};
use crate::geo::speed_at_latitude;
use crate::handle::{DragHandleState, HandleGeometry};
use crate::map::Viewport;

/// A selected location
#[derive(Clone, Debug, PartialEq)]
pub struct City {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

impl City {
    pub fn new(name: impl Into<String>, lon: f64, lat: f64) -> Self {
        Self {
            name: name.into(),
            lon: lon.clamp(-180.0, 180.0),
            lat: lat.clamp(-90.0, 90.0),
        }
    }

    /// Selection shown before the user picks anything
    pub fn placeholder() -> Self {
        Self::new("Pick a city", -30.0, 0.0)
    }
}

/// Input that changes the globe, independent of where it came from
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// A city was picked from a selection source
    CitySelected(City),
    /// The latitude handle was dragged to a canvas pixel position
    DragMoved { x: f64, y: f64 },
    /// The latitude handle was let go
    DragReleased,
    /// The globe itself was dragged horizontally, in degrees of spin
    SpinDragged { degrees: f64 },
}

/// All mutable view state, shared by the animation loop, the renderer and
/// the drag controller.
#[derive(Clone, Debug)]
pub struct GlobeState {
    pub city: City,
    /// Marker and handle-follows-latitude are enabled after a city selection
    pub show_marker: bool,
    pub rotation: RotationState,
    pub target: AnimationTarget,
    pub handle: DragHandleState,
    pub handle_geometry: HandleGeometry,
    /// Spin requested by globe drags, consumed on the next tick
    pending_spin: f64,
}

impl GlobeState {
    pub fn new(viewport: &Viewport) -> Self {
        let city = City::placeholder();
        let handle_geometry = HandleGeometry::from_viewport(viewport);
        let handle = DragHandleState::from_latitude(&handle_geometry, city.lat);
        let target = AnimationTarget {
            target_pitch: -city.lat / 2.0,
            previous_pitch: -city.lat / 2.0,
            previous_latitude: city.lat,
            is_converging: false,
        };

        Self {
            city,
            show_marker: false,
            rotation: RotationState::default(),
            target,
            handle,
            handle_geometry,
            pending_spin: 0.0,
        }
    }

    /// Apply one input command. Takes effect on the next tick.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::CitySelected(city) => self.select_city(city),
            Command::DragMoved { x, y } => self.drag_to(x, y),
            Command::DragReleased => {
                debug!(latitude = self.city.lat, "handle released");
            }
            Command::SpinDragged { degrees } => {
                self.pending_spin += degrees;
            }
        }
    }

    fn select_city(&mut self, city: City) {
        info!(
            name = %city.name,
            lon = city.lon,
            lat = city.lat,
            mph = speed_at_latitude(city.lat),
            "city selected"
        );
        self.target.previous_latitude = self.city.lat;
        self.target.target_pitch = -city.lat / 2.0;
        self.target.is_converging = true;
        self.show_marker = true;
        self.city = city;
    }

    fn drag_to(&mut self, x: f64, y: f64) {
        let (handle, latitude) = DragHandleState::from_pointer(&self.handle_geometry, x, y);

        self.show_marker = false;
        self.city.name.clear();
        self.city.lat = latitude;

        // Both eases settle immediately: the handle is the source of truth while dragged
        self.target.previous_pitch = -latitude / 2.0;
        self.target.target_pitch = -latitude / 2.0;
        self.target.previous_latitude = latitude;
        self.target.is_converging = false;

        self.handle = handle;
        debug!(latitude, mph = handle.speed_mph, "handle dragged");
    }

    /// Spin requested since the last tick.
    pub(crate) fn take_pending_spin(&mut self) -> f64 {
        std::mem::take(&mut self.pending_spin)
    }

    /// Move the handle to a latitude, keeping the geometry.
    pub(crate) fn place_handle(&mut self, latitude: f64) {
        self.handle = DragHandleState::from_latitude(&self.handle_geometry, latitude);
    }

    /// Rebuild handle geometry for a new viewport, keeping its angle.
    pub fn set_viewport(&mut self, viewport: &Viewport) {
        self.handle_geometry = HandleGeometry::from_viewport(viewport);
        self.handle.positions = self.handle_geometry.positions_for_angle(self.handle.angle);
    }

    /// Speed at the handle's latitude, in mph
    pub fn displayed_speed(&self) -> f64 {
        self.handle.speed_mph
    }
}
