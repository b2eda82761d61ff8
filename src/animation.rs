//! Per-frame animation: constant eastward spin plus two independent eases,
//! one for the camera pitch and one for the drawn latitude.

use std::cell::Cell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::info;

use crate::config::GlobeConfig;
use crate::geo::round_to;
use crate::handle::DragHandleState;
use crate::state::GlobeState;

/// Live orientation of the globe, in degrees
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RotationState {
    /// Accumulates without bound
    pub spin_longitude: f64,
    pub pitch: f64,
}

/// In-flight ease toward a selected city
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationTarget {
    pub target_pitch: f64,
    pub previous_pitch: f64,
    pub previous_latitude: f64,
    /// Set on city selection, cleared once pitch matches the target to 1 decimal
    pub is_converging: bool,
}

/// Everything the renderer needs for one frame
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub rotation: RotationState,
    /// Latitude of the drawn parallel
    pub latitude: f64,
    /// City marker position, when a city is selected
    pub marker: Option<(f64, f64)>,
    pub handle: DragHandleState,
}

/// One step of an exponential ease.
#[inline(always)]
pub fn ease(from: f64, to: f64, divisor: f64) -> f64 {
    from + (to - from) / divisor
}

/// Cancels a running loop. Every handle from the same scheduler shares one flag.
#[derive(Clone, Debug, Default)]
pub struct FrameHandle {
    id: u64,
    cancelled: Rc<Cell<bool>>,
}

impl FrameHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Source of frame timing for the animation loop
pub trait Scheduler {
    /// Arm the next frame.
    fn schedule(&mut self) -> FrameHandle;

    /// Block until the armed frame is due.
    /// Returns `false` once the loop should stop.
    fn wait(&mut self, handle: &FrameHandle) -> bool;
}

/// Paces frames against the wall clock
pub struct RealtimeScheduler {
    period: Duration,
    next_due: Option<Instant>,
    next_id: u64,
    cancelled: Rc<Cell<bool>>,
}

impl RealtimeScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
            next_id: 0,
            cancelled: Rc::new(Cell::new(false)),
        }
    }
}

impl Scheduler for RealtimeScheduler {
    fn schedule(&mut self) -> FrameHandle {
        let id = self.next_id;
        self.next_id += 1;
        FrameHandle { id, cancelled: Rc::clone(&self.cancelled) }
    }

    fn wait(&mut self, handle: &FrameHandle) -> bool {
        if handle.is_cancelled() {
            return false;
        }

        let now = Instant::now();
        let due = self.next_due.unwrap_or(now);
        if due > now {
            thread::sleep(due - now);
        }

        // Don't try to catch up on missed frames
        self.next_due = Some((due + self.period).max(Instant::now()));
        !handle.is_cancelled()
    }
}

/// Fires a fixed number of frames without waiting
pub struct FixedTicks {
    remaining: u64,
    next_id: u64,
    cancelled: Rc<Cell<bool>>,
}

impl FixedTicks {
    pub fn new(count: u64) -> Self {
        Self {
            remaining: count,
            next_id: 0,
            cancelled: Rc::new(Cell::new(false)),
        }
    }
}

impl Scheduler for FixedTicks {
    fn schedule(&mut self) -> FrameHandle {
        let id = self.next_id;
        self.next_id += 1;
        FrameHandle { id, cancelled: Rc::clone(&self.cancelled) }
    }

    fn wait(&mut self, handle: &FrameHandle) -> bool {
        if handle.is_cancelled() || self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

/// Drives the time-based state changes of the globe
#[derive(Clone, Copy, Debug)]
pub struct AnimationLoop {
    /// Degrees of spin per frame
    rotation_speed: f64,
    /// Each ease step closes 1/divisor of the remaining gap
    ease_divisor: f64,
}

impl Default for AnimationLoop {
    fn default() -> Self {
        Self::new(0.2, 20.0)
    }
}

impl AnimationLoop {
    pub fn new(rotation_speed: f64, ease_divisor: f64) -> Self {
        Self { rotation_speed, ease_divisor }
    }

    pub fn from_config(config: &GlobeConfig) -> Self {
        Self::new(config.rotation_speed, config.ease_divisor)
    }

    /// Advance the state by one frame.
    pub fn tick(&self, state: &mut GlobeState) -> Frame {
        state.rotation.spin_longitude += state.take_pending_spin();

        let target_pitch = -state.city.lat / 2.0;
        if state.target.is_converging {
            state.target.target_pitch = target_pitch;
            let new_pitch = ease(state.target.previous_pitch, target_pitch, self.ease_divisor);
            state.rotation.spin_longitude += self.rotation_speed;
            state.rotation.pitch = new_pitch;
            state.target.previous_pitch = new_pitch;

            if round_to(new_pitch, 1) == round_to(target_pitch, 1) {
                state.target.is_converging = false;
                info!(pitch = new_pitch, city = %state.city.name, "pitch converged");
            }
        } else {
            state.rotation.pitch = target_pitch;
            state.rotation.spin_longitude += self.rotation_speed;
        }

        let latitude = self.ease_latitude(state);

        Frame {
            rotation: state.rotation,
            latitude,
            marker: state.show_marker.then_some((state.city.lon, state.city.lat)),
            handle: state.handle,
        }
    }

    /// Ease the drawn latitude toward the city's, returning the latitude to draw.
    fn ease_latitude(&self, state: &mut GlobeState) -> f64 {
        let target = state.city.lat;
        if state.target.previous_latitude == target {
            return target;
        }

        let latitude = ease(state.target.previous_latitude, target, self.ease_divisor);
        state.target.previous_latitude = latitude;
        if state.show_marker {
            state.place_handle(latitude);
        }

        if round_to(latitude, 2) == round_to(target, 2) {
            state.target.previous_latitude = target;
            if state.show_marker {
                state.place_handle(target);
            }
        }
        latitude
    }

    /// Run frames until the scheduler stops or a handle is cancelled.
    /// Returns the number of frames produced.
    pub fn run<S, F>(&self, state: &mut GlobeState, scheduler: &mut S, mut on_frame: F) -> Result<u64>
    where
        S: Scheduler,
        F: FnMut(&mut GlobeState, &Frame, &FrameHandle) -> Result<()>,
    {
        let mut frames = 0;
        loop {
            let handle = scheduler.schedule();
            if !scheduler.wait(&handle) {
                break;
            }
            let frame = self.tick(state);
            on_frame(state, &frame, &handle)?;
            frames += 1;
        }
        Ok(frames)
    }
}
