use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use tracing::debug;

use crate::animation::Frame;
use crate::config::GlobeConfig;
use crate::geo::format_coords;
use crate::map::{GlobeRenderer, LandMask, Viewport};
use crate::state::{City, Command, GlobeState};

/// Braille pixel viewport for a terminal size.
/// Accounts for the border (2 chars horizontal, 2 vertical) and the status bar.
pub fn viewport_for_terminal(width: usize, height: usize) -> Viewport {
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(3);
    Viewport::new(inner_width * 2, inner_height * 4)
}

/// Convert a terminal cell to the braille pixel at its center.
/// Accounts for the border (1 cell offset).
pub fn cell_to_pixel(col: u16, row: u16) -> (f64, f64) {
    let px = (col.saturating_sub(1) as f64) * 2.0 + 1.0;
    let py = (row.saturating_sub(1) as f64) * 4.0 + 2.0;
    (px, py)
}

/// Application state around the globe: presets, pointer tracking, quit flag
pub struct App {
    pub renderer: GlobeRenderer,
    pub presets: Vec<City>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Index of the preset last selected from the keyboard
    preset_index: Option<usize>,
    /// Whether the current drag started on the handle knob
    grasping_handle: bool,
    spin_drag_sensitivity: f64,
}

impl App {
    pub fn new(width: usize, height: usize, land: LandMask, presets: Vec<City>, config: &GlobeConfig) -> Self {
        Self {
            renderer: GlobeRenderer::new(
                viewport_for_terminal(width, height),
                land,
                config.parallel_step_degrees,
            ),
            presets,
            should_quit: false,
            last_mouse: None,
            preset_index: None,
            grasping_handle: false,
            spin_drag_sensitivity: config.spin_drag_sensitivity,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        self.renderer.viewport()
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Rebuild the viewport for a new terminal size, keeping the animation state.
    pub fn resize(&mut self, width: usize, height: usize, state: &mut GlobeState) {
        let viewport = viewport_for_terminal(width, height);
        self.renderer.set_viewport(viewport);
        state.set_viewport(&viewport);
        debug!(width = viewport.width, height = viewport.height, "viewport resized");
    }

    /// Back to the initial view
    pub fn reset(&mut self, state: &mut GlobeState) {
        *state = GlobeState::new(self.renderer.viewport());
        self.preset_index = None;
        self.grasping_handle = false;
        self.last_mouse = None;
    }

    /// Handle a key press
    pub fn handle_key(&mut self, code: KeyCode, state: &mut GlobeState) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.reset(state),
            _ => {
                if let Some(command) = self.preset_command(code) {
                    state.apply(command);
                }
            }
        }
    }

    /// Preset selection keys: n/p cycle, 1-9 pick directly
    fn preset_command(&mut self, code: KeyCode) -> Option<Command> {
        let len = self.presets.len();
        if len == 0 {
            return None;
        }
        let index = match code {
            KeyCode::Char('n') | KeyCode::Right => self.preset_index.map_or(0, |i| (i + 1) % len),
            KeyCode::Char('p') | KeyCode::Left => self.preset_index.map_or(len - 1, |i| (i + len - 1) % len),
            KeyCode::Char(c @ '1'..='9') => {
                let i = c as usize - '1' as usize;
                if i >= len {
                    return None;
                }
                i
            }
            _ => return None,
        };
        self.preset_index = Some(index);
        Some(Command::CitySelected(self.presets[index].clone()))
    }

    /// Handle a mouse event
    pub fn handle_mouse(&mut self, mouse: MouseEvent, state: &mut GlobeState) {
        if let Some(command) = self.mouse_command(mouse, state) {
            state.apply(command);
        }
    }

    /// A press on the knob grasps the handle and later drags move it.
    /// A drag anywhere else spins the globe.
    fn mouse_command(&mut self, mouse: MouseEvent, state: &GlobeState) -> Option<Command> {
        let (x, y) = cell_to_pixel(mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.last_mouse = Some((mouse.column, mouse.row));
                self.grasping_handle = state.handle.hit_test(&state.handle_geometry, x, y);
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.grasping_handle {
                    return Some(Command::DragMoved { x, y });
                }
                let last = self.last_mouse.replace((mouse.column, mouse.row))?;
                let dx = (mouse.column as f64 - last.0 as f64) * 2.0;
                (dx != 0.0).then_some(Command::SpinDragged {
                    degrees: dx * self.spin_drag_sensitivity,
                })
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.last_mouse = None;
                std::mem::take(&mut self.grasping_handle).then_some(Command::DragReleased)
            }
            _ => None,
        }
    }

    /// Name of the selection, or a hint when the latitude was dragged
    pub fn city_label(&self, state: &GlobeState) -> String {
        let city = &state.city;
        if city.name.is_empty() {
            "Custom latitude".to_string()
        } else if state.show_marker {
            format!("{} ({})", city.name, format_coords(city.lon, city.lat))
        } else {
            city.name.clone()
        }
    }

    /// Drawn latitude as a string
    pub fn latitude_label(&self, frame: &Frame) -> String {
        format!(
            "{:.2}°{}",
            frame.latitude.abs(),
            if frame.latitude >= 0.0 { "N" } else { "S" }
        )
    }

    /// Speed shown on the handle, with 2 decimals
    pub fn speed_label(&self, state: &GlobeState) -> String {
        format!("{:.2} mph", state.displayed_speed())
    }

    /// Current spin and pitch as a string
    pub fn orientation_label(&self, frame: &Frame) -> String {
        format!(
            "spin {:.1}° pitch {:.1}°",
            frame.rotation.spin_longitude.rem_euclid(360.0),
            frame.rotation.pitch
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationLoop;
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        App::new(
            100,
            50,
            LandMask::empty(),
            vec![City::new("Quito", -78.5, -0.2), City::new("Oslo", 10.7, 59.9)],
            &GlobeConfig::default(),
        )
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE }
    }

    /// Terminal cell whose center pixel is nearest the handle knob
    fn knob_cell(state: &GlobeState) -> (u16, u16) {
        let (ex, ey) = state.handle.positions.end;
        ((ex / 2.0) as u16 + 1, (ey / 4.0) as u16 + 1)
    }

    #[test]
    fn test_viewport_for_terminal() {
        let viewport = viewport_for_terminal(100, 50);
        assert_eq!(viewport.width, 196);
        assert_eq!(viewport.height, 188);
        assert_eq!(viewport_for_terminal(1, 1).width, 0);
    }

    #[test]
    fn test_cell_to_pixel() {
        assert_eq!(cell_to_pixel(1, 1), (1.0, 2.0));
        assert_eq!(cell_to_pixel(11, 6), (21.0, 22.0));
        assert_eq!(cell_to_pixel(0, 0), (1.0, 2.0));
    }

    #[test]
    fn test_preset_cycle() {
        let mut app = app();
        let mut state = GlobeState::new(app.viewport());

        app.handle_key(KeyCode::Char('n'), &mut state);
        assert_eq!(state.city.name, "Quito");
        app.handle_key(KeyCode::Char('n'), &mut state);
        assert_eq!(state.city.name, "Oslo");
        app.handle_key(KeyCode::Char('n'), &mut state);
        assert_eq!(state.city.name, "Quito");
        app.handle_key(KeyCode::Char('p'), &mut state);
        assert_eq!(state.city.name, "Oslo");
        assert!(state.target.is_converging);
    }

    #[test]
    fn test_previous_without_selection_picks_last() {
        let mut app = app();
        let mut state = GlobeState::new(app.viewport());
        app.handle_key(KeyCode::Char('p'), &mut state);
        assert_eq!(state.city.name, "Oslo");
    }

    #[test]
    fn test_digit_selects_preset() {
        let mut app = app();
        let mut state = GlobeState::new(app.viewport());
        app.handle_key(KeyCode::Char('2'), &mut state);
        assert_eq!(state.city.name, "Oslo");
        // Out of range digits are ignored
        app.handle_key(KeyCode::Char('9'), &mut state);
        assert_eq!(state.city.name, "Oslo");
    }

    #[test]
    fn test_quit_and_reset() {
        let mut app = app();
        let mut state = GlobeState::new(app.viewport());
        app.handle_key(KeyCode::Char('1'), &mut state);
        app.handle_key(KeyCode::Char('r'), &mut state);
        assert_eq!(state.city, City::placeholder());
        assert!(!state.show_marker);

        assert!(!app.should_quit);
        app.handle_key(KeyCode::Esc, &mut state);
        assert!(app.should_quit);
    }

    #[test]
    fn test_knob_drag_moves_handle() {
        let mut app = app();
        let mut state = GlobeState::new(app.viewport());
        let (col, row) = knob_cell(&state);

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), col, row), &mut state);
        assert!(app.grasping_handle);

        // Drag to the top row just left of center: clamps to straight up
        let (cx, _) = state.handle_geometry.center;
        let top_col = (cx / 2.0) as u16;
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), top_col, 1), &mut state);
        assert_eq!(state.city.lat, 90.0);
        assert_eq!(state.displayed_speed(), 0.0);

        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), top_col, 1), &mut state);
        assert!(!app.grasping_handle);
        assert_eq!(state.city.lat, 90.0);
    }

    #[test]
    fn test_click_on_knob_keeps_selection() {
        let mut app = app();
        let mut state = GlobeState::new(app.viewport());
        app.handle_key(KeyCode::Char('2'), &mut state);
        let anim = AnimationLoop::default();
        for _ in 0..400 {
            anim.tick(&mut state);
        }
        assert_eq!(state.target.previous_latitude, 59.9);

        let (col, row) = knob_cell(&state);
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), col, row), &mut state);
        assert!(app.grasping_handle);
        assert!(state.show_marker);
        assert_eq!(state.city.name, "Oslo");
        assert_eq!(state.city.lat, 59.9);

        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), col, row), &mut state);
        assert!(!app.grasping_handle);
        assert!(state.show_marker);
        assert_eq!(state.city.lat, 59.9);
    }

    #[test]
    fn test_drag_off_handle_spins() {
        let mut app = app();
        let mut state = GlobeState::new(app.viewport());

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 5), &mut state);
        assert!(!app.grasping_handle);
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 10, 5), &mut state);

        // 5 cells = 10 pixels at 0.2° per pixel
        let frame = AnimationLoop::new(0.0, 20.0).tick(&mut state);
        assert!((frame.rotation.spin_longitude - 2.0).abs() < 1e-9);
        assert_eq!(state.city, City::placeholder());
    }

    #[test]
    fn test_resize_keeps_animation_state() {
        let mut app = app();
        let mut state = GlobeState::new(app.viewport());
        app.handle_key(KeyCode::Char('2'), &mut state);
        let target = state.target;

        app.resize(200, 80, &mut state);
        assert_eq!(app.viewport().width, 396);
        assert_eq!(state.target, target);
        assert_eq!(state.city.name, "Oslo");
        assert_eq!(state.handle_geometry.center, (198.0, 154.0));
    }

    #[test]
    fn test_labels() {
        let app = app();
        let mut state = GlobeState::new(app.viewport());
        let frame = AnimationLoop::default().tick(&mut state);
        assert_eq!(app.city_label(&state), "Pick a city");
        assert_eq!(app.latitude_label(&frame), "0.00°N");
        assert_eq!(app.speed_label(&state), "1040.40 mph");
        assert!(app.orientation_label(&frame).starts_with("spin 0.2° pitch "));

        state.apply(Command::CitySelected(City::new("Quito", -78.5, -0.2)));
        assert_eq!(app.city_label(&state), "Quito (0.2°S, 78.5°W)");

        state.city.name.clear();
        assert_eq!(app.city_label(&state), "Custom latitude");
    }
}
