pub mod geometry;
pub mod land;
pub mod projection;
pub mod renderer;
pub mod visibility;

pub use land::{LandMask, Polygon, Ring};
pub use projection::{Orthographic, Viewport};
pub use renderer::{GlobeLayers, GlobeRenderer, Label};
