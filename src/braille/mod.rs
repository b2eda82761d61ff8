mod canvas;

pub use canvas::{BrailleCanvas, BRAILLE_BASE};
