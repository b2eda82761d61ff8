//! Rotating terminal globe showing how fast the Earth's surface moves at a
//! given latitude.

pub mod animation;
pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod geo;
pub mod handle;
pub mod map;
pub mod state;
pub mod ui;
