//! # Rendering Module
//!
//! Presentation helpers: the enum-indexed sprite table consumed by graphical
//! front ends and plain-text snapshots used by the headless driver.

pub mod display;
pub mod sprites;

pub use display::*;
pub use sprites::*;
