//! # Light Sources
//!
//! Firepits and other emitters that light the cave independently of the
//! player's own sight.

use crate::game::Position;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A flickering point light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSource {
    pub position: Position,
    pub base_intensity: f32,
    /// Intensity after this tick's flicker
    pub current_intensity: f32,
    pub radius: i32,
}

impl LightSource {
    /// Creates a steady light at its base intensity.
    pub fn new(position: Position, base_intensity: f32, radius: i32) -> Self {
        let base_intensity = base_intensity.clamp(0.0, 1.0);
        Self {
            position,
            base_intensity,
            current_intensity: base_intensity,
            radius,
        }
    }

    /// Re-rolls the current intensity within `±amount` of the base.
    pub fn flicker<R: Rng + ?Sized>(&mut self, amount: f32, rng: &mut R) {
        let amount = amount.abs();
        let jitter = if amount > 0.0 {
            rng.gen_range(-amount..=amount)
        } else {
            0.0
        };
        self.current_intensity = (self.base_intensity * (1.0 + jitter)).clamp(0.0, 1.0);
    }
}
