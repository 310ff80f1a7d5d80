//! # Emberdeep
//!
//! The procedural-dungeon core of a tile-based cave roguelike.
//!
//! ## Architecture Overview
//!
//! Emberdeep is an in-process game core. Rendering, input devices and audio
//! live outside the crate and talk to it through a small surface:
//!
//! - **Generation System**: cellular-automaton caves, region pruning and
//!   depth-themed feature placement
//! - **Visibility System**: shadowcast field of view merged with flickering
//!   light sources into a visible/explored illumination map
//! - **Entity System**: player, NPC and monster collections with movement
//!   legality, monster AI and combat resolution
//! - **Game Session**: the turn state machine that ties everything together
//!   and emits a [`GameEvent`] stream for the presentation layer
//!
//! ## Determinism
//!
//! Every random decision flows from one seeded [`rand::rngs::StdRng`] owned by
//! the session, so a seed fully reproduces a run.

pub mod config;
pub mod game;
pub mod generation;
pub mod input;
pub mod rendering;
pub mod visibility;

// Core module re-exports
pub use config::*;
pub use game::*;
pub use generation::*;
pub use input::*;
pub use rendering::*;
pub use visibility::*;

/// Core error type for the Emberdeep engine.
#[derive(thiserror::Error, Debug)]
pub enum EmberError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration is unusable (bad dimensions, radius, probabilities)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Generation failed after exhausting its retries
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
}

/// Result type used throughout the Emberdeep codebase.
pub type EmberResult<T> = Result<T, EmberError>;

/// Version information for the game.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
