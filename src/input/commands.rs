//! # Command Definitions
//!
//! The commands a [`crate::GameSession`] accepts.

use crate::game::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A player command for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "command", content = "direction", rename_all = "snake_case")]
pub enum Command {
    /// Step (or attack) one tile in a direction
    Move(Direction),
    /// Pause or resume the periodic tick
    TogglePause,
    /// Throw the current run away and start again at depth 1
    Restart,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move(direction) => write!(f, "move {:?}", direction),
            Command::TogglePause => write!(f, "toggle pause"),
            Command::Restart => write!(f, "restart"),
        }
    }
}
