//! # Input Module
//!
//! Maps raw key tokens (as typed into the headless driver) to commands.

pub mod commands;

pub use commands::*;

use crate::game::Direction;

/// Input handler for turning key tokens into player input.
pub struct InputHandler {
    /// Whether to enable Vi-style movement keys (hjkl, yubn)
    pub vi_keys_enabled: bool,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    /// Creates a new input handler.
    ///
    /// # Examples
    ///
    /// ```
    /// use emberdeep::{Command, Direction, InputHandler, PlayerInput};
    ///
    /// let input = InputHandler::new();
    /// assert_eq!(
    ///     input.parse_key("k"),
    ///     Some(PlayerInput::Command(Command::Move(Direction::North)))
    /// );
    /// ```
    pub fn new() -> Self {
        Self {
            vi_keys_enabled: true,
        }
    }

    /// Parses one key token. Tokens are case-insensitive; unknown tokens give `None`.
    pub fn parse_key(&self, key: &str) -> Option<PlayerInput> {
        let key = key.trim().to_ascii_lowercase();
        let direction = match key.as_str() {
            "up" | "w" => Some(Direction::North),
            "down" | "s" => Some(Direction::South),
            "left" | "a" => Some(Direction::West),
            "right" | "d" => Some(Direction::East),
            "k" if self.vi_keys_enabled => Some(Direction::North),
            "j" if self.vi_keys_enabled => Some(Direction::South),
            "h" if self.vi_keys_enabled => Some(Direction::West),
            "l" if self.vi_keys_enabled => Some(Direction::East),
            "y" if self.vi_keys_enabled => Some(Direction::Northwest),
            "u" if self.vi_keys_enabled => Some(Direction::Northeast),
            "b" if self.vi_keys_enabled => Some(Direction::Southwest),
            "n" if self.vi_keys_enabled => Some(Direction::Southeast),
            _ => None,
        };
        if let Some(direction) = direction {
            return Some(PlayerInput::Command(Command::Move(direction)));
        }

        match key.as_str() {
            "p" | "pause" => Some(PlayerInput::Command(Command::TogglePause)),
            "r" | "restart" => Some(PlayerInput::Command(Command::Restart)),
            "." | "wait" => Some(PlayerInput::Wait),
            "?" | "help" => Some(PlayerInput::Help),
            "q" | "quit" | "escape" => Some(PlayerInput::Quit),
            _ => None,
        }
    }

    /// Parses a line of whitespace-separated key tokens, skipping unknown ones.
    pub fn parse_line(&self, line: &str) -> Vec<PlayerInput> {
        line.split_whitespace()
            .filter_map(|token| self.parse_key(token))
            .collect()
    }
}

/// Player input types that can be processed by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// A command for the session
    Command(Command),
    /// Let one tick pass immediately
    Wait,
    /// Quit the driver
    Quit,
    /// Show the key bindings
    Help,
}

/// Key bindings shown by the driver's help.
pub const KEY_HELP: &str = "\
move: w/a/s/d, arrows (up/down/left/right), vi keys h/j/k/l and y/u/b/n for diagonals
p: toggle pause    r: restart    .: wait one tick    ?: help    q: quit";
