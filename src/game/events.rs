//! # Game Events
//!
//! Output stream the presentation layer drains after every command or tick.

use crate::game::{EntityId, Position};
use serde::{Deserialize, Serialize};

/// Something the UI may want to react to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// The player moved one step
    PlayerMoved { from: Position, to: Position },
    /// The player hit a monster
    MonsterAttacked {
        target: EntityId,
        amount: u32,
        critical: bool,
        killed: bool,
    },
    /// A monster hit the player
    PlayerAttacked {
        attacker: EntityId,
        amount: u32,
        critical: bool,
    },
    /// A new depth was entered
    DepthChanged { depth: u32 },
    PlayerDied,
    PlayerWon,
    PauseToggled { paused: bool },
    SessionRestarted,
}

/// Running totals for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub monsters_killed: u32,
    pub damage_dealt: u64,
    pub damage_taken: u64,
    pub steps_taken: u64,
    pub deepest_depth: u32,
}

impl SessionStats {
    /// Updates the counters from an emitted event.
    pub fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::PlayerMoved { .. } => self.steps_taken += 1,
            GameEvent::MonsterAttacked { amount, killed, .. } => {
                self.damage_dealt += u64::from(*amount);
                if *killed {
                    self.monsters_killed += 1;
                }
            }
            GameEvent::PlayerAttacked { amount, .. } => {
                self.damage_taken += u64::from(*amount);
            }
            GameEvent::DepthChanged { depth } => {
                self.deepest_depth = self.deepest_depth.max(*depth);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_stats_follow_events() {
        let mut stats = SessionStats::default();
        stats.record(&GameEvent::PlayerMoved {
            from: Position::new(1, 1),
            to: Position::new(2, 1),
        });
        stats.record(&GameEvent::MonsterAttacked {
            target: Uuid::nil(),
            amount: 6,
            critical: false,
            killed: true,
        });
        stats.record(&GameEvent::PlayerAttacked {
            attacker: Uuid::nil(),
            amount: 3,
            critical: true,
        });
        stats.record(&GameEvent::DepthChanged { depth: 3 });
        stats.record(&GameEvent::DepthChanged { depth: 2 });

        assert_eq!(stats.steps_taken, 1);
        assert_eq!(stats.monsters_killed, 1);
        assert_eq!(stats.damage_dealt, 6);
        assert_eq!(stats.damage_taken, 3);
        assert_eq!(stats.deepest_depth, 3);
    }

    #[test]
    fn test_events_serialize_with_type_tag() {
        let json = serde_json::to_string(&GameEvent::DepthChanged { depth: 2 }).unwrap();
        assert_eq!(json, r#"{"type":"depth_changed","depth":2}"#);
        let json = serde_json::to_string(&GameEvent::PlayerDied).unwrap();
        assert_eq!(json, r#"{"type":"player_died"}"#);
    }
}
