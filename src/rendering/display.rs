//! # Text Display
//!
//! Plain-text snapshots of a session for the headless driver and for
//! debugging. Unexplored tiles stay blank, remembered tiles show terrain
//! only, and creatures are drawn only where the tile is lit.

use crate::game::{Entity, GameEvent, GameSession, Position, TurnState};
use crate::rendering::SpriteKey;

/// Draws the current level as rows of ASCII glyphs.
pub fn render_ascii(session: &GameSession) -> String {
    let level = session.level();
    let visibility = session.visibility();
    let entities = session.entities();
    let player = entities.player().position;

    let mut out =
        String::with_capacity((level.grid.width as usize + 1) * level.grid.height as usize);
    for y in 0..level.grid.height as i32 {
        for x in 0..level.grid.width as i32 {
            let pos = Position::new(x, y);
            let Some(tile) = level.grid.get(pos) else {
                continue;
            };
            let lit = visibility.visible(pos).is_some();
            let key = if pos == player {
                Some(SpriteKey::Player)
            } else if lit {
                entities
                    .monster_at(pos)
                    .map(|monster| SpriteKey::Monster(monster.kind))
                    .or_else(|| entities.npc_at(pos).map(|npc| SpriteKey::Npc(npc.kind)))
                    .or(tile.feature.map(SpriteKey::Feature))
                    .or(Some(SpriteKey::Tile(tile.kind)))
            } else if visibility.explored(pos).is_some() {
                Some(tile.feature.map_or(SpriteKey::Tile(tile.kind), SpriteKey::Feature))
            } else {
                None
            };
            out.push(key.map_or(' ', SpriteKey::glyph));
        }
        out.push('\n');
    }
    out
}

/// One-line summary of the run.
pub fn status_line(session: &GameSession) -> String {
    let player = session.entities().player();
    let stats = session.stats();
    let mut line = format!(
        "depth {} | hp {}/{} | kills {} | steps {} | tick {}",
        session.depth(),
        player.stats().health,
        player.stats().max_health,
        stats.monsters_killed,
        stats.steps_taken,
        session.current_tick()
    );
    match session.state() {
        TurnState::Dead => line.push_str(" | DEAD (r to restart)"),
        TurnState::Victorious => line.push_str(" | VICTORY (r to restart)"),
        _ if session.is_paused() => line.push_str(" | PAUSED"),
        _ => {}
    }
    line
}

/// Human-readable message for an event.
pub fn describe_event(event: &GameEvent) -> Option<String> {
    let text = match event {
        GameEvent::PlayerMoved { .. } => return None,
        GameEvent::MonsterAttacked {
            amount,
            critical,
            killed,
            ..
        } => format!(
            "You hit for {}{}{}",
            amount,
            if *critical { " (critical)" } else { "" },
            if *killed { ", it dies" } else { "" }
        ),
        GameEvent::PlayerAttacked {
            amount, critical, ..
        } => format!(
            "You are hit for {}{}",
            amount,
            if *critical { " (critical)" } else { "" }
        ),
        GameEvent::DepthChanged { depth } => format!("You reach depth {}", depth),
        GameEvent::PlayerDied => "You die.".to_string(),
        GameEvent::PlayerWon => "You step through the door into daylight.".to_string(),
        GameEvent::PauseToggled { paused } => {
            if *paused {
                "Paused".to_string()
            } else {
                "Resumed".to_string()
            }
        }
        GameEvent::SessionRestarted => "A new descent begins".to_string(),
    };
    Some(text)
}
