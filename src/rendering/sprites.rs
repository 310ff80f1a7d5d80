//! # Sprite Table
//!
//! Maps every drawable kind to its cell on the sprite sheet and to an ASCII
//! glyph. Lookups are exhaustive `match`es, so adding a kind without a
//! sprite does not compile.

use crate::game::{FeatureKind, MonsterKind, NpcKind, TileKind};
use serde::{Deserialize, Serialize};

/// Cell of a sprite on the sheet, in sprite units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteRef {
    pub sheet_x: u16,
    pub sheet_y: u16,
}

impl SpriteRef {
    const fn at(sheet_x: u16, sheet_y: u16) -> Self {
        Self { sheet_x, sheet_y }
    }
}

/// Anything the presentation layer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpriteKey {
    Tile(TileKind),
    Feature(FeatureKind),
    Monster(MonsterKind),
    Npc(NpcKind),
    Player,
}

impl SpriteKey {
    /// Sheet cell for this key. Rows: terrain, features, monsters, NPCs, player.
    pub fn sprite(self) -> SpriteRef {
        match self {
            SpriteKey::Tile(kind) => SpriteRef::at(
                match kind {
                    TileKind::EarthWall => 0,
                    TileKind::MossyWall => 1,
                    TileKind::StoneWall => 2,
                    TileKind::ObsidianWall => 3,
                    TileKind::Grass => 4,
                    TileKind::Dirt => 5,
                    TileKind::Stone => 6,
                    TileKind::Cobble => 7,
                    TileKind::Ash => 8,
                },
                0,
            ),
            SpriteKey::Feature(feature) => SpriteRef::at(
                match feature {
                    FeatureKind::Tree => 0,
                    FeatureKind::SmallTree => 1,
                    FeatureKind::Sapling => 2,
                    FeatureKind::Mushroom => 3,
                    FeatureKind::Chest => 4,
                    FeatureKind::Door => 5,
                    FeatureKind::StairsDown => 6,
                },
                1,
            ),
            SpriteKey::Monster(kind) => SpriteRef::at(
                match kind {
                    MonsterKind::Rat => 0,
                    MonsterKind::Bat => 1,
                    MonsterKind::Slime => 2,
                    MonsterKind::Goblin => 3,
                    MonsterKind::Skeleton => 4,
                    MonsterKind::Orc => 5,
                    MonsterKind::Wraith => 6,
                    MonsterKind::Demon => 7,
                },
                2,
            ),
            SpriteKey::Npc(kind) => SpriteRef::at(
                match kind {
                    NpcKind::Wanderer => 0,
                    NpcKind::Herbalist => 1,
                    NpcKind::Hermit => 2,
                    NpcKind::Ghost => 3,
                },
                3,
            ),
            SpriteKey::Player => SpriteRef::at(0, 4),
        }
    }

    /// ASCII stand-in used by the headless driver.
    pub fn glyph(self) -> char {
        match self {
            SpriteKey::Tile(kind) if kind.is_wall() => '#',
            SpriteKey::Tile(TileKind::Grass) => '"',
            SpriteKey::Tile(TileKind::Cobble) => ',',
            SpriteKey::Tile(TileKind::Ash) => ':',
            SpriteKey::Tile(_) => '.',
            SpriteKey::Feature(feature) => match feature {
                FeatureKind::Tree => 'T',
                FeatureKind::SmallTree => 't',
                FeatureKind::Sapling => '\'',
                FeatureKind::Mushroom => '*',
                FeatureKind::Chest => '$',
                FeatureKind::Door => '+',
                FeatureKind::StairsDown => '>',
            },
            SpriteKey::Monster(kind) => match kind {
                MonsterKind::Rat => 'r',
                MonsterKind::Bat => 'b',
                MonsterKind::Slime => 'j',
                MonsterKind::Goblin => 'g',
                MonsterKind::Skeleton => 'z',
                MonsterKind::Orc => 'o',
                MonsterKind::Wraith => 'W',
                MonsterKind::Demon => 'D',
            },
            SpriteKey::Npc(kind) => match kind {
                NpcKind::Wanderer => 'h',
                NpcKind::Herbalist => 'H',
                NpcKind::Hermit => 'e',
                NpcKind::Ghost => 'G',
            },
            SpriteKey::Player => '@',
        }
    }
}
