//! # Combat Resolution
//!
//! Damage rolls, critical hits and the combat tunables.

use crate::config::check_unit_interval;
use crate::game::{DamageRange, EntityStats};
use crate::{EmberError, EmberResult, DEFAULT_PLAYER_HEALTH};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Combat and monster AI tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Probability that an attack is a critical hit
    pub critical_chance: f64,
    /// Damage multiplier applied on a critical hit
    pub critical_multiplier: u32,
    /// Player starting and maximum health
    pub player_health: u32,
    /// Player damage range
    pub player_damage: DamageRange,
    /// Monsters closer than this Manhattan distance chase the player
    pub detection_range: u32,
}

impl CombatConfig {
    /// Rejects unusable combat settings.
    pub fn validate(&self) -> EmberResult<()> {
        check_unit_interval("critical_chance", self.critical_chance)?;
        if self.player_health == 0 {
            return Err(EmberError::Config(
                "player health must be positive".to_string(),
            ));
        }
        if self.critical_multiplier == 0 {
            return Err(EmberError::Config(
                "critical multiplier must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            critical_chance: 0.1,
            critical_multiplier: 2,
            player_health: DEFAULT_PLAYER_HEALTH,
            player_damage: DamageRange::new(4, 9),
            detection_range: 5,
        }
    }
}

/// Source of combat randomness.
///
/// Every [`rand::Rng`] is a `Dice`; tests can plug in scripted rolls.
pub trait Dice {
    /// Rolls a uniform integer within the inclusive range.
    fn roll_damage(&mut self, range: DamageRange) -> u32;

    /// Returns true with the given probability.
    fn roll_chance(&mut self, probability: f64) -> bool;
}

impl<R: Rng + ?Sized> Dice for R {
    fn roll_damage(&mut self, range: DamageRange) -> u32 {
        self.gen_range(range.min..=range.max)
    }

    fn roll_chance(&mut self, probability: f64) -> bool {
        self.gen_bool(probability.clamp(0.0, 1.0))
    }
}

/// Result of a single resolved attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Rolled damage after the critical multiplier
    pub damage: u32,
    pub critical: bool,
    /// Defender health after the hit
    pub remaining_health: u32,
    /// True if this hit brought the defender to zero
    pub killed: bool,
}

/// Resolves one attack and applies its damage to the defender.
///
/// Returns `None` without touching anything when either side is already dead.
///
/// # Examples
///
/// ```
/// use emberdeep::{resolve_attack, CombatConfig, DamageRange, EntityStats};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let attacker = EntityStats::new(10, DamageRange::new(3, 7));
/// let mut defender = EntityStats::new(50, DamageRange::new(1, 1));
/// let mut rng = StdRng::seed_from_u64(1);
///
/// let config = CombatConfig::default();
/// let outcome = resolve_attack(&attacker, &mut defender, &config, &mut rng).unwrap();
/// assert!(outcome.damage >= 3 && outcome.damage <= 14);
/// assert_eq!(defender.health, 50 - outcome.damage);
/// ```
pub fn resolve_attack<D: Dice + ?Sized>(
    attacker: &EntityStats,
    defender: &mut EntityStats,
    config: &CombatConfig,
    dice: &mut D,
) -> Option<AttackOutcome> {
    if !attacker.is_alive() || !defender.is_alive() {
        return None;
    }

    let mut damage = dice.roll_damage(attacker.damage);
    let critical = dice.roll_chance(config.critical_chance);
    if critical {
        damage = damage.saturating_mul(config.critical_multiplier);
    }

    let remaining_health = defender.take_damage(damage);
    Some(AttackOutcome {
        damage,
        critical,
        remaining_health,
        killed: remaining_health == 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// Always rolls the top of the range and never crits.
    struct MaxDice;

    impl Dice for MaxDice {
        fn roll_damage(&mut self, range: DamageRange) -> u32 {
            range.max
        }

        fn roll_chance(&mut self, _probability: f64) -> bool {
            false
        }
    }

    /// Always crits.
    struct CritDice;

    impl Dice for CritDice {
        fn roll_damage(&mut self, range: DamageRange) -> u32 {
            range.min
        }

        fn roll_chance(&mut self, _probability: f64) -> bool {
            true
        }
    }

    #[test]
    fn test_nine_max_hits_leave_37_health() {
        let config = CombatConfig::default();
        let monster = EntityStats::new(10, DamageRange::new(3, 7));
        let mut player = EntityStats::new(100, DamageRange::new(4, 9));

        for _ in 0..9 {
            let outcome = resolve_attack(&monster, &mut player, &config, &mut MaxDice).unwrap();
            assert_eq!(outcome.damage, 7);
        }
        assert_eq!(player.health, 100 - 9 * 7);
    }

    #[test]
    fn test_health_clamps_at_zero() {
        let config = CombatConfig::default();
        let monster = EntityStats::new(10, DamageRange::new(3, 7));
        let mut player = EntityStats::new(20, DamageRange::new(4, 9));

        let mut last = None;
        for _ in 0..5 {
            last = resolve_attack(&monster, &mut player, &config, &mut MaxDice).or(last);
        }
        assert_eq!(player.health, 0);
        assert!(last.unwrap().killed);
    }

    #[test]
    fn test_critical_doubles_damage() {
        let config = CombatConfig::default();
        let attacker = EntityStats::new(10, DamageRange::new(5, 8));
        let mut defender = EntityStats::new(100, DamageRange::new(1, 1));
        let outcome = resolve_attack(&attacker, &mut defender, &config, &mut CritDice).unwrap();
        assert!(outcome.critical);
        assert_eq!(outcome.damage, 10);
        assert_eq!(defender.health, 90);
    }

    #[test]
    fn test_dead_participants_do_nothing() {
        let config = CombatConfig::default();
        let mut dead = EntityStats::new(10, DamageRange::new(1, 2));
        dead.take_damage(10);
        let mut alive = EntityStats::new(10, DamageRange::new(1, 2));

        assert!(resolve_attack(&dead, &mut alive, &config, &mut MaxDice).is_none());
        assert_eq!(alive.health, 10);

        let attacker = alive.clone();
        assert!(resolve_attack(&attacker, &mut dead, &config, &mut MaxDice).is_none());
    }

    #[test]
    fn test_rng_rolls_stay_in_bounds() {
        let config = CombatConfig::default();
        let mut rng = StdRng::seed_from_u64(77);
        let attacker = EntityStats::new(10, DamageRange::new(3, 7));
        for _ in 0..500 {
            let mut defender = EntityStats::new(1000, DamageRange::new(1, 1));
            let outcome = resolve_attack(&attacker, &mut defender, &config, &mut rng).unwrap();
            assert!((3..=14).contains(&outcome.damage));
            if !outcome.critical {
                assert!(outcome.damage <= 7);
            }
        }
    }
}
