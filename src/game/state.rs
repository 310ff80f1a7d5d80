//! # Game Session
//!
//! The turn state machine that coordinates generation, visibility, entities
//! and combat for one run through the cave.
//!
//! A command or tick always runs to completion before the next one is
//! handled. Two phases are left open on purpose so the presentation layer
//! can show them: a depth transition (the new level is in place but nothing
//! has been seen yet) and combat (the player's blow has landed and the
//! monster's counter-attack is pending). Both are completed by
//! [`GameSession::advance`], which every command and tick calls first.

use crate::config::GameConfig;
use crate::game::{
    new_entity_id, Entity, EntityId, EntityManager, GameEvent, Level, MonsterAction, MoveResult,
    Mover, Player, Position, SessionStats,
};
use crate::generation::{populate_level, utils, CaveGenerator, Generator};
use crate::input::Command;
use crate::visibility::VisibilityMap;
use crate::EmberResult;
use log::{debug, info};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Where the session is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnState {
    /// Waiting for the next player command
    AwaitingInput,
    /// A player step is being applied
    ResolvingMove,
    /// The player attacked; the counter-attack may still be pending
    ResolvingCombat,
    /// A new depth is in place but not yet revealed
    TransitioningDepth,
    /// The player died; only a restart leaves this state
    Dead,
    /// The player left through the victory door; only a restart leaves this state
    Victorious,
}

impl TurnState {
    /// Returns true for the end-of-run states.
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnState::Dead | TurnState::Victorious)
    }
}

/// A monster's answer to the player's attack, fired by the next
/// [`GameSession::advance`].
///
/// The epoch identifies the level the attack was scheduled on; a depth
/// change or restart bumps the session epoch and the attack is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCounterAttack {
    pub monster: EntityId,
    pub epoch: u64,
}

/// One run through the cave.
///
/// # Examples
///
/// ```
/// use emberdeep::{Command, Direction, GameConfig, GameSession, TurnState};
///
/// let mut session = GameSession::new(GameConfig::for_testing(3)).unwrap();
/// assert_eq!(session.depth(), 1);
/// assert_eq!(session.state(), TurnState::AwaitingInput);
///
/// session.handle_command(Command::Move(Direction::East)).unwrap();
/// session.tick().unwrap();
/// assert!(!session.drain_events().is_empty());
/// ```
#[derive(Debug)]
pub struct GameSession {
    config: GameConfig,
    rng: StdRng,
    level: Level,
    entities: EntityManager,
    visibility: VisibilityMap,
    state: TurnState,
    paused: bool,
    tick: u64,
    epoch: u64,
    pending_counter: Option<PendingCounterAttack>,
    events: Vec<GameEvent>,
    stats: SessionStats,
}

impl GameSession {
    /// Starts a new run at depth 1.
    ///
    /// Fails on an invalid configuration or when the first level cannot be
    /// generated.
    pub fn new(config: GameConfig) -> EmberResult<Self> {
        config.validate()?;
        let mut rng = utils::create_rng(config.seed);
        let (level, entities) = start_run(&config, &mut rng)?;

        let mut session = Self {
            config,
            rng,
            level,
            entities,
            visibility: VisibilityMap::new(),
            state: TurnState::AwaitingInput,
            paused: false,
            tick: 0,
            epoch: 0,
            pending_counter: None,
            events: Vec::new(),
            stats: SessionStats::default(),
        };
        session.refresh_visibility()?;
        session.emit(GameEvent::DepthChanged { depth: 1 });
        info!("session started with seed {}", session.config.seed);
        Ok(session)
    }

    /// Gets the current level.
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Gets the illumination map.
    pub fn visibility(&self) -> &VisibilityMap {
        &self.visibility
    }

    /// Gets the player, NPCs and monsters.
    pub fn entities(&self) -> &EntityManager {
        &self.entities
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn depth(&self) -> u32 {
        self.level.depth
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of ticks processed so far.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// The counter-attack waiting for the next `advance`, if any.
    pub fn pending_counter_attack(&self) -> Option<&PendingCounterAttack> {
        self.pending_counter.as_ref()
    }

    /// Takes every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Applies a player command.
    ///
    /// Invalid requests (moving into a wall, moving while paused or after
    /// the run ended) change nothing and are not errors.
    pub fn handle_command(&mut self, command: Command) -> EmberResult<()> {
        match command {
            Command::Restart => self.restart(),
            Command::TogglePause => {
                self.paused = !self.paused;
                self.emit(GameEvent::PauseToggled {
                    paused: self.paused,
                });
                Ok(())
            }
            Command::Move(direction) => {
                if self.paused {
                    debug!("move {:?} ignored while paused", direction);
                    return Ok(());
                }
                self.advance()?;
                if self.state != TurnState::AwaitingInput {
                    debug!("move {:?} ignored in state {:?}", direction, self.state);
                    return Ok(());
                }
                self.move_player(direction.to_delta())
            }
        }
    }

    /// Completes a pending phase: reveals the new depth after a transition,
    /// or fires the pending counter-attack after combat.
    pub fn advance(&mut self) -> EmberResult<()> {
        match self.state {
            TurnState::TransitioningDepth => {
                self.refresh_visibility()?;
                self.state = TurnState::AwaitingInput;
            }
            TurnState::ResolvingCombat => {
                self.fire_counter_attack();
                if self.state == TurnState::ResolvingCombat {
                    self.state = TurnState::AwaitingInput;
                }
            }
            TurnState::ResolvingMove => self.state = TurnState::AwaitingInput,
            TurnState::AwaitingInput | TurnState::Dead | TurnState::Victorious => {}
        }
        Ok(())
    }

    /// Runs one periodic tick: pending phases, monster AI, light flicker and
    /// a visibility refresh. Does nothing while paused or after the run ended.
    pub fn tick(&mut self) -> EmberResult<()> {
        if self.paused || self.state.is_terminal() {
            return Ok(());
        }
        self.advance()?;
        if self.state.is_terminal() {
            return Ok(());
        }

        self.tick += 1;
        for id in self.entities.monster_ids() {
            let action = self.entities.step_monster_ai(
                &self.level.grid,
                id,
                self.tick,
                &self.config.combat,
                &mut self.rng,
            );
            if let MonsterAction::Attacked(outcome) = action {
                self.emit(GameEvent::PlayerAttacked {
                    attacker: id,
                    amount: outcome.damage,
                    critical: outcome.critical,
                });
                if outcome.killed {
                    self.player_died();
                    return Ok(());
                }
            }
        }

        let flicker = self.config.visibility.flicker;
        for light in &mut self.level.lights {
            light.flicker(flicker, &mut self.rng);
        }
        self.refresh_visibility()
    }

    /// Throws the current run away and starts again at depth 1.
    ///
    /// The random stream continues, so a restart gives a new cave.
    pub fn restart(&mut self) -> EmberResult<()> {
        let (level, entities) = start_run(&self.config, &mut self.rng)?;
        self.level = level;
        self.entities = entities;
        self.visibility.reset();
        self.state = TurnState::AwaitingInput;
        self.paused = false;
        self.epoch += 1;
        self.pending_counter = None;
        self.stats = SessionStats::default();
        self.refresh_visibility()?;
        self.emit(GameEvent::SessionRestarted);
        self.emit(GameEvent::DepthChanged { depth: 1 });
        info!("session restarted");
        Ok(())
    }

    fn emit(&mut self, event: GameEvent) {
        self.stats.record(&event);
        self.events.push(event);
    }

    fn refresh_visibility(&mut self) -> EmberResult<()> {
        self.visibility.refresh(
            &self.level.grid,
            self.entities.player().position,
            &self.level.lights,
            &self.config.visibility,
        )
    }

    fn move_player(&mut self, delta: Position) -> EmberResult<()> {
        let from = self.entities.player().position;
        self.state = if self.entities.monster_at(from + delta).is_some() {
            TurnState::ResolvingCombat
        } else {
            TurnState::ResolvingMove
        };

        match self.entities.attempt_move(&self.level.grid, Mover::Player, delta) {
            MoveResult::Blocked => {
                self.state = TurnState::AwaitingInput;
                Ok(())
            }
            MoveResult::Moved => {
                self.emit(GameEvent::PlayerMoved { from, to: from + delta });
                self.refresh_visibility()?;
                self.state = TurnState::AwaitingInput;
                Ok(())
            }
            MoveResult::EnteredStairs => {
                self.emit(GameEvent::PlayerMoved { from, to: from + delta });
                self.descend()
            }
            MoveResult::EnteredVictoryDoor => {
                self.emit(GameEvent::PlayerMoved { from, to: from + delta });
                self.state = TurnState::Victorious;
                self.pending_counter = None;
                self.refresh_visibility()?;
                self.emit(GameEvent::PlayerWon);
                info!("victory at depth {}", self.level.depth);
                Ok(())
            }
            MoveResult::InitiatedCombat(monster) => {
                self.state = TurnState::ResolvingCombat;
                self.player_attack(monster);
                Ok(())
            }
        }
    }

    /// Swaps in the next depth. Visibility stays empty until `advance`.
    fn descend(&mut self) -> EmberResult<()> {
        let depth = self.level.depth + 1;
        let mut level = CaveGenerator::new(depth).generate(&self.config.generation, &mut self.rng)?;
        populate_level(
            &mut level,
            &mut self.entities,
            &self.config.population,
            &self.config.visibility,
            &mut self.rng,
        )?;

        self.level = level;
        self.visibility.reset();
        self.epoch += 1;
        self.pending_counter = None;
        self.state = TurnState::TransitioningDepth;
        self.emit(GameEvent::DepthChanged { depth });
        info!("descended to depth {}", depth);
        Ok(())
    }

    fn player_attack(&mut self, monster: EntityId) {
        let Some(outcome) = self
            .entities
            .player_attack(monster, &self.config.combat, &mut self.rng)
        else {
            self.state = TurnState::AwaitingInput;
            return;
        };

        self.emit(GameEvent::MonsterAttacked {
            target: monster,
            amount: outcome.damage,
            critical: outcome.critical,
            killed: outcome.killed,
        });
        if outcome.killed {
            self.state = TurnState::AwaitingInput;
        } else {
            self.pending_counter = Some(PendingCounterAttack {
                monster,
                epoch: self.epoch,
            });
        }
    }

    fn fire_counter_attack(&mut self) {
        let Some(pending) = self.pending_counter.take() else {
            return;
        };
        if pending.epoch != self.epoch {
            debug!("dropping stale counter-attack from {}", pending.monster);
            return;
        }

        let outcome =
            self.entities
                .monster_attack(pending.monster, &self.config.combat, &mut self.rng);
        let Some(outcome) = outcome else {
            return;
        };
        // The blow uses up the monster's action for the coming tick
        self.entities.mark_acted(pending.monster, self.tick + 1);
        self.emit(GameEvent::PlayerAttacked {
            attacker: pending.monster,
            amount: outcome.damage,
            critical: outcome.critical,
        });
        if outcome.killed {
            self.player_died();
        }
    }

    fn player_died(&mut self) {
        self.state = TurnState::Dead;
        self.pending_counter = None;
        self.emit(GameEvent::PlayerDied);
        info!(
            "player died at depth {} after {} steps",
            self.level.depth, self.stats.steps_taken
        );
    }
}

/// Builds the depth-1 level and a fresh player for a new run.
fn start_run(config: &GameConfig, rng: &mut StdRng) -> EmberResult<(Level, EntityManager)> {
    let player = Player::new(
        new_entity_id(rng),
        Position::origin(),
        config.combat.player_health,
        config.combat.player_damage,
    );
    let mut entities = EntityManager::new(player);
    let mut level = CaveGenerator::new(1).generate(&config.generation, rng)?;
    populate_level(
        &mut level,
        &mut entities,
        &config.population,
        &config.visibility,
        rng,
    )?;
    debug!(
        "run started: player {} at {:?}",
        entities.player().id(),
        entities.player().position
    );
    Ok((level, entities))
}
