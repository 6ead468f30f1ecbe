/// GameStateMachine: the orchestrator.
///
/// ## States
///   ```
///   Menu ──select on StartGame──▶ Playing ◀──pause──▶ Paused
///     ▲                            │   │
///     │                 last life  │   │ cleared final room
///     │                 lost       ▼   ▼
///     └────────select──────── GameOver / Victory
///   ```
///
/// ## Sub-phases of Playing (flag + timestamp)
///   - waiting for respawn - entered on death, lasts `respawn_ms`
///   - room clear pending  - entered the first tick the room is cleared,
///                           lasts `room_clear_ms`, then the world advances
///
/// Movement is suspended during either sub-phase. While paused nothing
/// advances; on resume every recorded timestamp is pushed forward by the
/// paused duration.
///
/// Buttons are consumed on every loop pass (`handle_buttons`); everything
/// else runs at most once per `tick_ms` (`update`).

use tracing::{debug, trace, warn};

use crate::fx::tone::Sound;
use crate::hw::{elapsed, Board, Hardware};
use crate::sim::event::GameEvent;
use crate::sim::input::Direction;
use crate::sim::save::HighscoreTable;
use crate::sim::world::{GameState, MenuOption, RoomAdvance, RoomWorld};

#[derive(Clone, Copy, Debug)]
pub struct Timing {
    pub tick_ms: u32,
    pub respawn_ms: u32,
    pub room_clear_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Timing { tick_ms: 50, respawn_ms: 2000, room_clear_ms: 2000 }
    }
}

pub struct GameStateMachine {
    world: RoomWorld,
    timing: Timing,
    last_update: Option<u32>,

    waiting_respawn: bool,
    death_time: u32,
    room_clear_pending: bool,
    room_clear_time: u32,
    paused_at: u32,

    /// Set on entering GameOver/Victory when the score made the table.
    new_highscore: bool,
}

impl GameStateMachine {
    pub fn new(world: RoomWorld, timing: Timing) -> Self {
        GameStateMachine {
            world,
            timing,
            last_update: None,
            waiting_respawn: false,
            death_time: 0,
            room_clear_pending: false,
            room_clear_time: 0,
            paused_at: 0,
            new_highscore: false,
        }
    }

    /// Load the high-score table and park at the menu.
    pub fn initialize<B: Board>(&mut self, hw: &mut Hardware<B>) {
        let table = HighscoreTable::load(&mut hw.storage);
        self.world.set_highscores(table);
        self.world.reset_game();
        self.clear_phases();
    }

    // ── Buttons ──

    pub fn handle_buttons<B: Board>(&mut self, hw: &mut Hardware<B>) {
        let now = hw.now();
        if hw.input.take_select() {
            self.on_select(hw, now);
        }
        if hw.input.take_pause() {
            self.on_pause(hw, now);
        }
    }

    fn on_select<B: Board>(&mut self, hw: &mut Hardware<B>, now: u32) {
        match self.world.state() {
            GameState::Menu => {
                if self.world.menu() == MenuOption::StartGame {
                    self.clear_phases();
                    self.world.start_new_game(now);
                }
                self.emit(hw, GameEvent::Confirmed, now);
            }
            GameState::GameOver | GameState::Victory => {
                self.clear_phases();
                self.new_highscore = false;
                self.world.reset_game();
                self.emit(hw, GameEvent::Confirmed, now);
            }
            GameState::Playing | GameState::Paused => {}
        }
    }

    fn on_pause<B: Board>(&mut self, hw: &mut Hardware<B>, now: u32) {
        match self.world.state() {
            GameState::Playing => {
                self.paused_at = now;
                self.world.set_state(GameState::Paused);
                self.emit(hw, GameEvent::Confirmed, now);
            }
            GameState::Paused => {
                let paused = elapsed(now, self.paused_at);
                self.death_time = self.death_time.wrapping_add(paused);
                self.room_clear_time = self.room_clear_time.wrapping_add(paused);
                self.world.shift_timers(paused);
                self.world.set_state(GameState::Playing);
                self.emit(hw, GameEvent::Confirmed, now);
            }
            _ => {}
        }
    }

    // ── Throttled update ──

    pub fn update<B: Board>(&mut self, hw: &mut Hardware<B>) {
        let now = hw.now();
        if let Some(last) = self.last_update {
            if elapsed(now, last) < self.timing.tick_ms {
                return;
            }
        }
        self.last_update = Some(now);

        match self.world.state() {
            GameState::Menu => self.update_menu(hw, now),
            GameState::Playing => self.update_playing(hw, now),
            GameState::Paused | GameState::GameOver | GameState::Victory => {}
        }
    }

    fn update_menu<B: Board>(&mut self, hw: &mut Hardware<B>, now: u32) {
        let Some(dir) = hw.input.poll_vertical(now) else { return };
        let menu = self.world.menu();
        self.world.set_menu(match dir {
            Direction::Up => menu.prev(),
            _ => menu.next(),
        });
        self.emit(hw, GameEvent::MenuMoved, now);
    }

    fn update_playing<B: Board>(&mut self, hw: &mut Hardware<B>, now: u32) {
        if self.waiting_respawn {
            if elapsed(now, self.death_time) >= self.timing.respawn_ms {
                self.waiting_respawn = false;
                self.world.respawn_player();
                self.emit(hw, GameEvent::PlayerRespawned, now);
            }
            return;
        }

        if self.room_clear_pending {
            if elapsed(now, self.room_clear_time) >= self.timing.room_clear_ms {
                self.room_clear_pending = false;
                match self.world.advance_to_next_room(now) {
                    RoomAdvance::NextRoom { bonus } => self.emit(hw, GameEvent::EnteredRoom { bonus }, now),
                    RoomAdvance::Victory => self.finish_run(hw, now),
                }
            }
            return;
        }

        if let Some(dir) = hw.input.poll_direction(now) {
            let (dc, dr) = dir.delta();
            match self.world.move_player(dc, dr) {
                Ok(outcome) if outcome.died => self.on_death(hw, now),
                Ok(outcome) if outcome.collected_cup => self.emit(hw, GameEvent::CupCollected, now),
                Ok(_) => self.emit(hw, GameEvent::PlayerMoved, now),
                Err(reason) => trace!(?dir, %reason, "move blocked"),
            }
        }

        if self.world.state() == GameState::Playing
            && self.world.player().alive
            && self.world.is_current_room_cleared()
        {
            self.room_clear_pending = true;
            self.room_clear_time = now;
            self.emit(hw, GameEvent::RoomCleared, now);
        }
    }

    fn on_death<B: Board>(&mut self, hw: &mut Hardware<B>, now: u32) {
        if self.world.lose_life() {
            debug!(lives = self.world.lives(), "player killed");
            self.waiting_respawn = true;
            self.death_time = now;
            self.emit(hw, GameEvent::PlayerKilled, now);
        } else {
            self.world.set_state(GameState::GameOver);
            self.finish_run(hw, now);
        }
    }

    /// Entry into GameOver or Victory: record the score, then play the
    /// matching effect.
    fn finish_run<B: Board>(&mut self, hw: &mut Hardware<B>, now: u32) {
        self.clear_phases();
        let score = self.world.score();
        self.new_highscore = self.world.is_new_highscore(score) && self.world.add_highscore(score);
        if self.new_highscore {
            if let Err(e) = self.world.highscores().persist(&mut hw.storage) {
                warn!("high score not saved: {e}");
            }
        }
        debug!(score, new_highscore = self.new_highscore, state = ?self.world.state(), "run finished");

        let event = if self.world.state() == GameState::Victory {
            GameEvent::GameWon
        } else {
            GameEvent::GameLost
        };
        self.emit(hw, event, now);
    }

    fn clear_phases(&mut self) {
        self.waiting_respawn = false;
        self.room_clear_pending = false;
    }

    // ── Effects ──

    fn emit<B: Board>(&mut self, hw: &mut Hardware<B>, event: GameEvent, now: u32) {
        trace!(?event, "game event");
        let sound = match event {
            GameEvent::MenuMoved => Sound::MenuMove,
            GameEvent::Confirmed => Sound::MenuSelect,
            GameEvent::PlayerMoved => Sound::PlayerMove,
            GameEvent::CupCollected => {
                hw.lights.blink_cup(now);
                Sound::CupCollect
            }
            GameEvent::PlayerKilled => {
                hw.lights.blink_death(now);
                Sound::PlayerDeath
            }
            GameEvent::RoomCleared => {
                hw.lights.blink_room_clear(now);
                Sound::RoomClear
            }
            GameEvent::GameWon => Sound::Victory,
            GameEvent::GameLost => {
                hw.lights.blink_death(now);
                Sound::GameOver
            }
            GameEvent::PlayerRespawned | GameEvent::EnteredRoom { .. } => return,
        };
        hw.buzzer.play(sound, now);
    }

    // ── Accessors ──

    pub fn world(&self) -> &RoomWorld {
        &self.world
    }

    pub fn state(&self) -> GameState {
        self.world.state()
    }

    pub fn is_waiting_respawn(&self) -> bool {
        self.waiting_respawn
    }

    pub fn is_room_clear_pending(&self) -> bool {
        self.room_clear_pending
    }

    pub fn new_highscore(&self) -> bool {
        self.new_highscore
    }

    /// Time left before the player reappears; 0 when not waiting.
    pub fn respawn_remaining_ms(&self, now: u32) -> u32 {
        if !self.waiting_respawn {
            return 0;
        }
        self.timing.respawn_ms.saturating_sub(elapsed(now, self.death_time))
    }
}
