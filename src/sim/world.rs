/// RoomWorld: the complete snapshot of a running game.
///
/// ## Room layers
///
/// Two room arrays, same shape:
///   - `base_rooms` - the layouts as loaded. Play never changes them.
///   - `rooms`      - the rooms being played (cups taken, markers erased).
///
/// `start_new_game` and `reset_game` copy `base_rooms` over `rooms`, so
/// every run starts with all cups and start markers in place.
///
/// ## Lives
///
/// `max_lives == 0` means unlimited. Otherwise each death costs a life and
/// the run ends when none are left.

use tracing::{debug, info};

use crate::domain::entity::{Player, Room};
use crate::domain::rules::{self, MoveBlocked, BASE_ROOM_CLEAR_POINTS, POINTS_PER_CUP};
use crate::hw::elapsed;
use crate::sim::level::ROOM_COUNT;
use crate::sim::save::HighscoreTable;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum GameState {
    #[default]
    Menu,
    Playing,
    Paused,
    GameOver,
    Victory,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum MenuOption {
    #[default]
    StartGame,
    Highscore1,
    Highscore2,
    Highscore3,
}

impl MenuOption {
    const ORDER: [MenuOption; 4] = [
        MenuOption::StartGame,
        MenuOption::Highscore1,
        MenuOption::Highscore2,
        MenuOption::Highscore3,
    ];

    fn position(self) -> usize {
        Self::ORDER.iter().position(|&o| o == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.position() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        let n = Self::ORDER.len();
        Self::ORDER[(self.position() + n - 1) % n]
    }

    /// High-score rank shown by this entry, if it is one.
    pub fn highscore_rank(self) -> Option<usize> {
        match self {
            MenuOption::StartGame => None,
            other => Some(other.position() - 1),
        }
    }
}

/// What a successful move did besides changing position.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MoveOutcome {
    pub collected_cup: bool,
    pub died: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoomAdvance {
    NextRoom { bonus: u16 },
    Victory,
}

pub struct RoomWorld {
    // ── Room layers ──
    base_rooms: [Room; ROOM_COUNT],
    rooms: [Room; ROOM_COUNT],
    room_index: usize,

    // ── Entities ──
    player: Player,

    // ── Run tracking ──
    score: u16,
    room_started: u32,
    lives: u8,
    max_lives: u8,

    // ── Meta ──
    state: GameState,
    menu: MenuOption,
    highscores: HighscoreTable,
}

// ── Construction ──

impl RoomWorld {
    pub fn new(base_rooms: [Room; ROOM_COUNT], max_lives: u8) -> Self {
        RoomWorld {
            base_rooms,
            rooms: base_rooms,
            room_index: 0,
            player: Player::default(),
            score: 0,
            room_started: 0,
            lives: max_lives,
            max_lives,
            state: GameState::Menu,
            menu: MenuOption::StartGame,
            highscores: HighscoreTable::default(),
        }
    }

    #[cfg(test)]
    /// Replace room `index` from two layout rows. Out of range is a no-op.
    pub fn load_room(&mut self, index: usize, top: &str, bottom: &str) {
        if index >= ROOM_COUNT {
            return;
        }
        let room = Room::from_rows(top, bottom);
        self.base_rooms[index] = room;
        self.rooms[index] = room;
    }
}

// ── Player ──

impl RoomWorld {
    /// Place the player on the current room's start cell, alive.
    pub fn reset_player_to_room_start(&mut self) {
        let (column, row) = self.rooms[self.room_index].take_start();
        self.player = Player::new(column, row);
    }

    pub fn respawn_player(&mut self) {
        self.reset_player_to_room_start();
        debug!(column = self.player.column, row = self.player.row, "player respawned");
    }

    /// Move by `(dc, dr)`. Fire kills on arrival; a cup on the destination
    /// is collected either way.
    pub fn move_player(&mut self, dc: i8, dr: i8) -> Result<MoveOutcome, MoveBlocked> {
        let room = &mut self.rooms[self.room_index];
        let (column, row) = rules::check_move(room, &self.player, dc, dr)?;
        self.player.column = column;
        self.player.row = row;

        let mut outcome = MoveOutcome::default();
        if room.tile_at(column, row).is_hazard() {
            self.player.alive = false;
            outcome.died = true;
        }
        if room.take_cup(column, row) {
            self.score = self.score.saturating_add(POINTS_PER_CUP);
            outcome.collected_cup = true;
        }
        Ok(outcome)
    }

    /// Spend a life. Returns whether the run can continue.
    pub fn lose_life(&mut self) -> bool {
        if self.max_lives == 0 {
            return true;
        }
        self.lives = self.lives.saturating_sub(1);
        self.lives > 0
    }
}

// ── Rooms ──

impl RoomWorld {
    pub fn is_current_room_cleared(&self) -> bool {
        self.rooms[self.room_index].is_cleared()
    }

    pub fn is_final_room(&self) -> bool {
        self.room_index + 1 >= ROOM_COUNT
    }

    /// Leave a cleared room. On the last room the run is won instead and
    /// no bonus is paid.
    pub fn advance_to_next_room(&mut self, now: u32) -> RoomAdvance {
        if self.is_final_room() {
            self.set_state(GameState::Victory);
            return RoomAdvance::Victory;
        }
        let bonus = rules::room_clear_bonus(BASE_ROOM_CLEAR_POINTS, elapsed(now, self.room_started));
        self.score = self.score.saturating_add(bonus);
        self.room_index += 1;
        self.reset_player_to_room_start();
        self.room_started = now;
        info!(room = self.room_number(), bonus, score = self.score, "entered room");
        RoomAdvance::NextRoom { bonus }
    }

    /// Push the room timer forward, e.g. by the time spent paused.
    pub fn shift_timers(&mut self, ms: u32) {
        self.room_started = self.room_started.wrapping_add(ms);
    }
}

// ── Run lifecycle ──

impl RoomWorld {
    pub fn start_new_game(&mut self, now: u32) {
        self.rooms = self.base_rooms;
        self.room_index = 0;
        self.score = 0;
        self.lives = self.max_lives;
        self.reset_player_to_room_start();
        self.room_started = now;
        self.set_state(GameState::Playing);
        info!(lives = self.max_lives, "new game");
    }

    /// Back to the menu with a fresh run.
    pub fn reset_game(&mut self) {
        self.rooms = self.base_rooms;
        self.room_index = 0;
        self.score = 0;
        self.lives = self.max_lives;
        self.room_started = 0;
        self.player = Player::default();
        self.menu = MenuOption::StartGame;
        self.set_state(GameState::Menu);
    }
}

// ── High scores ──

impl RoomWorld {
    pub fn is_new_highscore(&self, score: u16) -> bool {
        self.highscores.is_new_highscore(score)
    }

    /// Insert into the table. Returns whether the table changed; the
    /// caller persists it.
    pub fn add_highscore(&mut self, score: u16) -> bool {
        self.highscores.insert(score)
    }

    pub fn highscores(&self) -> &HighscoreTable {
        &self.highscores
    }

    pub fn set_highscores(&mut self, table: HighscoreTable) {
        self.highscores = table;
    }
}

// ── Accessors ──

impl RoomWorld {
    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn set_state(&mut self, state: GameState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "state change");
        }
        self.state = state;
    }

    pub fn menu(&self) -> MenuOption {
        self.menu
    }

    pub fn set_menu(&mut self, option: MenuOption) {
        self.menu = option;
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn score(&self) -> u16 {
        self.score
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    #[cfg(test)]
    pub fn room_index(&self) -> usize {
        self.room_index
    }

    /// 1-based, for display.
    pub fn room_number(&self) -> u8 {
        self.room_index as u8 + 1
    }

    pub fn current_room(&self) -> &Room {
        &self.rooms[self.room_index]
    }

    #[cfg(test)]
    pub fn room(&self, index: usize) -> Option<&Room> {
        self.rooms.get(index)
    }

    #[cfg(test)]
    pub fn room_started(&self) -> u32 {
        self.room_started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::Tile;
    use crate::sim::level::builtin_rooms;

    fn world() -> RoomWorld {
        RoomWorld::new(builtin_rooms(), 3)
    }

    /// World with room 0 replaced and a game started at t=0.
    fn playing(top: &str, bottom: &str) -> RoomWorld {
        let mut w = world();
        w.load_room(0, top, bottom);
        w.start_new_game(0);
        w
    }

    #[test]
    fn new_game_resets_rooms_and_places_player() {
        let mut w = world();
        w.start_new_game(1_000);
        assert_eq!(w.state(), GameState::Playing);
        assert_eq!(w.room_index(), 0);
        assert_eq!(w.score(), 0);
        assert_eq!(*w.player(), Player::new(0, 1));
        // Room 0 marker erased, the others untouched
        assert!(!w.room(0).unwrap().has_start_marker());
        for i in 1..ROOM_COUNT {
            assert!(w.room(i).unwrap().has_start_marker(), "room {i}");
        }
    }

    #[test]
    fn new_game_restores_cups_from_previous_run() {
        let mut w = playing("                ", "P3              ");
        assert!(w.move_player(1, 0).unwrap().collected_cup);
        assert!(w.is_current_room_cleared());

        w.reset_game();
        w.start_new_game(5_000);
        assert_eq!(w.current_room().tile_at(1, 1), Tile::Cup);
        assert_eq!(w.current_room().cups_collected, 0);
        assert_eq!(*w.player(), Player::new(0, 1));
    }

    #[test]
    fn cup_collected_once_for_ten_points() {
        let mut w = playing("                ", "P3 3            ");
        let out = w.move_player(1, 0).unwrap();
        assert_eq!(out, MoveOutcome { collected_cup: true, died: false });
        assert_eq!(w.score(), 10);

        w.move_player(1, 0).unwrap();
        w.move_player(-1, 0).unwrap();
        assert_eq!(w.score(), 10);
        assert_eq!(w.current_room().cups_collected, 1);
        assert!(!w.is_current_room_cleared());
    }

    #[test]
    fn fire_kills_and_freezes_player() {
        let mut w = playing("                ", "PF              ");
        let out = w.move_player(1, 0).unwrap();
        assert!(out.died);
        assert!(!w.player().alive);
        assert_eq!(w.move_player(1, 0), Err(MoveBlocked::NotAlive));
        // Hazards are never removed
        assert_eq!(w.current_room().tile_at(1, 1), Tile::Fire);
    }

    /// Arrival checks the hazard and the cup separately, so a lethal move
    /// would still award a cup on the same cell. A layout cell holds one
    /// tile, so the two checks run on neighbouring cells here.
    #[test]
    fn death_and_cup_pickup_are_checked_independently() {
        let mut w = playing("                ", "P3F             ");
        let cup = w.move_player(1, 0).unwrap();
        assert_eq!(cup, MoveOutcome { collected_cup: true, died: false });

        let fire = w.move_player(1, 0).unwrap();
        assert_eq!(fire, MoveOutcome { collected_cup: false, died: true });
        // Dying keeps the cup and its points
        assert_eq!(w.score(), 10);
        assert_eq!(w.current_room().cups_collected, 1);
        assert!(w.is_current_room_cleared());
    }

    #[test]
    fn blocked_move_changes_nothing() {
        let mut w = playing("  3             ", "P               ");
        assert_eq!(w.move_player(0, -1), Err(MoveBlocked::NoLadder));
        assert_eq!(w.move_player(-1, 0), Err(MoveBlocked::OutOfBounds));
        assert_eq!(*w.player(), Player::new(0, 1));
    }

    #[test]
    fn ladder_climb_reaches_top_row() {
        let mut w = playing("  3             ", "PH              ");
        w.move_player(1, 0).unwrap();
        w.move_player(0, -1).unwrap();
        assert_eq!((w.player().column, w.player().row), (1, 0));
        w.move_player(1, 0).unwrap();
        assert!(w.is_current_room_cleared());
    }

    #[test]
    fn advance_pays_time_bonus() {
        let mut w = world();
        w.start_new_game(0);
        let adv = w.advance_to_next_room(10_500);
        assert_eq!(adv, RoomAdvance::NextRoom { bonus: 40 });
        assert_eq!(w.score(), 40);
        assert_eq!(w.room_index(), 1);
        assert_eq!(w.room_started(), 10_500);
        assert!(!w.room(1).unwrap().has_start_marker());
    }

    #[test]
    fn last_room_advances_to_victory() {
        let mut w = world();
        w.start_new_game(0);
        for _ in 0..ROOM_COUNT - 1 {
            w.advance_to_next_room(120_000);
        }
        assert!(w.is_final_room());
        let score = w.score();
        assert_eq!(w.advance_to_next_room(240_000), RoomAdvance::Victory);
        assert_eq!(w.state(), GameState::Victory);
        assert_eq!(w.score(), score);
    }

    #[test]
    fn respawn_returns_to_remembered_start() {
        let mut w = playing("                ", "   P F          ");
        w.move_player(1, 0).unwrap();
        w.move_player(1, 0).unwrap();
        assert!(!w.player().alive);
        w.respawn_player();
        assert_eq!(*w.player(), Player::new(3, 1));
    }

    #[test]
    fn lives_run_out() {
        let mut w = world();
        w.start_new_game(0);
        assert!(w.lose_life());
        assert!(w.lose_life());
        assert!(!w.lose_life());

        let mut endless = RoomWorld::new(builtin_rooms(), 0);
        endless.start_new_game(0);
        assert!((0..100).all(|_| endless.lose_life()));
    }

    #[test]
    fn menu_wraps_both_ways() {
        assert_eq!(MenuOption::StartGame.prev(), MenuOption::Highscore3);
        assert_eq!(MenuOption::Highscore3.next(), MenuOption::StartGame);
        assert_eq!(MenuOption::Highscore1.next(), MenuOption::Highscore2);
        assert_eq!(MenuOption::Highscore2.highscore_rank(), Some(1));
        assert_eq!(MenuOption::StartGame.highscore_rank(), None);
    }

    #[test]
    fn out_of_range_load_is_ignored() {
        let mut w = world();
        w.load_room(ROOM_COUNT, "FFFF", "FFFF");
        assert_eq!(w.room(0), builtin_rooms().first());
    }
}
