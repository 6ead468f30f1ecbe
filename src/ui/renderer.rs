/// Presentation layer: the display seam and its throttled dispatcher.
///
/// The core never formats text. It hands read-only values to a `Renderer`
/// through the `Presenter`, which runs at most once per render interval and
/// picks the screen from the state machine:
///
///   Menu      → render_menu
///   Playing   → render_respawn_message   (waiting for respawn)
///             → render_room_clear        (room clear pending)
///             → render_game              (otherwise)
///   Paused    → render_pause
///   GameOver  → render_game_over
///   Victory   → render_victory
///
/// A state change clears the display before the new screen is drawn.

use std::io;

use crate::domain::entity::{Player, Room};
use crate::hw::elapsed;
use crate::sim::controller::GameStateMachine;
use crate::sim::save::HighscoreTable;
use crate::sim::world::{GameState, MenuOption};

/// A display. `room_number` is 1-based.
pub trait Renderer {
    fn initialize(&mut self) -> io::Result<()>;
    fn clear(&mut self) -> io::Result<()>;
    fn render_menu(&mut self, selected: MenuOption, highscores: &HighscoreTable) -> io::Result<()>;
    fn render_game(&mut self, room: &Room, player: &Player, score: u16, room_number: u8) -> io::Result<()>;
    fn render_pause(&mut self) -> io::Result<()>;
    fn render_game_over(&mut self, score: u16, new_highscore: bool) -> io::Result<()>;
    fn render_victory(&mut self, score: u16, new_highscore: bool) -> io::Result<()>;
    fn render_room_clear(&mut self, room_number: u8, score: u16) -> io::Result<()>;
    fn render_respawn_message(&mut self, seconds_remaining: u32) -> io::Result<()>;
    /// Per-frame housekeeping (scrolling, flushing).
    fn update(&mut self) -> io::Result<()>;
    /// Give the terminal back.
    fn shutdown(&mut self) -> io::Result<()>;
}

pub struct Presenter {
    renderer: Box<dyn Renderer>,
    interval: u32,
    last_frame: Option<u32>,
    last_state: Option<GameState>,
}

impl Presenter {
    pub fn new(renderer: Box<dyn Renderer>, interval: u32) -> Self {
        Presenter { renderer, interval, last_frame: None, last_state: None }
    }

    /// A failed start is rolled back so the terminal is never left in raw
    /// mode; the original error is returned.
    pub fn initialize(&mut self) -> io::Result<()> {
        if let Err(e) = self.renderer.initialize() {
            let _ = self.renderer.shutdown();
            return Err(e);
        }
        Ok(())
    }

    pub fn shutdown(&mut self) -> io::Result<()> {
        self.renderer.shutdown()
    }

    /// Draw the current screen if the render interval has passed.
    pub fn present(&mut self, machine: &GameStateMachine, now: u32) -> io::Result<()> {
        if let Some(last) = self.last_frame {
            if elapsed(now, last) < self.interval {
                return Ok(());
            }
        }
        self.last_frame = Some(now);

        let world = machine.world();
        let state = world.state();
        if self.last_state != Some(state) {
            self.renderer.clear()?;
            self.last_state = Some(state);
        }

        let r = &mut self.renderer;
        match state {
            GameState::Menu => r.render_menu(world.menu(), world.highscores())?,
            GameState::Playing if machine.is_waiting_respawn() => {
                let seconds = machine.respawn_remaining_ms(now).div_ceil(1000);
                r.render_respawn_message(seconds)?;
            }
            GameState::Playing if machine.is_room_clear_pending() => {
                r.render_room_clear(world.room_number(), world.score())?;
            }
            GameState::Playing => {
                r.render_game(world.current_room(), world.player(), world.score(), world.room_number())?;
            }
            GameState::Paused => r.render_pause()?,
            GameState::GameOver => r.render_game_over(world.score(), machine.new_highscore())?,
            GameState::Victory => r.render_victory(world.score(), machine.new_highscore())?,
        }
        r.update()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::hw::testing::rig;
    use crate::sim::controller::Timing;
    use crate::sim::level::builtin_rooms;
    use crate::sim::world::RoomWorld;

    /// Records every call by name. With `fail_init` set, `initialize`
    /// records itself and then fails.
    struct Recorder {
        calls: Rc<RefCell<Vec<String>>>,
        fail_init: bool,
    }

    impl Recorder {
        fn log(&self, call: String) -> io::Result<()> {
            self.calls.borrow_mut().push(call);
            Ok(())
        }
    }

    impl Renderer for Recorder {
        fn initialize(&mut self) -> io::Result<()> {
            self.log("initialize".into())?;
            if self.fail_init {
                return Err(io::Error::new(io::ErrorKind::Other, "no tty"));
            }
            Ok(())
        }
        fn clear(&mut self) -> io::Result<()> {
            self.log("clear".into())
        }
        fn render_menu(&mut self, selected: MenuOption, _: &HighscoreTable) -> io::Result<()> {
            self.log(format!("menu {selected:?}"))
        }
        fn render_game(&mut self, _: &Room, p: &Player, score: u16, room: u8) -> io::Result<()> {
            self.log(format!("game {room} {score} {}", p.column))
        }
        fn render_pause(&mut self) -> io::Result<()> {
            self.log("pause".into())
        }
        fn render_game_over(&mut self, score: u16, hi: bool) -> io::Result<()> {
            self.log(format!("game over {score} {hi}"))
        }
        fn render_victory(&mut self, score: u16, hi: bool) -> io::Result<()> {
            self.log(format!("victory {score} {hi}"))
        }
        fn render_room_clear(&mut self, room: u8, score: u16) -> io::Result<()> {
            self.log(format!("room clear {room} {score}"))
        }
        fn render_respawn_message(&mut self, seconds: u32) -> io::Result<()> {
            self.log(format!("respawn {seconds}"))
        }
        fn update(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn shutdown(&mut self) -> io::Result<()> {
            self.log("shutdown".into())
        }
    }

    fn presenter_with(fail_init: bool) -> (Presenter, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let recorder = Recorder { calls: Rc::clone(&calls), fail_init };
        (Presenter::new(Box::new(recorder), 200), calls)
    }

    fn presenter() -> (Presenter, Rc<RefCell<Vec<String>>>) {
        presenter_with(false)
    }

    #[test]
    fn failed_initialize_gives_the_terminal_back() {
        let (mut p, calls) = presenter_with(true);
        let err = p.initialize().unwrap_err();
        assert_eq!(err.to_string(), "no tty");
        assert_eq!(*calls.borrow(), vec!["initialize", "shutdown"]);

        let (mut p, calls) = presenter();
        p.initialize().unwrap();
        assert_eq!(*calls.borrow(), vec!["initialize"]);
    }

    #[test]
    fn frames_are_throttled_and_state_change_clears() {
        let mut rig = rig();
        let mut m = GameStateMachine::new(RoomWorld::new(builtin_rooms(), 3), Timing::default());
        m.initialize(&mut rig.hw);
        let (mut p, calls) = presenter();

        p.present(&m, 1_000).unwrap();
        p.present(&m, 1_100).unwrap();
        assert_eq!(*calls.borrow(), vec!["clear", "menu StartGame"]);

        rig.press_select();
        m.handle_buttons(&mut rig.hw);
        p.present(&m, 1_200).unwrap();
        assert_eq!(calls.borrow()[2..], ["clear".to_string(), "game 1 0 0".to_string()]);

        p.present(&m, 1_400).unwrap();
        assert_eq!(calls.borrow().last().map(String::as_str), Some("game 1 0 0"));
        assert_eq!(calls.borrow().len(), 5);
    }

    #[test]
    fn respawn_countdown_rounds_up() {
        let mut rig = rig();
        let mut world = RoomWorld::new(builtin_rooms(), 3);
        world.load_room(0, "", "PF             3");
        let mut m = GameStateMachine::new(world, Timing::default());
        m.initialize(&mut rig.hw);

        rig.press_select();
        m.handle_buttons(&mut rig.hw);
        rig.hold(1, 0);
        rig.hw.clock.advance(100);
        m.update(&mut rig.hw);
        assert!(m.is_waiting_respawn());

        let (mut p, calls) = presenter();
        let died_at = rig.hw.now();
        p.present(&m, died_at + 1).unwrap();
        p.present(&m, died_at + 1_001).unwrap();
        p.present(&m, died_at + 1_999).unwrap();
        assert_eq!(calls.borrow()[1..], ["respawn 2".to_string(), "respawn 1".to_string(), "respawn 1".to_string()]);
    }
}
