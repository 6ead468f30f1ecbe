/// Indicator light animation.
///
/// Three lines (defeat, win, bonus). A blink is a finite toggle sequence:
/// `count` requested cycles become a budget of `2 × count` toggles, one per
/// `interval`. When the budget is spent the lines are parked off and the
/// blink ends.
///
/// One descriptor at a time. Starting any blink, single or multi-line,
/// replaces the active one and parks its lines off first.
///
/// ## Steady pattern (only while no blink runs)
/// ┌──────────┬────────┬─────┬──────────────────────┐
/// │ State     │ Defeat │ Win │ Bonus                │
/// ├──────────┼────────┼─────┼──────────────────────┤
/// │ Menu      │ off    │ off │ off                  │
/// │ Playing   │ off    │ off │ on                   │
/// │ Paused    │ off    │ off │ blinking (steady_ms) │
/// │ GameOver  │ on     │ off │ off                  │
/// │ Victory   │ off    │ on  │ off                  │
/// └──────────┴────────┴─────┴──────────────────────┘

use embedded_hal::digital::{OutputPin, PinState};
use tracing::{trace, warn};

use crate::hw::elapsed;
use crate::sim::world::GameState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Light {
    Defeat,
    Win,
    Bonus,
}

impl Light {
    fn index(self) -> usize {
        match self {
            Light::Defeat => 0,
            Light::Win => 1,
            Light::Bonus => 2,
        }
    }
}

// Effect presets
const DEATH_BLINKS: u8 = 6;
const DEATH_BLINK_MS: u32 = 100;
const CUP_BLINKS: u8 = 2;
const CUP_BLINK_MS: u32 = 100;
const ROOM_CLEAR_BLINKS: u8 = 3;
const ROOM_CLEAR_BLINK_MS: u32 = 200;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Mode {
    Single,
    Multi,
}

#[derive(Clone, Copy, Debug)]
struct Blink {
    mode: Mode,
    targets: [bool; 3],
    interval: u32,
    remaining: u16,
    lit: bool,
    last_toggle: u32,
}

pub struct AnimationScheduler<L> {
    lines: [L; 3],
    blink: Option<Blink>,
    steady_interval: u32,
    steady_lit: bool,
    steady_last: u32,
    /// Levels last written by the steady pattern; `None` forces a rewrite.
    shown: Option<[bool; 3]>,
}

impl<L: OutputPin> AnimationScheduler<L> {
    /// `lines` in `[defeat, win, bonus]` order.
    pub fn new(lines: [L; 3], steady_interval: u32) -> Self {
        AnimationScheduler {
            lines,
            blink: None,
            steady_interval,
            steady_lit: false,
            steady_last: 0,
            shown: None,
        }
    }

    pub fn start_blink(&mut self, light: Light, count: u8, interval: u32, now: u32) {
        let mut targets = [false; 3];
        targets[light.index()] = true;
        self.begin(Mode::Single, targets, count, interval, now);
    }

    pub fn start_multi_blink(&mut self, lights: &[Light], count: u8, interval: u32, now: u32) {
        let mut targets = [false; 3];
        for light in lights {
            targets[light.index()] = true;
        }
        self.begin(Mode::Multi, targets, count, interval, now);
    }

    pub fn blink_death(&mut self, now: u32) {
        self.start_blink(Light::Defeat, DEATH_BLINKS, DEATH_BLINK_MS, now);
    }

    pub fn blink_cup(&mut self, now: u32) {
        self.start_blink(Light::Bonus, CUP_BLINKS, CUP_BLINK_MS, now);
    }

    pub fn blink_room_clear(&mut self, now: u32) {
        self.start_multi_blink(&[Light::Win, Light::Bonus], ROOM_CLEAR_BLINKS, ROOM_CLEAR_BLINK_MS, now);
    }

    fn begin(&mut self, mode: Mode, targets: [bool; 3], count: u8, interval: u32, now: u32) {
        if let Some(old) = self.blink.take() {
            self.write_targets(&old.targets, false);
        }
        // Lines start the sequence dark regardless of the steady pattern
        self.write_targets(&targets, false);
        self.shown = None;
        trace!(?mode, count, interval, "blink start");
        self.blink = Some(Blink {
            mode,
            targets,
            interval,
            remaining: count as u16 * 2,
            lit: false,
            last_toggle: now,
        });
    }

    pub fn tick(&mut self, now: u32) {
        let Some(mut blink) = self.blink else { return };

        if blink.remaining == 0 {
            self.write_targets(&blink.targets, false);
            self.blink = None;
            self.shown = None;
            return;
        }

        if elapsed(now, blink.last_toggle) >= blink.interval {
            blink.lit = !blink.lit;
            blink.remaining -= 1;
            blink.last_toggle = now;
            self.write_targets(&blink.targets, blink.lit);
        }
        self.blink = Some(blink);
    }

    /// Apply the steady per-state pattern. Does nothing while a blink runs.
    pub fn show_state(&mut self, state: GameState, now: u32) {
        if self.blink.is_some() {
            return;
        }

        let levels = match state {
            GameState::Menu => [false, false, false],
            GameState::Playing => [false, false, true],
            GameState::Paused => {
                if elapsed(now, self.steady_last) >= self.steady_interval {
                    self.steady_lit = !self.steady_lit;
                    self.steady_last = now;
                }
                [false, false, self.steady_lit]
            }
            GameState::GameOver => [true, false, false],
            GameState::Victory => [false, true, false],
        };

        if self.shown == Some(levels) {
            return;
        }
        for (i, &high) in levels.iter().enumerate() {
            self.write(i, high);
        }
        self.shown = Some(levels);
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.blink.is_some()
    }

    #[cfg(test)]
    pub fn is_multi(&self) -> bool {
        matches!(self.blink, Some(Blink { mode: Mode::Multi, .. }))
    }

    fn write_targets(&mut self, targets: &[bool; 3], high: bool) {
        for (i, &hit) in targets.iter().enumerate() {
            if hit {
                self.write(i, high);
            }
        }
    }

    fn write(&mut self, index: usize, high: bool) {
        if let Err(e) = self.lines[index].set_state(PinState::from(high)) {
            warn!("indicator line {index} write failed: {e:?}");
        }
    }
}
