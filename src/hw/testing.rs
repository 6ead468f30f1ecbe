/// Test rig: a fully wired `Hardware` on host stand-ins with a clock the
/// test advances by hand.

use super::host::{axis_extreme, Eeprom, SharedLevel, SimLine};
use super::latch::ButtonLatch;
use super::{Board, Clock, Hardware, ToneOutput, ADC_CENTER};
use crate::fx::backlight::AutoBacklight;
use crate::fx::lights::AnimationScheduler;
use crate::fx::tone::ToneSequencer;
use crate::sim::input::{AxisThresholds, InputPoller};

/// Rig clocks start well past zero so the first debounced edge is accepted.
pub const T0: u32 = 10_000;

pub struct ManualClock(u32);

impl ManualClock {
    pub fn advance(&mut self, ms: u32) {
        self.0 = self.0.wrapping_add(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.0
    }
}

/// Tone output that records what it was asked to play.
#[derive(Default, Debug)]
pub struct ToneProbe {
    pub sounding: Option<u16>,
    pub started: Vec<u16>,
}

impl ToneOutput for ToneProbe {
    fn tone(&mut self, hz: u16) {
        self.sounding = Some(hz);
        self.started.push(hz);
    }

    fn no_tone(&mut self) {
        self.sounding = None;
    }
}

pub struct TestBoard;

impl Board for TestBoard {
    type Clock = ManualClock;
    type Light = SimLine;
    type Buzzer = ToneProbe;
    type Analog = SharedLevel;
    type Storage = Eeprom;
}

pub struct Rig {
    pub hw: Hardware<TestBoard>,
    pub x: SharedLevel,
    pub y: SharedLevel,
    pub ambient: SharedLevel,
    pub defeat: SimLine,
    pub win: SimLine,
    pub bonus: SimLine,
    pub backlight: SimLine,
    pub select: &'static ButtonLatch,
    pub pause: &'static ButtonLatch,
}

impl Rig {
    pub fn press_select(&self) {
        self.select.notify(self.hw.now(), 0);
    }

    pub fn press_pause(&self) {
        self.pause.notify(self.hw.now(), 0);
    }

    /// Push the stick to an extreme. `(dc, dr)` as in a move request.
    pub fn hold(&self, dc: i8, dr: i8) {
        self.x.set(axis_extreme(dc));
        self.y.set(axis_extreme(dr));
    }

    pub fn release(&self) {
        self.x.set(ADC_CENTER);
        self.y.set(ADC_CENTER);
    }
}


pub fn rig() -> Rig {
    let x = SharedLevel::new(ADC_CENTER);
    let y = SharedLevel::new(ADC_CENTER);
    let ambient = SharedLevel::new(800);
    let (defeat, win, bonus, backlight) =
        (SimLine::new(), SimLine::new(), SimLine::new(), SimLine::new());
    let select: &'static ButtonLatch = Box::leak(Box::new(ButtonLatch::new()));
    let pause: &'static ButtonLatch = Box::leak(Box::new(ButtonLatch::new()));

    let hw = Hardware {
        clock: ManualClock(T0),
        input: InputPoller::new(
            x.clone(),
            y.clone(),
            select,
            pause,
            AxisThresholds::default(),
            200,
        ),
        lights: AnimationScheduler::new([defeat.clone(), win.clone(), bonus.clone()], 500),
        buzzer: ToneSequencer::new(ToneProbe::default(), 50),
        backlight: AutoBacklight::new(backlight.clone(), ambient.clone(), 500, 300),
        storage: Eeprom::volatile(),
    };

    Rig { hw, x, y, ambient, defeat, win, bonus, backlight, select, pause }
}
