/// Hardware seams and the owned hardware context.
///
/// The core never touches a peripheral directly. Each peripheral class is
/// a trait; a `Board` names one concrete type per class, and `Hardware<B>`
/// owns every peripheral plus the schedulers that drive them. The context
/// is built once at startup and handed by `&mut` to whoever needs it.
///
/// Digital lines use `embedded_hal::digital::OutputPin` so real board pins
/// drop in unchanged; the remaining classes have no embedded-hal 1.0
/// counterpart and are defined here.

pub mod host;
pub mod latch;
#[cfg(test)]
pub mod testing;

use embedded_hal::digital::OutputPin;
use thiserror::Error;

use crate::fx::backlight::AutoBacklight;
use crate::fx::lights::AnimationScheduler;
use crate::fx::tone::ToneSequencer;
use crate::sim::input::InputPoller;
use crate::sim::world::GameState;

/// Full-scale reading of a 10-bit analog channel.
pub const ADC_MAX: u16 = 1023;
/// Resting joystick reading.
pub const ADC_CENTER: u16 = 512;

/// Monotonic millisecond counter. Wraps at `u32::MAX`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// One 10-bit analog channel (joystick axis, light sensor).
pub trait AnalogInput {
    fn read(&mut self) -> u16;
}

/// Square-wave tone generator.
pub trait ToneOutput {
    fn tone(&mut self, hz: u16);
    fn no_tone(&mut self);
}

/// Byte-addressable persistent storage (EEPROM-like).
pub trait Storage {
    fn read(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError>;
    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError>;
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("range {addr}..{end} exceeds {capacity}-byte storage")]
    OutOfRange { addr: usize, end: usize, capacity: usize },
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Wrapping-safe elapsed time between two clock readings.
#[inline]
pub fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// One concrete type per peripheral class.
pub trait Board {
    type Clock: Clock;
    type Light: OutputPin;
    type Buzzer: ToneOutput;
    type Analog: AnalogInput;
    type Storage: Storage;
}

/// Everything the main loop owns on the hardware side.
pub struct Hardware<B: Board> {
    pub clock: B::Clock,
    pub input: InputPoller<B::Analog>,
    pub lights: AnimationScheduler<B::Light>,
    pub buzzer: ToneSequencer<B::Buzzer>,
    pub backlight: AutoBacklight<B::Light, B::Analog>,
    pub storage: B::Storage,
}

impl<B: Board> Hardware<B> {
    pub fn now(&self) -> u32 {
        self.clock.now_ms()
    }

    /// Advance every output scheduler once. Each one keeps its own cadence,
    /// so calling this more often than any interval is harmless.
    pub fn service(&mut self, state: GameState) {
        let now = self.now();
        self.lights.tick(now);
        self.lights.show_state(state, now);
        self.buzzer.tick(now);
        self.backlight.tick(now);
    }
}
