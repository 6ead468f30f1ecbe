/// Ambient-light driven backlight.
///
/// In automatic mode the light channel is sampled every `interval` ms; a
/// reading below `threshold` means the room is dark and the backlight goes
/// on. The line is only written when the wanted level changes.

use embedded_hal::digital::{OutputPin, PinState};
use tracing::{debug, warn};

use crate::hw::{elapsed, AnalogInput};

pub struct AutoBacklight<P, A> {
    pin: P,
    sensor: A,
    interval: u32,
    threshold: u16,
    auto: bool,
    on: bool,
    last_check: Option<u32>,
}

impl<P: OutputPin, A: AnalogInput> AutoBacklight<P, A> {
    /// Starts with the backlight on, in automatic mode.
    pub fn new(pin: P, sensor: A, interval: u32, threshold: u16) -> Self {
        let mut bl = AutoBacklight {
            pin,
            sensor,
            interval,
            threshold,
            auto: true,
            on: false,
            last_check: None,
        };
        bl.drive(true);
        bl
    }

    pub fn tick(&mut self, now: u32) {
        if !self.auto {
            return;
        }
        if let Some(last) = self.last_check {
            if elapsed(now, last) < self.interval {
                return;
            }
        }
        self.last_check = Some(now);

        let level = self.sensor.read();
        let dark = level < self.threshold;
        if dark != self.on {
            debug!(level, dark, "backlight follows ambient light");
            self.drive(dark);
        }
    }

    /// Leaving automatic mode forces the backlight on.
    pub fn set_auto(&mut self, auto: bool) {
        self.auto = auto;
        self.last_check = None;
        if !auto {
            self.drive(true);
        }
    }

    pub fn set(&mut self, on: bool) {
        self.drive(on);
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn is_auto(&self) -> bool {
        self.auto
    }

    fn drive(&mut self, on: bool) {
        self.on = on;
        if let Err(e) = self.pin.set_state(PinState::from(on)) {
            warn!("backlight write failed: {e:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::host::{SharedLevel, SimLine};

    fn backlight(level: u16) -> (AutoBacklight<SimLine, SharedLevel>, SimLine, SharedLevel) {
        let pin = SimLine::new();
        let sensor = SharedLevel::new(level);
        let bl = AutoBacklight::new(pin.clone(), sensor.clone(), 500, 300);
        (bl, pin, sensor)
    }

    #[test]
    fn starts_on_and_turns_off_in_bright_light() {
        let (mut bl, pin, _) = backlight(800);
        assert!(pin.is_high());
        bl.tick(0);
        assert!(!bl.is_on());
        assert!(!pin.is_high());
    }

    #[test]
    fn samples_only_every_interval() {
        let (mut bl, pin, sensor) = backlight(800);
        bl.tick(1_000);
        assert!(!pin.is_high());

        sensor.set(100);
        bl.tick(1_499);
        assert!(!pin.is_high());
        bl.tick(1_500);
        assert!(pin.is_high());
    }

    #[test]
    fn manual_mode_ignores_sensor() {
        let (mut bl, pin, _) = backlight(800);
        bl.set_auto(false);
        bl.tick(0);
        assert!(pin.is_high());

        bl.set(false);
        bl.tick(5_000);
        assert!(!pin.is_high());
        assert!(!bl.is_auto());
    }
}
