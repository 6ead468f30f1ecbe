/// Non-blocking output schedulers. Each one is advanced by `tick(now)` from
/// the main loop and enforces its own cadence against the shared clock.

pub mod backlight;
pub mod lights;
pub mod tone;
