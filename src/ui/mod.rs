pub mod buzzer;
pub mod gamepad;
pub mod keyboard;
pub mod lcd;
pub mod renderer;
pub mod serial;
