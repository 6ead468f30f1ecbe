pub mod controller;
pub mod event;
pub mod input;
pub mod level;
pub mod save;
pub mod world;
