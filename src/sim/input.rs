/// Joystick and button polling.
///
/// The two axes are read as 10-bit values and discretized against a low
/// and a high threshold; the band between them is the dead zone. Only one
/// direction is reported per read, checked in a fixed priority order:
///
///   left (x < low) → right (x > high) → up (y < low) → down (y > high)
///
/// Gameplay and menu directions share one debounce window. Buttons arrive
/// through their `ButtonLatch` and are debounced where the edge is caught.

use crate::hw::latch::ButtonLatch;
use crate::hw::{elapsed, AnalogInput};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// `(dc, dr)` step for a move request. Row 0 is the top row.
    pub fn delta(self) -> (i8, i8) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AxisThresholds {
    pub low: u16,
    pub high: u16,
}

impl Default for AxisThresholds {
    fn default() -> Self {
        AxisThresholds { low: 400, high: 700 }
    }
}

pub struct InputPoller<A> {
    x: A,
    y: A,
    select: &'static ButtonLatch,
    pause: &'static ButtonLatch,
    thresholds: AxisThresholds,
    debounce_ms: u32,
    last_accept: Option<u32>,
}

impl<A: AnalogInput> InputPoller<A> {
    pub fn new(
        x: A,
        y: A,
        select: &'static ButtonLatch,
        pause: &'static ButtonLatch,
        thresholds: AxisThresholds,
        debounce_ms: u32,
    ) -> Self {
        InputPoller { x, y, select, pause, thresholds, debounce_ms, last_accept: None }
    }

    /// Current stick direction, ignoring the debounce window.
    pub fn direction(&mut self) -> Option<Direction> {
        let (x, y) = (self.x.read(), self.y.read());
        let t = self.thresholds;
        if x < t.low {
            Some(Direction::Left)
        } else if x > t.high {
            Some(Direction::Right)
        } else if y < t.low {
            Some(Direction::Up)
        } else if y > t.high {
            Some(Direction::Down)
        } else {
            None
        }
    }

    /// Vertical component only, for menu navigation.
    pub fn vertical(&mut self) -> Option<Direction> {
        let y = self.y.read();
        if y < self.thresholds.low {
            Some(Direction::Up)
        } else if y > self.thresholds.high {
            Some(Direction::Down)
        } else {
            None
        }
    }

    /// Has the debounce window passed since the last accepted input?
    pub fn ready(&self, now: u32) -> bool {
        match self.last_accept {
            Some(last) => elapsed(now, last) >= self.debounce_ms,
            None => true,
        }
    }

    pub fn accept(&mut self, now: u32) {
        self.last_accept = Some(now);
    }

    /// Debounced gameplay direction: at most one per window.
    pub fn poll_direction(&mut self, now: u32) -> Option<Direction> {
        if !self.ready(now) {
            return None;
        }
        let dir = self.direction()?;
        self.accept(now);
        Some(dir)
    }

    /// Debounced menu navigation: up/down only.
    pub fn poll_vertical(&mut self, now: u32) -> Option<Direction> {
        if !self.ready(now) {
            return None;
        }
        let dir = self.vertical()?;
        self.accept(now);
        Some(dir)
    }

    pub fn take_select(&self) -> bool {
        self.select.take()
    }

    pub fn take_pause(&self) -> bool {
        self.pause.take()
    }
}
