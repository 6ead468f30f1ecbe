/// Keyboard input tracker.
///
/// Tracks which keys are currently held so the keyboard can stand in for
/// the joystick: while an arrow (or WASD) key is held the matching axis
/// sits at its extreme, and it drops back to center on release.
///
///   ←/A  →/D     X axis
///   ↑/W  ↓/S     Y axis
///   Enter/Space  select button
///   P/Esc        pause button
///   L            toggle room lighting (the backlight itself when
///                automatic backlight is off)
///   M            mute
///   Q/Ctrl+C     quit
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

const LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const SELECT: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P'), KeyCode::Esc];
const LIGHT: &[KeyCode] = &[KeyCode::Char('l'), KeyCode::Char('L')];
const MUTE: &[KeyCode] = &[KeyCode::Char('m'), KeyCode::Char('M')];
const QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

/// One-shot actions seen during the last drain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyActions {
    pub select: bool,
    pub pause: bool,
    pub toggle_light: bool,
    pub mute: bool,
    pub quit: bool,
}

pub struct Keyboard {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for Ctrl+C detection.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per loop pass.
    pub fn drain_events(&mut self) {
        self.begin_frame();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.ingest(key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    // ── Event bookkeeping ──

    fn begin_frame(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();
    }

    fn ingest(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Unconfirmed releases are left to the timeout
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held_at(key.code, at);
                self.last_active.insert(key.code, at);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn is_held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .map(|t| now.duration_since(*t) < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    fn any_held(&self, codes: &[KeyCode]) -> bool {
        let now = Instant::now();
        codes.iter().any(|c| self.is_held_at(*c, now))
    }

    fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.fresh_presses.contains(c))
    }

    // ── Queries ──

    /// Stick deflection `(x, y)` from held keys, each in `-1..=1`.
    /// Left and up win over right and down when both are held.
    pub fn stick(&self) -> (i8, i8) {
        let x = if self.any_held(LEFT) {
            -1
        } else if self.any_held(RIGHT) {
            1
        } else {
            0
        };
        let y = if self.any_held(UP) {
            -1
        } else if self.any_held(DOWN) {
            1
        } else {
            0
        };
        (x, y)
    }

    pub fn actions(&self) -> KeyActions {
        KeyActions {
            select: self.any_pressed(SELECT),
            pause: self.any_pressed(PAUSE),
            toggle_light: self.any_pressed(LIGHT),
            mute: self.any_pressed(MUTE),
            quit: self.ctrl_c_pressed() || self.any_pressed(QUIT),
        }
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}
