/// Tone sequencer: plays fixed melodies and single beeps without blocking.
///
/// Each note is held for its duration, then followed by a silence gap
/// before the next note starts. A single beep is just a one-note sequence
/// kept inside the sequencer, so both paths share the same `tick`.
///
/// Sounds of a kind do not stack: asking for the sound that is already
/// playing is ignored, anything else replaces it.

use tracing::trace;

use crate::hw::{elapsed, ToneOutput};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Note {
    pub hz: u16,
    pub ms: u16,
}

const fn note(hz: u16, ms: u16) -> Note {
    Note { hz, ms }
}

// ── Melodies ──

pub const CUP_MELODY: &[Note] = &[note(1000, 80), note(1200, 80), note(1400, 80)];

pub const DEATH_MELODY: &[Note] = &[note(800, 100), note(600, 100), note(400, 100), note(200, 200)];

pub const ROOM_CLEAR_MELODY: &[Note] = &[
    note(800, 100),
    note(1000, 100),
    note(1200, 100),
    note(1400, 100),
    note(1600, 200),
];

pub const VICTORY_MELODY: &[Note] = &[
    note(523, 150),
    note(659, 150),
    note(784, 150),
    note(1047, 400),
    note(784, 150),
    note(1047, 150),
    note(1318, 500),
];

pub const GAME_OVER_MELODY: &[Note] = &[note(400, 200), note(350, 200), note(300, 200), note(250, 400)];

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Sound {
    #[default]
    None,
    MenuMove,
    MenuSelect,
    PlayerMove,
    CupCollect,
    PlayerDeath,
    RoomClear,
    Victory,
    GameOver,
}

enum Track {
    Melody(&'static [Note]),
    Beep(Note),
}

impl Sound {
    fn track(self) -> Option<Track> {
        Some(match self {
            Sound::None => return None,
            Sound::MenuMove => Track::Beep(note(800, 50)),
            Sound::MenuSelect => Track::Beep(note(1200, 100)),
            Sound::PlayerMove => Track::Beep(note(600, 30)),
            Sound::CupCollect => Track::Melody(CUP_MELODY),
            Sound::PlayerDeath => Track::Melody(DEATH_MELODY),
            Sound::RoomClear => Track::Melody(ROOM_CLEAR_MELODY),
            Sound::Victory => Track::Melody(VICTORY_MELODY),
            Sound::GameOver => Track::Melody(GAME_OVER_MELODY),
        })
    }
}

/// Where the current notes live.
#[derive(Clone, Copy)]
enum Tune {
    Static(&'static [Note]),
    Owned([Note; 1]),
}

impl Tune {
    fn notes(&self) -> &[Note] {
        match self {
            Tune::Static(notes) => *notes,
            Tune::Owned(one) => &one[..],
        }
    }
}

pub struct ToneSequencer<T> {
    out: T,
    gap_ms: u32,
    enabled: bool,
    tune: Tune,
    cursor: usize,
    playing: bool,
    sounding: bool,
    note_started: u32,
    current: Sound,
}

impl<T: ToneOutput> ToneSequencer<T> {
    pub fn new(out: T, gap_ms: u32) -> Self {
        ToneSequencer {
            out,
            gap_ms,
            enabled: true,
            tune: Tune::Static(&[]),
            cursor: 0,
            playing: false,
            sounding: false,
            note_started: 0,
            current: Sound::None,
        }
    }

    pub fn play(&mut self, sound: Sound, now: u32) {
        if !self.enabled {
            return;
        }
        if sound == Sound::None {
            self.stop();
            return;
        }
        if self.playing && self.current == sound {
            return;
        }
        match sound.track() {
            Some(Track::Melody(notes)) => self.start_melody(notes, now),
            Some(Track::Beep(n)) => self.play_tone(n.hz, n.ms, now),
            None => return,
        }
        self.current = sound;
        trace!(?sound, "sound start");
    }

    /// Start a melody from its first note. An empty melody just stops.
    pub fn start_melody(&mut self, notes: &'static [Note], now: u32) {
        self.begin(Tune::Static(notes), now);
    }

    /// Single beep as a one-note sequence.
    pub fn play_tone(&mut self, hz: u16, ms: u16, now: u32) {
        self.begin(Tune::Owned([note(hz, ms)]), now);
    }

    fn begin(&mut self, tune: Tune, now: u32) {
        self.tune = tune;
        self.cursor = 0;
        self.current = Sound::None;
        if tune.notes().is_empty() {
            self.stop();
            return;
        }
        self.playing = true;
        self.note_on(now);
    }

    fn note_on(&mut self, now: u32) {
        let hz = self.tune.notes()[self.cursor].hz;
        if hz == 0 {
            self.out.no_tone();
            self.sounding = false;
        } else {
            self.out.tone(hz);
            self.sounding = true;
        }
        self.note_started = now;
    }

    pub fn stop(&mut self) {
        self.out.no_tone();
        self.playing = false;
        self.sounding = false;
        self.current = Sound::None;
    }

    pub fn tick(&mut self, now: u32) {
        if !self.playing {
            return;
        }
        let Some(&current) = self.tune.notes().get(self.cursor) else {
            self.stop();
            return;
        };

        let held = elapsed(now, self.note_started);
        if self.sounding && held >= current.ms as u32 {
            self.out.no_tone();
            self.sounding = false;
        }
        if held >= current.ms as u32 + self.gap_ms {
            self.cursor += 1;
            if self.cursor >= self.tune.notes().len() {
                self.stop();
            } else {
                self.note_on(now);
            }
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.stop();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[cfg(test)]
    pub fn current_sound(&self) -> Sound {
        self.current
    }

    #[cfg(test)]
    pub fn output(&self) -> &T {
        &self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::testing::ToneProbe;

    fn seq() -> ToneSequencer<ToneProbe> {
        ToneSequencer::new(ToneProbe::default(), 50)
    }

    #[test]
    fn retrigger_of_playing_sound_is_ignored() {
        let mut s = seq();
        s.play(Sound::PlayerDeath, 0);
        s.tick(150);
        assert_eq!(s.output().started, vec![800, 600]);

        s.play(Sound::PlayerDeath, 160);
        assert_eq!(s.output().started, vec![800, 600]);
        assert_eq!(s.current_sound(), Sound::PlayerDeath);
    }

    #[test]
    fn different_sound_replaces_current() {
        let mut s = seq();
        s.play(Sound::PlayerDeath, 0);
        s.play(Sound::CupCollect, 10);
        assert_eq!(s.current_sound(), Sound::CupCollect);
        assert_eq!(s.output().sounding, Some(1000));
    }

    #[test]
    fn note_is_held_then_gap_then_next() {
        let mut s = seq();
        s.play(Sound::CupCollect, 0);
        assert_eq!(s.output().sounding, Some(1000));

        s.tick(79);
        assert_eq!(s.output().sounding, Some(1000));
        s.tick(80);
        assert_eq!(s.output().sounding, None);
        s.tick(129);
        assert_eq!(s.output().sounding, None);
        s.tick(130);
        assert_eq!(s.output().sounding, Some(1200));
    }

    #[test]
    fn melody_ends_and_clears_current_sound() {
        let mut s = seq();
        s.play(Sound::CupCollect, 0);
        for t in (0..=400).step_by(10) {
            s.tick(t);
        }
        assert!(!s.is_playing());
        assert_eq!(s.current_sound(), Sound::None);
        assert_eq!(s.output().started, vec![1000, 1200, 1400]);
        assert_eq!(s.output().sounding, None);
    }

    #[test]
    fn beep_is_a_one_note_sequence() {
        let mut s = seq();
        s.play(Sound::MenuSelect, 0);
        assert_eq!(s.output().sounding, Some(1200));
        s.tick(100);
        assert_eq!(s.output().sounding, None);
        assert!(s.is_playing());
        s.tick(150);
        assert!(!s.is_playing());
    }

    #[test]
    fn none_stops_and_disable_silences() {
        let mut s = seq();
        s.play(Sound::Victory, 0);
        s.play(Sound::None, 5);
        assert!(!s.is_playing());

        s.play(Sound::Victory, 10);
        s.set_enabled(false);
        assert!(!s.is_playing());
        assert_eq!(s.output().sounding, None);

        s.play(Sound::GameOver, 20);
        assert!(!s.is_playing());
    }
}
