/// Host buzzer: the `ToneOutput` the sequencer drives.
///
/// The current pitch is always published on a `SharedLevel` so the
/// display can show what the piezo would be doing. With the "sound"
/// feature a sine tone is also played through rodio while a note is on.
///
/// Compile without the "sound" feature to disable audio entirely (the
/// stub Voice does nothing).

use crate::hw::host::SharedLevel;
use crate::hw::ToneOutput;

#[cfg(feature = "sound")]
mod inner {
    use rodio::source::{SineWave, Source};
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const VOLUME: f32 = 0.15;

    /// One open output stream; each note gets a fresh sink.
    pub struct Voice {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sink: Option<Sink>,
    }

    impl Voice {
        pub fn new() -> Option<Self> {
            match OutputStream::try_default() {
                Ok((stream, handle)) => Some(Voice { _stream: stream, handle, sink: None }),
                Err(e) => {
                    tracing::warn!("audio output unavailable: {e}");
                    None
                }
            }
        }

        pub fn start(&mut self, hz: u16) {
            self.stop();
            if let Ok(sink) = Sink::try_new(&self.handle) {
                sink.append(SineWave::new(f32::from(hz)).amplify(VOLUME));
                self.sink = Some(sink);
            }
        }

        pub fn stop(&mut self) {
            if let Some(sink) = self.sink.take() {
                sink.stop();
            }
        }
    }
}

#[cfg(not(feature = "sound"))]
mod inner {
    pub struct Voice;

    impl Voice {
        pub fn new() -> Option<Self> { Some(Voice) }
        pub fn start(&mut self, _hz: u16) {}
        pub fn stop(&mut self) {}
    }
}

use inner::Voice;

pub struct HostBuzzer {
    pitch: SharedLevel,
    voice: Option<Voice>,
}

impl HostBuzzer {
    /// `audible` opens the audio device; otherwise only the pitch
    /// monitor is driven.
    pub fn new(pitch: SharedLevel, audible: bool) -> Self {
        let voice = if audible { Voice::new() } else { None };
        HostBuzzer { pitch, voice }
    }
}

impl ToneOutput for HostBuzzer {
    fn tone(&mut self, hz: u16) {
        self.pitch.set(hz);
        if let Some(voice) = &mut self.voice {
            voice.start(hz);
        }
    }

    fn no_tone(&mut self) {
        self.pitch.set(0);
        if let Some(voice) = &mut self.voice {
            voice.stop();
        }
    }
}
