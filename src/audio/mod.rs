//! Background music
//!
//! Procedurally generated chiptune - no external files needed!
//! The sequencer decides what plays on each beat; a `ToneGenerator` turns
//! the resulting tones into sound (Web Audio in the browser, a log natively).

pub mod sequencer;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use sequencer::{Beat, MusicCue, Sequencer, SequencerState, StartOutcome};
#[cfg(target_arch = "wasm32")]
pub use web::WebToneGenerator;

/// Gain of the mix bus every channel feeds
pub const MASTER_GAIN: f32 = 0.07;

/// Oscillator waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timbre {
    Square,
    Triangle,
    Sine,
    Sawtooth,
}

/// Mixer channel a tone is routed through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Lead,
    Bass,
    Hat,
    Pad,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Lead, Channel::Bass, Channel::Hat, Channel::Pad];

    pub fn gain(self) -> f32 {
        match self {
            Channel::Lead => 1.0,
            Channel::Bass => 0.6,
            Channel::Hat => 0.35,
            Channel::Pad => 0.3,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One enveloped note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Hz
    pub freq: f32,
    /// Seconds until the envelope has decayed
    pub length: f32,
    /// Envelope peak
    pub volume: f32,
    pub timbre: Timbre,
    pub channel: Channel,
}

/// Something that can sound a tone right now
pub trait ToneGenerator {
    fn play(&mut self, tone: &Tone);
}

/// Records tones and traces them to the log
#[derive(Debug, Clone, Default)]
pub struct ToneLog {
    pub tones: Vec<Tone>,
}

impl ToneLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ToneGenerator for ToneLog {
    fn play(&mut self, tone: &Tone) {
        log::trace!(
            "{:?} {:?} {:.1} Hz for {:.2}s",
            tone.channel,
            tone.timbre,
            tone.freq,
            tone.length
        );
        self.tones.push(*tone);
    }
}
