//! Tempo-locked chord sequencer
//!
//! Four-chord loop with lead, bass, hat and pad layers plus a shimmer while
//! rainbow is running. The caller schedules each beat after the returned
//! delay; the sequencer never touches gameplay state.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{Channel, Timbre, Tone};

/// Chord roots and thirds/fifths (Hz)
pub const CHORDS: [[f32; 3]; 4] = [
    [196.0, 247.0, 294.0],
    [220.0, 262.0, 330.0],
    [174.0, 220.0, 262.0],
    [247.0, 311.0, 370.0],
];

/// Beat spacing at base tempo
pub const BASE_INTERVAL_MS: f64 = 520.0;

/// Beat spacing factor; the music speeds up as the score climbs
pub fn tempo_factor(score: u64) -> f64 {
    if score >= 300 {
        0.75
    } else if score >= 150 {
        0.85
    } else {
        1.0
    }
}

/// Read-only gameplay snapshot taken when a beat fires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MusicCue {
    pub score: u64,
    pub rainbow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    /// Waiting for the first user interaction
    Idle,
    Running,
    /// Beats stopped (page hidden, context suspended)
    Suspended,
}

/// What the caller should do after `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// First start: create the audio output and begin scheduling beats
    Begin,
    /// Was suspended: resume output and restart the beat loop
    Resume,
    AlreadyRunning,
}

/// Tones for one beat and the wait before the next
#[derive(Debug, Clone, PartialEq)]
pub struct Beat {
    pub tones: Vec<Tone>,
    pub delay_ms: f64,
}

#[derive(Debug, Clone)]
pub struct Sequencer {
    state: SequencerState,
    step: u32,
    /// Hat and shimmer jitter
    rng: Pcg32,
}

impl Sequencer {
    pub fn new(seed: u64) -> Self {
        Self {
            state: SequencerState::Idle,
            step: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn state(&self) -> SequencerState {
        self.state
    }

    #[inline]
    pub fn step(&self) -> u32 {
        self.step
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == SequencerState::Running
    }

    pub fn start(&mut self) -> StartOutcome {
        let outcome = match self.state {
            SequencerState::Idle => StartOutcome::Begin,
            SequencerState::Suspended => StartOutcome::Resume,
            SequencerState::Running => return StartOutcome::AlreadyRunning,
        };
        self.state = SequencerState::Running;
        log::info!("Music {:?} at step {}", outcome, self.step);
        outcome
    }

    pub fn suspend(&mut self) {
        if self.state == SequencerState::Running {
            self.state = SequencerState::Suspended;
            log::info!("Music suspended");
        }
    }

    /// Produce the current beat and move to the next step
    pub fn advance(&mut self, cue: MusicCue) -> Option<Beat> {
        if !self.is_running() {
            return None;
        }

        let step = self.step as usize;
        let chord = CHORDS[step % CHORDS.len()];
        let mut tones = Vec::with_capacity(7);

        let lead = [chord[0], chord[1], chord[2], chord[0] * 2.0];
        tones.push(Tone {
            freq: lead[(step * 2) % lead.len()],
            length: 0.35,
            volume: 0.32,
            timbre: Timbre::Square,
            channel: Channel::Lead,
        });

        if step % 2 == 0 {
            tones.push(Tone {
                freq: chord[0] / 2.0,
                length: 0.6,
                volume: 0.28,
                timbre: Timbre::Triangle,
                channel: Channel::Bass,
            });
        }

        tones.push(Tone {
            freq: 820.0 + self.rng.random::<f32>() * 120.0,
            length: 0.08,
            volume: 0.15,
            timbre: Timbre::Sawtooth,
            channel: Channel::Hat,
        });

        if step % 4 == 0 {
            for (i, &freq) in chord.iter().enumerate() {
                tones.push(Tone {
                    freq,
                    length: 0.9,
                    volume: 0.15,
                    timbre: if i % 2 == 0 { Timbre::Triangle } else { Timbre::Sine },
                    channel: Channel::Pad,
                });
            }
        }

        if cue.rainbow {
            tones.push(Tone {
                freq: 1200.0 + self.rng.random::<f32>() * 200.0,
                length: 0.18,
                volume: 0.22,
                timbre: Timbre::Triangle,
                channel: Channel::Lead,
            });
        }

        self.step = self.step.wrapping_add(1);
        Some(Beat {
            tones,
            delay_ms: BASE_INTERVAL_MS * tempo_factor(cue.score),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> Sequencer {
        let mut seq = Sequencer::new(1);
        seq.start();
        seq
    }

    #[test]
    fn test_idle_until_started() {
        let mut seq = Sequencer::new(1);
        assert_eq!(seq.advance(MusicCue::default()), None);
        assert_eq!(seq.start(), StartOutcome::Begin);
        assert_eq!(seq.start(), StartOutcome::AlreadyRunning);
        seq.suspend();
        assert_eq!(seq.advance(MusicCue::default()), None);
        assert_eq!(seq.start(), StartOutcome::Resume);
        assert!(seq.advance(MusicCue::default()).is_some());
    }

    #[test]
    fn test_tempo_thresholds() {
        assert_eq!(tempo_factor(0), 1.0);
        assert_eq!(tempo_factor(149), 1.0);
        assert_eq!(tempo_factor(150), 0.85);
        assert_eq!(tempo_factor(299), 0.85);
        assert_eq!(tempo_factor(300), 0.75);

        let mut seq = running();
        let beat = seq.advance(MusicCue { score: 400, rainbow: false }).unwrap();
        assert_eq!(beat.delay_ms, 390.0);
    }

    #[test]
    fn test_first_beat_layers() {
        let mut seq = running();
        let beat = seq.advance(MusicCue::default()).unwrap();
        // lead, bass, hat, three pad notes
        assert_eq!(beat.tones.len(), 6);
        assert_eq!(beat.tones[0].freq, 196.0);
        assert_eq!(beat.tones[0].timbre, Timbre::Square);
        assert_eq!(beat.tones[1].freq, 98.0);
        assert_eq!(beat.tones[1].channel, Channel::Bass);
        assert!((820.0..=940.0).contains(&beat.tones[2].freq));
        let pads: Vec<_> = beat.tones[3..].iter().map(|t| t.timbre).collect();
        assert_eq!(pads, vec![Timbre::Triangle, Timbre::Sine, Timbre::Triangle]);
    }

    #[test]
    fn test_lead_walks_chord() {
        let mut seq = running();
        let leads: Vec<f32> = (0..4)
            .map(|_| seq.advance(MusicCue::default()).unwrap().tones[0].freq)
            .collect();
        // steps 0..3 pick notes 0, 2, 0, 2 of each chord
        assert_eq!(leads, vec![196.0, 330.0, 174.0, 370.0]);
    }

    #[test]
    fn test_odd_step_is_sparse() {
        let mut seq = running();
        seq.advance(MusicCue::default());
        let beat = seq.advance(MusicCue::default()).unwrap();
        assert_eq!(beat.tones.len(), 2, "lead and hat only");
    }

    #[test]
    fn test_rainbow_shimmer() {
        let mut seq = running();
        let beat = seq.advance(MusicCue { score: 0, rainbow: true }).unwrap();
        let shimmer = beat.tones.last().unwrap();
        assert_eq!(shimmer.channel, Channel::Lead);
        assert!((1200.0..=1400.0).contains(&shimmer.freq));
        assert_eq!(shimmer.length, 0.18);
    }
}
