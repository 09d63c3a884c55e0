//! Web Audio tone generator

use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

use super::{Channel, MASTER_GAIN, Timbre, Tone, ToneGenerator};

/// Oscillators routed through per-channel gains into one master gain
pub struct WebToneGenerator {
    ctx: AudioContext,
    master: GainNode,
    channels: Vec<GainNode>,
}

impl WebToneGenerator {
    /// Build the mixer graph. Fails outside a secure context or before the
    /// page is allowed to make sound.
    pub fn new() -> Option<Self> {
        let Some(ctx) = AudioContext::new().ok() else {
            log::warn!("Failed to create AudioContext - audio disabled");
            return None;
        };

        let master = ctx.create_gain().ok()?;
        master.gain().set_value(MASTER_GAIN);
        master.connect_with_audio_node(&ctx.destination()).ok()?;

        let mut channels = Vec::with_capacity(Channel::ALL.len());
        for channel in Channel::ALL {
            let gain = ctx.create_gain().ok()?;
            gain.gain().set_value(channel.gain());
            gain.connect_with_audio_node(&master).ok()?;
            channels.push(gain);
        }

        Some(Self {
            ctx,
            master,
            channels,
        })
    }

    /// Resume context if suspended (browsers require user gesture)
    pub fn resume(&self) {
        if self.ctx.state() == AudioContextState::Suspended {
            let _ = self.ctx.resume();
        }
    }

    /// Scale the master bus by the player's volume settings
    pub fn set_volume(&self, volume: f32) {
        self.master.gain().set_value(MASTER_GAIN * volume.clamp(0.0, 1.0));
    }

    fn create_osc(&self, tone: &Tone) -> Option<(OscillatorNode, GainNode)> {
        let osc = self.ctx.create_oscillator().ok()?;
        let env = self.ctx.create_gain().ok()?;

        osc.set_type(oscillator_type(tone.timbre));
        osc.frequency().set_value(tone.freq);
        osc.connect_with_audio_node(&env).ok()?;
        env.connect_with_audio_node(&self.channels[tone.channel.index()])
            .ok()?;

        Some((osc, env))
    }
}

impl ToneGenerator for WebToneGenerator {
    fn play(&mut self, tone: &Tone) {
        let Some((osc, env)) = self.create_osc(tone) else {
            return;
        };
        let t = self.ctx.current_time();
        let length = f64::from(tone.length);

        env.gain().set_value_at_time(0.0, t).ok();
        env.gain()
            .linear_ramp_to_value_at_time(tone.volume, t + 0.02)
            .ok();
        env.gain()
            .exponential_ramp_to_value_at_time(0.001, t + length)
            .ok();

        osc.start_with_when(t).ok();
        osc.stop_with_when(t + length + 0.02).ok();
    }
}

fn oscillator_type(timbre: Timbre) -> OscillatorType {
    match timbre {
        Timbre::Square => OscillatorType::Square,
        Timbre::Triangle => OscillatorType::Triangle,
        Timbre::Sine => OscillatorType::Sine,
        Timbre::Sawtooth => OscillatorType::Sawtooth,
    }
}
