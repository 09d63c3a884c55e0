//! Player preferences
//!
//! Persisted separately from progression under their own store key.

use serde::{Deserialize, Serialize};

use crate::consts::SETTINGS_KEY;
use crate::persistence::{self, KeyValueStore};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,

    // === Display ===
    /// Draw the previous run's paddle
    pub show_ghost: bool,

    // === Accessibility ===
    /// Freeze the drifting floor
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            music_volume: 1.0,
            muted: false,
            show_ghost: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Load from the store; missing or broken data gives defaults
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let settings: Self = persistence::load_or_default(store, SETTINGS_KEY);
        settings.sanitized()
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        persistence::save_logged(store, SETTINGS_KEY, self);
        log::info!("Settings saved");
    }

    /// Clamp volumes into range
    pub fn sanitized(mut self) -> Self {
        self.master_volume = clamp_volume(self.master_volume);
        self.music_volume = clamp_volume(self.music_volume);
        self
    }

    /// Gain applied on top of the sequencer's own mix
    pub fn effective_music_gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }

    /// Floor phase as drawn (frozen under reduced motion)
    pub fn effective_floor_phase(&self, phase: f32) -> f32 {
        if self.reduced_motion { 0.0 } else { phase }
    }
}

fn clamp_volume(v: f32) -> f32 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 1.0 }
}
