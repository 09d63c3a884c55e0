//! Timed status effects
//!
//! Every effect is a countdown in seconds; zero means inactive.

use serde::{Deserialize, Serialize};

/// Named timed effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Gems fall slower, spawns spread out
    Slow,
    /// Gems fall faster, double score
    Fever,
    /// Near-stop, triple score
    Rainbow,
    /// Gems drift toward the paddle
    Magnet,
    /// Gems bounce between the walls
    Reflector,
    /// Misses cost no life
    Shield,
}

impl EffectKind {
    pub const COUNT: usize = 6;

    /// Display order (also the storage order)
    pub const ALL: [EffectKind; Self::COUNT] = [
        EffectKind::Slow,
        EffectKind::Fever,
        EffectKind::Rainbow,
        EffectKind::Magnet,
        EffectKind::Reflector,
        EffectKind::Shield,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            EffectKind::Slow => 0,
            EffectKind::Fever => 1,
            EffectKind::Rainbow => 2,
            EffectKind::Magnet => 3,
            EffectKind::Reflector => 4,
            EffectKind::Shield => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EffectKind::Slow => "slow",
            EffectKind::Fever => "fever",
            EffectKind::Rainbow => "rainbow",
            EffectKind::Magnet => "magnet",
            EffectKind::Reflector => "reflector",
            EffectKind::Shield => "shield",
        }
    }

    /// Fixed duration granted when the effect is triggered
    pub fn duration(self) -> f32 {
        match self {
            EffectKind::Slow => 6.0,
            EffectKind::Fever => 7.0,
            EffectKind::Rainbow => 3.0,
            EffectKind::Magnet => 6.0,
            EffectKind::Reflector => 7.0,
            EffectKind::Shield => crate::consts::MISSION_SHIELD_SECS,
        }
    }
}

/// Remaining seconds per effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectTimers {
    remaining: [f32; EffectKind::COUNT],
}

impl EffectTimers {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn remaining(&self, kind: EffectKind) -> f32 {
        self.remaining[kind.index()]
    }

    #[inline]
    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.remaining(kind) > 0.0
    }

    /// Start (or restart) an effect at its fixed duration
    pub fn trigger(&mut self, kind: EffectKind) {
        self.set(kind, kind.duration());
    }

    /// Overwrite a timer; negative or NaN input stores zero
    pub fn set(&mut self, kind: EffectKind, secs: f32) {
        self.remaining[kind.index()] = if secs > 0.0 { secs } else { 0.0 };
    }

    /// Count every timer down by `dt`, flooring at zero
    pub fn decay(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        for t in &mut self.remaining {
            if *t > 0.0 {
                *t = (*t - dt).max(0.0);
            }
        }
    }

    pub fn clear(&mut self) {
        self.remaining = [0.0; EffectKind::COUNT];
    }

    /// Active effects with their remaining time, in display order
    pub fn active(&self) -> impl Iterator<Item = (EffectKind, f32)> + '_ {
        EffectKind::ALL
            .into_iter()
            .map(|k| (k, self.remaining(k)))
            .filter(|&(_, t)| t > 0.0)
    }

    /// Multiplier on gem movement; all active effects compound
    pub fn movement_multiplier(&self) -> f32 {
        let mut m = 1.0;
        if self.is_active(EffectKind::Slow) {
            m *= 0.55;
        }
        if self.is_active(EffectKind::Fever) {
            m *= 1.25;
        }
        if self.is_active(EffectKind::Rainbow) {
            m *= 0.05;
        }
        m
    }

    /// Multiplier on a new gem's fall velocity; first active effect wins
    pub fn spawn_speed_multiplier(&self) -> f32 {
        if self.is_active(EffectKind::Slow) {
            0.55
        } else if self.is_active(EffectKind::Fever) {
            1.25
        } else if self.is_active(EffectKind::Rainbow) {
            0.05
        } else {
            1.0
        }
    }

    /// Multiplier on the spawn countdown
    pub fn spawn_interval_multiplier(&self) -> f32 {
        if self.is_active(EffectKind::Slow) {
            1.25
        } else if self.is_active(EffectKind::Fever) {
            0.85
        } else {
            1.0
        }
    }

    /// Multiplier on the per-catch reward
    pub fn score_multiplier(&self) -> u64 {
        let mut m = 1;
        if self.is_active(EffectKind::Fever) {
            m *= 2;
        }
        if self.is_active(EffectKind::Rainbow) {
            m *= 3;
        }
        m
    }
}
