//! Gem spawning and difficulty ramp

use rand::Rng;

use super::effects::EffectTimers;
use super::state::{Gem, GemKind};
use crate::consts::*;

/// Time-based difficulty: 1.0 at run start, 2.8 from 180 s on
#[inline]
pub fn difficulty_factor(elapsed_secs: f32) -> f32 {
    1.0 + (elapsed_secs.max(0.0) / 100.0).min(1.8)
}

/// Roll a gem kind: 18% special, split evenly across the specials
pub fn roll_kind<R: Rng + ?Sized>(rng: &mut R) -> GemKind {
    if rng.random_bool(SPECIAL_CHANCE) {
        GemKind::SPECIALS[rng.random_range(0..GemKind::SPECIALS.len())]
    } else {
        GemKind::Normal
    }
}

/// Build a new gem at a random column
pub fn spawn_gem<R: Rng + ?Sized>(
    rng: &mut R,
    base_fall_speed: f32,
    difficulty: f32,
    effects: &EffectTimers,
) -> Gem {
    let inset = GEM_SIZE / 2.0;
    let span = FIELD_WIDTH - 2.0 * inset - GEM_SIZE;
    let x = inset + rng.random::<f32>() * span;
    let vy = base_fall_speed * difficulty * effects.spawn_speed_multiplier() / 70.0;
    Gem::new(x, vy, roll_kind(rng))
}

/// Countdown until the next spawn
pub fn next_interval(base_spawn_interval: f32, difficulty: f32, effects: &EffectTimers) -> f32 {
    (base_spawn_interval * effects.spawn_interval_multiplier() / difficulty).max(MIN_SPAWN_INTERVAL)
}

/// Run the spawn countdown; returns the gem spawned this tick, if any
pub fn step<R: Rng + ?Sized>(
    timer: &mut f32,
    dt: f32,
    rng: &mut R,
    base_fall_speed: f32,
    base_spawn_interval: f32,
    elapsed_secs: f32,
    effects: &EffectTimers,
) -> Option<Gem> {
    *timer -= dt;
    if *timer > 0.0 {
        return None;
    }
    let difficulty = difficulty_factor(elapsed_secs);
    let gem = spawn_gem(rng, base_fall_speed, difficulty, effects);
    *timer = next_interval(base_spawn_interval, difficulty, effects);
    Some(gem)
}
