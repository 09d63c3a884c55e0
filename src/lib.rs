//! Gem Catch - A Game & Watch style catching game
//!
//! Core modules:
//! - `sim`: Simulation (spawning, physics, effects, combos, missions, ghost)
//! - `game`: Orchestrator owning one run plus everything that outlives it
//! - `audio`: Tempo-locked background sequencer and tone generators
//! - `renderer`: Scene description over a minimal 2D surface
//! - `platform`: Input mapping (keys, pointer drag, joystick)
//! - `persistence`: Versioned key-value persistence with soft failure
//! - `themes`: Palettes and the unlock registry

pub mod audio;
pub mod game;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod themes;

pub use game::Game;
pub use settings::Settings;
pub use themes::{PALETTES, Palette, ThemeRegistry};

/// Game configuration constants
pub mod consts {
    /// Largest simulation step per frame (seconds)
    pub const MAX_DT: f32 = 0.05;

    /// Playfield dimensions (LCD canvas)
    pub const FIELD_WIDTH: f32 = 420.0;
    pub const FIELD_HEIGHT: f32 = 450.0;

    /// Player paddle
    pub const PLAYER_WIDTH: f32 = 36.0;
    pub const PLAYER_HEIGHT: f32 = 16.0;
    /// Distance from the bottom of the field to the paddle's top edge
    pub const PLAYER_FLOOR_OFFSET: f32 = 54.0;
    /// Gap kept between the paddle and either wall
    pub const PLAYER_WALL_MARGIN: f32 = 6.0;
    /// Keyboard/button movement speed (px/s)
    pub const PLAYER_KEY_SPEED: f32 = 120.0;
    /// Joystick full-deflection speed (px/s)
    pub const JOYSTICK_MAX_SPEED: f32 = 140.0;
    /// Joystick knob travel radius (px)
    pub const JOYSTICK_RADIUS: f32 = 35.0;

    /// Gems
    pub const GEM_SIZE: f32 = 12.0;
    pub const GEM_SPAWN_Y: f32 = -12.0;
    /// Gems further than this below the field are gone
    pub const MISS_MARGIN: f32 = 10.0;
    pub const SPECIAL_CHANCE: f64 = 0.18;
    pub const FRAGMENT_CHANCE: f64 = 0.35;
    pub const FRAGMENT_GOAL: u32 = 3;

    /// Run setup
    pub const START_LIVES: u8 = 3;
    pub const BASE_FALL_SPEED: f32 = 28.0;
    pub const FALL_SPEED_STEP: f32 = 1.2;
    pub const MAX_FALL_SPEED: f32 = 150.0;
    pub const BASE_SPAWN_INTERVAL: f32 = 3.0;
    pub const FIRST_SPAWN_DELAY: f32 = 0.2;
    pub const MIN_SPAWN_INTERVAL: f32 = 0.36;
    pub const CATCH_REWARD: u64 = 10;

    /// Wind
    pub const WIND_LOCKOUT_SECS: f32 = 15.0;
    pub const WIND_MAX: f32 = 30.0;
    pub const WIND_FIRST_ROLL: f32 = 4.0;

    /// Cosmetic sparks
    pub const SPARK_COUNT: usize = 6;
    pub const SPARK_LIFE: f32 = 0.4;
    pub const SPARK_GRAVITY: f32 = 160.0;

    /// Missions
    pub const MISSION_DURATION_MS: f64 = 30_000.0;
    pub const MISSION_SHIELD_SECS: f32 = 5.0;

    /// Ghost replay
    pub const GHOST_SAMPLE_INTERVAL_MS: f64 = 100.0;
    /// A trace needs more samples than this to be kept
    pub const GHOST_MIN_SAMPLES: usize = 10;

    /// Persistence keys
    pub const UNLOCKED_KEY: &str = "gwUnlocked";
    pub const THEME_KEY: &str = "gwThemeIdx";
    pub const GHOST_KEY: &str = "gwGhost";
    pub const SETTINGS_KEY: &str = "gwSettings";
}

/// Derive a run seed from a millisecond clock reading
#[inline]
pub fn seed_from_time(ms: f64) -> u64 {
    // splitmix64 finalizer so neighbouring timestamps give unrelated seeds
    let mut z = ms.to_bits().wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
