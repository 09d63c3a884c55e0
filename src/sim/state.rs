//! Run state and core simulation types
//!
//! Everything here belongs to a single run and is rebuilt on reset.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::combo::ChainState;
use super::effects::{EffectKind, EffectTimers};
use super::mission::{Mission, MissionKind};
use super::progress::Progression;
use crate::consts::*;

/// Falling gem types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GemKind {
    #[default]
    Normal,
    Slow,
    Fever,
    Magnet,
    Reflector,
    Rainbow,
}

impl GemKind {
    /// Kinds rolled when a spawn comes up special
    pub const SPECIALS: [GemKind; 5] = [
        GemKind::Slow,
        GemKind::Fever,
        GemKind::Magnet,
        GemKind::Reflector,
        GemKind::Rainbow,
    ];

    #[inline]
    pub fn is_special(self) -> bool {
        self != GemKind::Normal
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GemKind::Normal => "normal",
            GemKind::Slow => "slow",
            GemKind::Fever => "fever",
            GemKind::Magnet => "magnet",
            GemKind::Reflector => "reflector",
            GemKind::Rainbow => "rainbow",
        }
    }
}

/// A falling gem
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gem {
    /// Top-left corner
    pub pos: Vec2,
    pub size: f32,
    /// Base fall rate (px per 1/60 s before effect scaling)
    pub vy: f32,
    /// Horizontal speed, only picked up under the reflector effect
    pub vx: f32,
    pub kind: GemKind,
}

impl Gem {
    pub fn new(x: f32, vy: f32, kind: GemKind) -> Self {
        Self {
            pos: Vec2::new(x, GEM_SPAWN_Y),
            size: GEM_SIZE,
            vy,
            vx: 0.0,
            kind,
        }
    }

    /// Axis-aligned overlap against the paddle (edges touching count)
    pub fn overlaps(&self, player: &Player) -> bool {
        let hit_x = self.pos.x + self.size >= player.x && self.pos.x <= player.x + player.w;
        let hit_y = self.pos.y + self.size >= player.y && self.pos.y <= player.y + player.h;
        hit_x && hit_y
    }

    /// Whether the gem ever overlapped the visible column
    pub fn in_column(&self) -> bool {
        self.pos.x + self.size > 0.0 && self.pos.x < FIELD_WIDTH
    }
}

/// The player paddle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    /// Horizontal velocity (px/s), driven by input
    pub vx: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            x: FIELD_WIDTH / 2.0 - PLAYER_WIDTH / 2.0,
            y: FIELD_HEIGHT - PLAYER_FLOOR_OFFSET,
            w: PLAYER_WIDTH,
            h: PLAYER_HEIGHT,
            vx: 0.0,
        }
    }
}

impl Player {
    #[inline]
    pub fn center_x(&self) -> f32 {
        self.x + self.w / 2.0
    }

    /// Keep the paddle inside the walls
    pub fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(
            PLAYER_WALL_MARGIN,
            FIELD_WIDTH - self.w - PLAYER_WALL_MARGIN,
        )
    }

    pub fn integrate(&mut self, dt: f32) {
        self.x = self.clamp_x(self.x + self.vx * dt);
    }
}

/// A catch spark for visual effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spark {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds left
    pub life: f32,
}

/// Horizontal wind acting on every gem
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// Drift strength, in [-WIND_MAX, WIND_MAX]
    pub strength: f32,
    /// Seconds until the next re-roll
    pub timer: f32,
}

impl Default for Wind {
    fn default() -> Self {
        Self {
            strength: 0.0,
            timer: WIND_FIRST_ROLL,
        }
    }
}

/// Things that happened during a tick, drained by the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A gem hit the paddle
    Caught { kind: GemKind, gain: u64 },
    /// A special catch switched an effect on
    EffectApplied { effect: EffectKind },
    /// A gem fell through and cost a life
    Missed { lives_left: u8 },
    /// A gem fell through while shielded
    MissAbsorbed,
    FragmentAwarded { fragments: u32 },
    /// Fragment goal reached; this theme is now unlocked and current
    ThemeAdvanced { index: usize },
    MissionCompleted { kind: MissionKind },
    MissionExpired { kind: MissionKind },
    /// Lives exhausted
    RunOver { score: u64 },
}

/// Complete state of one run
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// RNG for spawns, missions, wind and sparks
    pub rng: Pcg32,
    pub player: Player,
    pub gems: Vec<Gem>,
    /// Visual particles (not gameplay-affecting)
    pub sparks: Vec<Spark>,
    pub score: u64,
    pub lives: u8,
    pub running: bool,
    /// Tick timestamp at run start (ms)
    pub started_at_ms: f64,
    /// Timestamp of the latest tick (ms)
    pub now_ms: f64,
    /// Timestamp of the latest life lost (ms), or run start
    pub last_miss_ms: f64,
    /// Fall speed before difficulty and effects; ramps per catch
    pub base_fall_speed: f32,
    pub base_spawn_interval: f32,
    /// Seconds until the next spawn
    pub spawn_timer: f32,
    pub effects: EffectTimers,
    pub chain: ChainState,
    pub mission: Mission,
    pub progression: Progression,
    pub wind: Wind,
    /// Drives the drifting floor animation
    pub floor_phase: f32,
    /// Pending events for this tick
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Fresh run starting at `now_ms`, using `theme_index` as the current theme
    pub fn new(seed: u64, now_ms: f64, theme_index: usize) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mission = Mission::random(&mut rng, now_ms);
        Self {
            seed,
            rng,
            player: Player::default(),
            gems: Vec::new(),
            sparks: Vec::new(),
            score: 0,
            lives: START_LIVES,
            running: true,
            started_at_ms: now_ms,
            now_ms,
            last_miss_ms: now_ms,
            base_fall_speed: BASE_FALL_SPEED,
            base_spawn_interval: BASE_SPAWN_INTERVAL,
            spawn_timer: FIRST_SPAWN_DELAY,
            effects: EffectTimers::new(),
            chain: ChainState::None,
            mission,
            progression: Progression::new(theme_index, crate::themes::THEME_COUNT),
            wind: Wind::default(),
            floor_phase: 0.0,
            events: Vec::new(),
        }
    }

    /// Seconds since the run started (wall clock, not simulated time)
    #[inline]
    pub fn elapsed_secs(&self) -> f32 {
        (((self.now_ms - self.started_at_ms) / 1000.0) as f32).max(0.0)
    }

    /// Seconds since the last life was lost
    #[inline]
    pub fn secs_since_miss(&self) -> f32 {
        (((self.now_ms - self.last_miss_ms) / 1000.0) as f32).max(0.0)
    }

    /// Take this tick's events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
