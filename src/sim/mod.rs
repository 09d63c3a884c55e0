//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Timestamps come in from the caller
//! - No rendering, audio or storage dependencies

pub mod combo;
pub mod effects;
pub mod ghost;
pub mod mission;
pub mod progress;
pub mod spawner;
pub mod state;
pub mod tick;

pub use combo::ChainState;
pub use effects::{EffectKind, EffectTimers};
pub use ghost::{GhostRecorder, GhostSample, GhostTrace};
pub use mission::{Mission, MissionKind, MissionUpdate};
pub use progress::Progression;
pub use state::{GameEvent, GameState, Gem, GemKind, Player, Spark, Wind};
pub use tick::tick;
