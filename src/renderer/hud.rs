//! HUD text
//!
//! The HUD lives in DOM pills next to the canvas; this builds their text.

use crate::consts::FRAGMENT_GOAL;
use crate::sim::{EffectTimers, GameState};
use crate::themes::Palette;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hud {
    pub score: String,
    pub lives: String,
    /// `name:1.2s` list, or "None"
    pub effects: String,
    pub theme: String,
    /// `n/3`
    pub fragments: String,
    /// Mission description, or `---`
    pub mission: String,
}

impl Hud {
    pub fn from_state(state: &GameState, palette: &Palette) -> Self {
        Self {
            score: state.score.to_string(),
            lives: state.lives.to_string(),
            effects: effects_label(&state.effects),
            theme: palette.name.to_string(),
            fragments: format!("{}/{}", state.progression.fragments, FRAGMENT_GOAL),
            mission: state.mission.description(),
        }
    }

    /// (element id, text) pairs for the page
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("score", self.score.as_str()),
            ("lives", self.lives.as_str()),
            ("effect", self.effects.as_str()),
            ("themeName", self.theme.as_str()),
            ("fragments", self.fragments.as_str()),
            ("missionText", self.mission.as_str()),
        ]
    }
}

pub fn effects_label(effects: &EffectTimers) -> String {
    let active: Vec<String> = effects
        .active()
        .map(|(kind, secs)| format!("{}:{:.1}s", kind.as_str(), secs))
        .collect();
    if active.is_empty() {
        "None".to_string()
    } else {
        active.join(",")
    }
}
