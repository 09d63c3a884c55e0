//! Fragment counter driving theme unlocks

use serde::{Deserialize, Serialize};

use crate::consts::FRAGMENT_GOAL;

/// Fragments collected toward the next theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    /// Always below `FRAGMENT_GOAL` between awards
    pub fragments: u32,
    /// Theme the next unlock advances from
    pub theme_index: usize,
    pub theme_count: usize,
}

impl Progression {
    pub fn new(theme_index: usize, theme_count: usize) -> Self {
        let theme_count = theme_count.max(1);
        Self {
            fragments: 0,
            theme_index: theme_index % theme_count,
            theme_count,
        }
    }

    /// Add one fragment. On reaching the goal the counter wraps to zero and
    /// the index of the newly unlocked theme is returned.
    pub fn award(&mut self) -> Option<usize> {
        self.fragments += 1;
        if self.fragments < FRAGMENT_GOAL {
            return None;
        }
        self.fragments = 0;
        self.theme_index = (self.theme_index + 1) % self.theme_count;
        Some(self.theme_index)
    }

    /// Follow a manual theme choice
    pub fn set_theme(&mut self, index: usize) {
        self.theme_index = index % self.theme_count;
    }
}
