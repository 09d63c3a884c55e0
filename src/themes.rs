//! Color themes and the unlock registry
//!
//! Theme 0 is always available. The rest unlock through fragments and stay
//! unlocked across sessions.

use std::collections::BTreeSet;

use crate::consts::{THEME_KEY, UNLOCKED_KEY};
use crate::persistence::{self, KeyValueStore, PersistError};

/// CSS colors for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    /// Page background
    pub bg: &'static str,
    /// Canvas border
    pub frame: &'static str,
    /// LCD gradient, top and bottom
    pub lcd1: &'static str,
    pub lcd2: &'static str,
    pub grid: &'static str,
    pub ground: &'static str,
    pub gem_edge: &'static str,
    pub gem_top: &'static str,
    pub gem_bottom: &'static str,
    pub player_dark: &'static str,
    pub player_light: &'static str,
    pub pill_bg: &'static str,
    pub pill_border: &'static str,
    pub pill_text: &'static str,
    pub btn1: &'static str,
    pub btn2: &'static str,
    pub spark: &'static str,
}

pub const PALETTES: [Palette; 3] = [
    Palette {
        name: "Classic Mint",
        bg: "#0f172a",
        frame: "#0a1a30",
        lcd1: "#eefbe4",
        lcd2: "#cfe6bc",
        grid: "#b9d7a0",
        ground: "#a6c48a",
        gem_edge: "#0f3c5c",
        gem_top: "#33bef2",
        gem_bottom: "#0d74c4",
        player_dark: "#0b4f1f",
        player_light: "#0e6f2b",
        pill_bg: "#1f2937",
        pill_border: "#233044",
        pill_text: "#cbd5e1",
        btn1: "#2bc0ff",
        btn2: "#178adf",
        spark: "#fbbf24",
    },
    Palette {
        name: "Sunset Amber",
        bg: "#1f0f1c",
        frame: "#3f1f33",
        lcd1: "#fef3c7",
        lcd2: "#fcd34d",
        grid: "#f59e0b",
        ground: "#f97316",
        gem_edge: "#7c2d12",
        gem_top: "#fb923c",
        gem_bottom: "#ea580c",
        player_dark: "#7c3aed",
        player_light: "#a855f7",
        pill_bg: "#2b1b29",
        pill_border: "#4b2e3f",
        pill_text: "#fde68a",
        btn1: "#fb7185",
        btn2: "#ec4899",
        spark: "#fcd34d",
    },
    Palette {
        name: "Deep Ocean",
        bg: "#0b1222",
        frame: "#0f1f3a",
        lcd1: "#dbeafe",
        lcd2: "#93c5fd",
        grid: "#60a5fa",
        ground: "#3b82f6",
        gem_edge: "#0f172a",
        gem_top: "#38bdf8",
        gem_bottom: "#0ea5e9",
        player_dark: "#0b4f1f",
        player_light: "#34d399",
        pill_bg: "#0f172a",
        pill_border: "#1e293b",
        pill_text: "#c7d2fe",
        btn1: "#22d3ee",
        btn2: "#0ea5e9",
        spark: "#a5b4fc",
    },
];

pub const THEME_COUNT: usize = PALETTES.len();

/// One entry of the theme chooser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeOption {
    pub index: usize,
    /// Name, with " (Locked)" appended when unavailable
    pub label: String,
    pub disabled: bool,
    pub selected: bool,
}

/// Unlocked themes and the current choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeRegistry {
    unlocked: BTreeSet<usize>,
    selected: usize,
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self {
            unlocked: BTreeSet::from([0]),
            selected: 0,
        }
    }
}

impl ThemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from the store. Unknown indices are dropped and a saved
    /// selection that is not unlocked falls back to theme 0.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        let mut registry = Self::default();

        let saved = persistence::load::<Vec<i64>, _>(store, UNLOCKED_KEY);
        if let Some(indices) = persistence::recover(saved) {
            for raw in indices {
                match usize::try_from(raw).ok().filter(|&i| i < THEME_COUNT) {
                    Some(index) => {
                        registry.unlocked.insert(index);
                    }
                    None => log::warn!("Ignoring unknown theme index {raw} in '{UNLOCKED_KEY}'"),
                }
            }
        }

        let selected = persistence::load::<i64, _>(store, THEME_KEY).and_then(|raw| {
            usize::try_from(raw)
                .ok()
                .filter(|i| registry.unlocked.contains(i))
                .ok_or_else(|| PersistError::Invalid {
                    key: THEME_KEY.to_string(),
                    reason: format!("theme {raw} is not unlocked"),
                })
        });
        if let Some(index) = persistence::recover(selected) {
            registry.selected = index;
        }

        log::info!(
            "Themes: {} unlocked, '{}' selected",
            registry.unlocked.len(),
            registry.palette().name
        );
        registry
    }

    /// Write both the unlocked set and the selection
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        let unlocked: Vec<usize> = self.unlocked.iter().copied().collect();
        persistence::save_logged(store, UNLOCKED_KEY, &unlocked);
        persistence::save_logged(store, THEME_KEY, &self.selected);
    }

    #[inline]
    pub fn selected(&self) -> usize {
        self.selected
    }

    #[inline]
    pub fn is_unlocked(&self, index: usize) -> bool {
        self.unlocked.contains(&index)
    }

    pub fn unlocked(&self) -> impl Iterator<Item = usize> + '_ {
        self.unlocked.iter().copied()
    }

    /// Idempotent; returns whether the theme was newly unlocked
    pub fn unlock(&mut self, index: usize) -> bool {
        index < THEME_COUNT && self.unlocked.insert(index)
    }

    /// Switch to an unlocked theme. Locked or unknown indices are refused.
    pub fn select(&mut self, index: usize) -> bool {
        if !self.is_unlocked(index) {
            return false;
        }
        self.selected = index;
        true
    }

    /// Unlock, select and persist in one go
    pub fn advance_to<S: KeyValueStore + ?Sized>(&mut self, index: usize, store: &mut S) {
        self.unlock(index);
        self.select(index);
        self.save(store);
    }

    pub fn palette(&self) -> &'static Palette {
        &PALETTES[self.selected.min(THEME_COUNT - 1)]
    }

    /// Chooser entries in palette order
    pub fn options(&self) -> Vec<ThemeOption> {
        PALETTES
            .iter()
            .enumerate()
            .map(|(index, palette)| {
                let unlocked = self.is_unlocked(index);
                ThemeOption {
                    index,
                    label: if unlocked {
                        palette.name.to_string()
                    } else {
                        format!("{} (Locked)", palette.name)
                    },
                    disabled: !unlocked,
                    selected: index == self.selected,
                }
            })
            .collect()
    }
}
