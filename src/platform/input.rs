//! Input mapping

use glam::Vec2;

use crate::consts::{JOYSTICK_MAX_SPEED, JOYSTICK_RADIUS, PLAYER_KEY_SPEED};
use crate::settings::Settings;

/// Volume sliders run 0-100
const SLIDER_MAX: f32 = 100.0;

/// Discrete commands from keys and buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    MoveLeftStart,
    MoveLeftStop,
    MoveRightStart,
    MoveRightStop,
    /// Start a new run (only honored once the current one is over)
    Restart,
}

/// Map a `KeyboardEvent.code` to an action
pub fn key_action(code: &str, pressed: bool) -> Option<InputAction> {
    match (code, pressed) {
        ("ArrowLeft" | "KeyA", true) => Some(InputAction::MoveLeftStart),
        ("ArrowLeft" | "KeyA", false) => Some(InputAction::MoveLeftStop),
        ("ArrowRight" | "KeyD", true) => Some(InputAction::MoveRightStart),
        ("ArrowRight" | "KeyD", false) => Some(InputAction::MoveRightStop),
        ("Enter" | "Space", true) => Some(InputAction::Restart),
        _ => None,
    }
}

/// Held direction buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    left: bool,
    right: bool,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a move action; returns the paddle velocity it implies
    pub fn apply(&mut self, action: InputAction) -> Option<f32> {
        match action {
            InputAction::MoveLeftStart => self.left = true,
            InputAction::MoveLeftStop => self.left = false,
            InputAction::MoveRightStart => self.right = true,
            InputAction::MoveRightStop => self.right = false,
            InputAction::Restart => return None,
        }
        Some(self.velocity())
    }

    /// Both or neither held means stand still
    pub fn velocity(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -PLAYER_KEY_SPEED,
            (false, true) => PLAYER_KEY_SPEED,
            _ => 0.0,
        }
    }

    pub fn release_all(&mut self) {
        *self = Self::default();
    }
}

/// Paddle velocity for a joystick deflection of `dx` px from center
pub fn joystick_velocity(dx: f32) -> f32 {
    (dx / JOYSTICK_RADIUS).clamp(-1.0, 1.0) * JOYSTICK_MAX_SPEED
}

/// Knob offset, limited to the joystick radius
pub fn joystick_knob(dx: f32, dy: f32) -> Vec2 {
    Vec2::new(dx, dy).clamp_length_max(JOYSTICK_RADIUS)
}

/// Swipe on the playfield: the paddle follows the pointer's offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    start_pointer_x: f32,
    start_player_x: f32,
}

impl Drag {
    pub fn begin(pointer_x: f32, player_x: f32) -> Self {
        Self {
            start_pointer_x: pointer_x,
            start_player_x: player_x,
        }
    }

    /// Unclamped paddle x for the current pointer position
    pub fn target_x(&self, pointer_x: f32) -> f32 {
        self.start_player_x + (pointer_x - self.start_pointer_x)
    }
}

/// Raw control values from the settings panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingsForm<'a> {
    pub master_volume: &'a str,
    pub music_volume: &'a str,
    pub muted: bool,
    pub show_ghost: bool,
    pub reduced_motion: bool,
}

impl SettingsForm<'_> {
    /// Settings the panel asks for. A slider value that does not parse
    /// keeps the current volume.
    pub fn apply(&self, current: &Settings) -> Settings {
        Settings {
            master_volume: slider_volume(self.master_volume).unwrap_or(current.master_volume),
            music_volume: slider_volume(self.music_volume).unwrap_or(current.music_volume),
            muted: self.muted,
            show_ghost: self.show_ghost,
            reduced_motion: self.reduced_motion,
        }
        .sanitized()
    }
}

/// Slider text to a 0.0 - 1.0 volume
pub fn slider_volume(raw: &str) -> Option<f32> {
    let value = raw.trim().parse::<f32>().ok().filter(|v| v.is_finite())?;
    Some((value / SLIDER_MAX).clamp(0.0, 1.0))
}

/// Slider text for a 0.0 - 1.0 volume
pub fn slider_value(volume: f32) -> String {
    ((volume.clamp(0.0, 1.0) * SLIDER_MAX).round() as u32).to_string()
}
