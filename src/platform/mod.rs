//! Platform abstraction layer
//!
//! Turns browser input (keys, on-screen buttons, pointer drag, joystick)
//! into paddle commands, and settings-panel values into `Settings`.
//! Storage lives in `persistence`.

pub mod input;

pub use input::{
    Controls, Drag, InputAction, SettingsForm, joystick_knob, joystick_velocity, key_action,
    slider_value, slider_volume,
};
