//! 2D rendering module
//!
//! The scene is described as filled rectangles and text over a minimal
//! `RenderSurface`, so the same drawing code targets a browser canvas or a
//! recording `DrawList` (native runs and tests).

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod hud;
pub mod scene;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;
pub use hud::Hud;
pub use scene::{SceneView, draw_scene};

use glam::Vec2;

/// Any CSS color string
pub type Color = &'static str;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    Solid(Color),
    /// Two-stop gradient between two canvas points
    LinearGradient { from: Vec2, to: Vec2, stops: [Color; 2] },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// CSS font shorthand
    pub font: &'static str,
    pub color: Color,
    pub align: TextAlign,
}

/// Drawing primitives the scene needs
pub trait RenderSurface {
    fn clear(&mut self, width: f32, height: f32);

    /// Fill `rect` at opacity `alpha` (0.0 - 1.0)
    fn fill_rect(&mut self, rect: Rect, fill: &Fill, alpha: f32);

    fn fill_text(&mut self, text: &str, pos: Vec2, style: &TextStyle);
}

/// One recorded drawing call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear { width: f32, height: f32 },
    Rect { rect: Rect, fill: Fill, alpha: f32 },
    Text { text: String, pos: Vec2, style: TextStyle },
}

/// Surface that just records what was drawn
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Recorded text, in draw order
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Recorded rectangles filled with `color`
    pub fn rects_with(&self, color: Color) -> impl Iterator<Item = (&Rect, f32)> + '_ {
        self.commands.iter().filter_map(move |cmd| match cmd {
            DrawCommand::Rect {
                rect,
                fill: Fill::Solid(c),
                alpha,
            } if *c == color => Some((rect, *alpha)),
            _ => None,
        })
    }
}

impl RenderSurface for DrawList {
    fn clear(&mut self, width: f32, height: f32) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { width, height });
    }

    fn fill_rect(&mut self, rect: Rect, fill: &Fill, alpha: f32) {
        self.commands.push(DrawCommand::Rect {
            rect,
            fill: *fill,
            alpha,
        });
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            pos,
            style: *style,
        });
    }
}
