//! Playfield drawing
//!
//! Back to front: LCD background, gems, ghost paddle, player, sparks,
//! game-over overlay.

use glam::Vec2;

use super::{Fill, Rect, RenderSurface, TextAlign, TextStyle};
use crate::consts::{FIELD_HEIGHT, FIELD_WIDTH};
use crate::sim::{GameState, Gem, GemKind};
use crate::themes::Palette;

const GRID_SPACING: f32 = 24.0;
const GROUND_HEIGHT: f32 = 38.0;
const FLOOR_DRIFT: f32 = 8.0;
const GHOST_COLOR: &str = "#e5e7eb";
const GHOST_ALPHA: f32 = 0.35;
const SPECIAL_EDGE: &str = "#6b21a8";
const SPECIAL_TOP: &str = "#e879f9";
const GEM_HIGHLIGHT: &str = "rgba(255,255,255,0.35)";
const PLAYER_SHADOW: &str = "rgba(0,0,0,0.2)";
const SPARK_SIZE: f32 = 3.0;

const TITLE_STYLE: TextStyle = TextStyle {
    font: "bold 22px 'Segoe UI'",
    color: "#f87171",
    align: TextAlign::Center,
};
const HINT_STYLE: TextStyle = TextStyle {
    font: "16px 'Segoe UI'",
    color: "#e2e8f0",
    align: TextAlign::Center,
};

/// Everything one frame needs
#[derive(Debug, Clone, Copy)]
pub struct SceneView<'a> {
    pub state: &'a GameState,
    pub palette: &'a Palette,
    /// Ghost paddle x, when one should be shown
    pub ghost_x: Option<f32>,
    /// Floor phase after motion settings are applied
    pub floor_phase: f32,
}

pub fn draw_scene<S: RenderSurface + ?Sized>(surface: &mut S, view: &SceneView<'_>) {
    surface.clear(FIELD_WIDTH, FIELD_HEIGHT);
    draw_background(surface, view.palette, view.floor_phase);
    for gem in &view.state.gems {
        draw_gem(surface, view.palette, gem);
    }
    if let Some(x) = view.ghost_x {
        let player = &view.state.player;
        surface.fill_rect(
            Rect::new(x, player.y, player.w, player.h),
            &Fill::Solid(GHOST_COLOR),
            GHOST_ALPHA,
        );
    }
    draw_player(surface, view);
    draw_sparks(surface, view);
    if !view.state.running {
        draw_game_over(surface);
    }
}

/// Horizontal offset of grid and ground
#[inline]
pub fn floor_drift(floor_phase: f32) -> f32 {
    (floor_phase * 0.4).sin() * FLOOR_DRIFT
}

fn draw_background<S: RenderSurface + ?Sized>(surface: &mut S, palette: &Palette, floor_phase: f32) {
    surface.fill_rect(
        Rect::new(0.0, 0.0, FIELD_WIDTH, FIELD_HEIGHT),
        &Fill::LinearGradient {
            from: Vec2::ZERO,
            to: Vec2::new(0.0, FIELD_HEIGHT),
            stops: [palette.lcd1, palette.lcd2],
        },
        1.0,
    );

    let drift = floor_drift(floor_phase);
    let grid = Fill::Solid(palette.grid);
    let mut y = 0.0;
    while y < FIELD_HEIGHT {
        surface.fill_rect(Rect::new(drift, y, FIELD_WIDTH, 1.0), &grid, 1.0);
        y += GRID_SPACING;
    }
    surface.fill_rect(
        Rect::new(drift, FIELD_HEIGHT - GROUND_HEIGHT, FIELD_WIDTH, GROUND_HEIGHT),
        &Fill::Solid(palette.ground),
        1.0,
    );
}

/// Gradient tail for special gems
fn special_tint(kind: GemKind) -> &'static str {
    match kind {
        GemKind::Slow => "#38bdf8",
        GemKind::Fever => "#f59e0b",
        _ => "#a3e635",
    }
}

fn draw_gem<S: RenderSurface + ?Sized>(surface: &mut S, palette: &Palette, gem: &Gem) {
    let x = gem.pos.x.round();
    let y = gem.pos.y.round();
    let s = gem.size;
    let special = gem.kind.is_special();

    let edge = if special { SPECIAL_EDGE } else { palette.gem_edge };
    surface.fill_rect(Rect::new(x - 1.0, y - 1.0, s + 2.0, s + 2.0), &Fill::Solid(edge), 1.0);

    let stops = if special {
        [SPECIAL_TOP, special_tint(gem.kind)]
    } else {
        [palette.gem_top, palette.gem_bottom]
    };
    surface.fill_rect(
        Rect::new(x, y, s, s),
        &Fill::LinearGradient {
            from: Vec2::new(x, y),
            to: Vec2::new(x + s, y + s),
            stops,
        },
        1.0,
    );
    surface.fill_rect(
        Rect::new(x + 2.0, y + 2.0, s / 2.0, s / 2.0),
        &Fill::Solid(GEM_HIGHLIGHT),
        1.0,
    );
}

fn draw_player<S: RenderSurface + ?Sized>(surface: &mut S, view: &SceneView<'_>) {
    let p = &view.state.player;
    let x = p.x.round();
    let y = p.y.round();
    surface.fill_rect(Rect::new(x + 2.0, y + 6.0, p.w, 8.0), &Fill::Solid(PLAYER_SHADOW), 1.0);
    surface.fill_rect(Rect::new(x, y, p.w, p.h), &Fill::Solid(view.palette.player_dark), 1.0);
    surface.fill_rect(
        Rect::new(x + 4.0, y + 3.0, p.w - 8.0, p.h - 6.0),
        &Fill::Solid(view.palette.player_light),
        1.0,
    );
}

fn draw_sparks<S: RenderSurface + ?Sized>(surface: &mut S, view: &SceneView<'_>) {
    let fill = Fill::Solid(view.palette.spark);
    for spark in &view.state.sparks {
        let alpha = (spark.life * 2.2).clamp(0.0, 1.0);
        surface.fill_rect(
            Rect::new(spark.pos.x, spark.pos.y, SPARK_SIZE, SPARK_SIZE),
            &fill,
            alpha,
        );
    }
}

fn draw_game_over<S: RenderSurface + ?Sized>(surface: &mut S) {
    surface.fill_rect(
        Rect::new(0.0, 0.0, FIELD_WIDTH, FIELD_HEIGHT),
        &Fill::Solid("rgba(0,0,0,0.5)"),
        1.0,
    );
    let cx = FIELD_WIDTH / 2.0;
    let cy = FIELD_HEIGHT / 2.0;
    surface.fill_text("GAME OVER", Vec2::new(cx, cy - 10.0), &TITLE_STYLE);
    surface.fill_text("Press Restart / Enter / Space", Vec2::new(cx, cy + 14.0), &HINT_STYLE);
}
