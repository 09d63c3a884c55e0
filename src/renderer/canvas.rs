//! Canvas 2D backend

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{Fill, Rect, RenderSurface, TextStyle};

pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;
        Ok(Self { ctx })
    }

    fn apply_fill(&self, fill: &Fill) {
        match fill {
            Fill::Solid(color) => self.ctx.set_fill_style_str(color),
            Fill::LinearGradient { from, to, stops } => {
                let gradient = self.ctx.create_linear_gradient(
                    from.x as f64,
                    from.y as f64,
                    to.x as f64,
                    to.y as f64,
                );
                gradient.add_color_stop(0.0, stops[0]).ok();
                gradient.add_color_stop(1.0, stops[1]).ok();
                self.ctx.set_fill_style_canvas_gradient(&gradient);
            }
        }
    }
}

impl RenderSurface for CanvasSurface {
    fn clear(&mut self, width: f32, height: f32) {
        self.ctx.clear_rect(0.0, 0.0, width as f64, height as f64);
    }

    fn fill_rect(&mut self, rect: Rect, fill: &Fill, alpha: f32) {
        self.apply_fill(fill);
        self.ctx.set_global_alpha(alpha as f64);
        self.ctx
            .fill_rect(rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
        self.ctx.set_global_alpha(1.0);
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, style: &TextStyle) {
        self.ctx.set_font(style.font);
        self.ctx.set_text_align(style.align.as_str());
        self.ctx.set_fill_style_str(style.color);
        self.ctx.fill_text(text, pos.x as f64, pos.y as f64).ok();
    }
}
