//! Canvas 2D backend

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::Viewport;
use super::draw::{Align, DrawCmd, DrawList, css};

pub struct CanvasPainter {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasPainter {
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Backing-store size in device pixels
    pub fn screen_size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.canvas.set_width(width.max(1));
        self.canvas.set_height(height.max(1));
    }

    pub fn viewport(&self, view: Vec2) -> Viewport {
        Viewport::fit(view, self.screen_size())
    }

    pub fn paint(&self, list: &DrawList) {
        let ctx = &self.ctx;
        let screen = self.screen_size();
        let vp = self.viewport(list.view);

        ctx.set_fill_style_str("#000");
        ctx.fill_rect(0.0, 0.0, screen.x as f64, screen.y as f64);

        ctx.save();
        ctx.translate(
            (vp.offset.x + list.shake.x * vp.scale) as f64,
            (vp.offset.y + list.shake.y * vp.scale) as f64,
        )
        .ok();
        ctx.scale(vp.scale as f64, vp.scale as f64).ok();

        ctx.set_fill_style_str(&css(list.clear));
        ctx.fill_rect(0.0, 0.0, list.view.x as f64, list.view.y as f64);

        for cmd in list.commands() {
            self.paint_cmd(cmd);
        }
        ctx.restore();
    }

    fn paint_cmd(&self, cmd: &DrawCmd) {
        let ctx = &self.ctx;
        match cmd {
            DrawCmd::Rect { rect, color } => {
                ctx.set_fill_style_str(&css(*color));
                ctx.fill_rect(rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
            }
            DrawCmd::Outline { rect, color, width } => {
                ctx.set_stroke_style_str(&css(*color));
                ctx.set_line_width(*width as f64);
                ctx.stroke_rect(rect.x as f64, rect.y as f64, rect.w as f64, rect.h as f64);
            }
            DrawCmd::Circle {
                center,
                radius,
                color,
            } => {
                ctx.set_fill_style_str(&css(*color));
                ctx.begin_path();
                ctx.arc(
                    center.x as f64,
                    center.y as f64,
                    radius.max(0.0) as f64,
                    0.0,
                    std::f64::consts::TAU,
                )
                .ok();
                ctx.fill();
            }
            DrawCmd::Line {
                from,
                to,
                color,
                width,
            } => {
                ctx.set_stroke_style_str(&css(*color));
                ctx.set_line_width(*width as f64);
                ctx.begin_path();
                ctx.move_to(from.x as f64, from.y as f64);
                ctx.line_to(to.x as f64, to.y as f64);
                ctx.stroke();
            }
            DrawCmd::Text {
                pos,
                text,
                size,
                color,
                align,
            } => {
                ctx.set_fill_style_str(&css(*color));
                ctx.set_font(&format!("bold {}px sans-serif", size.round().max(1.0)));
                ctx.set_text_align(match align {
                    Align::Left => "left",
                    Align::Center => "center",
                    Align::Right => "right",
                });
                ctx.set_text_baseline("middle");
                ctx.fill_text(text, pos.x as f64, pos.y as f64).ok();
            }
        }
    }
}
