//! Backend-agnostic draw commands
//!
//! Games describe a frame as a flat list of rectangles, circles and text in
//! their own logical coordinates. The canvas backend scales that space to fit
//! the screen.

use glam::Vec2;

use crate::sim::Rect;

pub type Color = [f32; 4];

/// Horizontal text anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Rect {
        rect: Rect,
        color: Color,
    },
    Outline {
        rect: Rect,
        color: Color,
        width: f32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Color,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Color,
        width: f32,
    },
    Text {
        pos: Vec2,
        text: String,
        size: f32,
        color: Color,
        align: Align,
    },
}

/// One frame worth of draw commands
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    /// Logical size of the play field
    pub view: Vec2,
    pub clear: Color,
    /// Whole-frame offset for screen shake
    pub shake: Vec2,
    cmds: Vec<DrawCmd>,
}

impl DrawList {
    pub fn new(view: Vec2) -> Self {
        Self {
            view,
            clear: colors::BACKGROUND,
            shake: Vec2::ZERO,
            cmds: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    pub fn commands(&self) -> &[DrawCmd] {
        &self.cmds
    }

    pub fn rect(&mut self, rect: Rect, color: Color) {
        self.cmds.push(DrawCmd::Rect { rect, color });
    }

    pub fn outline(&mut self, rect: Rect, color: Color, width: f32) {
        self.cmds.push(DrawCmd::Outline { rect, color, width });
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.cmds.push(DrawCmd::Circle {
            center,
            radius,
            color,
        });
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, color: Color, width: f32) {
        self.cmds.push(DrawCmd::Line {
            from,
            to,
            color,
            width,
        });
    }

    pub fn text(&mut self, pos: Vec2, text: impl Into<String>, size: f32, color: Color, align: Align) {
        self.cmds.push(DrawCmd::Text {
            pos,
            text: text.into(),
            size,
            color,
            align,
        });
    }

    /// Centered text, the common case for banners and popups
    pub fn label(&mut self, pos: Vec2, text: impl Into<String>, size: f32, color: Color) {
        self.text(pos, text, size, color, Align::Center);
    }
}

/// Convert to a CSS color string
pub fn css(color: Color) -> String {
    let [r, g, b, a] = color;
    format!(
        "rgba({},{},{},{:.3})",
        (r.clamp(0.0, 1.0) * 255.0).round() as u8,
        (g.clamp(0.0, 1.0) * 255.0).round() as u8,
        (b.clamp(0.0, 1.0) * 255.0).round() as u8,
        a.clamp(0.0, 1.0)
    )
}

pub fn with_alpha(color: Color, alpha: f32) -> Color {
    [color[0], color[1], color[2], alpha]
}

/// Shared palette
pub mod colors {
    use super::Color;

    pub const BACKGROUND: Color = [0.07, 0.08, 0.11, 1.0];
    pub const ROAD: Color = [0.22, 0.22, 0.25, 1.0];
    pub const GRASS: Color = [0.13, 0.4, 0.18, 1.0];
    pub const LANE_MARK: Color = [0.95, 0.95, 0.95, 0.7];
    pub const PLAYER: Color = [0.2, 0.55, 1.0, 1.0];
    pub const HAZARD: Color = [0.95, 0.3, 0.25, 1.0];
    pub const CONE: Color = [1.0, 0.55, 0.1, 1.0];
    pub const COIN: Color = [1.0, 0.85, 0.2, 1.0];
    pub const TEXT: Color = [1.0, 1.0, 1.0, 1.0];
    pub const DIM: Color = [0.6, 0.62, 0.7, 1.0];
    pub const OVERLAY: Color = [0.0, 0.0, 0.0, 0.6];
    pub const GOOD: Color = [0.3, 0.9, 0.45, 1.0];
    pub const BAD: Color = [0.95, 0.25, 0.3, 1.0];
    pub const ACCENT: Color = [0.75, 0.45, 1.0, 1.0];
    pub const GRID: Color = [1.0, 1.0, 1.0, 0.06];
    pub const WALL: Color = [0.35, 0.36, 0.45, 1.0];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_conversion() {
        assert_eq!(css([1.0, 0.0, 0.5, 1.0]), "rgba(255,0,128,1.000)");
        assert_eq!(css([2.0, -1.0, 0.0, 0.25]), "rgba(255,0,0,0.250)");
    }

    #[test]
    fn test_draw_list_collects() {
        let mut list = DrawList::new(Vec2::new(100.0, 100.0));
        assert!(list.is_empty());
        list.rect(Rect::new(0.0, 0.0, 1.0, 1.0), colors::PLAYER);
        list.label(Vec2::ZERO, "hi", 12.0, colors::TEXT);
        assert_eq!(list.len(), 2);
        assert!(matches!(list.commands()[1], DrawCmd::Text { align: Align::Center, .. }));
    }
}
