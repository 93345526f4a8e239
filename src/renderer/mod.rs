//! Rendering module
//!
//! Games fill a `DrawList`; on the web it is painted with Canvas 2D.

pub mod draw;
pub mod shapes;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

pub use draw::{Align, Color, DrawCmd, DrawList, colors};

use glam::Vec2;

/// Uniform scale + offset that letterboxes a logical view into a screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub offset: Vec2,
}

impl Viewport {
    pub fn fit(view: Vec2, screen: Vec2) -> Self {
        if view.x <= 0.0 || view.y <= 0.0 {
            return Self {
                scale: 1.0,
                offset: Vec2::ZERO,
            };
        }
        let scale = (screen.x / view.x).min(screen.y / view.y);
        let offset = (screen - view * scale) * 0.5;
        Self { scale, offset }
    }

    /// Screen pixels back to logical coordinates
    pub fn to_logical(&self, screen: Vec2) -> Vec2 {
        (screen - self.offset) / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_letterbox() {
        let vp = Viewport::fit(Vec2::new(100.0, 200.0), Vec2::new(400.0, 400.0));
        assert_eq!(vp.scale, 2.0);
        assert_eq!(vp.offset, Vec2::new(100.0, 0.0));
        assert_eq!(vp.to_logical(Vec2::new(100.0, 0.0)), Vec2::ZERO);
        assert_eq!(vp.to_logical(Vec2::new(300.0, 400.0)), Vec2::new(100.0, 200.0));
    }
}
