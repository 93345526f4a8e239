//! Composite drawing helpers shared by several games

use glam::Vec2;

use super::draw::{Color, DrawList, colors, with_alpha};
use crate::sim::{Board, Piece, PieceKind, Rect};

/// Fill color for a block kind
pub fn piece_color(kind: PieceKind) -> Color {
    match kind {
        PieceKind::I => [0.13, 0.83, 0.93, 1.0],
        PieceKind::O => [0.98, 0.8, 0.08, 1.0],
        PieceKind::T => [0.66, 0.33, 0.97, 1.0],
        PieceKind::S => [0.13, 0.77, 0.37, 1.0],
        PieceKind::Z => [0.94, 0.27, 0.27, 1.0],
        PieceKind::J => [0.23, 0.51, 0.96, 1.0],
        PieceKind::L => [0.98, 0.45, 0.09, 1.0],
        PieceKind::Cross => [0.42, 0.45, 0.5, 1.0],
        PieceKind::Hook => [0.29, 0.33, 0.39, 1.0],
        PieceKind::Arch => [0.22, 0.25, 0.32, 1.0],
    }
}

/// Dim the field and print a title with optional lines underneath
pub fn banner(list: &mut DrawList, title: &str, lines: &[String]) {
    let view = list.view;
    list.rect(Rect::new(0.0, 0.0, view.x, view.y), colors::OVERLAY);
    let mid = view * 0.5;
    let title_size = (view.x * 0.09).clamp(18.0, 48.0);
    list.label(mid - Vec2::new(0.0, title_size), title, title_size, colors::TEXT);
    let line_size = title_size * 0.45;
    for (i, line) in lines.iter().enumerate() {
        let y = mid.y + (i as f32 + 0.5) * line_size * 1.5;
        list.label(Vec2::new(mid.x, y), line.as_str(), line_size, colors::DIM);
    }
}

/// Floating text that fades out as `age` goes 0 → 1
pub fn popup(list: &mut DrawList, pos: Vec2, text: &str, size: f32, color: Color, age: f32) {
    let age = age.clamp(0.0, 1.0);
    let rise = Vec2::new(0.0, -size * age);
    list.label(pos + rise, text, size, with_alpha(color, 1.0 - age));
}

/// Settled cells of a grid board, plus the empty-cell grid
pub fn board(list: &mut DrawList, board: &Board, origin: Vec2, cell: f32) {
    let w = board.width() as f32 * cell;
    let h = board.height() as f32 * cell;
    list.rect(Rect::new(origin.x, origin.y, w, h), [0.0, 0.0, 0.0, 0.45]);
    for y in 0..board.height() as i32 {
        for x in 0..board.width() as i32 {
            let r = Rect::new(origin.x + x as f32 * cell, origin.y + y as f32 * cell, cell, cell);
            match board.get(x, y).flatten() {
                Some(kind) => list.rect(r.inset(1.0), piece_color(kind)),
                None => list.outline(r, colors::GRID, 1.0),
            }
        }
    }
    list.outline(Rect::new(origin.x, origin.y, w, h), colors::WALL, 2.0);
}

/// Falling piece on top of a board drawn at `origin`
pub fn piece(list: &mut DrawList, piece: &Piece, origin: Vec2, cell: f32) {
    let color = piece_color(piece.kind);
    for (x, y) in piece.cells() {
        if y < 0 {
            continue;
        }
        let r = Rect::new(origin.x + x as f32 * cell, origin.y + y as f32 * cell, cell, cell);
        list.rect(r.inset(1.0), color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_draws_every_cell() {
        let b = Board::new(4, 3);
        let mut list = DrawList::new(Vec2::new(100.0, 100.0));
        board(&mut list, &b, Vec2::ZERO, 10.0);
        // background + 12 cells + frame
        assert_eq!(list.len(), 14);
    }

    #[test]
    fn test_piece_skips_hidden_rows() {
        let mut p = Piece::spawn(PieceKind::O, 10);
        p.y = -1;
        let mut list = DrawList::new(Vec2::new(100.0, 100.0));
        piece(&mut list, &p, Vec2::ZERO, 10.0);
        assert_eq!(list.len(), 2);
    }
}
