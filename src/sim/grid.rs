//! Falling-block grid shared by the tetris variants
//!
//! Coordinates: (x, y) with x growing right and y growing down, row 0 at the
//! top. Pieces may hang above the board (negative y) while falling.

use serde::{Deserialize, Serialize};

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// Every block shape used by the grid games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
    /// Cross with two horns
    Cross,
    /// Z with a tail
    Hook,
    /// Wide upside-down U
    Arch,
}

impl PieceKind {
    /// The seven standard tetrominoes
    pub const STANDARD: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Easy to stack
    pub const FRIENDLY: [PieceKind; 2] = [PieceKind::I, PieceKind::O];

    /// Hard to stack
    pub const AWKWARD: [PieceKind; 3] = [PieceKind::Cross, PieceKind::Hook, PieceKind::Arch];

    /// Spawn orientation as rows of 0/1
    fn rows(&self) -> &'static [&'static [u8]] {
        match self {
            PieceKind::I => &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]],
            PieceKind::O => &[&[1, 1], &[1, 1]],
            PieceKind::T => &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]],
            PieceKind::S => &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]],
            PieceKind::Z => &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]],
            PieceKind::J => &[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]],
            PieceKind::L => &[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]],
            PieceKind::Cross => &[&[1, 0, 1], &[1, 1, 1], &[0, 1, 0]],
            PieceKind::Hook => &[&[1, 1, 0], &[0, 1, 1], &[0, 1, 0]],
            PieceKind::Arch => &[&[1, 1, 1], &[1, 0, 1], &[1, 0, 1]],
        }
    }

    pub fn shape(&self) -> Shape {
        Shape::from_rows(self.rows())
    }
}

/// Occupancy matrix of a piece in one orientation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    w: usize,
    h: usize,
    cells: Vec<bool>,
}

impl Shape {
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let h = rows.len();
        let w = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut cells = Vec::with_capacity(w * h);
        for row in rows {
            cells.extend((0..w).map(|c| row.get(c).copied().unwrap_or(0) != 0));
        }
        Self { w, h, cells }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn filled(&self, col: usize, row: usize) -> bool {
        col < self.w && row < self.h && self.cells[row * self.w + col]
    }

    /// Filled cells as (col, row) offsets
    pub fn offsets(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.h).flat_map(move |r| {
            (0..self.w)
                .filter(move |&c| self.cells[r * self.w + c])
                .map(move |c| (c as i32, r as i32))
        })
    }

    /// Clockwise rotation: row i of the result is column i read bottom-up
    pub fn rotated_cw(&self) -> Self {
        let (w, h) = (self.h, self.w);
        let mut cells = vec![false; w * h];
        for r in 0..h {
            for c in 0..w {
                cells[r * w + c] = self.cells[(self.h - 1 - c) * self.w + r];
            }
        }
        Self { w, h, cells }
    }
}

/// A falling piece
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
}

impl Piece {
    /// New piece centred on the top row of a board `board_width` wide
    pub fn spawn(kind: PieceKind, board_width: usize) -> Self {
        let shape = kind.shape();
        let x = (board_width / 2) as i32 - (shape.width() / 2) as i32;
        Self { kind, shape, x, y: 0 }
    }

    /// Absolute board cells covered by the piece
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.offsets().map(|(c, r)| (self.x + c, self.y + r))
    }

    /// Move by (dx, dy) if the target is free. Returns whether it moved.
    pub fn try_shift(&mut self, board: &Board, dx: i32, dy: i32) -> bool {
        if board.collides(&self.shape, self.x + dx, self.y + dy) {
            return false;
        }
        self.x += dx;
        self.y += dy;
        true
    }

    /// Rotate clockwise, trying each horizontal kick in order.
    /// Pass `&[0]` for rotation without kicks.
    pub fn try_rotate(&mut self, board: &Board, kicks: &[i32]) -> bool {
        let rotated = self.shape.rotated_cw();
        for &dx in kicks {
            if !board.collides(&rotated, self.x + dx, self.y) {
                self.shape = rotated;
                self.x += dx;
                return true;
            }
        }
        false
    }
}

/// Settled cells of a grid game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    width: usize,
    height: usize,
    /// Row-major (y * width + x)
    cells: Vec<Option<PieceKind>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BOARD_WIDTH, BOARD_HEIGHT)
    }
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    /// Cell at (x, y), None when out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<Option<PieceKind>> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// Returns false if out of bounds
    pub fn set(&mut self, x: i32, y: i32, cell: Option<PieceKind>) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    pub fn is_occupied(&self, x: i32, y: i32) -> bool {
        matches!(self.get(x, y), Some(Some(_)))
    }

    /// Would `shape` at (x, y) leave the board sideways, go through the floor,
    /// or overlap a settled cell? Cells above row 0 are allowed.
    pub fn collides(&self, shape: &Shape, x: i32, y: i32) -> bool {
        shape.offsets().any(|(c, r)| {
            let (bx, by) = (x + c, y + r);
            if bx < 0 || bx as usize >= self.width || by >= self.height as i32 {
                return true;
            }
            by >= 0 && self.is_occupied(bx, by)
        })
    }

    /// Write the piece into the board. Cells outside the board are dropped.
    pub fn lock(&mut self, piece: &Piece) {
        for (x, y) in piece.cells() {
            self.set(x, y, Some(piece.kind));
        }
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        y < self.height && self.cells[y * self.width..(y + 1) * self.width].iter().all(Option::is_some)
    }

    pub fn row_has_block(&self, y: usize) -> bool {
        y < self.height && self.cells[y * self.width..(y + 1) * self.width].iter().any(Option::is_some)
    }

    /// Remove full rows, shifting everything above down. Returns rows cleared.
    pub fn clear_full_rows(&mut self) -> u32 {
        let mut kept: Vec<Option<PieceKind>> = Vec::with_capacity(self.cells.len());
        let mut cleared = 0;
        for y in 0..self.height {
            if self.is_row_full(y) {
                cleared += 1;
            } else {
                kept.extend_from_slice(&self.cells[y * self.width..(y + 1) * self.width]);
            }
        }
        if cleared > 0 {
            let mut cells = vec![None; cleared as usize * self.width];
            cells.extend(kept);
            self.cells = cells;
        }
        cleared
    }

    /// Height of each column measured from the floor (0 for empty)
    pub fn column_heights(&self) -> Vec<usize> {
        (0..self.width)
            .map(|x| {
                (0..self.height)
                    .find(|&y| self.cells[y * self.width + x].is_some())
                    .map(|y| self.height - y)
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_is_centered() {
        assert_eq!(Piece::spawn(PieceKind::I, BOARD_WIDTH).x, 3);
        assert_eq!(Piece::spawn(PieceKind::O, BOARD_WIDTH).x, 4);
        assert_eq!(Piece::spawn(PieceKind::T, BOARD_WIDTH).x, 4);
    }

    #[test]
    fn test_rotate_t() {
        let r = PieceKind::T.shape().rotated_cw();
        let expected = Shape::from_rows(&[&[0, 1, 0], &[0, 1, 1], &[0, 1, 0]]);
        assert_eq!(r, expected);
        // Four turns come back home
        let full = r.rotated_cw().rotated_cw().rotated_cw();
        assert_eq!(full, PieceKind::T.shape());
    }

    #[test]
    fn test_collides_walls_floor_and_sky() {
        let board = Board::default();
        let o = PieceKind::O.shape();
        assert!(board.collides(&o, -1, 0));
        assert!(board.collides(&o, 9, 0));
        assert!(board.collides(&o, 0, 19));
        assert!(!board.collides(&o, 0, -1));
        assert!(!board.collides(&o, 8, 18));
    }

    #[test]
    fn test_lock_and_clear() {
        let mut board = Board::default();
        for x in 0..BOARD_WIDTH as i32 {
            board.set(x, 19, Some(PieceKind::I));
        }
        board.set(0, 18, Some(PieceKind::T));
        assert!(board.is_row_full(19));
        assert_eq!(board.clear_full_rows(), 1);
        assert!(!board.row_has_block(18));
        assert_eq!(board.get(0, 19), Some(Some(PieceKind::T)));
        assert_eq!(board.filled_count(), 1);
    }

    #[test]
    fn test_piece_falls_until_floor() {
        let board = Board::default();
        let mut piece = Piece::spawn(PieceKind::O, BOARD_WIDTH);
        let mut steps = 0;
        while piece.try_shift(&board, 0, 1) {
            steps += 1;
        }
        assert_eq!(steps, 18);
        assert_eq!(piece.y, 18);
    }

    #[test]
    fn test_kick_off_wall() {
        let board = Board::default();
        let mut piece = Piece::spawn(PieceKind::I, BOARD_WIDTH);
        piece.try_rotate(&board, &[0]);
        // Vertical I sits in column 2 of its matrix; push it against the right wall
        while piece.try_shift(&board, 1, 0) {}
        assert!(!piece.clone().try_rotate(&board, &[0]));
        assert!(piece.try_rotate(&board, &[0, -1, 1, -2]));
    }

    #[test]
    fn test_column_heights() {
        let mut board = Board::default();
        board.set(0, 19, Some(PieceKind::O));
        board.set(1, 15, Some(PieceKind::O));
        let h = board.column_heights();
        assert_eq!(h[0], 1);
        assert_eq!(h[1], 5);
        assert_eq!(h[2], 0);
    }
}
