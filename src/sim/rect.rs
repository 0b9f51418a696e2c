//! Integer pixel rectangles
//!
//! Every hitbox in the sim is an axis-aligned box in pixel space. Overlap
//! is strict (touching edges do not collide) and point containment is
//! half-open: the left/top edge is inside, the right/bottom edge is not.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::TILE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// The full tile rect at (row, col)
    pub fn of_cell(row: i32, col: i32) -> Self {
        Self::new(col * TILE_SIZE, row * TILE_SIZE, TILE_SIZE, TILE_SIZE)
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn center(&self) -> IVec2 {
        IVec2::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    pub fn set_center(&mut self, center: IVec2) {
        self.x = center.x - self.w / 2;
        self.y = center.y - self.h / 2;
    }

    pub fn set_left(&mut self, left: i32) {
        self.x = left;
    }

    pub fn set_right(&mut self, right: i32) {
        self.x = right - self.w;
    }

    pub fn set_top(&mut self, top: i32) {
        self.y = top;
    }

    pub fn set_bottom(&mut self, bottom: i32) {
        self.y = bottom - self.h;
    }

    pub fn translate(&self, delta: IVec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.w, self.h)
    }

    /// Grow (positive) or shrink (negative) by `d` pixels on every side,
    /// keeping the center fixed.
    pub fn inflate(&self, d: i32) -> Self {
        Self::new(self.x - d, self.y - d, self.w + 2 * d, self.h + 2 * d)
    }

    /// Strict overlap test. Rects that merely share an edge do not overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Half-open containment: left/top edges inclusive, right/bottom exclusive.
    pub fn contains_point(&self, p: IVec2) -> bool {
        p.x >= self.left() && p.x < self.right() && p.y >= self.top() && p.y < self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_touching_rects_do_not_intersect() {
        let a = Rect::new(0, 0, 48, 48);
        let b = Rect::new(48, 0, 48, 48);
        assert!(!a.intersects(&b));
        let c = Rect::new(47, 0, 48, 48);
        assert!(a.intersects(&c));
    }

    #[test]
    fn containment_is_half_open() {
        let r = Rect::new(0, 0, 48, 48);
        assert!(r.contains_point(IVec2::new(0, 0)));
        assert!(r.contains_point(IVec2::new(47, 47)));
        assert!(!r.contains_point(IVec2::new(48, 0)));
        assert!(!r.contains_point(IVec2::new(0, 48)));
    }

    #[test]
    fn cell_rect_center_matches_helper() {
        let r = Rect::of_cell(3, 7);
        assert_eq!(r.center(), crate::cell_center(3, 7));
    }

    #[test]
    fn inflate_keeps_center() {
        let r = Rect::new(10, 20, 40, 40);
        let shrunk = r.inflate(-2);
        assert_eq!(shrunk.center(), r.center());
        assert_eq!(shrunk.w, 36);
    }
}
