//! Players
//!
//! A player is a tile-sized rect steered by per-tick input. Movement
//! resolves against the 3x3 tile neighborhood around the player's cell,
//! snapping to the blocking tile's edge along the dominant axis, with a
//! corner-slide assist around pillars. Once hit or exiting, the player
//! freezes and plays out a fixed animation before removal.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEATH_ANIM_MS, EXIT_SHRINK_INTERVAL_MS, PLAYER_VELOCITY, TILE_SIZE};

use super::bomb::Bomb;
use super::grid::{CellKind, LevelGrid};
use super::rect::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerColor {
    White,
    Black,
}

/// One tick of player intent, decoded by the host from whatever input
/// device it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerInput {
    /// Unit direction or zero
    pub dir: IVec2,
    pub drop_bomb: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerFate {
    Alive,
    /// Frozen, playing the death sigil until the deadline
    Dying { until_ms: u64 },
    /// Shrinking into the portal, next shrink step at the deadline
    Exiting { next_shrink_ms: u64 },
}

/// End-of-round record handed to the host for the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerReport {
    pub id: PlayerId,
    pub color: PlayerColor,
    pub reached_exit: bool,
    pub hit_by_explosion: bool,
    pub hit_by_creep: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub color: PlayerColor,
    pub rect: Rect,
    pub dir: IVec2,
    pub velocity: i32,
    pub bomb_inventory: u32,
    pub explosion_radius: u32,
    pub fate: PlayerFate,
    pub hit_by_explosion: bool,
    pub hit_by_creep: bool,
    pub on_ice: bool,
}

impl Player {
    pub fn new(id: PlayerId, color: PlayerColor, row: i32, col: i32) -> Self {
        Self {
            id,
            color,
            rect: Rect::of_cell(row, col),
            dir: IVec2::ZERO,
            velocity: PLAYER_VELOCITY,
            bomb_inventory: 1,
            explosion_radius: 1,
            fate: PlayerFate::Alive,
            hit_by_explosion: false,
            hit_by_creep: false,
            on_ice: false,
        }
    }

    pub fn alive(&self) -> bool {
        self.fate == PlayerFate::Alive
    }

    /// (row, col) of the tile under the player's center
    pub fn cell(&self) -> (i32, i32) {
        crate::cell_of(self.rect.center())
    }

    /// Steering. On ice the current direction is locked until the slide
    /// ends; fresh input is only taken up from a standstill.
    pub fn apply_input(&mut self, input: &PlayerInput) {
        if !self.alive() {
            return;
        }
        if !self.on_ice || self.dir == IVec2::ZERO {
            self.dir = input.dir;
        }
    }

    /// Advance one tick of movement and resolve against blocking tiles.
    pub fn walk(&mut self, grid: &LevelGrid) {
        if !self.alive() {
            return;
        }
        let speed = if self.on_ice {
            (self.velocity / 2).max(1)
        } else {
            self.velocity
        };
        let mut next = self.rect.translate(self.dir * speed);
        let (row, col) = self.cell();
        let tolerance = TILE_SIZE / 4;

        for d_row in -1..=1 {
            for d_col in -1..=1 {
                let (tile_row, tile_col) = (row + d_row, col + d_col);
                let kind = grid.cell(tile_row, tile_col);
                if kind.passable_for(false) {
                    continue;
                }
                let block = Rect::of_cell(tile_row, tile_col);
                if !next.intersects(&block) {
                    continue;
                }

                let delta = next.center() - block.center();
                if delta.x.abs() > delta.y.abs() {
                    // Hit the left or right face, snap horizontally.
                    if delta.x > 0 {
                        next.set_left(block.right());
                    } else {
                        next.set_right(block.left());
                    }
                    // Offset far enough from a pillar's center: slide
                    // around the corner instead of stopping dead.
                    if kind == CellKind::Pillar
                        && (next.center().y - block.center().y).abs() > tolerance
                    {
                        self.dir = IVec2::new(
                            0,
                            if next.center().y > block.center().y { 1 } else { -1 },
                        );
                        next = next.translate(self.dir * speed);
                    }
                } else {
                    if delta.y > 0 {
                        next.set_top(block.bottom());
                    } else {
                        next.set_bottom(block.top());
                    }
                    if kind == CellKind::Pillar
                        && (next.center().x - block.center().x).abs() > tolerance
                    {
                        self.dir = IVec2::new(
                            if next.center().x > block.center().x { 1 } else { -1 },
                            0,
                        );
                        next = next.translate(self.dir * speed);
                    }
                }
            }
        }

        self.rect = next;
    }

    /// Drop a bomb on the current tile if the slot rules allow it.
    pub fn try_drop_bomb(&mut self, now_ms: u64, bombs: &[Bomb], grid: &LevelGrid) -> Option<Bomb> {
        let (row, col) = self.cell();
        let allowed = self.bomb_inventory > 0
            && self.alive()
            && !bombs
                .iter()
                .any(|b| b.owner == self.id && b.cell == (row, col))
            && !matches!(
                grid.cell(row, col),
                CellKind::ExitPortalHidden | CellKind::ExitPortalRevealed
            );
        if !allowed {
            return None;
        }
        self.bomb_inventory -= 1;
        Some(Bomb::new(self.id, row, col, self.explosion_radius, now_ms))
    }

    /// Freeze the player and start the death sigil.
    pub fn kill(&mut self, now_ms: u64) {
        self.velocity = 0;
        self.dir = IVec2::ZERO;
        self.fate = PlayerFate::Dying {
            until_ms: now_ms + DEATH_ANIM_MS,
        };
    }

    /// Freeze the player and start the shrink-into-portal animation.
    pub fn begin_exit(&mut self, now_ms: u64) {
        self.velocity = 0;
        self.dir = IVec2::ZERO;
        self.fate = PlayerFate::Exiting {
            next_shrink_ms: now_ms + EXIT_SHRINK_INTERVAL_MS,
        };
    }

    /// Run the fate animations; `Some(report)` means the player is done
    /// and must be removed from the round.
    pub fn advance_fate(&mut self, now_ms: u64) -> Option<PlayerReport> {
        match self.fate {
            PlayerFate::Alive => None,
            PlayerFate::Dying { until_ms } => {
                (now_ms >= until_ms).then(|| self.report(false))
            }
            PlayerFate::Exiting { mut next_shrink_ms } => {
                while now_ms >= next_shrink_ms {
                    self.rect = self.rect.inflate(-1);
                    next_shrink_ms += EXIT_SHRINK_INTERVAL_MS;
                    if self.rect.w <= 0 || self.rect.h <= 0 {
                        return Some(self.report(true));
                    }
                }
                self.fate = PlayerFate::Exiting { next_shrink_ms };
                None
            }
        }
    }

    fn report(&self, reached_exit: bool) -> PlayerReport {
        PlayerReport {
            id: self.id,
            color: self.color,
            reached_exit,
            hit_by_explosion: self.hit_by_explosion,
            hit_by_creep: self.hit_by_creep,
        }
    }

    pub fn shift_timers(&mut self, delta_ms: u64) {
        match &mut self.fate {
            PlayerFate::Alive => {}
            PlayerFate::Dying { until_ms } => *until_ms += delta_ms,
            PlayerFate::Exiting { next_shrink_ms } => *next_shrink_ms += delta_ms,
        }
    }
}
