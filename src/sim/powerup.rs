//! Powerups
//!
//! Each round buries one powerup of each kind under a distinct brittle
//! block. An explosion reveals it (the grid cell flips to
//! `PowerupRevealed`); a player walking their center over the revealed
//! tile collects it.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::grid::{CellKind, LevelGrid};
use super::rect::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerkKind {
    /// Lengthens the holder's explosion rays by one tile
    ExplosionRadius,
    /// Grants one more bomb inventory slot
    ExtraBomb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Powerup {
    pub kind: PerkKind,
    pub cell: (i32, i32),
    pub rect: Rect,
}

impl Powerup {
    /// Bury one powerup of each kind under its own brittle block.
    /// Kinds that find no free brittle cell are skipped with a warning.
    pub fn place_all<R: Rng>(grid: &mut LevelGrid, rng: &mut R) -> Vec<Powerup> {
        let mut placed = Vec::new();
        for kind in [PerkKind::ExplosionRadius, PerkKind::ExtraBomb] {
            let candidates = grid.cells_of_kind(CellKind::Brittle);
            match candidates.choose(rng) {
                Some(&(row, col)) => {
                    grid.set_cell(row, col, CellKind::PowerupHidden);
                    placed.push(Powerup {
                        kind,
                        cell: (row, col),
                        rect: Rect::of_cell(row, col),
                    });
                }
                None => log::warn!("no brittle cell left for powerup {kind:?}, none placed"),
            }
        }
        placed
    }

    pub fn revealed(&self, grid: &LevelGrid) -> bool {
        grid.cell(self.cell.0, self.cell.1) == CellKind::PowerupRevealed
    }
}
