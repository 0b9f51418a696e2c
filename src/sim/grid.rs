//! Level grid
//!
//! The playfield is a row-major matrix of cell kinds. The grid is the
//! single source of truth for passability; entities carry pixel rects but
//! every walkability question comes back here. Out-of-bounds reads fail
//! closed to `Border`.

use std::fmt;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use crate::consts::{LEVEL_COLS, LEVEL_ROWS};

/// What occupies one tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    /// Indestructible outer wall
    Border,
    /// Open floor
    Path,
    /// Indestructible inner block
    Pillar,
    /// Player spawn tile
    PlayerStart,
    /// Guaranteed-open tile next to a spawn
    PlayerAdjacent,
    /// Destructible block
    Brittle,
    /// Tile claimed by an armed bomb
    BombOccupied,
    /// Exit portal still buried under a brittle block
    ExitPortalHidden,
    /// Exit portal uncovered by an explosion
    ExitPortalRevealed,
    /// Powerup still buried under a brittle block
    PowerupHidden,
    /// Powerup uncovered by an explosion
    PowerupRevealed,
}

impl CellKind {
    /// Cells that block ordinary movement.
    pub fn impassable(self) -> bool {
        matches!(
            self,
            CellKind::Border
                | CellKind::Pillar
                | CellKind::Brittle
                | CellKind::BombOccupied
                | CellKind::ExitPortalHidden
                | CellKind::PowerupHidden
        )
    }

    /// Passability with the ghost exception: ghosts walk through brittle
    /// blocks and anything still buried under one.
    pub fn passable_for(self, ghost: bool) -> bool {
        if ghost
            && matches!(
                self,
                CellKind::Brittle | CellKind::ExitPortalHidden | CellKind::PowerupHidden
            )
        {
            return true;
        }
        !self.impassable()
    }
}

/// Setup can fail before the round starts; everything after that fails soft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupError {
    BrittleCountExceedsSpace { requested: usize, available: usize },
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::BrittleCountExceedsSpace {
                requested,
                available,
            } => write!(
                f,
                "requested {requested} brittle blocks but only {available} cells are free"
            ),
        }
    }
}

impl std::error::Error for SetupError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelGrid {
    rows: i32,
    cols: i32,
    cells: Vec<CellKind>,
    /// Pristine copy taken at construction, restored by `reset`
    initial: Vec<CellKind>,
}

impl LevelGrid {
    /// The standard layout: border ring, pillar at every (even, even)
    /// interior cell, path everywhere else.
    pub fn standard() -> Self {
        let (rows, cols) = (LEVEL_ROWS, LEVEL_COLS);
        let mut cells = Vec::with_capacity((rows * cols) as usize);
        for row in 0..rows {
            for col in 0..cols {
                let kind = if row == 0 || col == 0 || row == rows - 1 || col == cols - 1 {
                    CellKind::Border
                } else if row % 2 == 0 && col % 2 == 0 {
                    CellKind::Pillar
                } else {
                    CellKind::Path
                };
                cells.push(kind);
            }
        }
        Self {
            rows,
            cols,
            initial: cells.clone(),
            cells,
        }
    }

    /// Throw away every setup and in-round mutation and go back to the
    /// layout the grid was built with.
    pub fn reset(&mut self) {
        self.cells.clone_from(&self.initial);
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn cell(&self, row: i32, col: i32) -> CellKind {
        if row < 0 || col < 0 || row >= self.rows || col >= self.cols {
            return CellKind::Border;
        }
        self.cells[(row * self.cols + col) as usize]
    }

    pub fn set_cell(&mut self, row: i32, col: i32, kind: CellKind) {
        if row < 0 || col < 0 || row >= self.rows || col >= self.cols {
            return;
        }
        self.cells[(row * self.cols + col) as usize] = kind;
    }

    /// All plain path cells, in row-major order.
    pub fn path_cells(&self) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.cell(row, col) == CellKind::Path {
                    out.push((row, col));
                }
            }
        }
        out
    }

    /// Mark the spawn tiles and every open tile next to them, scatter
    /// brittle blocks over the remaining floor and bury the exit portal
    /// under one of them. Returns the portal cell, or `None` when not a
    /// single brittle block was placed.
    pub fn setup<R: Rng>(
        &mut self,
        two_player: bool,
        brittle_count: usize,
        rng: &mut R,
    ) -> Result<Option<(i32, i32)>, SetupError> {
        let mut starts = vec![(1, 1)];
        if two_player {
            starts.push((self.rows - 2, self.cols - 2));
        }
        for &(row, col) in &starts {
            self.set_cell(row, col, CellKind::PlayerStart);
        }
        for &(row, col) in &starts {
            for (dr, dc) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                if self.cell(row + dr, col + dc) == CellKind::Path {
                    self.set_cell(row + dr, col + dc, CellKind::PlayerAdjacent);
                }
            }
        }

        self.scatter_brittle(brittle_count, rng)?;

        let brittle: Vec<(i32, i32)> = self.cells_of_kind(CellKind::Brittle);
        let portal = brittle.choose(rng).copied();
        match portal {
            Some((row, col)) => self.set_cell(row, col, CellKind::ExitPortalHidden),
            None => log::warn!("no location found for the exit portal, none placed"),
        }
        Ok(portal)
    }

    fn scatter_brittle<R: Rng>(&mut self, count: usize, rng: &mut R) -> Result<(), SetupError> {
        // A path cell qualifies unless it borders a spawn tile.
        let mut candidates: Vec<(i32, i32)> = Vec::new();
        for (row, col) in self.path_cells() {
            let next_to_start = [(-1, 0), (1, 0), (0, -1), (0, 1)]
                .iter()
                .any(|&(dr, dc)| self.cell(row + dr, col + dc) == CellKind::PlayerStart);
            if !next_to_start {
                candidates.push((row, col));
            }
        }
        if count > candidates.len() {
            return Err(SetupError::BrittleCountExceedsSpace {
                requested: count,
                available: candidates.len(),
            });
        }
        candidates.shuffle(rng);
        for &(row, col) in candidates.iter().take(count) {
            self.set_cell(row, col, CellKind::Brittle);
        }
        Ok(())
    }

    pub fn cells_of_kind(&self, kind: CellKind) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                if self.cell(row, col) == kind {
                    out.push((row, col));
                }
            }
        }
        out
    }
}
