//! Bombs
//!
//! A bomb lives through three phases: a 3000 ms countdown, a 1000 ms
//! explosion, then inactive until its owner reclaims the inventory slot.
//! The affected-cell set is computed once, at detonation, and each
//! terminal cell transformation (brittle cleared, portal or powerup
//! revealed) is applied exactly once at that moment. Later polls return
//! the cached set.

use serde::{Deserialize, Serialize};

use crate::audio::{SoundCue, SoundEffect};
use crate::consts::{
    BOMB_COUNTDOWN_MS, BOMB_EXPLOSION_MS, BOMB_REGAIN_DELAY_MS, FUSE_BRIGHT_RED_MS,
    FUSE_DARK_RED_MS, TILE_SIZE,
};

use super::grid::{CellKind, LevelGrid};
use super::player::PlayerId;
use super::rect::Rect;
use super::timer::Countdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BombPhase {
    Countdown,
    Exploding,
    Inactive,
}

/// Fuse color for the renderer, derived from countdown time remaining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuseColor {
    Black,
    DarkRed,
    BrightRed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bomb {
    pub owner: PlayerId,
    /// (row, col) of the tile the bomb sits on
    pub cell: (i32, i32),
    pub rect: Rect,
    /// Ray length of the explosion in tiles
    pub radius: u32,
    pub phase: BombPhase,
    countdown: Countdown,
    explosion: Countdown,
    /// Deadline after which the owner's inventory slot comes back
    overall_deadline_ms: u64,
    /// Set once the grid cell has been flipped to BombOccupied
    pub cell_marked: bool,
    dark_tick_played: bool,
    bright_tick_played: bool,
    affected: Vec<(i32, i32)>,
}

impl Bomb {
    pub fn new(owner: PlayerId, row: i32, col: i32, radius: u32, now_ms: u64) -> Self {
        Self {
            owner,
            cell: (row, col),
            rect: Rect::of_cell(row, col),
            radius,
            phase: BombPhase::Countdown,
            countdown: Countdown::new(now_ms, BOMB_COUNTDOWN_MS),
            explosion: Countdown::new(now_ms, BOMB_EXPLOSION_MS),
            overall_deadline_ms: now_ms + BOMB_COUNTDOWN_MS + BOMB_EXPLOSION_MS,
            cell_marked: false,
            dark_tick_played: false,
            bright_tick_played: false,
            affected: Vec::new(),
        }
    }

    pub fn armed(&self) -> bool {
        self.phase == BombPhase::Countdown
    }

    pub fn exploding(&self) -> bool {
        self.phase == BombPhase::Exploding
    }

    pub fn fuse_color(&self, now_ms: u64) -> FuseColor {
        let remaining = self.countdown.remaining_ms(now_ms);
        if remaining > FUSE_DARK_RED_MS {
            FuseColor::Black
        } else if remaining > FUSE_BRIGHT_RED_MS {
            FuseColor::DarkRed
        } else {
            FuseColor::BrightRed
        }
    }

    /// Cells covered by the explosion; empty before detonation.
    pub fn affected_cells(&self) -> &[(i32, i32)] {
        &self.affected
    }

    /// Half-tile hitboxes centered on each affected cell, live only
    /// while the explosion phase runs.
    pub fn explosion_rects(&self) -> Vec<Rect> {
        if !self.exploding() {
            return Vec::new();
        }
        self.affected
            .iter()
            .map(|&(row, col)| {
                let mut r = Rect::new(0, 0, TILE_SIZE / 2, TILE_SIZE / 2);
                r.set_center(crate::cell_center(row, col));
                r
            })
            .collect()
    }

    /// Inactive and past the regain cooldown; the owner may reclaim the slot.
    pub fn spent(&self, now_ms: u64) -> bool {
        self.phase == BombPhase::Inactive
            && now_ms > self.overall_deadline_ms + BOMB_REGAIN_DELAY_MS
    }

    pub fn update(&mut self, now_ms: u64, grid: &mut LevelGrid, sounds: &mut Vec<SoundCue>) {
        match self.phase {
            BombPhase::Countdown => {
                match self.fuse_color(now_ms) {
                    FuseColor::Black => {}
                    FuseColor::DarkRed => {
                        if !self.dark_tick_played {
                            self.dark_tick_played = true;
                            sounds.push(SoundCue::new(SoundEffect::BombCountdownTick, 0.3));
                        }
                    }
                    FuseColor::BrightRed => {
                        if !self.bright_tick_played {
                            self.bright_tick_played = true;
                            sounds.push(SoundCue::new(SoundEffect::BombCountdownTick, 0.2));
                        }
                    }
                }
                if self.countdown.poll(now_ms) {
                    self.detonate(now_ms, grid, sounds);
                }
            }
            BombPhase::Exploding => {
                if self.explosion.poll(now_ms) {
                    self.phase = BombPhase::Inactive;
                    self.revert_cell(grid);
                }
            }
            BombPhase::Inactive => {}
        }
    }

    fn detonate(&mut self, now_ms: u64, grid: &mut LevelGrid, sounds: &mut Vec<SoundCue>) {
        self.phase = BombPhase::Exploding;
        self.explosion.restart(now_ms, BOMB_EXPLOSION_MS);
        sounds.push(SoundCue::new(SoundEffect::BombExplosion, 0.3));
        self.affected = propagate(grid, self.cell, self.radius, sounds);
    }

    /// The bomb's own tile goes back to plain path unless something the
    /// explosion can't erase sits there.
    fn revert_cell(&self, grid: &mut LevelGrid) {
        let (row, col) = self.cell;
        let keep = matches!(
            grid.cell(row, col),
            CellKind::PlayerStart
                | CellKind::PlayerAdjacent
                | CellKind::ExitPortalHidden
                | CellKind::ExitPortalRevealed
        );
        if !keep {
            grid.set_cell(row, col, CellKind::Path);
        }
    }

    /// Move deadlines forward after an unpause.
    pub fn shift_timers(&mut self, delta_ms: u64) {
        self.countdown.shift(delta_ms);
        self.explosion.shift(delta_ms);
        self.overall_deadline_ms += delta_ms;
    }
}

/// Walk the four explosion rays, collect affected cells and apply each
/// terminal transformation once.
///
/// Per step: Border / Pillar / revealed portal / revealed powerup stop the
/// ray without being affected. Brittle blocks and hidden portal/powerup
/// cells are affected, transformed, and stop the ray. Anything else is
/// affected and the ray continues.
fn propagate(
    grid: &mut LevelGrid,
    cell: (i32, i32),
    radius: u32,
    sounds: &mut Vec<SoundCue>,
) -> Vec<(i32, i32)> {
    let (bomb_row, bomb_col) = cell;
    let mut affected = vec![cell];

    for (dr, dc) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
        for distance in 1..=radius as i32 {
            let row = bomb_row + dr * distance;
            let col = bomb_col + dc * distance;
            match grid.cell(row, col) {
                CellKind::Border
                | CellKind::Pillar
                | CellKind::ExitPortalRevealed
                | CellKind::PowerupRevealed => break,
                CellKind::Brittle => {
                    affected.push((row, col));
                    grid.set_cell(row, col, CellKind::Path);
                    break;
                }
                CellKind::ExitPortalHidden => {
                    affected.push((row, col));
                    grid.set_cell(row, col, CellKind::ExitPortalRevealed);
                    sounds.push(SoundCue::new(SoundEffect::ExitPortalReveal, 0.8));
                    break;
                }
                CellKind::PowerupHidden => {
                    affected.push((row, col));
                    grid.set_cell(row, col, CellKind::PowerupRevealed);
                    sounds.push(SoundCue::new(SoundEffect::PowerupReveal, 0.8));
                    break;
                }
                _ => affected.push((row, col)),
            }
        }
    }

    affected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid() -> LevelGrid {
        LevelGrid::standard()
    }

    #[test]
    fn ray_stops_after_brittle_and_clears_it() {
        let mut grid = open_grid();
        // Ray to the right of (5, 5): brittle at distance 2.
        grid.set_cell(5, 7, CellKind::Brittle);
        let mut sounds = Vec::new();
        let affected = propagate(&mut grid, (5, 5), 3, &mut sounds);

        assert!(affected.contains(&(5, 6)));
        assert!(affected.contains(&(5, 7)));
        assert!(!affected.contains(&(5, 8)));
        assert_eq!(grid.cell(5, 7), CellKind::Path);
    }

    #[test]
    fn ray_stops_at_pillar_without_including_it() {
        let mut grid = open_grid();
        // (4, 4) is a pillar in the standard layout.
        let mut sounds = Vec::new();
        let affected = propagate(&mut grid, (4, 3), 3, &mut sounds);
        assert!(!affected.contains(&(4, 4)));
        assert_eq!(grid.cell(4, 4), CellKind::Pillar);
    }

    #[test]
    fn radius_two_open_room_covers_nine_cells() {
        let mut grid = open_grid();
        let mut sounds = Vec::new();
        let affected = propagate(&mut grid, (5, 5), 2, &mut sounds);
        let expected = [
            (5, 5),
            (4, 5),
            (3, 5),
            (6, 5),
            (7, 5),
            (5, 4),
            (5, 3),
            (5, 6),
            (5, 7),
        ];
        assert_eq!(affected.len(), 9);
        for cell in expected {
            assert!(affected.contains(&cell), "missing {cell:?}");
        }
    }

    #[test]
    fn hidden_portal_is_revealed_once_with_sound() {
        let mut grid = open_grid();
        grid.set_cell(5, 6, CellKind::ExitPortalHidden);
        let mut sounds = Vec::new();
        let affected = propagate(&mut grid, (5, 5), 3, &mut sounds);

        assert!(affected.contains(&(5, 6)));
        assert!(!affected.contains(&(5, 7)));
        assert_eq!(grid.cell(5, 6), CellKind::ExitPortalRevealed);
        assert_eq!(sounds.len(), 1);
        assert_eq!(sounds[0].effect, SoundEffect::ExitPortalReveal);

        // A second blast must not touch the revealed portal.
        let affected = propagate(&mut grid, (5, 5), 3, &mut sounds);
        assert!(!affected.contains(&(5, 6)));
        assert_eq!(sounds.len(), 1);
    }

    #[test]
    fn lifecycle_has_exactly_one_inactive_transition() {
        let mut grid = open_grid();
        let mut sounds = Vec::new();
        let mut bomb = Bomb::new(PlayerId(0), 5, 5, 1, 0);

        bomb.update(1500, &mut grid, &mut sounds);
        assert_eq!(bomb.phase, BombPhase::Countdown);
        assert_eq!(bomb.fuse_color(1500), FuseColor::DarkRed);

        bomb.update(3000, &mut grid, &mut sounds);
        assert_eq!(bomb.phase, BombPhase::Exploding);
        assert!(!bomb.affected_cells().is_empty());

        bomb.update(4000, &mut grid, &mut sounds);
        assert_eq!(bomb.phase, BombPhase::Inactive);
        let affected_after_first = bomb.affected_cells().to_vec();

        // Further updates change nothing.
        bomb.update(5000, &mut grid, &mut sounds);
        assert_eq!(bomb.phase, BombPhase::Inactive);
        assert_eq!(bomb.affected_cells(), affected_after_first.as_slice());

        assert!(!bomb.spent(4015));
        assert!(bomb.spent(4016));
    }

    #[test]
    fn fuse_ticks_once_per_threshold() {
        let mut grid = open_grid();
        let mut sounds = Vec::new();
        let mut bomb = Bomb::new(PlayerId(0), 5, 5, 1, 0);

        for now in (0..3000).step_by(8) {
            bomb.update(now, &mut grid, &mut sounds);
        }
        let ticks: Vec<_> = sounds
            .iter()
            .filter(|cue| cue.effect == SoundEffect::BombCountdownTick)
            .collect();
        assert_eq!(ticks.len(), 2);
        assert_eq!(ticks[0].volume, 0.3);
        assert_eq!(ticks[1].volume, 0.2);
    }

    #[test]
    fn own_cell_reverts_to_path_unless_protected() {
        let mut grid = open_grid();
        let mut sounds = Vec::new();
        let mut bomb = Bomb::new(PlayerId(0), 5, 5, 1, 0);
        bomb.update(3000, &mut grid, &mut sounds);
        bomb.update(4000, &mut grid, &mut sounds);
        assert_eq!(grid.cell(5, 5), CellKind::Path);

        let mut grid = open_grid();
        grid.set_cell(1, 1, CellKind::PlayerStart);
        let mut bomb = Bomb::new(PlayerId(0), 1, 1, 1, 0);
        bomb.update(3000, &mut grid, &mut sounds);
        bomb.update(4000, &mut grid, &mut sounds);
        assert_eq!(grid.cell(1, 1), CellKind::PlayerStart);
    }
}
