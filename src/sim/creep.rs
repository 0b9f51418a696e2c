//! Creeps
//!
//! Five species share one wandering movement routine and differ in what
//! happens around it. Per-species behavior is a tagged state value, not a
//! pile of flags, so invalid combinations (a raging cyan, a transmuted
//! decoy) cannot be represented.
//!
//! Creeps never mutate the round directly. An update returns a list of
//! deferred actions (spawn an ice cluster, spawn or remove a decoy,
//! remove the creep) that the round applies after the iteration.

use glam::IVec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::consts::{
    CREEP_VELOCITY, DEATH_BLINK_MS, DECOY_ALERT_MS, ICE_CLUSTER_MS, ICE_SPAWN_INTERVAL_MS,
    RAGE_MS, RAGE_VELOCITY, SPAWN_FREEZE_MS, TILE_SIZE, YELLOW_NORMAL_CHOICES_MS,
    YELLOW_TRANSMUTED_CHOICES_MS,
};

use super::grid::{CellKind, LevelGrid};
use super::rect::Rect;
use super::timer::Countdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreepId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterId(pub u32);

pub const DIRECTIONS: [IVec2; 4] = [
    IVec2::new(0, -1),
    IVec2::new(0, 1),
    IVec2::new(-1, 0),
    IVec2::new(1, 0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Species {
    Purple,
    /// Walks through brittle blocks and anything buried under them
    White,
    /// Rages instead of dying when hit, blinks out afterwards
    Red,
    /// Periodically freezes the floor around itself
    Cyan,
    /// Toggles into an explosion-immune form and plants a decoy
    Yellow,
    /// Spawned by a transmuted yellow, lives only while the parent stays
    /// transmuted
    Decoy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YellowPhase {
    Normal,
    Transmuted,
}

/// Per-species state, one variant per species that carries any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpeciesState {
    Simple,
    Red {
        /// Velocity already doubled this rage
        boosted: bool,
    },
    Cyan {
        spawn_timer: Countdown,
        /// Snapshot of freezable cells, refreshed each time the creep
        /// crosses a tile center
        freeze_cells: Vec<(i32, i32)>,
    },
    Yellow {
        normal_ms: u64,
        transmuted_ms: u64,
        phase: YellowPhase,
        phase_timer: Countdown,
        /// Transmuted form holds still once it reaches a tile center
        halted: bool,
    },
    Decoy {
        parent: CreepId,
        /// Intangible and immobile until this deadline
        tangible_at_ms: u64,
    },
}

/// Which image the renderer should show, `None` while blink-hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreepSprite {
    Purple,
    White,
    Red,
    RedRage,
    Cyan,
    Yellow,
    YellowImmune,
    YellowAlert,
    YellowTransmuted,
}

/// Deferred side effect of one creep update, applied by the round after
/// the iteration finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreepAction {
    Remove(CreepId),
    SpawnCluster(Vec<(i32, i32)>),
    SpawnDecoy { parent: CreepId },
    RemoveDecoy { parent: CreepId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creep {
    pub id: CreepId,
    pub species: Species,
    pub rect: Rect,
    pub dir: IVec2,
    pub frozen_until_ms: u64,
    pub hit_by_explosion: bool,
    /// Removal deadline once hit; the last 1000 ms of it blink
    death_deadline_ms: Option<u64>,
    pub state: SpeciesState,
}

impl Creep {
    pub fn spawn<R: Rng>(
        id: CreepId,
        species: Species,
        row: i32,
        col: i32,
        now_ms: u64,
        rng: &mut R,
    ) -> Self {
        let state = match species {
            Species::Purple | Species::White => SpeciesState::Simple,
            Species::Red => SpeciesState::Red { boosted: false },
            Species::Cyan => SpeciesState::Cyan {
                spawn_timer: Countdown::new(now_ms, ICE_SPAWN_INTERVAL_MS),
                freeze_cells: Vec::new(),
            },
            Species::Yellow => {
                let normal_ms = *YELLOW_NORMAL_CHOICES_MS.choose(rng).unwrap_or(&7000);
                let transmuted_ms = *YELLOW_TRANSMUTED_CHOICES_MS.choose(rng).unwrap_or(&8000);
                SpeciesState::Yellow {
                    normal_ms,
                    transmuted_ms,
                    phase: YellowPhase::Normal,
                    phase_timer: Countdown::new(now_ms, normal_ms),
                    halted: false,
                }
            }
            Species::Decoy => unreachable!("decoys are spawned through spawn_decoy"),
        };
        Self {
            id,
            species,
            rect: Rect::of_cell(row, col),
            dir: *DIRECTIONS.choose(rng).unwrap_or(&DIRECTIONS[0]),
            frozen_until_ms: now_ms + SPAWN_FREEZE_MS,
            hit_by_explosion: false,
            death_deadline_ms: None,
            state,
        }
    }

    pub fn spawn_decoy<R: Rng>(
        id: CreepId,
        parent: CreepId,
        row: i32,
        col: i32,
        now_ms: u64,
        rng: &mut R,
    ) -> Self {
        Self {
            id,
            species: Species::Decoy,
            rect: Rect::of_cell(row, col),
            dir: *DIRECTIONS.choose(rng).unwrap_or(&DIRECTIONS[0]),
            frozen_until_ms: 0,
            hit_by_explosion: false,
            death_deadline_ms: None,
            state: SpeciesState::Decoy {
                parent,
                tangible_at_ms: now_ms + DECOY_ALERT_MS,
            },
        }
    }

    /// Walks through brittle blocks and buried portal/powerup cells.
    pub fn ghost(&self) -> bool {
        self.species == Species::White
    }

    /// In the intangible warning sub-phase of a fresh decoy.
    pub fn alert(&self, now_ms: u64) -> bool {
        matches!(self.state, SpeciesState::Decoy { tangible_at_ms, .. } if now_ms < tangible_at_ms)
    }

    pub fn transmuted(&self) -> bool {
        matches!(
            self.state,
            SpeciesState::Yellow {
                phase: YellowPhase::Transmuted,
                ..
            }
        )
    }

    /// Explosions pass through transmuted yellows and alert decoys.
    pub fn immune_to_explosions(&self, now_ms: u64) -> bool {
        self.transmuted() || self.alert(now_ms)
    }

    fn death_remaining_ms(&self, now_ms: u64) -> Option<i64> {
        self.death_deadline_ms
            .map(|deadline| deadline as i64 - now_ms as i64)
    }

    /// Hit and inside the final blink-out second.
    pub fn blinking(&self, now_ms: u64) -> bool {
        matches!(self.death_remaining_ms(now_ms), Some(rem) if rem <= DEATH_BLINK_MS as i64)
    }

    /// Hit red creep still in its rage span.
    pub fn raging(&self, now_ms: u64) -> bool {
        self.species == Species::Red
            && matches!(self.death_remaining_ms(now_ms), Some(rem) if rem > DEATH_BLINK_MS as i64)
    }

    /// Register an explosion hit. Red creeps get the long rage deadline,
    /// everyone else blinks out immediately.
    pub fn hit(&mut self, now_ms: u64) {
        if self.hit_by_explosion {
            return;
        }
        self.hit_by_explosion = true;
        let span = if self.species == Species::Red {
            RAGE_MS
        } else {
            DEATH_BLINK_MS
        };
        self.death_deadline_ms = Some(now_ms + span);
    }

    /// Hidden during the off windows of the death blink.
    pub fn visible(&self, now_ms: u64) -> bool {
        match self.death_remaining_ms(now_ms) {
            None => true,
            Some(rem) if rem > DEATH_BLINK_MS as i64 => true,
            Some(rem) => matches!(rem, 801..=1000 | 401..=600 | 1..=200),
        }
    }

    pub fn sprite(&self, now_ms: u64) -> Option<CreepSprite> {
        if !self.visible(now_ms) {
            return None;
        }
        let sprite = match (&self.species, &self.state) {
            (Species::Red, _) if self.raging(now_ms) => CreepSprite::RedRage,
            (
                Species::Yellow,
                SpeciesState::Yellow {
                    phase: YellowPhase::Transmuted,
                    ..
                },
            ) => CreepSprite::YellowImmune,
            (Species::Decoy, _) if self.alert(now_ms) => CreepSprite::YellowAlert,
            (Species::Decoy, _) => CreepSprite::YellowTransmuted,
            (Species::Purple, _) => CreepSprite::Purple,
            (Species::White, _) => CreepSprite::White,
            (Species::Red, _) => CreepSprite::Red,
            (Species::Cyan, _) => CreepSprite::Cyan,
            (Species::Yellow, _) => CreepSprite::Yellow,
        };
        Some(sprite)
    }

    fn speed(&self, now_ms: u64) -> i32 {
        if now_ms < self.frozen_until_ms || self.blinking(now_ms) || self.alert(now_ms) {
            return 0;
        }
        if let SpeciesState::Yellow {
            phase: YellowPhase::Transmuted,
            halted: true,
            ..
        } = self.state
        {
            return 0;
        }
        if let SpeciesState::Red { boosted: true } = self.state {
            if self.raging(now_ms) {
                return RAGE_VELOCITY;
            }
        }
        CREEP_VELOCITY
    }

    fn centered(&self) -> bool {
        let center = self.rect.center();
        let (row, col) = crate::cell_of(center);
        center == crate::cell_center(row, col)
    }

    /// One tick of wandering. On collision the creep holds its ground and
    /// turns away from the blocking cell; crossing a tile center rerolls
    /// the direction among the open neighbors (never straight back).
    fn pathfind<R: Rng>(&mut self, grid: &LevelGrid, rng: &mut R, now_ms: u64) {
        let speed = self.speed(now_ms);
        let next = self.rect.translate(self.dir * speed);

        if let Some((block_row, block_col)) = self.first_blocking_cell(&next, grid) {
            let (row, col) = crate::cell_of(self.rect.center());
            let toward = IVec2::new(block_col - col, block_row - row);
            let opposite = -self.dir;
            let choices: Vec<IVec2> = DIRECTIONS
                .iter()
                .copied()
                .filter(|d| *d != opposite && *d != toward)
                .collect();
            if let Some(&turn) = choices.choose(rng) {
                self.dir = turn;
            }
            return;
        }

        self.rect = next;
        if !self.centered() {
            return;
        }

        let (row, col) = crate::cell_of(self.rect.center());
        let opposite = -self.dir;
        let mut open: Vec<IVec2> = Vec::new();
        for d in DIRECTIONS {
            if d == opposite {
                continue;
            }
            if !grid.cell(row + d.y, col + d.x).impassable() {
                open.push(d);
            }
        }
        for &d in &open {
            if d != self.dir && rng.random_bool(0.33) {
                self.dir = d;
            }
        }

        if let SpeciesState::Cyan { freeze_cells, .. } = &mut self.state {
            *freeze_cells = open.iter().map(|d| (row + d.y, col + d.x)).collect();
            freeze_cells.push((row, col));
        }
    }

    fn first_blocking_cell(&self, next: &Rect, grid: &LevelGrid) -> Option<(i32, i32)> {
        let min_row = next.top().div_euclid(TILE_SIZE);
        let max_row = (next.bottom() - 1).div_euclid(TILE_SIZE);
        let min_col = next.left().div_euclid(TILE_SIZE);
        let max_col = (next.right() - 1).div_euclid(TILE_SIZE);
        for row in min_row..=max_row {
            for col in min_col..=max_col {
                if grid.cell(row, col).passable_for(self.ghost()) {
                    continue;
                }
                if next.intersects(&Rect::of_cell(row, col)) {
                    return Some((row, col));
                }
            }
        }
        None
    }

    /// Per-tick behavior. Returns deferred actions for the round.
    pub fn update<R: Rng>(
        &mut self,
        now_ms: u64,
        grid: &LevelGrid,
        rng: &mut R,
    ) -> Vec<CreepAction> {
        let mut actions = Vec::new();

        if let Some(deadline) = self.death_deadline_ms {
            if now_ms >= deadline {
                actions.push(CreepAction::Remove(self.id));
                if self.species == Species::Yellow {
                    // A dead yellow takes its decoy with it.
                    actions.push(CreepAction::RemoveDecoy { parent: self.id });
                }
                return actions;
            }
        }

        let centered_before = self.centered();
        self.pathfind(grid, rng, now_ms);
        let centered = centered_before || self.centered();
        let raging = self.raging(now_ms);
        let hit = self.hit_by_explosion;
        let id = self.id;

        match &mut self.state {
            SpeciesState::Red { boosted } => {
                if raging && centered {
                    *boosted = true;
                }
            }
            SpeciesState::Cyan {
                spawn_timer,
                freeze_cells,
            } => {
                if spawn_timer.poll(now_ms) {
                    if !freeze_cells.is_empty() {
                        actions.push(CreepAction::SpawnCluster(freeze_cells.clone()));
                    }
                    spawn_timer.restart(now_ms, ICE_SPAWN_INTERVAL_MS);
                }
            }
            SpeciesState::Yellow {
                normal_ms,
                transmuted_ms,
                phase,
                phase_timer,
                halted,
            } => {
                if !hit {
                    match phase {
                        YellowPhase::Normal => {
                            if phase_timer.poll(now_ms) {
                                *phase = YellowPhase::Transmuted;
                                *halted = false;
                                phase_timer.restart(now_ms, *transmuted_ms);
                                actions.push(CreepAction::SpawnDecoy { parent: id });
                            }
                        }
                        YellowPhase::Transmuted => {
                            if phase_timer.poll(now_ms) {
                                *phase = YellowPhase::Normal;
                                *halted = false;
                                phase_timer.restart(now_ms, *normal_ms);
                                actions.push(CreepAction::RemoveDecoy { parent: id });
                            } else if centered {
                                *halted = true;
                            }
                        }
                    }
                }
            }
            SpeciesState::Simple | SpeciesState::Decoy { .. } => {}
        }

        actions
    }

    pub fn shift_timers(&mut self, delta_ms: u64) {
        self.frozen_until_ms += delta_ms;
        if let Some(deadline) = &mut self.death_deadline_ms {
            *deadline += delta_ms;
        }
        match &mut self.state {
            SpeciesState::Cyan { spawn_timer, .. } => spawn_timer.shift(delta_ms),
            SpeciesState::Yellow { phase_timer, .. } => phase_timer.shift(delta_ms),
            SpeciesState::Decoy { tangible_at_ms, .. } => *tangible_at_ms += delta_ms,
            SpeciesState::Simple | SpeciesState::Red { .. } => {}
        }
    }
}

/// A batch of frozen floor tiles, removed together when the timer runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceCluster {
    pub id: ClusterId,
    pub cells: Vec<(i32, i32)>,
    expiry: Countdown,
}

impl IceCluster {
    pub fn new(id: ClusterId, cells: Vec<(i32, i32)>, now_ms: u64) -> Self {
        Self {
            id,
            cells,
            expiry: Countdown::new(now_ms, ICE_CLUSTER_MS),
        }
    }

    pub fn expired(&self, now_ms: u64) -> bool {
        self.expiry.expired(now_ms)
    }

    pub fn rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.cells.iter().map(|&(row, col)| Rect::of_cell(row, col))
    }

    pub fn shift_timers(&mut self, delta_ms: u64) {
        self.expiry.shift(delta_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn grid() -> LevelGrid {
        LevelGrid::standard()
    }

    fn rng(seed: u64) -> Pcg32 {
        Pcg32::seed_from_u64(seed)
    }

    #[test]
    fn spawn_freeze_holds_creep_in_place() {
        let grid = grid();
        let mut rng = rng(1);
        let mut creep = Creep::spawn(CreepId(0), Species::Purple, 5, 5, 0, &mut rng);
        let start = creep.rect;
        creep.update(100, &grid, &mut rng);
        assert_eq!(creep.rect, start);
        creep.update(1500, &grid, &mut rng);
        assert_ne!(creep.rect, start);
    }

    #[test]
    fn collision_turn_excludes_reverse_and_blocker() {
        let grid = grid();
        let mut rng = rng(2);
        // Walking into the left border: the creep holds its ground and
        // turns, never toward the wall and never straight back.
        let mut creep = Creep::spawn(CreepId(0), Species::Purple, 1, 1, 0, &mut rng);
        creep.frozen_until_ms = 0;
        creep.dir = IVec2::new(-1, 0);
        let start = creep.rect;
        creep.update(2000, &grid, &mut rng);
        assert_eq!(creep.rect, start);
        assert!(creep.dir == IVec2::new(0, -1) || creep.dir == IVec2::new(0, 1));
    }

    #[test]
    fn ghost_walks_through_brittle() {
        let mut grid = grid();
        grid.set_cell(1, 2, CellKind::Brittle);
        let mut rng = rng(3);
        let mut white = Creep::spawn(CreepId(0), Species::White, 1, 1, 0, &mut rng);
        white.frozen_until_ms = 0;
        white.dir = IVec2::new(1, 0);
        white.pathfind(&grid, &mut rng, 2000);
        assert_eq!(white.rect.x, TILE_SIZE + CREEP_VELOCITY);

        let mut purple = Creep::spawn(CreepId(1), Species::Purple, 1, 1, 0, &mut rng);
        purple.frozen_until_ms = 0;
        purple.dir = IVec2::new(1, 0);
        purple.pathfind(&grid, &mut rng, 2000);
        assert_eq!(purple.rect.x, TILE_SIZE, "brittle blocks non-ghosts");
    }

    #[test]
    fn blink_windows() {
        let mut rng = rng(4);
        let mut creep = Creep::spawn(CreepId(0), Species::Purple, 5, 5, 0, &mut rng);
        creep.hit(10_000);
        // Deadline 11_000; visible in (800,1000], (400,600], (0,200].
        assert!(creep.visible(10_000));
        assert!(creep.visible(10_100));
        assert!(!creep.visible(10_300));
        assert!(creep.visible(10_500));
        assert!(!creep.visible(10_700));
        assert!(creep.visible(10_900));
        assert!(!creep.visible(11_000));
        assert!(creep.blinking(10_500));
    }

    #[test]
    fn red_rages_before_blinking() {
        let mut rng = rng(5);
        let mut red = Creep::spawn(CreepId(0), Species::Red, 5, 5, 0, &mut rng);
        red.hit(1000);
        assert!(red.raging(2000));
        assert!(!red.blinking(2000));
        assert_eq!(red.sprite(2000), Some(CreepSprite::RedRage));
        // Last second of the 6000 ms span blinks like everyone else.
        assert!(!red.raging(6500));
        assert!(red.blinking(6500));
        // Second hit during rage is ignored.
        let deadline = red.death_deadline_ms;
        red.hit(3000);
        assert_eq!(red.death_deadline_ms, deadline);
    }

    #[test]
    fn red_velocity_doubles_once_centered() {
        let grid = grid();
        let mut rng = rng(6);
        let mut red = Creep::spawn(CreepId(0), Species::Red, 5, 5, 0, &mut rng);
        red.frozen_until_ms = 0;
        red.hit(2000);
        // Spawned on a tile so it is centered already.
        red.update(2000, &grid, &mut rng);
        assert_eq!(red.state, SpeciesState::Red { boosted: true });
        assert_eq!(red.speed(2100), RAGE_VELOCITY);
    }

    #[test]
    fn yellow_toggle_emits_decoy_actions_once_per_phase() {
        let grid = grid();
        let mut rng = rng(7);
        let mut yellow = Creep::spawn(CreepId(3), Species::Yellow, 5, 5, 0, &mut rng);
        let (normal_ms, transmuted_ms) = match yellow.state {
            SpeciesState::Yellow {
                normal_ms,
                transmuted_ms,
                ..
            } => (normal_ms, transmuted_ms),
            _ => unreachable!(),
        };

        let mut spawns = 0;
        let mut removals = 0;
        let mut now = 0;
        while now <= normal_ms + transmuted_ms + 1000 {
            for action in yellow.update(now, &grid, &mut rng) {
                match action {
                    CreepAction::SpawnDecoy { parent } => {
                        assert_eq!(parent, CreepId(3));
                        spawns += 1;
                    }
                    CreepAction::RemoveDecoy { parent } => {
                        assert_eq!(parent, CreepId(3));
                        removals += 1;
                    }
                    _ => {}
                }
            }
            now += 8;
        }
        assert_eq!(spawns, 1);
        assert_eq!(removals, 1);
        assert!(!yellow.transmuted());
    }

    #[test]
    fn transmuted_yellow_is_immune_and_halts_centered() {
        let grid = grid();
        let mut rng = rng(8);
        let mut yellow = Creep::spawn(CreepId(0), Species::Yellow, 5, 5, 0, &mut rng);
        yellow.frozen_until_ms = 0;
        let normal_ms = match yellow.state {
            SpeciesState::Yellow { normal_ms, .. } => normal_ms,
            _ => unreachable!(),
        };
        yellow.update(normal_ms, &grid, &mut rng);
        assert!(yellow.transmuted());
        assert!(yellow.immune_to_explosions(normal_ms));

        // Wanders until the next center, then freezes.
        for tick in 1..=(TILE_SIZE as u64) {
            yellow.update(normal_ms + tick, &grid, &mut rng);
        }
        assert_eq!(yellow.speed(normal_ms + TILE_SIZE as u64 + 1), 0);
    }

    #[test]
    fn decoy_alert_then_tangible() {
        let mut rng = rng(9);
        let decoy = Creep::spawn_decoy(CreepId(9), CreepId(3), 5, 5, 1000, &mut rng);
        assert!(decoy.alert(2000));
        assert!(decoy.immune_to_explosions(2000));
        assert_eq!(decoy.speed(2000), 0);
        assert_eq!(decoy.sprite(2000), Some(CreepSprite::YellowAlert));

        assert!(!decoy.alert(3500));
        assert!(!decoy.immune_to_explosions(3500));
        assert_eq!(decoy.sprite(3500), Some(CreepSprite::YellowTransmuted));
    }

    #[test]
    fn cyan_snapshot_and_cluster_expiry() {
        let grid = grid();
        let mut rng = rng(10);
        let mut cyan = Creep::spawn(CreepId(0), Species::Cyan, 5, 5, 0, &mut rng);
        cyan.frozen_until_ms = 0;

        // One tick per millisecond; the snapshot refreshes at every tile
        // center crossed, and the spawn timer fires at 4000 ms.
        let mut cluster_cells = None;
        for now in 1..=4000u64 {
            for action in cyan.update(now, &grid, &mut rng) {
                if let CreepAction::SpawnCluster(cells) = action {
                    cluster_cells = Some(cells);
                }
            }
        }
        let cluster_cells = cluster_cells.expect("cyan spawns a cluster at 4000 ms");
        assert!((1..=4).contains(&cluster_cells.len()));

        let cluster = IceCluster::new(ClusterId(0), cluster_cells, 4000);
        assert!(!cluster.expired(18_999));
        assert!(cluster.expired(19_000));
    }
}
