//! Round orchestration
//!
//! `RoundState` owns every entity in play and advances them in a fixed
//! per-tick order: players (input, movement, collisions, bomb regain),
//! then bombs, then ice, then creeps. Entities reference each other by ID
//! only; all cross-entity effects flow through the round.
//!
//! The caller drives the round with `tick(now_ms, inputs)` at its fixed
//! timestep and drains queued sound cues afterwards.

use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::audio::{SoundCue, SoundEffect};
use crate::config::{CreepCensus, RoundConfig};
use crate::consts::PORTAL_BLINK_MS;

use super::bomb::Bomb;
use super::collision;
use super::creep::{ClusterId, Creep, CreepAction, CreepId, IceCluster, Species, SpeciesState};
use super::grid::{CellKind, LevelGrid, SetupError};
use super::player::{Player, PlayerColor, PlayerId, PlayerInput, PlayerReport};
use super::powerup::Powerup;

/// How the round finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Victory { winner: PlayerId },
    Defeat,
    Tie,
}

/// Exit portal image selector for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalSprite {
    Closed,
    Open1,
    Open2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    pub grid: LevelGrid,
    pub players: Vec<Player>,
    pub bombs: Vec<Bomb>,
    pub creeps: Vec<Creep>,
    pub ice_clusters: Vec<IceCluster>,
    pub powerups: Vec<Powerup>,
    pub portal_cell: Option<(i32, i32)>,
    rng: Pcg32,
    sounds: Vec<SoundCue>,
    reports: Vec<PlayerReport>,
    outcome: Option<RoundOutcome>,
    paused_at_ms: Option<u64>,
    next_creep_id: u32,
    next_cluster_id: u32,
    two_player: bool,
}

impl RoundState {
    pub fn new(config: &RoundConfig, now_ms: u64) -> Result<Self, SetupError> {
        let mut rng = Pcg32::seed_from_u64(config.seed);

        let mut grid = LevelGrid::standard();
        let portal_cell = grid.setup(config.two_player, config.brittle_count, &mut rng)?;
        let powerups = Powerup::place_all(&mut grid, &mut rng);

        let mut players = vec![Player::new(PlayerId(0), PlayerColor::White, 1, 1)];
        if config.two_player {
            players.push(Player::new(
                PlayerId(1),
                PlayerColor::Black,
                grid.rows() - 2,
                grid.cols() - 2,
            ));
        }

        let census = config
            .census
            .unwrap_or_else(|| CreepCensus::standard(&mut rng));

        let mut round = Self {
            grid,
            players,
            bombs: Vec::new(),
            creeps: Vec::new(),
            ice_clusters: Vec::new(),
            powerups,
            portal_cell,
            rng,
            sounds: Vec::new(),
            reports: Vec::new(),
            outcome: None,
            paused_at_ms: None,
            next_creep_id: 0,
            next_cluster_id: 0,
            two_player: config.two_player,
        };
        round.spawn_census(&census, now_ms);

        log::info!(
            "round start: seed={} players={} creeps={} brittle={}",
            config.seed,
            round.players.len(),
            round.creeps.len(),
            config.brittle_count,
        );
        Ok(round)
    }

    fn spawn_census(&mut self, census: &CreepCensus, now_ms: u64) {
        let species_counts = [
            (Species::Purple, census.purple),
            (Species::White, census.white),
            (Species::Red, census.red),
            (Species::Cyan, census.cyan),
            (Species::Yellow, census.yellow),
        ];
        for (species, count) in species_counts {
            for _ in 0..count {
                let cells = self.grid.path_cells();
                let Some(&(row, col)) = cells.choose(&mut self.rng) else {
                    log::warn!("no path cell free for a {species:?} creep, skipped");
                    continue;
                };
                let id = self.alloc_creep_id();
                self.creeps
                    .push(Creep::spawn(id, species, row, col, now_ms, &mut self.rng));
            }
        }
    }

    fn alloc_creep_id(&mut self) -> CreepId {
        let id = CreepId(self.next_creep_id);
        self.next_creep_id += 1;
        id
    }

    /// Advance one fixed tick. `inputs` is indexed by `PlayerId`; missing
    /// entries read as no input. Does nothing while paused or finished.
    pub fn tick(&mut self, now_ms: u64, inputs: &[PlayerInput]) {
        if self.paused_at_ms.is_some() || self.outcome.is_some() {
            return;
        }

        // Players: steer, move, drop.
        for idx in 0..self.players.len() {
            let input = inputs
                .get(self.players[idx].id.0 as usize)
                .copied()
                .unwrap_or_default();
            let player = &mut self.players[idx];
            player.apply_input(&input);
            player.walk(&self.grid);
            if input.drop_bomb {
                if let Some(bomb) =
                    self.players[idx].try_drop_bomb(now_ms, &self.bombs, &self.grid)
                {
                    self.bombs.push(bomb);
                }
            }
        }

        // Spent bombs go back into their owners' inventories.
        for player in &mut self.players {
            let regained = self
                .bombs
                .iter()
                .filter(|b| b.owner == player.id && b.spent(now_ms))
                .count() as u32;
            player.bomb_inventory += regained;
        }
        self.bombs.retain(|b| !b.spent(now_ms));

        // Player-facing collisions, in resolution order.
        collision::bomb_pushback(&mut self.players, &self.bombs);
        collision::mark_bomb_cells(&mut self.bombs, &self.players, &mut self.grid);
        collision::explosions_vs_players(&mut self.players, &self.bombs, now_ms, &mut self.sounds);
        collision::creeps_vs_players(&mut self.players, &self.creeps, now_ms, &mut self.sounds);
        collision::ice_slide(&mut self.players, &self.ice_clusters, &self.grid);
        collision::powerup_pickup(
            &mut self.players,
            &mut self.powerups,
            &mut self.grid,
            &mut self.sounds,
        );
        collision::portal_entry(
            &mut self.players,
            self.portal_cell,
            !self.creeps.is_empty(),
            &self.grid,
            now_ms,
        );

        // Bombs.
        for bomb in &mut self.bombs {
            bomb.update(now_ms, &mut self.grid, &mut self.sounds);
        }

        // Ice clusters expire whole.
        self.ice_clusters.retain(|c| !c.expired(now_ms));

        // Creeps.
        collision::creep_bomb_pushback(&mut self.creeps, &self.bombs, &mut self.rng);
        collision::explosions_vs_creeps(&mut self.creeps, &self.bombs, now_ms);
        let mut actions = Vec::new();
        for creep in &mut self.creeps {
            actions.extend(creep.update(now_ms, &self.grid, &mut self.rng));
        }
        for action in actions {
            self.apply_creep_action(action, now_ms);
        }

        // Fate animations run down; finished players leave reports behind.
        let reports = &mut self.reports;
        self.players.retain_mut(|player| {
            match player.advance_fate(now_ms) {
                Some(report) => {
                    reports.push(report);
                    false
                }
                None => true,
            }
        });

        self.detect_end();
    }

    fn apply_creep_action(&mut self, action: CreepAction, now_ms: u64) {
        match action {
            CreepAction::Remove(id) => self.creeps.retain(|c| c.id != id),
            CreepAction::SpawnCluster(cells) => {
                let id = ClusterId(self.next_cluster_id);
                self.next_cluster_id += 1;
                self.ice_clusters.push(IceCluster::new(id, cells, now_ms));
            }
            CreepAction::SpawnDecoy { parent } => self.spawn_decoy_for(parent, now_ms),
            CreepAction::RemoveDecoy { parent } => {
                self.creeps.retain(|c| {
                    !matches!(c.state, SpeciesState::Decoy { parent: p, .. } if p == parent)
                });
            }
        }
    }

    /// Decoys appear on a random open floor tile nobody stands on.
    fn spawn_decoy_for(&mut self, parent: CreepId, now_ms: u64) {
        let creep_cells: Vec<(i32, i32)> = self
            .creeps
            .iter()
            .map(|c| crate::cell_of(c.rect.center()))
            .collect();
        let player_cells: Vec<(i32, i32)> = self.players.iter().map(|p| p.cell()).collect();

        let mut viable = Vec::new();
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                let open = matches!(
                    self.grid.cell(row, col),
                    CellKind::Path | CellKind::PlayerStart | CellKind::PlayerAdjacent
                );
                if open
                    && !creep_cells.contains(&(row, col))
                    && !player_cells.contains(&(row, col))
                {
                    viable.push((row, col));
                }
            }
        }
        let Some(&(row, col)) = viable.choose(&mut self.rng) else {
            log::warn!("no free cell for a decoy, none spawned");
            return;
        };
        let id = self.alloc_creep_id();
        self.creeps
            .push(Creep::spawn_decoy(id, parent, row, col, now_ms, &mut self.rng));
    }

    fn detect_end(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        let over = if self.two_player {
            self.players.len() <= 1 && !self.reports.is_empty()
        } else {
            self.players.is_empty()
        };
        if !over {
            return;
        }
        let outcome = if let Some(exited) = self.reports.iter().find(|r| r.reached_exit) {
            RoundOutcome::Victory { winner: exited.id }
        } else if self.two_player {
            match self.players.first() {
                Some(survivor) => RoundOutcome::Victory { winner: survivor.id },
                None => RoundOutcome::Tie,
            }
        } else {
            RoundOutcome::Defeat
        };
        log::info!("round over: {outcome:?}");
        self.outcome = Some(outcome);
    }

    /// Freeze the round. Pending cues are dropped so nothing queued before
    /// the pause plays after it.
    pub fn pause(&mut self, now_ms: u64) {
        if self.paused_at_ms.is_some() {
            return;
        }
        self.paused_at_ms = Some(now_ms);
        self.sounds.clear();
        self.sounds
            .push(SoundCue::new(SoundEffect::PauseGame, 0.2));
    }

    /// Unfreeze, shifting every live deadline by the paused span.
    pub fn resume(&mut self, now_ms: u64) {
        let Some(paused_at) = self.paused_at_ms.take() else {
            return;
        };
        let delta = now_ms.saturating_sub(paused_at);
        for bomb in &mut self.bombs {
            bomb.shift_timers(delta);
        }
        for creep in &mut self.creeps {
            creep.shift_timers(delta);
        }
        for cluster in &mut self.ice_clusters {
            cluster.shift_timers(delta);
        }
        for player in &mut self.players {
            player.shift_timers(delta);
        }
    }

    pub fn paused(&self) -> bool {
        self.paused_at_ms.is_some()
    }

    /// Take the cues queued since the last drain.
    pub fn drain_sounds(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.sounds)
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }

    pub fn reports(&self) -> &[PlayerReport] {
        &self.reports
    }

    /// Closed while any creep lives, then blinking open on the clock.
    pub fn portal_sprite(&self, now_ms: u64) -> PortalSprite {
        if !self.creeps.is_empty() {
            return PortalSprite::Closed;
        }
        if (now_ms / PORTAL_BLINK_MS) % 2 == 0 {
            PortalSprite::Open1
        } else {
            PortalSprite::Open2
        }
    }
}
