//! Collision resolution
//!
//! Free functions applied by the round once per tick, in a fixed order:
//! bomb pushback, bomb cell marking, explosions vs players, creeps vs
//! players, ice slide, powerup pickup, portal entry. Explosion and creep
//! deaths are one-shot and mutually exclusive per player.

use glam::IVec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::audio::{SoundCue, SoundEffect};
use crate::consts::{CREEP_CONTACT_OFFSET, PUSHBACK_STEPS};

use super::bomb::Bomb;
use super::creep::{Creep, DIRECTIONS, IceCluster};
use super::grid::{CellKind, LevelGrid};
use super::player::Player;
use super::powerup::{PerkKind, Powerup};
use super::rect::Rect;

/// Push non-owner players off armed bombs, one pixel at a time along the
/// axis of greatest center separation. A player whose center sits exactly
/// on the bomb's center cannot be assigned a side; that bomb pushes
/// nobody this tick.
pub fn bomb_pushback(players: &mut [Player], bombs: &[Bomb]) {
    for bomb in bombs.iter().filter(|b| b.armed()) {
        let ambiguous = players
            .iter()
            .any(|p| p.id != bomb.owner && p.rect.center() == bomb.rect.center());
        if ambiguous {
            continue;
        }
        for player in players.iter_mut() {
            if player.id == bomb.owner || !bomb.rect.intersects(&player.rect) {
                continue;
            }
            let delta = bomb.rect.center() - player.rect.center();
            let push = if delta.x.abs() > delta.y.abs() {
                IVec2::new(if delta.x < 0 { 1 } else { -1 }, 0)
            } else {
                IVec2::new(0, if delta.y < 0 { 1 } else { -1 })
            };
            for _ in 0..PUSHBACK_STEPS {
                player.rect = player.rect.translate(push);
                if !bomb.rect.intersects(&player.rect) {
                    break;
                }
            }
        }
    }
}

/// Flip a bomb's tile to BombOccupied on the first tick no player is
/// standing on it. Until then the tile stays walkable so the dropper can
/// step off.
pub fn mark_bomb_cells(bombs: &mut [Bomb], players: &[Player], grid: &mut LevelGrid) {
    for bomb in bombs.iter_mut().filter(|b| b.armed() && !b.cell_marked) {
        if players.iter().any(|p| p.rect.intersects(&bomb.rect)) {
            continue;
        }
        let (row, col) = bomb.cell;
        grid.set_cell(row, col, CellKind::BombOccupied);
        bomb.cell_marked = true;
    }
}

/// Kill players overlapping a live explosion. A player already taken by a
/// creep this round is left to that death.
pub fn explosions_vs_players(
    players: &mut [Player],
    bombs: &[Bomb],
    now_ms: u64,
    sounds: &mut Vec<SoundCue>,
) {
    for bomb in bombs.iter().filter(|b| b.exploding()) {
        let rects = bomb.explosion_rects();
        for player in players.iter_mut() {
            if !player.alive() || player.hit_by_creep {
                continue;
            }
            if rects.iter().any(|r| r.intersects(&player.rect)) {
                player.hit_by_explosion = true;
                player.kill(now_ms);
                sounds.push(SoundCue::new(SoundEffect::PlayerDeath, 0.2));
            }
        }
    }
}

/// Contact check against four sample points just inside the creep's
/// silhouette. Blinking creeps and alert decoys have no presence.
pub fn creeps_vs_players(
    players: &mut [Player],
    creeps: &[Creep],
    now_ms: u64,
    sounds: &mut Vec<SoundCue>,
) {
    let offsets = [
        IVec2::new(CREEP_CONTACT_OFFSET, 0),
        IVec2::new(-CREEP_CONTACT_OFFSET, 0),
        IVec2::new(0, CREEP_CONTACT_OFFSET),
        IVec2::new(0, -CREEP_CONTACT_OFFSET),
    ];
    for player in players.iter_mut() {
        if !player.alive() || player.hit_by_explosion {
            continue;
        }
        let touched = creeps.iter().any(|creep| {
            !creep.alert(now_ms)
                && !creep.blinking(now_ms)
                && offsets
                    .iter()
                    .any(|&o| player.rect.contains_point(creep.rect.center() + o))
        });
        if touched {
            player.hit_by_creep = true;
            player.kill(now_ms);
            sounds.push(SoundCue::new(SoundEffect::PlayerDeath, 0.2));
        }
    }
}

/// Explosions hit a creep when its rect covers an affected cell's center.
pub fn explosions_vs_creeps(creeps: &mut [Creep], bombs: &[Bomb], now_ms: u64) {
    let centers: Vec<IVec2> = bombs
        .iter()
        .filter(|b| b.exploding())
        .flat_map(|b| b.affected_cells().iter())
        .map(|&(row, col)| crate::cell_center(row, col))
        .collect();
    if centers.is_empty() {
        return;
    }
    for creep in creeps.iter_mut() {
        if creep.hit_by_explosion || creep.immune_to_explosions(now_ms) {
            continue;
        }
        if centers.iter().any(|&c| creep.rect.contains_point(c)) {
            creep.hit(now_ms);
        }
    }
}

/// Nudge creeps off armed bombs by one pixel and scatter their heading.
pub fn creep_bomb_pushback<R: Rng>(creeps: &mut [Creep], bombs: &[Bomb], rng: &mut R) {
    for bomb in bombs.iter().filter(|b| b.armed()) {
        for creep in creeps.iter_mut() {
            if !creep.rect.intersects(&bomb.rect) {
                continue;
            }
            let delta = creep.rect.center() - bomb.rect.center();
            let push = if delta.x.abs() > delta.y.abs() {
                IVec2::new(if delta.x < 0 { -1 } else { 1 }, 0)
            } else {
                IVec2::new(0, if delta.y < 0 { -1 } else { 1 })
            };
            creep.rect = creep.rect.translate(push);
            if let Some(&turn) = DIRECTIONS.choose(rng) {
                creep.dir = turn;
            }
        }
    }
}

/// Standing on frozen floor locks the current heading into a slide at
/// half speed; the slide ends on leaving the ice or facing a wall.
pub fn ice_slide(players: &mut [Player], clusters: &[IceCluster], grid: &LevelGrid) {
    for player in players.iter_mut() {
        let on_ice = clusters
            .iter()
            .flat_map(|c| c.rects())
            .any(|r| r.intersects(&player.rect));
        if !on_ice {
            player.on_ice = false;
            continue;
        }
        player.on_ice = true;
        let slide_velocity = (player.velocity / 2).max(1);
        let next = player.rect.translate(player.dir * slide_velocity);
        if slide_blocked(&next, grid) {
            player.dir = IVec2::ZERO;
        }
    }
}

fn slide_blocked(next: &Rect, grid: &LevelGrid) -> bool {
    let (row, col) = crate::cell_of(next.center());
    for d_row in -1..=1 {
        for d_col in -1..=1 {
            let kind = grid.cell(row + d_row, col + d_col);
            if kind.passable_for(false) {
                continue;
            }
            if next.intersects(&Rect::of_cell(row + d_row, col + d_col)) {
                return true;
            }
        }
    }
    false
}

/// Collect revealed powerups under player centers and apply their perks.
pub fn powerup_pickup(
    players: &mut [Player],
    powerups: &mut Vec<Powerup>,
    grid: &mut LevelGrid,
    sounds: &mut Vec<SoundCue>,
) {
    powerups.retain(|powerup| {
        if !powerup.revealed(grid) {
            return true;
        }
        for player in players.iter_mut() {
            if !player.alive() || !powerup.rect.contains_point(player.rect.center()) {
                continue;
            }
            match powerup.kind {
                PerkKind::ExplosionRadius => player.explosion_radius += 1,
                PerkKind::ExtraBomb => player.bomb_inventory += 1,
            }
            sounds.push(SoundCue::new(SoundEffect::PowerupPickup, 0.2));
            grid.set_cell(powerup.cell.0, powerup.cell.1, CellKind::Path);
            return false;
        }
        true
    });
}

/// Start the exit animation for a player whose center sits exactly on the
/// revealed portal's center. The portal only opens once every creep is
/// gone.
pub fn portal_entry(
    players: &mut [Player],
    portal: Option<(i32, i32)>,
    any_creeps: bool,
    grid: &LevelGrid,
    now_ms: u64,
) {
    let Some((row, col)) = portal else { return };
    if any_creeps || grid.cell(row, col) != CellKind::ExitPortalRevealed {
        return;
    }
    let center = crate::cell_center(row, col);
    for player in players.iter_mut() {
        if player.alive() && player.rect.center() == center {
            player.begin_exit(now_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TILE_SIZE;
    use crate::sim::creep::{CreepId, Species};
    use crate::sim::player::{PlayerColor, PlayerFate, PlayerId};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn player_at(id: u32, row: i32, col: i32) -> Player {
        Player::new(PlayerId(id), PlayerColor::White, row, col)
    }

    #[test]
    fn pushback_moves_non_owner_off_the_bomb() {
        let bomb = Bomb::new(PlayerId(0), 5, 5, 1, 0);
        let mut other = player_at(1, 5, 5);
        other.rect.x += 47; // barely overlapping from the right
        let mut players = vec![other];
        bomb_pushback(&mut players, &[bomb.clone()]);
        assert!(!players[0].rect.intersects(&bomb.rect));
    }

    #[test]
    fn pushback_skips_owner_and_exact_center_overlap() {
        let bomb = Bomb::new(PlayerId(0), 5, 5, 1, 0);
        let owner = player_at(0, 5, 5);
        let centered = player_at(1, 5, 5);
        let mut players = vec![owner, centered];
        let before: Vec<Rect> = players.iter().map(|p| p.rect).collect();
        bomb_pushback(&mut players, &[bomb]);
        let after: Vec<Rect> = players.iter().map(|p| p.rect).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn bomb_cell_marked_only_once_players_clear_it() {
        let mut grid = LevelGrid::standard();
        let mut bombs = vec![Bomb::new(PlayerId(0), 5, 5, 1, 0)];
        let mut dropper = player_at(0, 5, 5);

        mark_bomb_cells(&mut bombs, std::slice::from_ref(&dropper), &mut grid);
        assert_eq!(grid.cell(5, 5), CellKind::Path);
        assert!(!bombs[0].cell_marked);

        dropper.rect.x += TILE_SIZE; // stepped off
        mark_bomb_cells(&mut bombs, std::slice::from_ref(&dropper), &mut grid);
        assert_eq!(grid.cell(5, 5), CellKind::BombOccupied);
        assert!(bombs[0].cell_marked);
    }

    #[test]
    fn explosion_kills_player_once_and_respects_creep_death() {
        let mut grid = LevelGrid::standard();
        let mut sounds = Vec::new();
        let mut bomb = Bomb::new(PlayerId(0), 5, 5, 1, 0);
        bomb.update(3000, &mut grid, &mut sounds);
        assert!(bomb.exploding());
        sounds.clear();

        let mut players = vec![player_at(0, 5, 5), player_at(1, 5, 6)];
        players[1].hit_by_creep = true;
        players[1].fate = PlayerFate::Dying { until_ms: 9999 };

        explosions_vs_players(&mut players, std::slice::from_ref(&bomb), 3000, &mut sounds);
        assert!(players[0].hit_by_explosion);
        assert!(!players[0].alive());
        assert!(!players[1].hit_by_explosion);
        assert_eq!(sounds.len(), 1);

        // Already dying, no second kill.
        explosions_vs_players(&mut players, &[bomb], 3100, &mut sounds);
        assert_eq!(sounds.len(), 1);
    }

    #[test]
    fn creep_contact_uses_sample_points() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut sounds = Vec::new();
        let creep = Creep::spawn(CreepId(0), Species::Purple, 5, 5, 0, &mut rng);
        let mut players = vec![player_at(0, 5, 5)];
        creeps_vs_players(&mut players, std::slice::from_ref(&creep), 0, &mut sounds);
        assert!(players[0].hit_by_creep);

        // A creep one tile over is out of sample-point range.
        let far = Creep::spawn(CreepId(1), Species::Purple, 5, 7, 0, &mut rng);
        let mut players = vec![player_at(0, 5, 5)];
        creeps_vs_players(&mut players, &[far], 0, &mut sounds);
        assert!(!players[0].hit_by_creep);
    }

    #[test]
    fn blinking_creep_has_no_contact() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut sounds = Vec::new();
        let mut creep = Creep::spawn(CreepId(0), Species::Purple, 5, 5, 0, &mut rng);
        creep.hit(1000);
        let mut players = vec![player_at(0, 5, 5)];
        creeps_vs_players(&mut players, &[creep], 1000, &mut sounds);
        assert!(!players[0].hit_by_creep);
    }

    #[test]
    fn explosion_center_hits_creep() {
        let mut grid = LevelGrid::standard();
        let mut sounds = Vec::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut bomb = Bomb::new(PlayerId(0), 5, 5, 1, 0);
        bomb.update(3000, &mut grid, &mut sounds);

        let mut creeps = vec![
            Creep::spawn(CreepId(0), Species::Purple, 5, 6, 0, &mut rng),
            Creep::spawn(CreepId(1), Species::Purple, 9, 9, 0, &mut rng),
        ];
        explosions_vs_creeps(&mut creeps, std::slice::from_ref(&bomb), 3000);
        assert!(creeps[0].hit_by_explosion);
        assert!(!creeps[1].hit_by_explosion);
    }

    #[test]
    fn ice_locks_direction_and_wall_stops_slide() {
        let grid = LevelGrid::standard();
        let cluster = IceCluster::new(crate::sim::creep::ClusterId(0), vec![(1, 1)], 0);

        let mut players = vec![player_at(0, 1, 1)];
        players[0].dir = IVec2::new(1, 0);
        ice_slide(&mut players, std::slice::from_ref(&cluster), &grid);
        assert!(players[0].on_ice);
        assert_eq!(players[0].dir, IVec2::new(1, 0), "open slide keeps the heading");

        // Sliding into the border kills the slide.
        players[0].dir = IVec2::new(-1, 0);
        ice_slide(&mut players, std::slice::from_ref(&cluster), &grid);
        assert_eq!(players[0].dir, IVec2::ZERO);

        // Off the ice, the flag clears.
        players[0].rect = Rect::of_cell(1, 3);
        ice_slide(&mut players, &[cluster], &grid);
        assert!(!players[0].on_ice);
    }

    #[test]
    fn powerup_collected_once() {
        let mut grid = LevelGrid::standard();
        grid.set_cell(5, 5, CellKind::PowerupRevealed);
        let mut powerups = vec![Powerup {
            kind: PerkKind::ExtraBomb,
            cell: (5, 5),
            rect: Rect::of_cell(5, 5),
        }];
        let mut players = vec![player_at(0, 5, 5)];
        let mut sounds = Vec::new();

        powerup_pickup(&mut players, &mut powerups, &mut grid, &mut sounds);
        assert!(powerups.is_empty());
        assert_eq!(players[0].bomb_inventory, 2);
        assert_eq!(grid.cell(5, 5), CellKind::Path);
        assert_eq!(sounds.len(), 1);

        powerup_pickup(&mut players, &mut powerups, &mut grid, &mut sounds);
        assert_eq!(players[0].bomb_inventory, 2);
        assert_eq!(sounds.len(), 1);
    }

    #[test]
    fn portal_requires_exact_center_and_no_creeps() {
        let mut grid = LevelGrid::standard();
        grid.set_cell(5, 5, CellKind::ExitPortalRevealed);

        let mut players = vec![player_at(0, 5, 5)];
        portal_entry(&mut players, Some((5, 5)), true, &grid, 0);
        assert!(players[0].alive(), "closed while creeps live");

        players[0].rect.x += 1;
        portal_entry(&mut players, Some((5, 5)), false, &grid, 0);
        assert!(players[0].alive(), "off-center does not count");

        players[0].rect.x -= 1;
        portal_entry(&mut players, Some((5, 5)), false, &grid, 0);
        assert!(matches!(players[0].fate, PlayerFate::Exiting { .. }));
    }
}
