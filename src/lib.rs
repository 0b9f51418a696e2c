//! Maze Blaster - tile-grid arcade blaster simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (level grid, bombs, creeps, collisions)
//! - `audio`: Sound-effect cues emitted by the sim for the host to play
//! - `config`: Data-driven round options (mode, brittle count, creep census)
//!
//! Rendering, audio playback, input decoding and menus live in the host
//! application; this crate only exposes the state they read and the cues
//! they consume.

pub mod audio;
pub mod config;
pub mod sim;

pub use audio::{SoundCue, SoundEffect};
pub use config::{CreepCensus, RoundConfig};

use glam::IVec2;

/// Game configuration constants
pub mod consts {
    /// Edge length of one grid tile in pixels
    pub const TILE_SIZE: i32 = 48;
    /// Standard level height in tiles
    pub const LEVEL_ROWS: i32 = 13;
    /// Standard level width in tiles
    pub const LEVEL_COLS: i32 = 29;

    /// Bomb fuse duration
    pub const BOMB_COUNTDOWN_MS: u64 = 3000;
    /// Bomb explosion duration
    pub const BOMB_EXPLOSION_MS: u64 = 1000;
    /// Extra delay after a bomb goes inactive before the owner regains the slot
    pub const BOMB_REGAIN_DELAY_MS: u64 = 15;
    /// Fuse turns dark red below this remaining time
    pub const FUSE_DARK_RED_MS: i64 = 2000;
    /// Fuse turns bright red below this remaining time
    pub const FUSE_BRIGHT_RED_MS: i64 = 1000;

    /// Creeps hold still for this long at round start
    pub const SPAWN_FREEZE_MS: u64 = 1500;
    /// Red creep rage span between explosion hit and the blink sequence
    pub const RAGE_MS: u64 = 6000;
    /// Blink-then-remove death sequence length
    pub const DEATH_BLINK_MS: u64 = 1000;
    /// Cyan creep ice-cluster spawn interval
    pub const ICE_SPAWN_INTERVAL_MS: u64 = 4000;
    /// Lifetime of one ice-tile cluster
    pub const ICE_CLUSTER_MS: u64 = 15000;
    /// Decoy creeps spend this long in the intangible alert sub-phase
    pub const DECOY_ALERT_MS: u64 = 2500;
    /// Candidate durations for the yellow creep's normal phase
    pub const YELLOW_NORMAL_CHOICES_MS: [u64; 8] =
        [7000, 8000, 9000, 10000, 11000, 12000, 13000, 14000];
    /// Candidate durations for the yellow creep's transmutation phase
    pub const YELLOW_TRANSMUTED_CHOICES_MS: [u64; 8] =
        [8000, 9000, 10000, 11000, 12000, 13000, 14000, 15000];

    /// Player walk speed in pixels per tick
    pub const PLAYER_VELOCITY: i32 = 2;
    /// Creep walk speed in pixels per tick
    pub const CREEP_VELOCITY: i32 = 1;
    /// Red creep walk speed while raging
    pub const RAGE_VELOCITY: i32 = 2;
    /// Maximum pushback applied per tick when a player overlaps a bomb
    pub const PUSHBACK_STEPS: i32 = 2;
    /// Offset of the four creep contact sample points from its center
    pub const CREEP_CONTACT_OFFSET: i32 = 5;

    /// Default number of brittle cells scattered at setup
    pub const DEFAULT_BRITTLE_COUNT: usize = 75;

    /// Exit animation shrinks the player rect by 2px at this interval
    pub const EXIT_SHRINK_INTERVAL_MS: u64 = 200;
    /// Player death-sigil animation length (24 steps at 105ms)
    pub const DEATH_ANIM_MS: u64 = 2520;
    /// Open exit portal alternates sprites at this interval
    pub const PORTAL_BLINK_MS: u64 = 1000;
}

/// Pixel center of the tile at (row, col)
#[inline]
pub fn cell_center(row: i32, col: i32) -> IVec2 {
    IVec2::new(
        col * consts::TILE_SIZE + consts::TILE_SIZE / 2,
        row * consts::TILE_SIZE + consts::TILE_SIZE / 2,
    )
}

/// Tile (row, col) containing the given pixel point
#[inline]
pub fn cell_of(point: IVec2) -> (i32, i32) {
    (
        point.y.div_euclid(consts::TILE_SIZE),
        point.x.div_euclid(consts::TILE_SIZE),
    )
}
