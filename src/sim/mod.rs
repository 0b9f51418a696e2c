//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod bomb;
pub mod collision;
pub mod creep;
pub mod grid;
pub mod player;
pub mod powerup;
pub mod rect;
pub mod round;
pub mod timer;

pub use bomb::{Bomb, BombPhase, FuseColor};
pub use creep::{Creep, CreepId, CreepSprite, IceCluster, Species};
pub use grid::{CellKind, LevelGrid, SetupError};
pub use player::{Player, PlayerColor, PlayerFate, PlayerId, PlayerInput, PlayerReport};
pub use powerup::{PerkKind, Powerup};
pub use rect::Rect;
pub use round::{PortalSprite, RoundOutcome, RoundState};
pub use timer::Countdown;
