//! Sound-effect cues emitted by the simulation
//!
//! The sim never plays audio itself. Update methods push cues onto the
//! round's queue and the host drains them after each tick and forwards
//! them to whatever mixer it uses. Fire-and-forget, non-blocking.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Bomb fuse crossing a color threshold
    BombCountdownTick,
    /// Bomb countdown expired, explosion starts
    BombExplosion,
    /// Hidden exit portal uncovered by an explosion
    ExitPortalReveal,
    /// Hidden powerup uncovered by an explosion
    PowerupReveal,
    /// Player walked over a revealed powerup
    PowerupPickup,
    /// Player killed by explosion or creep
    PlayerDeath,
    /// Round entered the paused state
    PauseGame,
}

/// One queued playback request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoundCue {
    pub effect: SoundEffect,
    /// Linear volume, 0.0 - 1.0
    pub volume: f32,
}

impl SoundCue {
    pub fn new(effect: SoundEffect, volume: f32) -> Self {
        Self { effect, volume }
    }
}
