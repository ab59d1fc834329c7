use std::time::Duration;

use bevy::prelude::*;

use super::projectiles::GrenadeTuning;

/// Combat loop tuning
#[derive(Resource, Clone, Debug)]
pub struct CombatConfig {
    pub kill_score: u32,                // Points per enemy killed
    pub auto_reload_delay: Duration,    // Pause between running dry and the automatic reload
    pub corpse_linger: Duration,        // How long a dead enemy stays visible
    pub lunge_duration: Duration,       // Cosmetic hop when an enemy strikes
    pub hud_interval: Duration,         // Minimum time between HUD refreshes
    pub player_max_health: f32,
    pub pickup_radius: f32,
    pub health_pickup_amount: f32,
    pub arena_half_extent: f32,         // Player and enemies are kept inside +-this on X/Z
    pub rng_seed: u64,
    pub grenade: GrenadeTuning,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            kill_score: 150,
            auto_reload_delay: Duration::from_millis(300),
            corpse_linger: Duration::from_secs(3),
            lunge_duration: Duration::from_millis(200),
            hud_interval: Duration::from_millis(100),
            player_max_health: 100.0,
            pickup_radius: 2.0,
            health_pickup_amount: 25.0,
            arena_half_extent: 98.0,
            rng_seed: 0x5eed,
            grenade: GrenadeTuning::default(),
        }
    }
}
