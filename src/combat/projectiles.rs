//! Grenade ballistics
//!
//! Stepped once per combat tick. Gravity is a per-step velocity change, so the
//! arc depends on the fixed timestep the loop runs at.

use bevy::prelude::*;

use super::damage::linear_falloff;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct GrenadeId(pub u32);

#[derive(Clone, Debug)]
pub struct GrenadeTuning {
    pub launch_speed: f32,     // Speed along the facing direction
    pub arc_lift: f32,         // Extra upward velocity added on launch
    pub gravity_per_step: f32, // Vertical velocity change per step
    pub fuse: f32,             // Seconds before detonating in the air
    pub ground_level: f32,
    pub blast_radius: f32,
    pub min_damage: f32,
    pub falloff_per_unit: f32, // Damage lost per unit of distance from the blast
}

impl Default for GrenadeTuning {
    fn default() -> Self {
        Self {
            launch_speed: 15.0,
            arc_lift: 2.0,
            gravity_per_step: -0.02,
            fuse: 3.0,
            ground_level: 0.0,
            blast_radius: 5.0,
            min_damage: 10.0,
            falloff_per_unit: 8.0,
        }
    }
}

/// A grenade in flight
#[derive(Clone, Debug)]
pub struct Grenade {
    pub id: GrenadeId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub fuse_remaining: f32,
}

impl Grenade {
    pub fn launch(id: GrenadeId, origin: Vec3, facing: Vec3, tuning: &GrenadeTuning) -> Self {
        let velocity = facing.normalize_or_zero() * tuning.launch_speed + Vec3::Y * tuning.arc_lift;

        Self {
            id,
            position: origin,
            velocity,
            fuse_remaining: tuning.fuse,
        }
    }

    /// Advance one step. Returns true once the grenade should detonate.
    pub fn step(&mut self, dt: f32, tuning: &GrenadeTuning) -> bool {
        self.velocity.y += tuning.gravity_per_step;
        self.position += self.velocity * dt;
        self.fuse_remaining -= dt;

        self.fuse_remaining <= 0.0 || self.position.y <= tuning.ground_level
    }
}

/// Damage dealt at `distance` from a blast, or None outside the radius
pub fn blast_damage(distance: f32, max_damage: f32, tuning: &GrenadeTuning) -> Option<f32> {
    if distance >= tuning.blast_radius {
        return None;
    }
    Some(linear_falloff(max_damage, tuning.min_damage, distance, tuning.falloff_per_unit))
}
