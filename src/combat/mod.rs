//! Combat system - weapons, hit resolution, grenades and the fixed-step session tick

use std::collections::HashSet;

use bevy::prelude::*;

use crate::GameState;
use crate::level::ArenaLayout;
use crate::player::input::ControlIntent;
use crate::player::movement::MovementConfig;

pub mod config;
pub mod damage;
pub mod hitscan;
pub mod projectiles;
pub mod schedule;
pub mod session;
pub mod weapons;

pub use config::CombatConfig;
pub use session::{CombatEvent, CombatSession, HudSnapshot, SessionOutcome, SoundCue, TickInput};

use hitscan::SphereCaster;
use projectiles::GrenadeId;

/// Seconds per combat step. Grenade gravity is tuned per step at this rate.
pub const COMBAT_STEP: f64 = 0.016;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Outbox drained into `CombatEvent`s; sinks run after this
    Publish,
}

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CombatConfig>()
            .add_event::<CombatEvent>()
            .insert_resource(Time::<Fixed>::from_seconds(COMBAT_STEP))
            .add_systems(OnEnter(GameState::Menu), (start_session, clear_effects))
            .add_systems(
                FixedUpdate,
                run_combat_tick.run_if(in_state(GameState::Playing)),
            )
            .add_systems(Update, publish_combat_events.in_set(CombatSet::Publish))
            .add_systems(
                Update,
                (
                    end_session_on_defeat,
                    spawn_combat_effects,
                    sync_grenade_visuals,
                    update_flashes,
                    update_explosions,
                )
                    .after(CombatSet::Publish),
            );
    }
}

/// Build a fresh session from the arena layout
pub fn start_session(
    mut commands: Commands,
    config: Res<CombatConfig>,
    movement: Res<MovementConfig>,
    layout: Res<ArenaLayout>,
) {
    info!(
        "New session: {} enemies, {} pickups",
        layout.enemies.len(),
        layout.pickups.len()
    );
    commands.insert_resource(CombatSession::new(config.clone(), movement.clone(), &layout));
}

fn run_combat_tick(
    mut session: ResMut<CombatSession>,
    mut intent: ResMut<ControlIntent>,
    time: Res<Time>,
) {
    let input = TickInput {
        now: session.clock() + time.delta(),
        dt: time.delta_secs(),
        intent: *intent,
    };

    session.tick(&input, &SphereCaster);
    intent.consume_triggers();
}

fn publish_combat_events(mut session: ResMut<CombatSession>, mut events: EventWriter<CombatEvent>) {
    events.write_batch(session.drain_events());
}

fn end_session_on_defeat(
    mut events: EventReader<CombatEvent>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    for event in events.read() {
        if let CombatEvent::PlayerDied { score, kills } = event {
            info!("Game over - score {}, kills {}", score, kills);
            next_state.set(GameState::GameOver);
        }
    }
}

/// Short-lived light/mesh effect
#[derive(Component)]
pub struct Flash {
    pub lifetime: f32,
}

/// Cosmetic blast sphere
#[derive(Component)]
pub struct Explosion {
    pub radius: f32,
    pub max_radius: f32,
    pub lifetime: f32,
}

#[derive(Component)]
pub struct GrenadeVisual(pub GrenadeId);

fn spawn_combat_effects(
    mut commands: Commands,
    mut events: EventReader<CombatEvent>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<CombatConfig>,
) {
    for event in events.read() {
        match event {
            CombatEvent::ShotFired { origin, direction, .. } => {
                let flash_pos = *origin + *direction * 0.6 + Vec3::NEG_Y * 0.1;

                commands.spawn((
                    Mesh3d(meshes.add(Cuboid::new(0.1, 0.1, 0.02))),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: Color::srgb(1.0, 0.9, 0.5),
                        emissive: LinearRgba::rgb(10.0, 8.0, 2.0),
                        unlit: true,
                        ..default()
                    })),
                    Transform::from_translation(flash_pos).looking_to(*direction, Vec3::Y),
                    Flash { lifetime: 0.05 },
                ));

                commands.spawn((
                    PointLight {
                        intensity: 50000.0,
                        color: Color::srgb(1.0, 0.8, 0.4),
                        range: 10.0,
                        shadows_enabled: false,
                        ..default()
                    },
                    Transform::from_translation(flash_pos),
                    Flash { lifetime: 0.05 },
                ));
            }
            CombatEvent::EnemyHit { point, .. } => {
                commands.spawn((
                    Mesh3d(meshes.add(Sphere::new(0.12))),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: Color::srgb(1.0, 0.3, 0.2),
                        emissive: LinearRgba::rgb(4.0, 0.8, 0.4),
                        unlit: true,
                        ..default()
                    })),
                    Transform::from_translation(*point),
                    Flash { lifetime: 0.1 },
                ));
            }
            CombatEvent::GrenadeDetonated { position, .. } => {
                let radius = config.grenade.blast_radius;

                commands.spawn((
                    Mesh3d(meshes.add(Sphere::new(0.5))),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: Color::srgba(1.0, 0.5, 0.1, 0.7),
                        emissive: LinearRgba::rgb(4.0, 1.5, 0.2),
                        unlit: true,
                        alpha_mode: AlphaMode::Blend,
                        ..default()
                    })),
                    Transform::from_translation(*position),
                    Explosion {
                        radius: 0.5,
                        max_radius: radius,
                        lifetime: 0.3,
                    },
                ));

                commands.spawn((
                    PointLight {
                        intensity: 200000.0,
                        color: Color::srgb(1.0, 0.6, 0.2),
                        range: radius * 3.0,
                        shadows_enabled: false,
                        ..default()
                    },
                    Transform::from_translation(*position + Vec3::Y),
                    Flash { lifetime: 0.2 },
                ));
            }
            _ => {}
        }
    }
}

/// Keep one small sphere per grenade in flight
fn sync_grenade_visuals(
    mut commands: Commands,
    session: Res<CombatSession>,
    mut visuals: Query<(Entity, &GrenadeVisual, &mut Transform)>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut shown = HashSet::new();

    for (entity, visual, mut transform) in &mut visuals {
        match session.grenades.iter().find(|grenade| grenade.id == visual.0) {
            Some(grenade) => {
                transform.translation = grenade.position;
                shown.insert(visual.0);
            }
            None => {
                commands.entity(entity).despawn();
            }
        }
    }

    for grenade in session.grenades.iter().filter(|grenade| !shown.contains(&grenade.id)) {
        commands.spawn((
            Mesh3d(meshes.add(Sphere::new(0.15))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.2, 0.4, 0.2),
                perceptual_roughness: 0.6,
                ..default()
            })),
            Transform::from_translation(grenade.position),
            GrenadeVisual(grenade.id),
        ));
    }
}

fn update_flashes(
    mut commands: Commands,
    mut flash_query: Query<(Entity, &mut Flash)>,
    time: Res<Time>,
) {
    for (entity, mut flash) in &mut flash_query {
        flash.lifetime -= time.delta_secs();
        if flash.lifetime <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}

fn update_explosions(
    mut commands: Commands,
    mut query: Query<(Entity, &mut Transform, &mut Explosion)>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();

    for (entity, mut transform, mut explosion) in &mut query {
        let expand_rate = explosion.max_radius / 0.12;
        explosion.radius = (explosion.radius + expand_rate * dt).min(explosion.max_radius);
        transform.scale = Vec3::splat(explosion.radius / 0.5);

        explosion.lifetime -= dt;
        if explosion.lifetime <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}

fn clear_effects(
    mut commands: Commands,
    query: Query<Entity, Or<(With<Flash>, With<Explosion>, With<GrenadeVisual>)>>,
) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}
