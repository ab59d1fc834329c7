//! Enemy AI and its on-screen representation
//!
//! Behaviour lives in `agent` and is driven by the combat session. This plugin
//! only mirrors the roster into the scene through an id -> entity map.

use std::collections::HashMap;

use bevy::ecs::hierarchy::ChildOf;
use bevy::prelude::*;

use crate::GameState;
use crate::combat::{CombatEvent, CombatSession, CombatSet};

pub mod agent;

pub use agent::{AgentContext, Enemy, EnemyId, EnemyKind, EnemyState};

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EnemyVisuals>()
            .add_systems(OnEnter(GameState::Menu), despawn_enemy_visuals)
            .add_systems(
                Update,
                (
                    spawn_missing_visuals,
                    trigger_hit_reactions,
                    sync_enemy_visuals,
                    despawn_removed_enemies,
                )
                    .chain()
                    .after(CombatSet::Publish),
            );
    }
}

/// Which scene entity shows which enemy
#[derive(Resource, Default)]
pub struct EnemyVisuals(pub HashMap<EnemyId, Entity>);

const PALETTE: [Color; 7] = [
    Color::srgb(1.0, 0.28, 0.34),
    Color::srgb(0.33, 0.32, 0.93),
    Color::srgb(0.0, 0.82, 0.83),
    Color::srgb(1.0, 0.39, 0.28),
    Color::srgb(0.48, 0.93, 0.62),
    Color::srgb(1.0, 0.85, 0.24),
    Color::srgb(1.0, 0.42, 0.42),
];

const BODY_HEIGHT: f32 = 2.5;
const HEALTH_BAR_HEIGHT: f32 = 3.2;
const LUNGE_DISTANCE: f32 = 0.4;

/// Root of an enemy's visual
#[derive(Component)]
pub struct EnemyVisual {
    pub id: EnemyId,
    pub body_material: Handle<StandardMaterial>,
    pub health_bar: Entity,
}

#[derive(Component)]
pub struct HealthBar;

/// Hit reaction - makes enemies jitter when damaged
#[derive(Component, Default)]
pub struct HitReaction {
    pub intensity: f32,
}

impl HitReaction {
    pub fn trigger(&mut self, damage: f32) {
        self.intensity = (self.intensity + damage / 20.0).min(1.0);
    }
}

fn spawn_missing_visuals(
    mut commands: Commands,
    session: Res<CombatSession>,
    mut visuals: ResMut<EnemyVisuals>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for enemy in session.enemies.values() {
        if visuals.0.contains_key(&enemy.id) {
            continue;
        }

        let entity = spawn_enemy(&mut commands, &mut meshes, &mut materials, enemy);
        visuals.0.insert(enemy.id, entity);
    }
}

/// Palette colour cycled by id so neighbours in the roster look different
pub fn body_color(id: EnemyId) -> Color {
    PALETTE[id.0 as usize % PALETTE.len()]
}

fn spawn_enemy(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    enemy: &Enemy,
) -> Entity {
    let body_material = materials.add(StandardMaterial {
        base_color: body_color(enemy.id),
        perceptual_roughness: 0.6,
        ..default()
    });

    // Snipers and guards get glowing eyes in a different colour so they read at range
    let eye_color = match enemy.kind {
        EnemyKind::Sniper | EnemyKind::Guard => LinearRgba::rgb(1.0, 2.0, 2.0),
        EnemyKind::Aggressive | EnemyKind::Patrol => LinearRgba::rgb(2.0, 2.0, 0.0),
    };
    let eye_material = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        emissive: eye_color,
        unlit: true,
        ..default()
    });

    let health_bar = commands
        .spawn((
            Mesh3d(meshes.add(Cuboid::new(1.0, 0.1, 0.05))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.2, 1.0, 0.2),
                unlit: true,
                ..default()
            })),
            Transform::from_xyz(0.0, HEALTH_BAR_HEIGHT, 0.0),
            HealthBar,
        ))
        .id();

    let root = commands
        .spawn((
            Transform::from_translation(enemy.position),
            Visibility::default(),
            EnemyVisual {
                id: enemy.id,
                body_material: body_material.clone(),
                health_bar,
            },
            HitReaction::default(),
        ))
        .id();
    commands.entity(health_bar).insert(ChildOf(root));

    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(1.0, BODY_HEIGHT, 0.8))),
        MeshMaterial3d(body_material),
        Transform::from_xyz(0.0, BODY_HEIGHT / 2.0, 0.0),
        ChildOf(root),
    ));

    for eye_x in [-0.2, 0.2] {
        commands.spawn((
            Mesh3d(meshes.add(Sphere::new(0.08))),
            MeshMaterial3d(eye_material.clone()),
            Transform::from_xyz(eye_x, BODY_HEIGHT - 0.3, -0.42),
            ChildOf(root),
        ));
    }

    root
}

fn trigger_hit_reactions(
    mut events: EventReader<CombatEvent>,
    visuals: Res<EnemyVisuals>,
    mut reactions: Query<&mut HitReaction>,
) {
    for event in events.read() {
        let CombatEvent::EnemyHit { enemy, damage, .. } = event else {
            continue;
        };
        let Some(&entity) = visuals.0.get(enemy) else {
            continue;
        };
        if let Ok(mut reaction) = reactions.get_mut(entity) {
            reaction.trigger(*damage);
        }
    }
}

/// Mirror position, facing, alert tint, lunge and health into the scene
fn sync_enemy_visuals(
    session: Res<CombatSession>,
    mut roots: Query<(&EnemyVisual, &mut Transform, &mut HitReaction)>,
    mut bars: Query<&mut Transform, (With<HealthBar>, Without<EnemyVisual>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    time: Res<Time>,
) {
    let player = session.player.body.position;
    let dt = time.delta_secs();

    for (visual, mut transform, mut reaction) in &mut roots {
        // Removed enemies are despawned by `despawn_removed_enemies`
        let Some(enemy) = session.enemy(visual.id) else {
            continue;
        };

        if !enemy.is_alive() {
            transform.translation = enemy.position + Vec3::Y * 0.3;
            transform.rotation = Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2);
            continue;
        }

        let to_player = Vec3::new(player.x - enemy.position.x, 0.0, player.z - enemy.position.z);
        let facing = to_player.normalize_or_zero();

        transform.translation = enemy.position;
        if enemy.state != EnemyState::Patrol && facing != Vec3::ZERO {
            transform.look_to(facing, Vec3::Y);
        }

        if enemy.lunging {
            transform.translation += facing * LUNGE_DISTANCE;
        }

        if reaction.intensity > 0.01 {
            let t = time.elapsed_secs() * 50.0;
            let jitter = Vec3::new((t * 1.1).sin() * (t * 2.3).cos(), 0.0, (t * 1.7).cos() * (t * 1.9).sin());
            transform.translation += jitter * reaction.intensity * 0.03;
            reaction.intensity *= (1.0 - dt * 8.0).max(0.0);
        } else {
            reaction.intensity = 0.0;
        }

        if let Some(material) = materials.get_mut(&visual.body_material) {
            material.emissive = LinearRgba::rgb(enemy.alert * 0.8, 0.0, 0.0);
        }

        if let Ok(mut bar) = bars.get_mut(visual.health_bar) {
            let fraction = enemy.health.fraction().max(0.01);
            bar.scale.x = fraction;
            bar.translation.x = -(1.0 - fraction) / 2.0;
        }
    }
}

fn despawn_removed_enemies(
    mut commands: Commands,
    mut events: EventReader<CombatEvent>,
    mut visuals: ResMut<EnemyVisuals>,
) {
    for event in events.read() {
        let CombatEvent::EnemyRemoved { enemy } = event else {
            continue;
        };
        let Some(entity) = visuals.0.remove(enemy) else {
            warn!("No visual for removed enemy {:?}", enemy);
            continue;
        };
        commands.entity(entity).despawn();
    }
}

fn despawn_enemy_visuals(mut commands: Commands, mut visuals: ResMut<EnemyVisuals>) {
    for (_, entity) in visuals.0.drain() {
        commands.entity(entity).despawn();
    }
}
