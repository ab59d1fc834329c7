use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::combat::{CombatEvent, CombatSet};
use crate::enemies::EnemyKind;

pub const ARENA_SIZE: f32 = 100.0;

/// Enemies scattered around the map on top of the routed patrols
const SCATTERED_ENEMIES: usize = 12;
const LAYOUT_SEED: u64 = 0xa55a;

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ArenaLayout::generate(LAYOUT_SEED))
            .add_systems(Startup, spawn_arena)
            .add_systems(OnEnter(crate::GameState::Menu), spawn_pickups)
            .add_systems(Update, (spin_pickups, remove_collected_pickups.after(CombatSet::Publish)));
    }
}

/// Where an enemy starts and the route it walks while nothing is in sight
#[derive(Clone, Debug)]
pub struct EnemyPlacement {
    pub kind: EnemyKind,
    pub position: Vec3,
    pub route: Vec<Vec3>,
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PickupId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PickupKind {
    Ammo,   // Refills the active magazine
    Health, // Heals a fixed amount
}

#[derive(Clone, Copy, Debug)]
pub struct Pickup {
    pub id: PickupId,
    pub kind: PickupKind,
    pub position: Vec3,
}

/// Everything a session needs to populate the arena
#[derive(Resource, Clone, Debug, Default)]
pub struct ArenaLayout {
    pub player_spawn: Vec3,
    pub enemies: Vec<EnemyPlacement>,
    pub pickups: Vec<Pickup>,
}

impl ArenaLayout {
    /// Standard map: three routed patrols near the spawn plus a seeded scatter of mixed enemies
    pub fn generate(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut enemies = vec![
            EnemyPlacement {
                kind: EnemyKind::Patrol,
                position: Vec3::new(15.0, 0.0, 15.0),
                route: vec![Vec3::new(15.0, 0.0, 15.0), Vec3::new(20.0, 0.0, 20.0)],
            },
            EnemyPlacement {
                kind: EnemyKind::Patrol,
                position: Vec3::new(-15.0, 0.0, -15.0),
                route: vec![Vec3::new(-15.0, 0.0, -15.0), Vec3::new(-20.0, 0.0, -20.0)],
            },
            EnemyPlacement {
                kind: EnemyKind::Patrol,
                position: Vec3::new(10.0, 0.0, -10.0),
                route: vec![Vec3::new(10.0, 0.0, -10.0), Vec3::new(15.0, 0.0, -15.0)],
            },
        ];

        for _ in 0..SCATTERED_ENEMIES {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let distance = rng.gen_range(20.0..ARENA_SIZE * 0.6);
            let kind = EnemyKind::ALL[rng.gen_range(0..EnemyKind::ALL.len())];

            enemies.push(EnemyPlacement {
                kind,
                position: Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance),
                route: Vec::new(),
            });
        }

        let pickup_spots = [
            (PickupKind::Ammo, Vec3::new(8.0, 0.0, 8.0)),
            (PickupKind::Health, Vec3::new(-8.0, 0.0, 8.0)),
            (PickupKind::Ammo, Vec3::new(-40.0, 0.0, -40.0)),
            (PickupKind::Health, Vec3::new(40.0, 0.0, -40.0)),
            (PickupKind::Ammo, Vec3::new(40.0, 0.0, 40.0)),
            (PickupKind::Health, Vec3::new(-40.0, 0.0, 40.0)),
        ];

        let pickups = pickup_spots
            .into_iter()
            .enumerate()
            .map(|(index, (kind, position))| Pickup {
                id: PickupId(index as u32),
                kind,
                position,
            })
            .collect();

        Self {
            player_spawn: Vec3::ZERO,
            enemies,
            pickups,
        }
    }
}

#[derive(Component)]
pub struct LevelGeometry;

#[derive(Component)]
pub struct PickupVisual(pub PickupId);

fn spawn_arena(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(ARENA_SIZE * 2.5, ARENA_SIZE * 2.5))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.18, 0.2, 0.22),
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::from_xyz(0.0, 0.0, 0.0),
        LevelGeometry,
    ));

    let wall_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.35, 0.35, 0.4),
        perceptual_roughness: 0.8,
        ..default()
    });

    let wall_height = 8.0;
    let wall_thickness = 0.5;

    // North, south, east, west
    let walls = [
        (Vec3::new(0.0, wall_height / 2.0, -ARENA_SIZE), Vec3::new(ARENA_SIZE * 2.0, wall_height, wall_thickness)),
        (Vec3::new(0.0, wall_height / 2.0, ARENA_SIZE), Vec3::new(ARENA_SIZE * 2.0, wall_height, wall_thickness)),
        (Vec3::new(ARENA_SIZE, wall_height / 2.0, 0.0), Vec3::new(wall_thickness, wall_height, ARENA_SIZE * 2.0)),
        (Vec3::new(-ARENA_SIZE, wall_height / 2.0, 0.0), Vec3::new(wall_thickness, wall_height, ARENA_SIZE * 2.0)),
    ];

    for (position, size) in walls {
        commands.spawn((
            Mesh3d(meshes.add(Cuboid::new(size.x, size.y, size.z))),
            MeshMaterial3d(wall_material.clone()),
            Transform::from_translation(position),
            LevelGeometry,
        ));
    }

    let light_positions = [
        Vec3::new(0.0, 15.0, 0.0),
        Vec3::new(-50.0, 15.0, -50.0),
        Vec3::new(50.0, 15.0, -50.0),
        Vec3::new(-50.0, 15.0, 50.0),
        Vec3::new(50.0, 15.0, 50.0),
    ];

    for pos in light_positions {
        commands.spawn((
            PointLight {
                intensity: 1000000.0,
                shadows_enabled: true,
                range: 80.0,
                ..default()
            },
            Transform::from_translation(pos),
        ));
    }

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.7, 0.75, 0.8),
        brightness: 300.0,
        ..default()
    });
}

/// (Re)spawn pickup markers for a fresh session
fn spawn_pickups(
    mut commands: Commands,
    layout: Res<ArenaLayout>,
    existing: Query<Entity, With<PickupVisual>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for entity in &existing {
        commands.entity(entity).despawn();
    }

    let mesh = meshes.add(Cuboid::new(0.6, 0.6, 0.6));
    let ammo_material = materials.add(StandardMaterial {
        base_color: Color::srgb(1.0, 0.8, 0.2),
        emissive: LinearRgba::rgb(0.4, 0.3, 0.0),
        ..default()
    });
    let health_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.2, 1.0, 0.4),
        emissive: LinearRgba::rgb(0.0, 0.4, 0.1),
        ..default()
    });

    for pickup in &layout.pickups {
        let material = match pickup.kind {
            PickupKind::Ammo => ammo_material.clone(),
            PickupKind::Health => health_material.clone(),
        };

        commands.spawn((
            Mesh3d(mesh.clone()),
            MeshMaterial3d(material),
            Transform::from_translation(pickup.position + Vec3::Y * 0.5),
            PickupVisual(pickup.id),
        ));
    }
}

fn spin_pickups(mut query: Query<&mut Transform, With<PickupVisual>>, time: Res<Time>) {
    for mut transform in &mut query {
        transform.rotate_y(time.delta_secs() * 1.5);
    }
}

fn remove_collected_pickups(
    mut commands: Commands,
    mut events: EventReader<CombatEvent>,
    query: Query<(Entity, &PickupVisual)>,
) {
    for event in events.read() {
        let CombatEvent::PickupCollected { pickup, .. } = event else {
            continue;
        };

        if let Some((entity, _)) = query.iter().find(|(_, visual)| visual.0 == *pickup) {
            commands.entity(entity).despawn();
        }
    }
}
