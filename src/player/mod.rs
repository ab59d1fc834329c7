use bevy::ecs::hierarchy::ChildOf;
use bevy::prelude::*;
use bevy::window::{CursorGrabMode, WindowFocused};

use crate::GameState;
use crate::combat::{CombatEvent, CombatSession, CombatSet};

pub mod input;
pub mod movement;

use input::{ControlIntent, gather_intent, release_intent};
use movement::MovementConfig;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MovementConfig>()
            .init_resource::<ControlIntent>()
            .add_systems(Startup, spawn_player_camera)
            .add_systems(OnEnter(GameState::Playing), grab_cursor)
            .add_systems(OnExit(GameState::Playing), (release_cursor, release_intent))
            .add_systems(OnEnter(GameState::Menu), reset_view)
            .add_systems(
                Update,
                (handle_window_focus, gather_intent)
                    .chain()
                    .run_if(in_state(GameState::Playing)),
            )
            .add_systems(
                Update,
                (kick_viewmodel, update_player_camera)
                    .chain()
                    .after(CombatSet::Publish),
            );
    }
}

#[derive(Component)]
pub struct PlayerCamera;

/// Tracks view effects: bob, landing impact, lean
#[derive(Component, Default)]
pub struct ViewSway {
    pub bob_time: f32,
    pub bob_amount: Vec3,
    pub landing_offset: f32,
    pub velocity_tilt: Vec2, // Roll and pitch from velocity
    pub prev_velocity_y: f32,
}

/// Marker for the viewmodel (arms/weapon)
#[derive(Component)]
pub struct ViewModel {
    pub rest: Vec3,
    pub kick: f32,
}

fn spawn_player_camera(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<MovementConfig>,
) {
    let camera = commands
        .spawn((
            Camera3d::default(),
            Projection::Perspective(PerspectiveProjection {
                fov: 75.0_f32.to_radians(),
                ..default()
            }),
            Transform::from_xyz(0.0, config.eye_height, 0.0),
            PlayerCamera,
            ViewSway::default(),
        ))
        .id();

    let gun_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.2, 0.2, 0.22),
        metallic: 0.6,
        perceptual_roughness: 0.4,
        ..default()
    });
    let hand_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.8, 0.6, 0.5), // Skin-ish color
        perceptual_roughness: 0.8,
        ..default()
    });

    // Gun body, down and to the right of the view
    let rest = Vec3::new(0.2, -0.18, -0.45);
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(0.08, 0.1, 0.5))),
        MeshMaterial3d(gun_material),
        Transform::from_translation(rest),
        ViewModel { rest, kick: 0.0 },
        ChildOf(camera),
    ));

    let rest = Vec3::new(0.2, -0.26, -0.3);
    commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(0.07, 0.12, 0.08))),
        MeshMaterial3d(hand_material),
        Transform::from_translation(rest),
        ViewModel { rest, kick: 0.0 },
        ChildOf(camera),
    ));
}

fn grab_cursor(mut windows: Query<&mut Window>) {
    if let Ok(mut window) = windows.single_mut() {
        window.cursor_options.grab_mode = CursorGrabMode::Locked;
        window.cursor_options.visible = false;
    }
}

fn release_cursor(mut windows: Query<&mut Window>) {
    if let Ok(mut window) = windows.single_mut() {
        window.cursor_options.grab_mode = CursorGrabMode::None;
        window.cursor_options.visible = true;
    }
}

fn handle_window_focus(
    mut focus_events: EventReader<WindowFocused>,
    mut windows: Query<&mut Window>,
    mut intent: ResMut<ControlIntent>,
) {
    for event in focus_events.read() {
        if let Ok(mut window) = windows.single_mut() {
            if event.focused {
                window.cursor_options.grab_mode = CursorGrabMode::Locked;
                window.cursor_options.visible = false;
            } else {
                window.cursor_options.grab_mode = CursorGrabMode::None;
                window.cursor_options.visible = true;
                // Keys released while unfocused never report a release
                intent.release_all();
            }
        }
    }
}

/// New sessions start looking down -Z
fn reset_view(mut intent: ResMut<ControlIntent>) {
    *intent = ControlIntent::default();
}

/// Vertical and sideways bob for a given phase
pub fn view_bob(phase: f32) -> Vec3 {
    Vec3::new(phase.sin() * 0.03, (phase * 2.0).sin().abs() * 0.04, 0.0)
}

/// Roll and pitch lean for velocity seen from the given yaw
pub fn velocity_lean(velocity: Vec3, yaw: f32) -> Vec2 {
    let forward = Quat::from_rotation_y(yaw) * Vec3::NEG_Z;
    let right = Quat::from_rotation_y(yaw) * Vec3::X;

    let roll = -(velocity.dot(right) / 60.0).clamp(-0.03, 0.03);
    let pitch = (velocity.dot(forward) / 100.0).clamp(-0.015, 0.015);
    Vec2::new(roll, pitch)
}

/// Place the camera at the session player's eye, with sway on top
fn update_player_camera(
    session: Res<CombatSession>,
    intent: Res<ControlIntent>,
    mut camera_query: Query<(&mut Transform, &mut ViewSway), With<PlayerCamera>>,
    mut viewmodel_query: Query<(&mut Transform, &mut ViewModel), Without<PlayerCamera>>,
    time: Res<Time>,
) {
    let Ok((mut transform, mut sway)) = camera_query.single_mut() else {
        return;
    };

    let dt = time.delta_secs();
    let body = &session.player.body;
    let horiz_speed = Vec2::new(body.velocity.x, body.velocity.z).length();

    // Landing impact, detected from a sharp stop in vertical speed
    let was_falling = sway.prev_velocity_y < -2.0;
    if was_falling && body.velocity.y >= 0.0 {
        let impact = (sway.prev_velocity_y.abs() / 160.0).clamp(0.025, 0.1);
        sway.landing_offset = sway.landing_offset * 0.3 - impact * 0.7;
    }
    sway.prev_velocity_y = body.velocity.y;
    sway.landing_offset *= (1.0 - dt * 8.0).max(0.0);

    if body.grounded && horiz_speed > 0.5 {
        sway.bob_time += dt * 10.0;
        sway.bob_amount = view_bob(sway.bob_time);
    } else {
        sway.bob_amount *= (1.0 - dt * 8.0).max(0.0);
    }

    // Mouse look is applied at frame rate; the session only sees it per tick
    let (yaw, pitch) = (intent.yaw, intent.pitch);
    let target = velocity_lean(body.velocity, yaw);
    let tilt = sway.velocity_tilt;
    sway.velocity_tilt = tilt + (target - tilt) * (dt * 5.0).min(1.0);

    let eye = session.player.eye(session.movement.eye_height);
    let rotation = Quat::from_euler(EulerRot::YXZ, yaw, pitch + sway.velocity_tilt.y, sway.velocity_tilt.x);
    transform.translation = eye + rotation * Vec3::new(sway.bob_amount.x, sway.bob_amount.y, 0.0)
        + Vec3::Y * sway.landing_offset;
    transform.rotation = rotation;

    for (mut vm_transform, mut viewmodel) in &mut viewmodel_query {
        viewmodel.kick *= (1.0 - dt * 12.0).max(0.0);
        vm_transform.translation = viewmodel.rest
            + Vec3::new(-sway.velocity_tilt.x * 0.8, sway.landing_offset * 0.5, viewmodel.kick);
        vm_transform.rotation = Quat::from_rotation_x(viewmodel.kick * 1.5);
    }
}

fn kick_viewmodel(mut events: EventReader<CombatEvent>, mut viewmodels: Query<&mut ViewModel>) {
    let fired = events
        .read()
        .filter(|event| matches!(event, CombatEvent::ShotFired { .. }))
        .count();
    if fired == 0 {
        return;
    }

    for mut viewmodel in &mut viewmodels {
        viewmodel.kick = (viewmodel.kick + 0.06).min(0.12);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_bob_never_dips_below_eye() {
        for step in 0..100 {
            let bob = view_bob(step as f32 * 0.13);
            assert!(bob.y >= 0.0);
            assert!(bob.x.abs() <= 0.03 + EPSILON);
        }
    }

    #[test]
    fn test_lean_follows_strafe_direction() {
        // Strafing right at yaw 0 rolls the view left
        let lean = velocity_lean(Vec3::new(10.0, 0.0, 0.0), 0.0);
        assert!(lean.x < 0.0);
        assert!(approx_eq(lean.y, 0.0));

        // Fast forward run is capped
        let lean = velocity_lean(Vec3::new(0.0, 0.0, -100.0), 0.0);
        assert!(approx_eq(lean.y, 0.015));
    }

    #[test]
    fn test_lean_rotates_with_yaw() {
        // Facing -X, moving -X is forward motion
        let yaw = std::f32::consts::FRAC_PI_2;
        let lean = velocity_lean(Vec3::new(-1.0, 0.0, 0.0), yaw);
        assert!(lean.y > 0.0);
        assert!(approx_eq(lean.x, 0.0));
    }
}
