//! Keyboard and mouse mapped onto intent flags for the combat tick
//!
//! Gathered every frame in `Update`. One-shot requests (jump, weapon select,
//! reload) latch until a fixed tick consumes them, so a press is never lost
//! between fixed steps.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;

use super::movement::MovementConfig;
use crate::combat::weapons::WeaponKey;

const MOUSE_SENSITIVITY: f32 = 0.0004;

const WEAPON_KEYS: [(KeyCode, WeaponKey); 5] = [
    (KeyCode::Digit1, WeaponKey::Pistol),
    (KeyCode::Digit2, WeaponKey::Rifle),
    (KeyCode::Digit3, WeaponKey::Shotgun),
    (KeyCode::Digit4, WeaponKey::Sniper),
    (KeyCode::Digit5, WeaponKey::Grenade),
];

#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlIntent {
    pub forward: f32, // -1..1, W/S
    pub strafe: f32,  // -1..1, D/A
    pub sprint: bool,
    pub fire_held: bool,
    pub yaw: f32,
    pub pitch: f32,
    pub jump: bool,
    pub select: Option<WeaponKey>,
    pub reload: bool,
}

impl ControlIntent {
    /// Clear the one-shot requests after a tick has acted on them
    pub fn consume_triggers(&mut self) {
        self.jump = false;
        self.select = None;
        self.reload = false;
    }

    /// Let go of everything but keep the view direction
    pub fn release_all(&mut self) {
        *self = Self {
            yaw: self.yaw,
            pitch: self.pitch,
            ..default()
        };
    }
}

pub fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// Turn accumulated mouse motion into yaw/pitch
pub fn apply_look(intent: &mut ControlIntent, delta: Vec2, max_pitch: f32) {
    intent.yaw -= delta.x * MOUSE_SENSITIVITY;
    intent.pitch = (intent.pitch - delta.y * MOUSE_SENSITIVITY).clamp(-max_pitch, max_pitch);
}

pub fn gather_intent(
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    config: Res<MovementConfig>,
    mut intent: ResMut<ControlIntent>,
) {
    let mut delta = Vec2::ZERO;
    for event in mouse_motion.read() {
        delta += event.delta;
    }
    if delta != Vec2::ZERO {
        apply_look(&mut intent, delta, config.max_pitch);
    }

    intent.forward = axis(keyboard.pressed(KeyCode::KeyW), keyboard.pressed(KeyCode::KeyS));
    intent.strafe = axis(keyboard.pressed(KeyCode::KeyD), keyboard.pressed(KeyCode::KeyA));
    intent.sprint = keyboard.pressed(KeyCode::ShiftLeft);
    intent.fire_held = mouse.pressed(MouseButton::Left);

    if keyboard.just_pressed(KeyCode::Space) {
        intent.jump = true;
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        intent.reload = true;
    }
    if let Some((_, key)) = WEAPON_KEYS.iter().find(|(code, _)| keyboard.just_pressed(*code)) {
        intent.select = Some(*key);
    }
}

pub fn release_intent(mut intent: ResMut<ControlIntent>) {
    intent.release_all();
}
