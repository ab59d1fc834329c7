use bevy::prelude::*;

/// Player movement constants
#[derive(Resource, Clone, Debug)]
pub struct MovementConfig {
    pub max_speed: f32,         // Walking ground speed (units/sec)
    pub sprint_multiplier: f32, // Ground speed multiplier while sprinting
    pub accelerate: f32,        // Ground acceleration
    pub air_control: f32,       // Fraction of ground acceleration available mid-air
    pub friction: f32,          // Ground friction
    pub stop_speed: f32,        // Speed below which friction stops you instantly
    pub gravity: f32,           // Gravity (units/sec^2)
    pub jump_speed: f32,        // Jump velocity
    pub eye_height: f32,        // Camera height above the feet
    pub max_pitch: f32,         // Look up/down limit (radians)
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_speed: 7.5,
            sprint_multiplier: 1.8,
            accelerate: 8.0,
            air_control: 0.3,
            friction: 5.0,
            stop_speed: 1.8,
            gravity: 20.0,
            jump_speed: 7.0,
            eye_height: 1.6,
            max_pitch: 1.54, // Just shy of straight up/down
        }
    }
}

/// Kinematic state of the player's body. `position` is at the feet.
#[derive(Clone, Copy, Debug)]
pub struct PlayerBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
}

impl PlayerBody {
    pub fn standing_at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            grounded: position.y <= 0.0,
        }
    }
}

impl Default for PlayerBody {
    fn default() -> Self {
        Self::standing_at(Vec3::ZERO)
    }
}

/// What the player is asking the body to do this step
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveIntent {
    /// Normalized horizontal direction (or zero)
    pub wish_dir: Vec3,
    pub sprint: bool,
    pub jump: bool,
}

/// World-space horizontal wish direction from look yaw and -1..1 axis input
pub fn wish_direction(yaw: f32, forward: f32, strafe: f32) -> Vec3 {
    let rotation = Quat::from_rotation_y(yaw);
    let forward_dir = rotation * Vec3::NEG_Z;
    let right_dir = rotation * Vec3::X;

    let wish = forward_dir * forward + right_dir * strafe;
    Vec3::new(wish.x, 0.0, wish.z).normalize_or_zero()
}

/// Quake-style ground acceleration
pub fn accelerate(
    velocity: Vec3,
    wish_dir: Vec3,
    wish_speed: f32,
    accel: f32,
    dt: f32,
) -> Vec3 {
    let current_speed = velocity.dot(wish_dir);
    let add_speed = wish_speed - current_speed;

    if add_speed <= 0.0 {
        return velocity;
    }

    let accel_speed = (accel * wish_speed * dt).min(add_speed);
    velocity + wish_dir * accel_speed
}

/// Apply ground friction
pub fn apply_friction(velocity: Vec3, friction: f32, stop_speed: f32, dt: f32) -> Vec3 {
    let speed = velocity.length();

    if speed < 0.1 {
        return Vec3::ZERO;
    }

    let control = speed.max(stop_speed);
    let drop = control * friction * dt;
    let new_speed = (speed - drop).max(0.0);

    if new_speed > 0.0 {
        velocity * (new_speed / speed)
    } else {
        Vec3::ZERO
    }
}

/// Advance the body one step and keep it inside +-`half_extent` on X/Z.
/// Returns true when the player left the ground with a jump this step.
pub fn step_player(
    body: &mut PlayerBody,
    intent: &MoveIntent,
    config: &MovementConfig,
    half_extent: f32,
    dt: f32,
) -> bool {
    let mut horizontal = Vec3::new(body.velocity.x, 0.0, body.velocity.z);
    let mut vertical = body.velocity.y;
    let mut jumped = false;

    let wish_speed = if intent.sprint {
        config.max_speed * config.sprint_multiplier
    } else {
        config.max_speed
    };

    if body.grounded {
        if intent.jump {
            vertical = config.jump_speed;
            body.grounded = false;
            jumped = true;
        } else {
            // No friction on the jump frame so speed carries into the air
            horizontal = apply_friction(horizontal, config.friction, config.stop_speed, dt);
        }
        horizontal = accelerate(horizontal, intent.wish_dir, wish_speed, config.accelerate, dt);
    } else {
        horizontal = accelerate(
            horizontal,
            intent.wish_dir,
            wish_speed,
            config.accelerate * config.air_control,
            dt,
        );
    }

    if !body.grounded {
        vertical -= config.gravity * dt;
    }

    body.velocity = Vec3::new(horizontal.x, vertical, horizontal.z);
    body.position += body.velocity * dt;

    if body.position.y <= 0.0 {
        body.position.y = 0.0;
        body.velocity.y = 0.0;
        body.grounded = true;
    }

    // Arena walls
    if body.position.x.abs() > half_extent {
        body.position.x = body.position.x.clamp(-half_extent, half_extent);
        body.velocity.x = 0.0;
    }
    if body.position.z.abs() > half_extent {
        body.position.z = body.position.z.clamp(-half_extent, half_extent);
        body.velocity.z = 0.0;
    }

    jumped
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;
    const DT: f32 = 0.016;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    fn walk(dir: Vec3) -> MoveIntent {
        MoveIntent { wish_dir: dir, ..default() }
    }

    // ==================== MovementConfig Tests ====================

    #[test]
    fn test_movement_config_defaults() {
        let config = MovementConfig::default();

        assert!(approx_eq(config.max_speed, 7.5));
        assert!(approx_eq(config.sprint_multiplier, 1.8));
        assert!(approx_eq(config.eye_height, 1.6));
        assert!(config.air_control < 1.0);
    }

    // ==================== Wish Direction Tests ====================

    #[test]
    fn test_wish_direction_forward_is_neg_z() {
        assert!(vec3_approx_eq(wish_direction(0.0, 1.0, 0.0), Vec3::NEG_Z));
        assert!(vec3_approx_eq(wish_direction(0.0, 0.0, 1.0), Vec3::X));
    }

    #[test]
    fn test_wish_direction_diagonal_is_normalized() {
        let dir = wish_direction(0.7, 1.0, -1.0);
        assert!(approx_eq(dir.length(), 1.0));
        assert!(approx_eq(dir.y, 0.0));
    }

    #[test]
    fn test_wish_direction_no_input() {
        assert_eq!(wish_direction(1.2, 0.0, 0.0), Vec3::ZERO);
    }

    // ==================== Accelerate Tests ====================

    #[test]
    fn test_accelerate_from_standstill() {
        let result = accelerate(Vec3::ZERO, Vec3::NEG_Z, 8.0, 10.0, DT);

        assert!(result.z < 0.0);
        assert!(approx_eq(result.x, 0.0));
        assert!(approx_eq(result.y, 0.0));
    }

    #[test]
    fn test_accelerate_already_at_max_speed() {
        let velocity = Vec3::new(0.0, 0.0, -8.0);
        let result = accelerate(velocity, Vec3::NEG_Z, 8.0, 10.0, DT);

        assert!(vec3_approx_eq(result, velocity));
    }

    #[test]
    fn test_accelerate_perpendicular_strafe() {
        let velocity = Vec3::new(0.0, 0.0, -8.0);
        let result = accelerate(velocity, Vec3::X, 8.0, 10.0, DT);

        assert!(result.x > 0.0);
        assert!(approx_eq(result.z, velocity.z));
    }

    #[test]
    fn test_ground_movement_caps_at_wish_speed() {
        let mut velocity = Vec3::ZERO;
        for _ in 0..1000 {
            velocity = accelerate(velocity, Vec3::NEG_Z, 8.0, 10.0, DT);
        }

        assert!(velocity.length() <= 8.0 + EPSILON);
    }

    // ==================== Friction Tests ====================

    #[test]
    fn test_friction_reduces_speed() {
        let velocity = Vec3::new(0.0, 0.0, -8.0);
        let result = apply_friction(velocity, 6.0, 2.5, DT);

        assert!(result.length() < velocity.length());
        assert!(result.z < 0.0);
    }

    #[test]
    fn test_friction_stops_slow_movement() {
        let result = apply_friction(Vec3::new(0.0, 0.0, -0.05), 6.0, 2.5, DT);
        assert!(vec3_approx_eq(result, Vec3::ZERO));
    }

    #[test]
    fn test_friction_preserves_direction() {
        let velocity = Vec3::new(3.0, 0.0, -4.0);
        let result = apply_friction(velocity, 6.0, 2.5, DT);

        assert!(vec3_approx_eq(velocity.normalize(), result.normalize()));
    }

    // ==================== Step Tests ====================

    #[test]
    fn test_sprint_is_faster_than_walk() {
        let config = MovementConfig::default();
        let mut walker = PlayerBody::default();
        let mut sprinter = PlayerBody::default();
        let sprint = MoveIntent { wish_dir: Vec3::NEG_Z, sprint: true, jump: false };

        for _ in 0..300 {
            step_player(&mut walker, &walk(Vec3::NEG_Z), &config, 1000.0, DT);
            step_player(&mut sprinter, &sprint, &config, 1000.0, DT);
        }

        let walk_speed = walker.velocity.length();
        let sprint_speed = sprinter.velocity.length();
        assert!(walk_speed <= config.max_speed + EPSILON);
        assert!(sprint_speed > walk_speed * 1.7);
        assert!(sprint_speed <= config.max_speed * config.sprint_multiplier + EPSILON);
    }

    #[test]
    fn test_jump_leaves_ground_and_lands() {
        let config = MovementConfig::default();
        let mut body = PlayerBody::default();
        let jump = MoveIntent { jump: true, ..default() };

        assert!(step_player(&mut body, &jump, &config, 100.0, DT));
        assert!(!body.grounded);
        assert!(body.position.y > 0.0);

        // Holding jump mid-air doesn't jump again
        assert!(!step_player(&mut body, &jump, &config, 100.0, DT));

        let mut steps = 0;
        while !body.grounded {
            step_player(&mut body, &MoveIntent::default(), &config, 100.0, DT);
            steps += 1;
            assert!(steps < 500);
        }
        assert!(approx_eq(body.position.y, 0.0));
        assert!(approx_eq(body.velocity.y, 0.0));
    }

    #[test]
    fn test_arena_walls_stop_the_player() {
        let config = MovementConfig::default();
        let mut body = PlayerBody::standing_at(Vec3::new(9.9, 0.0, 0.0));

        for _ in 0..100 {
            step_player(&mut body, &walk(Vec3::X), &config, 10.0, DT);
        }

        assert!(approx_eq(body.position.x, 10.0));
        assert!(body.velocity.x <= config.accelerate * config.max_speed * DT + EPSILON);
    }

    #[test]
    fn test_idle_body_comes_to_rest() {
        let config = MovementConfig::default();
        let mut body = PlayerBody::default();
        body.velocity = Vec3::new(5.0, 0.0, 0.0);

        for _ in 0..200 {
            step_player(&mut body, &MoveIntent::default(), &config, 100.0, DT);
        }

        assert!(vec3_approx_eq(body.velocity, Vec3::ZERO));
    }
}
