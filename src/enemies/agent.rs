//! Per-enemy behaviour: distance-driven state machine plus a movement policy per kind

use std::time::Duration;

use bevy::prelude::*;
use rand::Rng;

use crate::combat::damage::{DamageOutcome, Health, distance_falloff};
use crate::combat::hitscan::HitVolume;

/// Distance under which a route waypoint counts as reached
pub const WAYPOINT_ARRIVAL: f32 = 1.0;
/// Wandering is looser about arrival than following a route
pub const WANDER_ARRIVAL: f32 = 3.0;
/// Wander targets are picked within +-this of the current position
pub const WANDER_RANGE: f32 = 20.0;
/// Height of the hit sphere's centre above an enemy's feet
pub const BODY_CENTER_HEIGHT: f32 = 1.0;

const ALERT_RISE_PER_SEC: f32 = 2.0;
const ALERT_DECAY_PER_SEC: f32 = 1.0;

/// Stable identifier, independent of any render entity
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct EnemyId(pub u32);

/// Enemy type determines movement policy and strike strength
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum EnemyKind {
    Aggressive, // Charges straight in
    Sniper,     // Keeps its distance, hits hard
    #[default]
    Patrol,     // Walks a route or wanders, chases on sight
    Guard,      // Only advances while the player is inside its band
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 4] = [
        EnemyKind::Aggressive,
        EnemyKind::Sniper,
        EnemyKind::Patrol,
        EnemyKind::Guard,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EnemyKind::Aggressive => "aggressive",
            EnemyKind::Sniper => "sniper",
            EnemyKind::Patrol => "patrol",
            EnemyKind::Guard => "guard",
        }
    }

    pub fn damage_multiplier(&self) -> f32 {
        match self {
            EnemyKind::Sniper => 1.5,
            EnemyKind::Aggressive => 1.2,
            EnemyKind::Patrol | EnemyKind::Guard => 1.0,
        }
    }
}

/// AI behaviour states
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum EnemyState {
    #[default]
    Patrol,
    Chase,
    Attack,
    Dead,
}

/// Enemy stats
#[derive(Clone, Debug)]
pub struct EnemyProfile {
    pub max_health: f32,
    pub detection_radius: f32,
    pub attack_radius: f32,
    pub attack_damage: f32,
    pub attack_cooldown: Duration,
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub hit_radius: f32,
    pub retreat_within: f32,    // Snipers back off when the player is closer than this
    pub guard_band: (f32, f32), // Guards advance while the player is in [min, max)
}

impl EnemyProfile {
    pub fn for_kind(kind: EnemyKind) -> Self {
        match kind {
            EnemyKind::Aggressive => Self {
                max_health: 100.0,
                detection_radius: 30.0,
                attack_radius: 10.0,
                attack_damage: 15.0,
                attack_cooldown: Duration::from_millis(2000),
                patrol_speed: 1.5,
                chase_speed: 5.0,
                hit_radius: 1.0,
                retreat_within: 0.0,
                guard_band: (0.0, 0.0),
            },
            EnemyKind::Sniper => Self {
                max_health: 70.0,
                detection_radius: 35.0,
                attack_radius: 25.0,
                attack_damage: 15.0,
                attack_cooldown: Duration::from_millis(2000),
                patrol_speed: 1.0,
                chase_speed: 2.5,
                hit_radius: 0.9,
                retreat_within: 15.0,
                guard_band: (0.0, 0.0),
            },
            EnemyKind::Patrol => Self {
                max_health: 50.0,
                detection_radius: 15.0,
                attack_radius: 3.0,
                attack_damage: 10.0,
                attack_cooldown: Duration::from_millis(1500),
                patrol_speed: 2.0,
                chase_speed: 4.5,
                hit_radius: 1.0,
                retreat_within: 0.0,
                guard_band: (0.0, 0.0),
            },
            EnemyKind::Guard => Self {
                max_health: 120.0,
                detection_radius: 25.0,
                attack_radius: 12.0,
                attack_damage: 15.0,
                attack_cooldown: Duration::from_millis(2000),
                patrol_speed: 0.0,
                chase_speed: 3.0,
                hit_radius: 1.1,
                retreat_within: 0.0,
                guard_band: (12.0, 20.0),
            },
        }
    }
}

/// What an enemy needs to know about the world for one update
#[derive(Clone, Copy, Debug)]
pub struct AgentContext {
    pub now: Duration,
    pub dt: f32,
    pub player_position: Vec3,
    pub arena_half_extent: f32,
}

/// Damage an enemy lands on the player this tick
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Strike {
    pub damage: f32,
    pub distance: f32,
}

/// Pick the state for a given distance to the player
pub fn classify(distance: f32, detection_radius: f32, attack_radius: f32) -> EnemyState {
    if distance >= detection_radius {
        EnemyState::Patrol
    } else if distance >= attack_radius {
        EnemyState::Chase
    } else {
        EnemyState::Attack
    }
}

/// Strike damage after kind scaling and distance falloff, floored to whole points
pub fn strike_damage(base: f32, kind: EnemyKind, distance: f32, range: f32) -> f32 {
    (base * kind.damage_multiplier() * distance_falloff(distance, range)).floor()
}

/// Horizontal step from `from` toward `to`, never overshooting.
/// Returns `from` unchanged when the two coincide.
fn step_toward(from: Vec3, to: Vec3, max_step: f32) -> Vec3 {
    let offset = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
    let Some(direction) = offset.try_normalize() else {
        return from;
    };
    from + direction * max_step.clamp(0.0, offset.length())
}

fn step_away(from: Vec3, threat: Vec3, max_step: f32) -> Vec3 {
    let offset = Vec3::new(from.x - threat.x, 0.0, from.z - threat.z);
    let Some(direction) = offset.try_normalize() else {
        return from;
    };
    from + direction * max_step.max(0.0)
}

fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: EnemyId,
    pub kind: EnemyKind,
    pub profile: EnemyProfile,
    pub position: Vec3,
    pub health: Health,
    pub state: EnemyState,
    pub route: Vec<Vec3>,
    pub route_index: usize,
    pub wander_target: Option<Vec3>,
    pub last_attack: Duration,
    pub alert: f32,
    pub lunging: bool,
}

impl Enemy {
    /// New enemy at full health. Its first strike comes one cooldown after `spawned_at`.
    pub fn new(id: EnemyId, kind: EnemyKind, position: Vec3, spawned_at: Duration) -> Self {
        let profile = EnemyProfile::for_kind(kind);
        Self {
            id,
            kind,
            health: Health::new(profile.max_health),
            profile,
            position,
            state: EnemyState::Patrol,
            route: Vec::new(),
            route_index: 0,
            wander_target: None,
            last_attack: spawned_at,
            alert: 0.0,
            lunging: false,
        }
    }

    pub fn with_route(mut self, route: Vec<Vec3>) -> Self {
        self.route = route;
        self.route_index = 0;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.state != EnemyState::Dead && !self.health.is_dead()
    }

    pub fn hit_volume(&self) -> HitVolume {
        HitVolume {
            enemy: self.id,
            center: self.position + Vec3::Y * BODY_CENTER_HEIGHT,
            radius: self.profile.hit_radius,
        }
    }

    /// Apply damage. Dead enemies ignore further hits.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if !self.is_alive() {
            return DamageOutcome::Ignored;
        }

        let dealt = self.health.take_damage(amount);
        self.alert = 1.0;

        if self.health.is_dead() {
            self.state = EnemyState::Dead;
            self.lunging = false;
            DamageOutcome::Killed { dealt }
        } else {
            DamageOutcome::Wounded { dealt, remaining: self.health.current }
        }
    }

    /// Run one frame of AI. Returns the strike landed on the player, if any.
    pub fn update(&mut self, ctx: &AgentContext, rng: &mut impl Rng) -> Option<Strike> {
        if !self.is_alive() {
            self.state = EnemyState::Dead;
            return None;
        }

        let distance = self.position.distance(ctx.player_position);
        self.state = classify(distance, self.profile.detection_radius, self.profile.attack_radius);

        if self.state == EnemyState::Patrol {
            self.alert = (self.alert - ALERT_DECAY_PER_SEC * ctx.dt).max(0.0);
        } else {
            self.alert = (self.alert + ALERT_RISE_PER_SEC * ctx.dt).min(1.0);
        }

        let strike = match self.state {
            EnemyState::Patrol => {
                self.patrol(ctx, rng);
                None
            }
            EnemyState::Chase => {
                self.pursue(ctx, distance);
                None
            }
            EnemyState::Attack => {
                let strike = self.try_strike(ctx.now, distance);
                // Snipers keep backing off while they shoot
                if self.kind == EnemyKind::Sniper {
                    self.pursue(ctx, distance);
                }
                strike
            }
            EnemyState::Dead => None,
        };

        let bounds = ctx.arena_half_extent;
        self.position.x = self.position.x.clamp(-bounds, bounds);
        self.position.z = self.position.z.clamp(-bounds, bounds);

        strike
    }

    fn patrol(&mut self, ctx: &AgentContext, rng: &mut impl Rng) {
        let step = self.profile.patrol_speed * ctx.dt;

        if !self.route.is_empty() {
            let index = self.route_index % self.route.len();
            let target = self.route[index];

            if horizontal_distance(self.position, target) < WAYPOINT_ARRIVAL {
                self.route_index = (index + 1) % self.route.len();
                return;
            }

            self.position = step_toward(self.position, target, step);
            return;
        }

        // Without a route only patrol-type enemies roam; the rest stand their ground
        if self.kind != EnemyKind::Patrol {
            return;
        }

        let target = match self.wander_target {
            Some(target) if horizontal_distance(self.position, target) >= WANDER_ARRIVAL => target,
            _ => {
                let bounds = ctx.arena_half_extent;
                let target = Vec3::new(
                    (self.position.x + rng.gen_range(-WANDER_RANGE..WANDER_RANGE)).clamp(-bounds, bounds),
                    self.position.y,
                    (self.position.z + rng.gen_range(-WANDER_RANGE..WANDER_RANGE)).clamp(-bounds, bounds),
                );
                self.wander_target = Some(target);
                return;
            }
        };

        self.position = step_toward(self.position, target, step);
    }

    fn pursue(&mut self, ctx: &AgentContext, distance: f32) {
        let step = self.profile.chase_speed * ctx.dt;
        let player = ctx.player_position;

        match self.kind {
            EnemyKind::Aggressive | EnemyKind::Patrol => {
                // Stop short so the enemy doesn't walk through the player
                let room = distance - self.profile.attack_radius * 0.5;
                self.position = step_toward(self.position, player, step.min(room));
            }
            EnemyKind::Sniper => {
                if distance < self.profile.retreat_within {
                    self.position = step_away(self.position, player, step);
                }
            }
            EnemyKind::Guard => {
                let (near, far) = self.profile.guard_band;
                if distance >= near && distance < far {
                    self.position = step_toward(self.position, player, step);
                }
            }
        }
    }

    fn try_strike(&mut self, now: Duration, distance: f32) -> Option<Strike> {
        if now.saturating_sub(self.last_attack) <= self.profile.attack_cooldown {
            return None;
        }

        self.last_attack = now;
        self.lunging = true;

        Some(Strike {
            damage: strike_damage(self.profile.attack_damage, self.kind, distance, self.profile.attack_radius),
            distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPSILON: f32 = 0.0001;
    const DT: f32 = 0.016;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn ctx(now_ms: u64, player: Vec3) -> AgentContext {
        AgentContext {
            now: Duration::from_millis(now_ms),
            dt: DT,
            player_position: player,
            arena_half_extent: 100.0,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    // ==================== Classification ====================

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(15.0, 15.0, 3.0), EnemyState::Patrol);
        assert_eq!(classify(40.0, 15.0, 3.0), EnemyState::Patrol);
        assert_eq!(classify(14.99, 15.0, 3.0), EnemyState::Chase);
        assert_eq!(classify(3.0, 15.0, 3.0), EnemyState::Chase);
        assert_eq!(classify(2.99, 15.0, 3.0), EnemyState::Attack);
        assert_eq!(classify(0.0, 15.0, 3.0), EnemyState::Attack);
    }

    #[test]
    fn test_classify_sweep() {
        let (detection, attack) = (20.0, 5.0);
        for step in 0..300 {
            let d = step as f32 * 0.1;
            let expected = if d >= detection {
                EnemyState::Patrol
            } else if d >= attack {
                EnemyState::Chase
            } else {
                EnemyState::Attack
            };
            assert_eq!(classify(d, detection, attack), expected);
        }
    }

    // ==================== Patrol ====================

    #[test]
    fn test_patrol_walks_toward_waypoint() {
        let mut enemy = Enemy::new(EnemyId(1), EnemyKind::Patrol, Vec3::ZERO, Duration::ZERO)
            .with_route(vec![Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 10.0)]);

        enemy.update(&ctx(0, Vec3::new(0.0, 0.0, 100.0)), &mut rng());

        assert_eq!(enemy.state, EnemyState::Patrol);
        assert!(approx_eq(enemy.position.x, 2.0 * DT));
        assert!(approx_eq(enemy.position.z, 0.0));
    }

    #[test]
    fn test_patrol_route_wraps() {
        let route = vec![Vec3::new(0.5, 0.0, 0.0), Vec3::new(30.0, 0.0, 0.0)];
        let mut enemy = Enemy::new(EnemyId(1), EnemyKind::Patrol, Vec3::ZERO, Duration::ZERO).with_route(route);
        let far = ctx(0, Vec3::new(0.0, 0.0, 90.0));

        enemy.update(&far, &mut rng());
        assert_eq!(enemy.route_index, 1);

        enemy.position = Vec3::new(29.5, 0.0, 0.0);
        enemy.update(&far, &mut rng());
        assert_eq!(enemy.route_index, 0);
    }

    #[test]
    fn test_patrol_target_on_top_of_enemy_is_safe() {
        let spot = Vec3::new(4.0, 0.0, 4.0);
        let mut enemy = Enemy::new(EnemyId(1), EnemyKind::Patrol, spot, Duration::ZERO).with_route(vec![spot]);

        enemy.update(&ctx(0, Vec3::new(80.0, 0.0, 80.0)), &mut rng());

        assert!(enemy.position.is_finite());
        assert_eq!(enemy.route_index, 0);
        assert_eq!(enemy.position, spot);
    }

    #[test]
    fn test_wander_without_route_picks_target() {
        let mut enemy = Enemy::new(EnemyId(1), EnemyKind::Patrol, Vec3::ZERO, Duration::ZERO);
        let mut rng = rng();
        let far = ctx(0, Vec3::new(90.0, 0.0, 90.0));

        enemy.update(&far, &mut rng);
        let target = enemy.wander_target.expect("wander target picked");
        assert!(target.x.abs() <= WANDER_RANGE && target.z.abs() <= WANDER_RANGE);

        for _ in 0..10 {
            enemy.update(&far, &mut rng);
        }
        assert!(enemy.position.is_finite());
    }

    #[test]
    fn test_guard_holds_position_without_route() {
        let start = Vec3::new(5.0, 0.0, 5.0);
        let mut enemy = Enemy::new(EnemyId(1), EnemyKind::Guard, start, Duration::ZERO);

        enemy.update(&ctx(0, Vec3::new(90.0, 0.0, 90.0)), &mut rng());

        assert_eq!(enemy.state, EnemyState::Patrol);
        assert_eq!(enemy.position, start);
    }

    // ==================== Chase ====================

    #[test]
    fn test_chase_moves_faster_than_patrol() {
        let mut chaser = Enemy::new(EnemyId(1), EnemyKind::Patrol, Vec3::ZERO, Duration::ZERO);
        chaser.update(&ctx(0, Vec3::new(10.0, 0.0, 0.0)), &mut rng());

        assert_eq!(chaser.state, EnemyState::Chase);
        let chase_step = chaser.position.x;
        assert!(approx_eq(chase_step, 4.5 * DT));
        assert!(chase_step > chaser.profile.patrol_speed * DT);
    }

    #[test]
    fn test_sniper_retreats_when_crowded() {
        let mut sniper = Enemy::new(EnemyId(1), EnemyKind::Sniper, Vec3::ZERO, Duration::ZERO);
        sniper.update(&ctx(0, Vec3::new(10.0, 0.0, 0.0)), &mut rng());

        assert_eq!(sniper.state, EnemyState::Attack);
        assert!(sniper.position.x < 0.0);
    }

    #[test]
    fn test_sniper_holds_at_range() {
        let mut sniper = Enemy::new(EnemyId(1), EnemyKind::Sniper, Vec3::ZERO, Duration::ZERO);
        sniper.update(&ctx(0, Vec3::new(30.0, 0.0, 0.0)), &mut rng());

        assert_eq!(sniper.state, EnemyState::Chase);
        assert_eq!(sniper.position, Vec3::ZERO);
    }

    #[test]
    fn test_guard_advances_only_inside_band() {
        let mut guard = Enemy::new(EnemyId(1), EnemyKind::Guard, Vec3::ZERO, Duration::ZERO);
        guard.update(&ctx(0, Vec3::new(22.0, 0.0, 0.0)), &mut rng());
        assert_eq!(guard.state, EnemyState::Chase);
        assert_eq!(guard.position, Vec3::ZERO);

        guard.update(&ctx(16, Vec3::new(15.0, 0.0, 0.0)), &mut rng());
        assert!(guard.position.x > 0.0);
    }

    #[test]
    fn test_alert_rises_and_decays() {
        let mut enemy = Enemy::new(EnemyId(1), EnemyKind::Patrol, Vec3::ZERO, Duration::ZERO);
        for _ in 0..10 {
            enemy.update(&ctx(0, Vec3::new(8.0, 0.0, 0.0)), &mut rng());
        }
        let alerted = enemy.alert;
        assert!(alerted > 0.3 && alerted <= 1.0);

        enemy.update(&ctx(0, Vec3::new(90.0, 0.0, 90.0)), &mut rng());
        assert!(enemy.alert < alerted);
    }

    // ==================== Attack ====================

    #[test]
    fn test_strike_damage_formula() {
        assert!(approx_eq(strike_damage(10.0, EnemyKind::Patrol, 2.0, 3.0), 3.0));
        assert!(approx_eq(strike_damage(15.0, EnemyKind::Sniper, 0.0, 25.0), 22.0));
        assert!(approx_eq(strike_damage(15.0, EnemyKind::Aggressive, 20.0, 25.0), 5.0));
        assert!(approx_eq(strike_damage(15.0, EnemyKind::Guard, 24.9, 25.0), 4.0));
    }

    #[test]
    fn test_attack_waits_for_cooldown() {
        let mut enemy = Enemy::new(EnemyId(1), EnemyKind::Patrol, Vec3::ZERO, Duration::ZERO);
        let player = Vec3::new(2.0, 0.0, 0.0);

        assert_eq!(enemy.update(&ctx(100, player), &mut rng()), None);
        assert_eq!(enemy.state, EnemyState::Attack);
        assert_eq!(enemy.update(&ctx(1500, player), &mut rng()), None);

        let strike = enemy.update(&ctx(1501, player), &mut rng()).expect("cooldown elapsed");
        assert!(approx_eq(strike.damage, 3.0));
        assert!(approx_eq(strike.distance, 2.0));
        assert!(enemy.lunging);
        assert_eq!(enemy.last_attack, Duration::from_millis(1501));

        assert_eq!(enemy.update(&ctx(2000, player), &mut rng()), None);
    }

    #[test]
    fn test_kind_names_are_distinct() {
        let mut names: Vec<_> = EnemyKind::ALL.iter().map(EnemyKind::name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), EnemyKind::ALL.len());
        assert_eq!(EnemyKind::Sniper.name(), "sniper");
    }

    // ==================== Damage / Death ====================

    #[test]
    fn test_dead_enemy_never_strikes_or_takes_hits() {
        let mut enemy = Enemy::new(EnemyId(1), EnemyKind::Patrol, Vec3::ZERO, Duration::ZERO);

        assert!(matches!(enemy.take_damage(20.0), DamageOutcome::Wounded { .. }));
        assert!(matches!(enemy.take_damage(40.0), DamageOutcome::Killed { .. }));
        assert_eq!(enemy.state, EnemyState::Dead);
        assert!(approx_eq(enemy.health.current, 0.0));

        assert_eq!(enemy.take_damage(10.0), DamageOutcome::Ignored);
        let strike = enemy.update(&ctx(60_000, Vec3::new(1.0, 0.0, 0.0)), &mut rng());
        assert_eq!(strike, None);
        assert_eq!(enemy.state, EnemyState::Dead);
        assert_eq!(enemy.position, Vec3::ZERO);
    }

    #[test]
    fn test_hit_volume_sits_at_body_center() {
        let enemy = Enemy::new(EnemyId(9), EnemyKind::Guard, Vec3::new(1.0, 0.0, 2.0), Duration::ZERO);
        let volume = enemy.hit_volume();
        assert_eq!(volume.enemy, EnemyId(9));
        assert!(approx_eq(volume.center.y, BODY_CENTER_HEIGHT));
        assert!(approx_eq(volume.radius, 1.1));
    }
}
