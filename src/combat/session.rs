//! One play session: every piece of mutable combat state and the tick that advances it
//!
//! The session never touches the ECS world. Bevy systems feed it a `TickInput`
//! and forward whatever lands in the outbox to the render, audio and HUD sinks.

use std::collections::BTreeMap;
use std::time::Duration;

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::config::CombatConfig;
use super::damage::{DamageOutcome, Health};
use super::hitscan::{HitVolume, RayCaster, apply_spread};
use super::projectiles::{Grenade, GrenadeId, blast_damage};
use super::schedule::{TimedAction, TimerQueue};
use super::weapons::{FireMode, WeaponKey, WeaponRegistry, WeaponStats};
use crate::enemies::{AgentContext, Enemy, EnemyId};
use crate::level::{ArenaLayout, Pickup, PickupId, PickupKind};
use crate::player::input::ControlIntent;
use crate::player::movement::{MoveIntent, MovementConfig, PlayerBody, step_player, wish_direction};

/// Fire-and-forget audio triggers
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SoundCue {
    Shoot,
    Hit,
    Reload,
    Jump,
    EnemyAttack,
    PlayerDamage,
    WeaponSwitch,
    Explosion,
}

/// Values shown on the HUD
#[derive(Clone, Debug, PartialEq)]
pub struct HudSnapshot {
    pub health: f32,
    pub max_health: f32,
    pub magazine: u32,
    pub reserve: u32,
    pub weapon_name: &'static str,
    pub weapon_slot: usize,
    pub reloading: bool,
    pub score: u32,
    pub kills: u32,
}

/// Everything that happened during a tick, in order
#[derive(Event, Clone, Debug, PartialEq)]
pub enum CombatEvent {
    Sound(SoundCue),
    WeaponSwitched { weapon: WeaponKey },
    ShotFired { weapon: WeaponKey, origin: Vec3, direction: Vec3 },
    EnemyHit { enemy: EnemyId, point: Vec3, damage: f32, remaining: f32 },
    EnemyKilled { enemy: EnemyId, score: u32, kills: u32 },
    EnemyRemoved { enemy: EnemyId },
    GrenadeLaunched { grenade: GrenadeId, position: Vec3 },
    GrenadeDetonated { grenade: GrenadeId, position: Vec3 },
    ReloadStarted { weapon: WeaponKey },
    ReloadFinished { weapon: WeaponKey, transferred: u32 },
    PickupCollected { pickup: PickupId, kind: PickupKind },
    PlayerDamaged { source: EnemyId, amount: f32, remaining: f32 },
    PlayerDied { score: u32, kills: u32 },
    Hud(HudSnapshot),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SessionOutcome {
    #[default]
    Active,
    Defeated,
}

#[derive(Clone, Debug)]
pub struct PlayerStatus {
    pub body: PlayerBody,
    pub health: Health,
    pub yaw: f32,
    pub pitch: f32,
    pub kills: u32,
    pub score: u32,
}

impl PlayerStatus {
    pub fn eye(&self, eye_height: f32) -> Vec3 {
        self.body.position + Vec3::Y * eye_height
    }

    /// Unit view direction from yaw and pitch
    pub fn facing(&self) -> Vec3 {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0) * Vec3::NEG_Z
    }
}

/// Input for one tick. `now` is session time and must not run backwards.
#[derive(Clone, Copy, Debug)]
pub struct TickInput {
    pub now: Duration,
    pub dt: f32,
    pub intent: ControlIntent,
}

#[derive(Resource)]
pub struct CombatSession {
    pub config: CombatConfig,
    pub movement: MovementConfig,
    pub player: PlayerStatus,
    pub enemies: BTreeMap<EnemyId, Enemy>,
    pub weapons: WeaponRegistry,
    pub grenades: Vec<Grenade>,
    pub pickups: Vec<Pickup>,
    pub timers: TimerQueue,
    outbox: Vec<CombatEvent>,
    rng: StdRng,
    clock: Duration,
    last_hud: Option<Duration>,
    next_grenade: u32,
    outcome: SessionOutcome,
}

impl CombatSession {
    pub fn new(config: CombatConfig, movement: MovementConfig, layout: &ArenaLayout) -> Self {
        let enemies = layout
            .enemies
            .iter()
            .enumerate()
            .map(|(index, placement)| {
                let id = EnemyId(index as u32);
                let enemy = Enemy::new(id, placement.kind, placement.position, Duration::ZERO)
                    .with_route(placement.route.clone());
                (id, enemy)
            })
            .collect();

        Self {
            player: PlayerStatus {
                body: PlayerBody::standing_at(layout.player_spawn),
                health: Health::new(config.player_max_health),
                yaw: 0.0,
                pitch: 0.0,
                kills: 0,
                score: 0,
            },
            enemies,
            weapons: WeaponRegistry::default(),
            grenades: Vec::new(),
            pickups: layout.pickups.clone(),
            timers: TimerQueue::default(),
            outbox: Vec::new(),
            rng: StdRng::seed_from_u64(config.rng_seed),
            clock: Duration::ZERO,
            last_hud: None,
            next_grenade: 0,
            outcome: SessionOutcome::Active,
            config,
            movement,
        }
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn outcome(&self) -> SessionOutcome {
        self.outcome
    }

    pub fn is_active(&self) -> bool {
        self.outcome == SessionOutcome::Active
    }

    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    pub fn living_enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values().filter(|enemy| enemy.is_alive())
    }

    /// Hand over everything queued since the last drain
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, CombatEvent> {
        self.outbox.drain(..)
    }

    /// Advance the session by one step
    pub fn tick(&mut self, input: &TickInput, caster: &impl RayCaster) {
        if !self.is_active() {
            return;
        }

        self.clock = self.clock.max(input.now);
        self.run_due_timers();

        self.move_player(&input.intent, input.dt);
        self.collect_pickups();

        self.update_enemies(input.dt);
        if !self.is_active() {
            self.emit_hud();
            return;
        }

        if let Some(key) = input.intent.select {
            self.switch_weapon(key);
        }
        if input.intent.reload {
            self.request_reload();
        }
        if input.intent.fire_held {
            self.fire(caster);
        }

        self.step_grenades(input.dt);

        let hud_due = self
            .last_hud
            .is_none_or(|last| self.clock.saturating_sub(last) >= self.config.hud_interval);
        if hud_due {
            self.emit_hud();
        }
    }

    fn run_due_timers(&mut self) {
        while let Some(action) = self.timers.pop_due(self.clock) {
            match action {
                TimedAction::AutoReload(key) => {
                    self.begin_reload(key);
                }
                TimedAction::FinishReload(key) => {
                    let Some(weapon) = self.weapons.get_mut(key) else {
                        continue;
                    };
                    // A cancelled reload, or one restarted since, is not ours to finish
                    if !weapon.reload_due(self.clock) {
                        continue;
                    }

                    let transferred = weapon.finish_reload();
                    info!(
                        "{} reloaded: {}/{}",
                        weapon.stats.name, weapon.magazine, weapon.reserve
                    );
                    self.outbox.push(CombatEvent::ReloadFinished { weapon: key, transferred });
                }
                TimedAction::RemoveEnemy(id) => {
                    let corpse = self.enemies.get(&id).is_some_and(|enemy| !enemy.is_alive());
                    if corpse {
                        self.enemies.remove(&id);
                        self.outbox.push(CombatEvent::EnemyRemoved { enemy: id });
                    }
                }
                TimedAction::EndLunge(id) => {
                    if let Some(enemy) = self.enemies.get_mut(&id) {
                        enemy.lunging = false;
                    }
                }
            }
        }
    }

    fn move_player(&mut self, intent: &ControlIntent, dt: f32) {
        self.player.yaw = intent.yaw;
        self.player.pitch = intent.pitch.clamp(-self.movement.max_pitch, self.movement.max_pitch);

        let move_intent = MoveIntent {
            wish_dir: wish_direction(self.player.yaw, intent.forward, intent.strafe),
            sprint: intent.sprint,
            jump: intent.jump,
        };

        let jumped = step_player(
            &mut self.player.body,
            &move_intent,
            &self.movement,
            self.config.arena_half_extent,
            dt,
        );
        if jumped {
            self.outbox.push(CombatEvent::Sound(SoundCue::Jump));
        }
    }

    fn collect_pickups(&mut self) {
        let feet = self.player.body.position;
        let radius = self.config.pickup_radius;

        let (collected, remaining): (Vec<Pickup>, Vec<Pickup>) = self
            .pickups
            .drain(..)
            .partition(|pickup| pickup.position.distance(feet) < radius);
        self.pickups = remaining;

        for pickup in collected {
            match pickup.kind {
                PickupKind::Ammo => {
                    if let Some(weapon) = self.weapons.active_mut() {
                        weapon.refill_magazine();
                    }
                }
                PickupKind::Health => {
                    self.player.health.heal(self.config.health_pickup_amount);
                }
            }

            debug!("Picked up {:?}", pickup.kind);
            self.outbox.push(CombatEvent::PickupCollected {
                pickup: pickup.id,
                kind: pickup.kind,
            });
        }
    }

    fn update_enemies(&mut self, dt: f32) {
        let ctx = AgentContext {
            now: self.clock,
            dt,
            player_position: self.player.body.position,
            arena_half_extent: self.config.arena_half_extent,
        };

        let mut strikes = Vec::new();
        for enemy in self.enemies.values_mut() {
            if !enemy.is_alive() {
                continue;
            }
            if let Some(strike) = enemy.update(&ctx, &mut self.rng) {
                debug!(
                    "{} enemy {:?} strikes for {:.0} from {:.1}",
                    enemy.kind.name(),
                    enemy.id,
                    strike.damage,
                    strike.distance
                );
                strikes.push((enemy.id, strike));
            }
        }

        for (id, strike) in strikes {
            self.timers.schedule(self.clock + self.config.lunge_duration, TimedAction::EndLunge(id));
            self.outbox.push(CombatEvent::Sound(SoundCue::EnemyAttack));
            self.damage_player(id, strike.damage);
        }
    }

    /// Apply an enemy strike to the player, ending the session at zero health
    pub fn damage_player(&mut self, source: EnemyId, amount: f32) {
        if !self.is_active() {
            return;
        }

        let dealt = self.player.health.take_damage(amount);
        if dealt <= 0.0 {
            return;
        }

        self.outbox.push(CombatEvent::Sound(SoundCue::PlayerDamage));
        self.outbox.push(CombatEvent::PlayerDamaged {
            source,
            amount: dealt,
            remaining: self.player.health.current,
        });

        if self.player.health.is_dead() {
            self.outcome = SessionOutcome::Defeated;
            info!(
                "Player killed by enemy {:?} - score {}, kills {}",
                source, self.player.score, self.player.kills
            );
            self.outbox.push(CombatEvent::PlayerDied {
                score: self.player.score,
                kills: self.player.kills,
            });
        }
    }

    /// Make `key` the active weapon. Selecting the active weapon does nothing.
    pub fn switch_weapon(&mut self, key: WeaponKey) -> bool {
        if !self.weapons.switch_to(key) {
            return false;
        }

        info!("Switched to {}", WeaponStats::for_key(key).name);
        self.outbox.push(CombatEvent::WeaponSwitched { weapon: key });
        self.outbox.push(CombatEvent::Sound(SoundCue::WeaponSwitch));
        true
    }

    /// Reload the active weapon if it can be reloaded
    pub fn request_reload(&mut self) -> bool {
        self.begin_reload(self.weapons.active_key())
    }

    fn begin_reload(&mut self, key: WeaponKey) -> bool {
        let Some(weapon) = self.weapons.get_mut(key) else {
            return false;
        };
        let Some(done) = weapon.begin_reload(self.clock) else {
            return false;
        };

        info!("Reloading {}", weapon.stats.name);
        self.timers.schedule(done, TimedAction::FinishReload(key));
        self.outbox.push(CombatEvent::ReloadStarted { weapon: key });
        self.outbox.push(CombatEvent::Sound(SoundCue::Reload));
        true
    }

    /// Pull the trigger on the active weapon. Rejected attempts change nothing.
    pub fn fire(&mut self, caster: &impl RayCaster) -> bool {
        let now = self.clock;
        let key = self.weapons.active_key();
        let Some(weapon) = self.weapons.active_mut() else {
            return false;
        };
        if !weapon.fire(now) {
            return false;
        }

        let stats = weapon.stats.clone();
        if weapon.needs_auto_reload() {
            self.timers.schedule(now + self.config.auto_reload_delay, TimedAction::AutoReload(key));
        }

        let origin = self.player.eye(self.movement.eye_height);
        let facing = self.player.facing();

        self.outbox.push(CombatEvent::Sound(SoundCue::Shoot));
        self.outbox.push(CombatEvent::ShotFired {
            weapon: key,
            origin,
            direction: facing,
        });

        match stats.fire_mode {
            FireMode::Hitscan => {
                self.resolve_ray(origin, facing, stats.range, stats.damage, caster);
            }
            FireMode::Pellets { count, spread } => {
                let per_pellet = stats.damage / count.max(1) as f32;
                for _ in 0..count {
                    let direction = apply_spread(facing, spread, &mut self.rng);
                    self.resolve_ray(origin, direction, stats.range, per_pellet, caster);
                }
            }
            FireMode::Lobbed => {
                let id = GrenadeId(self.next_grenade);
                self.next_grenade += 1;
                self.grenades.push(Grenade::launch(id, origin, facing, &self.config.grenade));
                self.outbox.push(CombatEvent::GrenadeLaunched { grenade: id, position: origin });
            }
        }

        true
    }

    fn resolve_ray(&mut self, origin: Vec3, direction: Vec3, range: f32, damage: f32, caster: &impl RayCaster) {
        let Ok(direction) = Dir3::new(direction) else {
            return;
        };

        let candidates: Vec<HitVolume> = self.living_enemies().map(Enemy::hit_volume).collect();
        let Some(hit) = caster.nearest_hit(Ray3d { origin, direction }, range, &candidates) else {
            return;
        };

        self.apply_enemy_damage(hit.enemy, damage, hit.point);
    }

    /// Damage an enemy, awarding the kill immediately and scheduling corpse removal.
    /// Dead or missing enemies are ignored.
    pub fn apply_enemy_damage(&mut self, id: EnemyId, amount: f32, point: Vec3) -> DamageOutcome {
        let Some(enemy) = self.enemies.get_mut(&id) else {
            return DamageOutcome::Ignored;
        };

        let outcome = enemy.take_damage(amount);
        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Wounded { dealt, remaining } => {
                debug!("Enemy {:?} hit for {:.0}, {:.0} left", id, dealt, remaining);
                self.outbox.push(CombatEvent::EnemyHit { enemy: id, point, damage: dealt, remaining });
                self.outbox.push(CombatEvent::Sound(SoundCue::Hit));
            }
            DamageOutcome::Killed { dealt } => {
                self.outbox.push(CombatEvent::EnemyHit { enemy: id, point, damage: dealt, remaining: 0.0 });
                self.outbox.push(CombatEvent::Sound(SoundCue::Hit));

                self.player.kills += 1;
                self.player.score += self.config.kill_score;
                info!("Enemy {:?} killed! Score: {}", id, self.player.score);

                self.timers.schedule(self.clock + self.config.corpse_linger, TimedAction::RemoveEnemy(id));
                self.outbox.push(CombatEvent::EnemyKilled {
                    enemy: id,
                    score: self.player.score,
                    kills: self.player.kills,
                });
            }
        }

        outcome
    }

    fn step_grenades(&mut self, dt: f32) {
        let tuning = &self.config.grenade;
        let mut detonated = Vec::new();

        self.grenades.retain_mut(|grenade| {
            if grenade.step(dt, tuning) {
                detonated.push((grenade.id, grenade.position));
                false
            } else {
                true
            }
        });

        for (id, position) in detonated {
            self.detonate(id, position);
        }
    }

    fn detonate(&mut self, id: GrenadeId, position: Vec3) {
        self.outbox.push(CombatEvent::Sound(SoundCue::Explosion));
        self.outbox.push(CombatEvent::GrenadeDetonated { grenade: id, position });

        let max_damage = self
            .weapons
            .get(WeaponKey::Grenade)
            .map_or(WeaponStats::grenade().damage, |weapon| weapon.stats.damage);

        let victims: Vec<(EnemyId, f32, Vec3)> = self
            .living_enemies()
            .filter_map(|enemy| {
                let damage = blast_damage(enemy.position.distance(position), max_damage, &self.config.grenade)?;
                Some((enemy.id, damage, enemy.hit_volume().center))
            })
            .collect();

        debug!("Grenade {:?} caught {} enemies", id, victims.len());
        for (enemy, damage, point) in victims {
            self.apply_enemy_damage(enemy, damage, point);
        }
    }

    pub fn hud_snapshot(&self) -> HudSnapshot {
        let weapon = self.weapons.active();

        HudSnapshot {
            health: self.player.health.current,
            max_health: self.player.health.max,
            magazine: weapon.map_or(0, |w| w.magazine),
            reserve: weapon.map_or(0, |w| w.reserve),
            weapon_name: weapon.map_or("", |w| w.stats.name),
            weapon_slot: self.weapons.active_key().slot(),
            reloading: weapon.is_some_and(|w| w.is_reloading()),
            score: self.player.score,
            kills: self.player.kills,
        }
    }

    fn emit_hud(&mut self) {
        self.last_hud = Some(self.clock);
        let snapshot = self.hud_snapshot();
        self.outbox.push(CombatEvent::Hud(snapshot));
    }
}
