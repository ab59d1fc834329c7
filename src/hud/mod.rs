//! On-screen text: health, weapon, ammo, score, damage flash and state banners
//!
//! Nothing here reads combat state directly during play. The session publishes
//! `CombatEvent::Hud` snapshots at a fixed interval and the text follows them.

use bevy::prelude::*;

use crate::GameState;
use crate::combat::{CombatEvent, CombatSession, CombatSet, HudSnapshot, start_session};

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        // The first OnEnter(Menu) runs before Startup, so fill the HUD once it exists
        app.add_systems(
            Startup,
            (
                (spawn_hud, spawn_damage_flash_overlay, spawn_banner),
                (reset_hud, show_banner),
            )
                .chain(),
        )
            .add_systems(OnEnter(GameState::Menu), (reset_hud, show_banner).after(start_session))
            .add_systems(OnEnter(GameState::Playing), show_banner)
            .add_systems(OnEnter(GameState::Paused), show_banner)
            .add_systems(OnEnter(GameState::GameOver), show_banner)
            .add_systems(
                Update,
                (apply_hud_snapshots, trigger_damage_flash, update_damage_flash)
                    .after(CombatSet::Publish),
            );
    }
}

#[derive(Component)]
pub struct HealthHud;

#[derive(Component)]
pub struct WeaponHud;

#[derive(Component)]
pub struct AmmoHud;

#[derive(Component)]
pub struct ScoreHud;

#[derive(Component)]
pub struct Crosshair;

#[derive(Component)]
pub struct Banner;

fn hud_text(text: impl Into<String>, size: f32, color: Color, node: Node) -> impl Bundle {
    (
        Text::new(text),
        TextFont {
            font_size: size,
            ..default()
        },
        TextColor(color),
        node,
    )
}

fn spawn_hud(mut commands: Commands) {
    // Health display (bottom-left)
    commands.spawn((
        hud_text(
            "HP: 100/100",
            24.0,
            Color::srgb(0.3, 1.0, 0.3),
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                bottom: Val::Px(10.0),
                ..default()
            },
        ),
        HealthHud,
    ));

    // Weapon name display (bottom-right, above ammo)
    commands.spawn((
        hud_text(
            "",
            20.0,
            Color::srgb(0.8, 0.8, 1.0),
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(10.0),
                bottom: Val::Px(35.0),
                ..default()
            },
        ),
        WeaponHud,
    ));

    // Ammo display (bottom-right)
    commands.spawn((
        hud_text(
            "",
            24.0,
            Color::srgb(1.0, 0.8, 0.2),
            Node {
                position_type: PositionType::Absolute,
                right: Val::Px(10.0),
                bottom: Val::Px(10.0),
                ..default()
            },
        ),
        AmmoHud,
    ));

    // Score and kills (top-left)
    commands.spawn((
        hud_text(
            "SCORE: 0  KILLS: 0",
            24.0,
            Color::srgb(1.0, 1.0, 1.0),
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(10.0),
                top: Val::Px(10.0),
                ..default()
            },
        ),
        ScoreHud,
    ));

    commands.spawn((
        hud_text(
            "+",
            18.0,
            Color::srgba(1.0, 1.0, 1.0, 0.8),
            Node {
                position_type: PositionType::Absolute,
                left: Val::Percent(50.0),
                top: Val::Percent(50.0),
                margin: UiRect {
                    left: Val::Px(-5.0), // Center the character
                    top: Val::Px(-10.0),
                    ..default()
                },
                ..default()
            },
        ),
        Crosshair,
    ));
}

/// Green above 60%, yellow above 30%, red below
pub fn health_color(fraction: f32) -> Color {
    if fraction > 0.6 {
        Color::srgb(0.3, 1.0, 0.3)
    } else if fraction > 0.3 {
        Color::srgb(1.0, 1.0, 0.3)
    } else {
        Color::srgb(1.0, 0.3, 0.3)
    }
}

pub fn health_line(snapshot: &HudSnapshot) -> String {
    format!("HP: {:.0}/{:.0}", snapshot.health.max(0.0), snapshot.max_health)
}

pub fn weapon_line(snapshot: &HudSnapshot) -> String {
    format!("[{}] {}", snapshot.weapon_slot, snapshot.weapon_name)
}

pub fn ammo_line(snapshot: &HudSnapshot) -> String {
    if snapshot.reloading {
        format!("RELOADING... {}/{}", snapshot.magazine, snapshot.reserve)
    } else {
        format!("AMMO: {}/{}", snapshot.magazine, snapshot.reserve)
    }
}

pub fn score_line(score: u32, kills: u32) -> String {
    format!("SCORE: {}  KILLS: {}", score, kills)
}

fn apply_hud_snapshots(
    mut events: EventReader<CombatEvent>,
    mut health_query: Query<(&mut Text, &mut TextColor), With<HealthHud>>,
    mut weapon_query: Query<&mut Text, (With<WeaponHud>, Without<HealthHud>)>,
    mut ammo_query: Query<&mut Text, (With<AmmoHud>, Without<HealthHud>, Without<WeaponHud>)>,
    mut score_query: Query<&mut Text, (With<ScoreHud>, Without<HealthHud>, Without<WeaponHud>, Without<AmmoHud>)>,
) {
    // Only the newest snapshot matters
    let Some(snapshot) = events
        .read()
        .filter_map(|event| match event {
            CombatEvent::Hud(snapshot) => Some(snapshot),
            _ => None,
        })
        .last()
    else {
        return;
    };

    if let Ok((mut text, mut color)) = health_query.single_mut() {
        **text = health_line(snapshot);
        color.0 = health_color(snapshot.health / snapshot.max_health.max(1.0));
    }
    if let Ok(mut text) = weapon_query.single_mut() {
        **text = weapon_line(snapshot);
    }
    if let Ok(mut text) = ammo_query.single_mut() {
        **text = ammo_line(snapshot);
    }
    if let Ok(mut text) = score_query.single_mut() {
        **text = score_line(snapshot.score, snapshot.kills);
    }
}

/// Fill the HUD from a fresh session before its first snapshot arrives
fn reset_hud(
    session: Option<Res<CombatSession>>,
    mut flash_query: Query<&mut DamageFlash>,
    mut health_query: Query<(&mut Text, &mut TextColor), With<HealthHud>>,
    mut weapon_query: Query<&mut Text, (With<WeaponHud>, Without<HealthHud>)>,
    mut ammo_query: Query<&mut Text, (With<AmmoHud>, Without<HealthHud>, Without<WeaponHud>)>,
    mut score_query: Query<&mut Text, (With<ScoreHud>, Without<HealthHud>, Without<WeaponHud>, Without<AmmoHud>)>,
) {
    if let Ok(mut flash) = flash_query.single_mut() {
        flash.intensity = 0.0;
    }

    let Some(session) = session else {
        return;
    };
    let snapshot = session.hud_snapshot();

    if let Ok((mut text, mut color)) = health_query.single_mut() {
        **text = health_line(&snapshot);
        color.0 = health_color(1.0);
    }
    if let Ok(mut text) = weapon_query.single_mut() {
        **text = weapon_line(&snapshot);
    }
    if let Ok(mut text) = ammo_query.single_mut() {
        **text = ammo_line(&snapshot);
    }
    if let Ok(mut text) = score_query.single_mut() {
        **text = score_line(snapshot.score, snapshot.kills);
    }
}

// === Damage flash ===

/// Screen flash effect for damage feedback
#[derive(Component)]
pub struct DamageFlash {
    pub intensity: f32,
    pub decay_rate: f32,
}

impl Default for DamageFlash {
    fn default() -> Self {
        Self {
            intensity: 0.0,
            decay_rate: 4.0, // Fades in 0.25 seconds
        }
    }
}

impl DamageFlash {
    pub fn trigger(&mut self, amount: f32) {
        let boost = (amount / 25.0).min(1.0);
        self.intensity = (self.intensity + boost).min(1.0);
    }

    pub fn decay(&mut self, dt: f32) {
        self.intensity = (self.intensity - self.decay_rate * dt).max(0.0);
    }
}

fn spawn_damage_flash_overlay(mut commands: Commands) {
    commands.spawn((
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            position_type: PositionType::Absolute,
            ..default()
        },
        BackgroundColor(Color::srgba(1.0, 0.0, 0.0, 0.0)),
        GlobalZIndex(100),
        DamageFlash::default(),
    ));
}

fn trigger_damage_flash(mut events: EventReader<CombatEvent>, mut flash_query: Query<&mut DamageFlash>) {
    let Ok(mut flash) = flash_query.single_mut() else {
        return;
    };

    for event in events.read() {
        if let CombatEvent::PlayerDamaged { amount, .. } = event {
            flash.trigger(*amount);
        }
    }
}

fn update_damage_flash(mut flash_query: Query<(&mut DamageFlash, &mut BackgroundColor)>, time: Res<Time>) {
    let Ok((mut flash, mut background)) = flash_query.single_mut() else {
        return;
    };

    flash.decay(time.delta_secs());
    background.0 = Color::srgba(1.0, 0.0, 0.0, flash.intensity * 0.5);
}

// === State banners ===

fn spawn_banner(mut commands: Commands) {
    commands.spawn((
        hud_text(
            "",
            40.0,
            Color::WHITE,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                top: Val::Percent(35.0),
                justify_content: JustifyContent::Center,
                ..default()
            },
        ),
        TextLayout::new_with_justify(JustifyText::Center),
        GlobalZIndex(110),
        Banner,
    ));
}

pub fn banner_text(state: GameState, score: u32, kills: u32) -> String {
    match state {
        GameState::Menu => "SHADOW ASSAULT\n\nWASD move  SHIFT sprint  SPACE jump\nMOUSE aim/fire  R reload  1-5 weapons\n\nPress ENTER to start".to_string(),
        GameState::Playing => String::new(),
        GameState::Paused => "PAUSED\n\nESC resume  Q quit to menu".to_string(),
        GameState::GameOver => format!("GAME OVER\n\nScore: {}\nKills: {}\n\nPress ENTER to continue", score, kills),
    }
}

fn show_banner(
    state: Res<State<GameState>>,
    session: Option<Res<CombatSession>>,
    mut banner_query: Query<&mut Text, With<Banner>>,
) {
    let Ok(mut text) = banner_query.single_mut() else {
        return;
    };

    let (score, kills) = session
        .map(|session| (session.player.score, session.player.kills))
        .unwrap_or_default();
    **text = banner_text(*state.get(), score, kills);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> HudSnapshot {
        HudSnapshot {
            health: 72.4,
            max_health: 100.0,
            magazine: 12,
            reserve: 90,
            weapon_name: "RIFLE",
            weapon_slot: 2,
            reloading: false,
            score: 300,
            kills: 2,
        }
    }

    #[test]
    fn test_health_color_thresholds() {
        assert_eq!(health_color(0.9), Color::srgb(0.3, 1.0, 0.3));
        assert_eq!(health_color(0.5), Color::srgb(1.0, 1.0, 0.3));
        assert_eq!(health_color(0.1), Color::srgb(1.0, 0.3, 0.3));
    }

    #[test]
    fn test_hud_lines() {
        let snap = snapshot();
        assert_eq!(health_line(&snap), "HP: 72/100");
        assert_eq!(weapon_line(&snap), "[2] RIFLE");
        assert_eq!(ammo_line(&snap), "AMMO: 12/90");
        assert_eq!(score_line(snap.score, snap.kills), "SCORE: 300  KILLS: 2");
    }

    #[test]
    fn test_reloading_shows_in_ammo_line() {
        let snap = HudSnapshot {
            reloading: true,
            ..snapshot()
        };
        assert!(ammo_line(&snap).starts_with("RELOADING"));
    }

    #[test]
    fn test_negative_health_reads_zero() {
        let snap = HudSnapshot {
            health: -5.0,
            ..snapshot()
        };
        assert_eq!(health_line(&snap), "HP: 0/100");
    }

    #[test]
    fn test_damage_flash_caps_and_fades() {
        let mut flash = DamageFlash::default();
        flash.trigger(10.0);
        assert!((flash.intensity - 0.4).abs() < 0.0001);

        flash.trigger(100.0);
        assert!((flash.intensity - 1.0).abs() < 0.0001);

        flash.decay(1.0);
        assert_eq!(flash.intensity, 0.0);
    }

    #[test]
    fn test_game_over_banner_reports_result() {
        let text = banner_text(GameState::GameOver, 450, 3);
        assert!(text.contains("Score: 450"));
        assert!(text.contains("Kills: 3"));
        assert!(banner_text(GameState::Playing, 0, 0).is_empty());
    }
}
