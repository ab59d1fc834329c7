use bevy::prelude::*;

mod audio;
mod combat;
mod enemies;
mod hud;
mod level;
mod player;

/// Game states
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum GameState {
    #[default]
    Menu,
    Playing,
    Paused,
    GameOver,
}

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Shadow Assault".into(),
                resolution: (1280.0, 720.0).into(),
                ..default()
            }),
            ..default()
        }))
        .init_state::<GameState>()
        .insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.08)))
        .add_plugins((
            player::PlayerPlugin,
            level::LevelPlugin,
            combat::CombatPlugin,
            enemies::EnemyPlugin,
            hud::HudPlugin,
            audio::GameAudioPlugin,
        ))
        .add_systems(Update, handle_game_state_input)
        .run();
}

fn handle_game_state_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    current_state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    match current_state.get() {
        GameState::Menu => {
            if keyboard.just_pressed(KeyCode::Space) || keyboard.just_pressed(KeyCode::Enter) {
                next_state.set(GameState::Playing);
            }
        }
        GameState::Playing => {
            if keyboard.just_pressed(KeyCode::Escape) {
                next_state.set(GameState::Paused);
            }
        }
        GameState::Paused => {
            if keyboard.just_pressed(KeyCode::Escape) {
                next_state.set(GameState::Playing);
            }
            if keyboard.just_pressed(KeyCode::KeyQ) {
                next_state.set(GameState::Menu);
            }
        }
        // Back through the menu so a fresh session is built
        GameState::GameOver => {
            if keyboard.just_pressed(KeyCode::Space) || keyboard.just_pressed(KeyCode::Enter) {
                next_state.set(GameState::Menu);
            }
        }
    }
}
