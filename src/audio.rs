//! Synthesized sound cues
//!
//! Each `SoundCue` the session publishes becomes a short generated tone, so
//! the game ships without audio assets.

use std::time::Duration;

use bevy::audio::{Pitch, Volume};
use bevy::prelude::*;

use crate::combat::{CombatEvent, CombatSet, SoundCue};

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, play_sound_cues.after(CombatSet::Publish));
    }
}

/// Frequency, length and volume of a cue
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    pub frequency: f32,
    pub duration: Duration,
    pub volume: f32,
}

pub fn tone_for(cue: SoundCue) -> Tone {
    let (frequency, millis, volume) = match cue {
        SoundCue::Shoot => (200.0, 100, 0.4),
        SoundCue::Hit => (800.0, 200, 0.5),
        SoundCue::Reload => (300.0, 400, 0.3),
        SoundCue::Jump => (150.0, 300, 0.2),
        SoundCue::EnemyAttack => (100.0, 300, 0.4),
        SoundCue::PlayerDamage => (600.0, 500, 0.6),
        SoundCue::WeaponSwitch => (400.0, 150, 0.3),
        SoundCue::Explosion => (60.0, 600, 0.7),
    };

    Tone {
        frequency,
        duration: Duration::from_millis(millis),
        volume,
    }
}

/// Marker for one-shot cue entities
#[derive(Component)]
pub struct CueSound(pub SoundCue);

fn play_sound_cues(
    mut commands: Commands,
    mut events: EventReader<CombatEvent>,
    mut pitches: ResMut<Assets<Pitch>>,
) {
    let mut played = Vec::new();

    for event in events.read() {
        let CombatEvent::Sound(cue) = event else {
            continue;
        };
        // Pellets and splash can raise the same cue many times in one frame
        if played.contains(cue) {
            continue;
        }
        played.push(*cue);

        let tone = tone_for(*cue);
        commands.spawn((
            CueSound(*cue),
            AudioPlayer(pitches.add(Pitch::new(tone.frequency, tone.duration))),
            PlaybackSettings::DESPAWN.with_volume(Volume::Linear(tone.volume)),
        ));
    }
}
