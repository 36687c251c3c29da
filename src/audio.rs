use log::warn;
use macroquad::audio::{Sound, load_sound_from_bytes, play_sound_once};
use std::collections::HashMap;
use wandfire::SoundCue;
use wandfire::assets::get_asset_bytes;

const CUE_FILES: [(SoundCue, &str); 8] = [
    (SoundCue::Cast, "sounds/cast.ogg"),
    (SoundCue::Hit, "sounds/hit.ogg"),
    (SoundCue::Death, "sounds/death.ogg"),
    (SoundCue::Clash, "sounds/clash.ogg"),
    (SoundCue::Door, "sounds/door.ogg"),
    (SoundCue::DementorAttach, "sounds/dementor.ogg"),
    (SoundCue::Patronus, "sounds/patronus.ogg"),
    (SoundCue::LifeLost, "sounds/life_lost.ogg"),
];

#[derive(Default)]
pub struct AudioManager {
    sounds: HashMap<SoundCue, Sound>,
}

impl AudioManager {
    pub fn new() -> Self {
        Default::default()
    }

    // Load every cue that ships with the binary; missing ones stay silent
    pub async fn load_assets(&mut self) {
        for (cue, path) in CUE_FILES {
            let Some(bytes) = get_asset_bytes(path) else {
                warn!("Sound '{}' for {:?} not bundled", path, cue);
                continue;
            };
            match load_sound_from_bytes(&bytes).await {
                Ok(sound) => {
                    self.sounds.insert(cue, sound);
                }
                Err(e) => warn!("Failed to load sound '{}': {}", path, e),
            }
        }
    }

    pub fn play(&self, cue: SoundCue) {
        if let Some(sound) = self.sounds.get(&cue) {
            play_sound_once(sound);
        }
    }
}
