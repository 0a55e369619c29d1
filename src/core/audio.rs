use log::debug;

use crate::assets::{AssetKind, Handle};

/// Front end of the audio engine. Playback itself happens elsewhere; the
/// mixer records what stages asked for so the engine (or a test) can pick
/// the requests up once per frame.
#[derive(Debug, Default)]
pub struct Mixer {
    queued: Vec<String>,
}

impl Mixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn play(&mut self, sound: &Handle) {
        if sound.kind() != AssetKind::Sound {
            debug!("Ignoring play request for non-sound '{}'", sound.key());
            return;
        }
        debug!("Queueing sound '{}'", sound.key());
        self.queued.push(sound.key().to_string());
    }

    /// Takes the requests queued since the previous call.
    pub fn take_queued(&mut self) -> Vec<String> {
        std::mem::take(&mut self.queued)
    }
}
